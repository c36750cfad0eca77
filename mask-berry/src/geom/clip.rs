//! 越界安全的裁剪插入.
//!
//! 将较小的 `src` 数组以整数原点 `origin` 放进较大的 `dst` 数组中.
//! `origin` 可以为负, 也可以超出 `dst` 的范围; 两侧都会被裁剪,
//! 完全不重叠时什么也不做. 各轴的读写区间由 [`CropPlan`] 统一计算.

use std::ops::Range;

use ndarray::{s, ArrayView3, ArrayViewMut3};

use crate::{Idx3d, Idx3dI64};

/// 单轴上的裁剪结果: (读取范围, 写入范围). 二者长度相同.
type AxisPlan = (Range<usize>, Range<usize>);

/// 一次裁剪插入的读写计划.
///
/// 由 [`CropPlan::new`] 计算. 任意轴上读取区域与写入区域长度相等.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropPlan {
    read: [Range<usize>; 3],
    write: [Range<usize>; 3],
}

/// 单轴裁剪. 使用 `i128` 计算, 因此任意 `i64` 原点都不会溢出.
fn plan_axis(dst_len: usize, src_len: usize, origin: i64) -> Option<AxisPlan> {
    let (d, s, o) = (dst_len as i128, src_len as i128, origin as i128);

    // 完全位于左侧或右侧.
    if s + o <= 0 || o >= d {
        return None;
    }

    let read = 0i128.max(-o)..(d - o).min(s);
    let write = o.max(0)..(o + s).min(d);
    debug_assert_eq!(read.end - read.start, write.end - write.start);

    // 以上区间端点均落在 [0, max(d, s)] 内, 转换不会失败.
    let cast = |r: Range<i128>| r.start as usize..r.end as usize;
    Some((cast(read), cast(write)))
}

impl CropPlan {
    /// 计算把形状为 `src_shape` 的数组以 `origin` 放入形状为 `dst_shape`
    /// 的数组时, 两侧各自需要读写的子区域.
    ///
    /// 若在任一轴上没有重叠, 返回 `None`.
    pub fn new(dst_shape: Idx3d, src_shape: Idx3d, origin: Idx3dI64) -> Option<Self> {
        let (rz, wz) = plan_axis(dst_shape.0, src_shape.0, origin.0)?;
        let (ry, wy) = plan_axis(dst_shape.1, src_shape.1, origin.1)?;
        let (rx, wx) = plan_axis(dst_shape.2, src_shape.2, origin.2)?;
        Some(Self {
            read: [rz, ry, rx],
            write: [wz, wy, wx],
        })
    }

    /// 源数组上的读取区域, 按 `(z, y, x)` 排列.
    #[inline]
    pub fn read(&self) -> &[Range<usize>; 3] {
        &self.read
    }

    /// 目标数组上的写入区域, 按 `(z, y, x)` 排列.
    #[inline]
    pub fn write(&self) -> &[Range<usize>; 3] {
        &self.write
    }

    /// 实际搬运的体素形状. 可能在某轴上为 0 (源数组该轴为空).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let [z, y, x] = &self.write;
        (z.len(), y.len(), x.len())
    }

    /// 将 `dst` 的写入区域全部置为 `value`.
    ///
    /// 等价于插入一个形状为 `src_shape`、元素全为 `value` 的源数组,
    /// 但不需要分配源数组.
    pub(crate) fn fill<T: Clone>(&self, mut dst: ArrayViewMut3<'_, T>, value: T) {
        let [wz, wy, wx] = self.write.clone();
        dst.slice_mut(s![wz, wy, wx]).fill(value);
    }

    /// 按计划将 `src` 的读取区域复制到 `dst` 的写入区域.
    fn copy<T: Clone>(&self, mut dst: ArrayViewMut3<'_, T>, src: ArrayView3<'_, T>) {
        let [rz, ry, rx] = self.read.clone();
        let [wz, wy, wx] = self.write.clone();
        dst.slice_mut(s![wz, wy, wx])
            .assign(&src.slice(s![rz, ry, rx]));
    }
}

/// 将 `src` 插入 `dst` 中以 `origin` 为起点的位置, 覆盖重叠区域的原值.
///
/// 越界部分被裁剪; 完全不重叠时为空操作. 返回是否实际写入了数据.
///
/// # 例子
///
/// ```
/// use mask_berry::insert_cropped;
/// use ndarray::Array3;
///
/// let mut dst = Array3::<u8>::zeros((3, 3, 3));
/// let src = Array3::<u8>::ones((2, 2, 2));
/// insert_cropped(dst.view_mut(), src.view(), (2, 2, 2));
///
/// assert_eq!(dst[[2, 2, 2]], 1);
/// assert_eq!(dst.sum(), 1);
/// ```
pub fn insert_cropped<T: Clone>(
    dst: ArrayViewMut3<'_, T>,
    src: ArrayView3<'_, T>,
    origin: Idx3dI64,
) -> bool {
    match CropPlan::new(dst.dim(), src.dim(), origin) {
        Some(plan) => {
            plan.copy(dst, src);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{insert_cropped, CropPlan};
    use crate::{Idx3d, Idx3dI64};
    use ndarray::{Array3, Zip};

    fn ones_in(dst: &Array3<u8>) -> Vec<Idx3d> {
        dst.indexed_iter()
            .filter_map(|(pos, &p)| (p != 0).then_some(pos))
            .collect()
    }

    fn run(dst_shape: Idx3d, src_shape: Idx3d, origin: Idx3dI64) -> Array3<u8> {
        let mut dst = Array3::zeros(dst_shape);
        let src = Array3::ones(src_shape);
        insert_cropped(dst.view_mut(), src.view(), origin);
        dst
    }

    /// 朴素实现: 逐个源体素平移, 落在目标范围内即写入.
    fn brute_force(dst_shape: Idx3d, src_shape: Idx3d, origin: Idx3dI64) -> Array3<u8> {
        let mut dst = Array3::zeros(dst_shape);
        let (dz, dy, dx) = dst_shape;
        for ((z, y, x), _) in Array3::<u8>::ones(src_shape).indexed_iter() {
            let (tz, ty, tx) = (z as i64 + origin.0, y as i64 + origin.1, x as i64 + origin.2);
            let inside = |v: i64, n: usize| (0..n as i64).contains(&v);
            if inside(tz, dz) && inside(ty, dy) && inside(tx, dx) {
                dst[[tz as usize, ty as usize, tx as usize]] = 1;
            }
        }
        dst
    }

    #[test]
    fn test_insert_corner() {
        let dst = run((3, 3, 3), (2, 2, 2), (2, 2, 2));
        assert_eq!(ones_in(&dst), vec![(2, 2, 2)]);
    }

    #[test]
    fn test_insert_negative_origin() {
        let dst = run((3, 3, 3), (2, 2, 2), (-1, -1, -1));
        assert_eq!(ones_in(&dst), vec![(0, 0, 0)]);
    }

    #[test]
    fn test_insert_beyond() {
        let dst = run((3, 3, 3), (2, 2, 2), (5, 5, 5));
        assert!(ones_in(&dst).is_empty());
        assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (5, 5, 5)).is_none());
    }

    /// 退化情况: 某轴原点恰好等于目标长度, 或源数组恰好在左侧结束.
    #[test]
    fn test_insert_degenerate_touching() {
        assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (3, 0, 0)).is_none());
        assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (0, -2, 0)).is_none());
        assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (0, -1, 0)).is_some());
        assert!(ones_in(&run((3, 3, 3), (2, 2, 2), (0, 0, 3))).is_empty());

        // 源数组某轴为空: 形成零大小的搬运, 不报错.
        let plan = CropPlan::new((3, 3, 3), (2, 0, 2), (1, 1, 1)).unwrap();
        assert_eq!(plan.shape(), (2, 0, 2));
        assert!(ones_in(&run((3, 3, 3), (2, 0, 2), (1, 1, 1))).is_empty());
    }

    #[test]
    fn test_insert_extreme_origin() {
        for o in [i64::MIN, i64::MIN + 1, -1 << 40, 1 << 40, i64::MAX] {
            assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (o, 0, 0)).is_none());
            assert!(CropPlan::new((3, 3, 3), (2, 2, 2), (0, 0, o)).is_none());
            assert!(ones_in(&run((3, 3, 3), (2, 2, 2), (0, o, 0))).is_empty());
        }
    }

    /// 在一组原点上与朴素实现逐体素对比, 同时检查读写区域形状一致.
    #[test]
    fn test_insert_totality() {
        let (dst_shape, src_shape) = ((3, 4, 5), (2, 3, 4));
        for z in -4..=6 {
            for y in -5..=6 {
                for x in -6..=7 {
                    let origin = (z, y, x);
                    assert_eq!(
                        run(dst_shape, src_shape, origin),
                        brute_force(dst_shape, src_shape, origin),
                        "origin: {origin:?}"
                    );
                    if let Some(plan) = CropPlan::new(dst_shape, src_shape, origin) {
                        for (r, w) in plan.read().iter().zip(plan.write()) {
                            assert_eq!(r.len(), w.len());
                        }
                    }
                }
            }
        }
    }

    /// 源数组大于目标数组时两侧都被裁剪.
    #[test]
    fn test_insert_larger_source() {
        let mut dst = Array3::<i32>::zeros((2, 2, 2));
        let src = Array3::from_shape_fn((4, 4, 4), |(z, y, x)| (z * 16 + y * 4 + x) as i32);
        assert!(insert_cropped(dst.view_mut(), src.view(), (-1, -2, -1)));
        Zip::indexed(&dst).for_each(|(z, y, x), &v| {
            assert_eq!(v, src[[z + 1, y + 2, x + 1]]);
        });
    }

    #[test]
    fn test_insert_overwrites() {
        let mut src = Array3::<f32>::zeros((2, 2, 2));
        src[[0, 0, 0]] = 1.0;

        let mut dst = Array3::<f32>::ones((3, 3, 3));
        assert!(insert_cropped(dst.view_mut(), src.view(), (1, 1, 1)));
        assert_eq!(dst.sum(), 27.0 - 7.0);
        assert_eq!(dst[[1, 1, 1]], 1.0);
        assert_eq!(dst[[2, 2, 2]], 0.0);
    }
}
