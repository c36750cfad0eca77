//! 椭球结节掩膜.

use std::ops::Range;

use itertools::iproduct;
use log::{debug, trace};
use ndarray::{ArrayBase, DataMut, Ix3};
use num::One;

use super::EllipsoidNodule;
use crate::geom::check_windows;
use crate::{MaskResult, Window};

/// 单轴扫描范围 `[max(0, c - r), min(len, c + r + 1))`, 可能为空.
///
/// 使用 `i128` 计算, 因此任意 `i64` 中心都不会溢出.
#[inline]
fn scan_axis(len: usize, center: i64, radius: usize) -> Range<usize> {
    let (len, c, r) = (len as i128, center as i128, radius as i128);
    let begin = (c - r).clamp(0, len);
    let end = (c + r + 1).clamp(begin, len);
    begin as usize..end as usize
}

/// 单轴归一化距离的平方, `((p - c) / r)²`.
#[inline]
fn term(p: usize, center: i64, radius: usize) -> f64 {
    ((p as f64 - center as f64) / radius as f64).powi(2)
}

/// 在 `dst` 中按窗口填充所有椭球结节.
///
/// 对每个结节, 只扫描其包围盒与窗口的交集, 对其中每个整数体素
/// (窗口相对坐标) 判定 `Σ ((p - center) / radius)² < 1`, 满足时置为 1.
/// 恰好落在椭球面上的体素 (和为 1) 不计入.
///
/// # 返回值
///
/// 若存在越出 `dst` 的窗口, 返回 `Err(MaskError::WindowOutOfBounds)`,
/// 且 `dst` 不会被修改.
pub fn fill_ellipsoids<S, T>(
    dst: &mut ArrayBase<S, Ix3>,
    nodules: &[EllipsoidNodule],
) -> MaskResult<()>
where
    S: DataMut<Elem = T>,
    T: One,
{
    check_windows(nodules.iter().map(EllipsoidNodule::window), dst.dim())?;

    let voxels: usize = nodules
        .iter()
        .map(|n| fill_ellipsoid(dst, n.window, n))
        .sum();
    debug!("filled {} ellipsoid nodules, {voxels} voxels set", nodules.len());
    Ok(())
}

/// 在 `dst` 的 `window` 子视图中填充单个结节. 返回置位的体素数.
fn fill_ellipsoid<S, T>(
    dst: &mut ArrayBase<S, Ix3>,
    window: Window,
    nodule: &EllipsoidNodule,
) -> usize
where
    S: DataMut<Elem = T>,
    T: One,
{
    let (sz, sy, sx) = window.size();
    let (cz, cy, cx) = nodule.center;
    let (rz, ry, rx) = nodule.radius;
    let (zs, ys, xs) = (
        scan_axis(sz, cz, rz),
        scan_axis(sy, cy, ry),
        scan_axis(sx, cx, rx),
    );
    if zs.is_empty() || ys.is_empty() || xs.is_empty() {
        trace!("ellipsoid nodule {nodule:?} does not reach its window");
        return 0;
    }

    let mut view = window.view_mut(dst);
    let mut cnt = 0usize;
    for (z, y, x) in iproduct!(zs, ys, xs) {
        if term(z, cz, rz) + term(y, cy, ry) + term(x, cx, rx) < 1.0 {
            view[[z, y, x]] = T::one();
            cnt += 1;
        }
    }
    cnt
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use crate::geom::SlabPartition;
        use ndarray::ArrayViewMut3;
    }
}

/// 借助 `rayon`, 并行地填充椭球结节.
///
/// 划分规则与 [`super::par_fill_boxes`] 相同: 各病人窗口沿 z 轴互不相交时按病人并行,
/// 否则退化为顺序的 [`fill_ellipsoids`]. 结果与顺序版本完全一致.
#[cfg(feature = "rayon")]
pub fn par_fill_ellipsoids<T>(
    mut dst: ArrayViewMut3<'_, T>,
    nodules: &[EllipsoidNodule],
) -> MaskResult<()>
where
    T: One + Send,
{
    check_windows(nodules.iter().map(EllipsoidNodule::window), dst.dim())?;

    let Some(part) = SlabPartition::new(nodules.iter().map(EllipsoidNodule::window)) else {
        debug!("ellipsoid windows overlap along z, filling sequentially");
        return fill_ellipsoids(&mut dst, nodules);
    };
    part.par_for_each(dst, |mut slab, z0, items| {
        for n in items.iter().map(|&i| &nodules[i]) {
            fill_ellipsoid(&mut slab, n.window.rebase_z(z0), n);
        }
    });
    Ok(())
}
