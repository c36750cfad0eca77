//! 长方体结节掩膜.

use log::{debug, trace};
use ndarray::{ArrayBase, DataMut, Ix3};
use num::One;

use super::BoxNodule;
use crate::geom::{check_windows, CropPlan};
use crate::{MaskResult, Window};

/// 在 `dst` 中按窗口填充所有长方体结节.
///
/// 对每个结节, 相当于以结节起点为原点, 把一个全 1 的实心块经 [`crate::insert_cropped`]
/// 插入 `dst` 在该结节窗口上的子视图. 实心块不会被真正分配, 只填充裁剪后的写入区域,
/// 因此结节尺寸可以远大于窗口. 越出窗口的部分被裁剪, 完全在窗口外时什么也不做.
///
/// # 返回值
///
/// 若存在越出 `dst` 的窗口, 返回 `Err(MaskError::WindowOutOfBounds)`,
/// 且 `dst` 不会被修改.
pub fn fill_boxes<S, T>(dst: &mut ArrayBase<S, Ix3>, nodules: &[BoxNodule]) -> MaskResult<()>
where
    S: DataMut<Elem = T>,
    T: Clone + One,
{
    check_windows(nodules.iter().map(BoxNodule::window), dst.dim())?;

    let written = nodules
        .iter()
        .filter(|n| fill_box(dst, n.window, n))
        .count();
    debug!("filled {written} of {} box nodules", nodules.len());
    Ok(())
}

/// 在 `dst` 的 `window` 子视图中填充单个结节. 返回是否写入了体素.
///
/// 并行版本会传入平移后的窗口, 因此窗口与结节分开给出.
fn fill_box<S, T>(dst: &mut ArrayBase<S, Ix3>, window: Window, nodule: &BoxNodule) -> bool
where
    S: DataMut<Elem = T>,
    T: Clone + One,
{
    let Some(plan) = CropPlan::new(window.size(), nodule.size, nodule.start) else {
        trace!("box nodule {nodule:?} lies outside its window");
        return false;
    };
    plan.fill(window.view_mut(dst), T::one());
    true
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use crate::geom::SlabPartition;
        use ndarray::ArrayViewMut3;
    }
}

/// 借助 `rayon`, 并行地填充长方体结节.
///
/// 各病人窗口沿 z 轴互不相交 (同一病人的结节可共享窗口) 时,
/// 每个病人的 z 区间交给一个任务; 否则退化为顺序的 [`fill_boxes`].
/// 两种方式的结果完全一致.
#[cfg(feature = "rayon")]
pub fn par_fill_boxes<T>(mut dst: ArrayViewMut3<'_, T>, nodules: &[BoxNodule]) -> MaskResult<()>
where
    T: Clone + One + Send,
{
    check_windows(nodules.iter().map(BoxNodule::window), dst.dim())?;

    let Some(part) = SlabPartition::new(nodules.iter().map(BoxNodule::window)) else {
        debug!("box windows overlap along z, filling sequentially");
        return fill_boxes(&mut dst, nodules);
    };
    part.par_for_each(dst, |mut slab, z0, items| {
        for n in items.iter().map(|&i| &nodules[i]) {
            fill_box(&mut slab, n.window.rebase_z(z0), n);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::fill_boxes;
    use crate::consts::marker::{BACKGROUND_F32, BACKGROUND_U8, NODULE_U8};
    use crate::{BoxNodule, Idx3d, MaskError, Window};
    use ndarray::{s, Array3};

    fn win(start: Idx3d, end: Idx3d) -> Window {
        Window::new(start, end).unwrap()
    }

    fn count(v: &Array3<u8>) -> usize {
        v.iter().filter(|&&p| p != 0).count()
    }

    /// 两个病人上下堆叠, 各有一个结节.
    #[test]
    fn test_fill_boxes_skyscraper() {
        let _ = simple_logger::init_with_level(log::Level::Trace);

        let mut vol = Array3::<u8>::zeros((10, 6, 6));
        let (w0, w1) = (win((0, 0, 0), (5, 6, 6)), win((5, 0, 0), (10, 6, 6)));
        let nodules = [
            BoxNodule::new(w0, (1, 1, 1), (2, 2, 2)).unwrap(),
            BoxNodule::new(w1, (0, 3, 3), (1, 2, 3)).unwrap(),
        ];
        fill_boxes(&mut vol, &nodules).unwrap();

        assert_eq!(count(&vol), 8 + 6);
        assert!(vol.slice(s![1..3, 1..3, 1..3]).iter().all(|&p| p == 1));
        // 第二个病人窗口从 z = 5 开始, 且 x 方向被裁剪到 [3, 6).
        assert!(vol.slice(s![5..6, 3..5, 3..6]).iter().all(|&p| p == 1));
    }

    /// 结节越出窗口时只填充窗口内部分, 不会写进相邻病人.
    #[test]
    fn test_fill_boxes_clipped_to_window() {
        let mut vol = Array3::<f32>::zeros((8, 4, 4));
        let w = win((0, 0, 0), (4, 4, 4));
        let n = BoxNodule::new(w, (2, -1, 3), (5, 2, 5)).unwrap();
        fill_boxes(&mut vol, &[n]).unwrap();

        // z: [2, 4), y: [0, 1), x: [3, 4)
        assert_eq!(vol.sum(), 2.0);
        assert_eq!(vol[[2, 0, 3]], 1.0);
        assert_eq!(vol[[3, 0, 3]], 1.0);
        assert!(vol.slice(s![4.., .., ..]).iter().all(|&p| p == BACKGROUND_F32));
    }

    /// 结节远大于窗口时只填满窗口, 不会为整个结节分配内存.
    #[test]
    fn test_fill_boxes_huge_nodule() {
        let mut vol = Array3::<u8>::zeros((8, 4, 4));
        let w = win((4, 0, 0), (8, 4, 4));
        let huge = 1usize << 21;
        let nodules = [
            BoxNodule::new(w, (-1, -1, -1), (huge, huge, huge)).unwrap(),
            BoxNodule::new(w, (i64::MIN, 0, 0), (usize::MAX, 1, 1)).unwrap(),
        ];
        fill_boxes(&mut vol, &nodules).unwrap();

        assert!(vol.slice(s![4.., .., ..]).iter().all(|&p| p == NODULE_U8));
        assert!(vol.slice(s![..4, .., ..]).iter().all(|&p| p == BACKGROUND_U8));
    }

    #[test]
    fn test_fill_boxes_outside_is_noop() {
        let mut vol = Array3::<u8>::zeros((4, 4, 4));
        let w = win((0, 0, 0), (2, 2, 2));
        let nodules = [
            BoxNodule::new(w, (2, 0, 0), (1, 1, 1)).unwrap(),
            BoxNodule::new(w, (-3, -3, -3), (3, 3, 3)).unwrap(),
        ];
        fill_boxes(&mut vol, &nodules).unwrap();
        assert_eq!(count(&vol), 0);
    }

    /// 重复调用与单次调用结果相同, 且不会清除已有前景.
    #[test]
    fn test_fill_boxes_idempotent_union() {
        let mut vol = Array3::<u8>::zeros((6, 6, 6));
        vol[[5, 5, 5]] = 1;
        let w = Window::full((6, 6, 6));
        let nodules = [
            BoxNodule::new(w, (0, 0, 0), (2, 2, 2)).unwrap(),
            BoxNodule::new(w, (1, 1, 1), (2, 2, 2)).unwrap(),
        ];
        fill_boxes(&mut vol, &nodules).unwrap();
        let once = vol.clone();
        fill_boxes(&mut vol, &nodules).unwrap();

        assert_eq!(vol, once);
        assert_eq!(count(&vol), 8 + 8 - 1 + 1);
        assert_eq!(vol[[5, 5, 5]], 1);
    }

    #[test]
    fn test_fill_boxes_bad_window() {
        let mut vol = Array3::<u8>::zeros((4, 4, 4));
        let ok = BoxNodule::new(win((0, 0, 0), (4, 4, 4)), (0, 0, 0), (1, 1, 1)).unwrap();
        let bad = BoxNodule::new(win((2, 0, 0), (5, 4, 4)), (0, 0, 0), (1, 1, 1)).unwrap();
        assert_eq!(
            fill_boxes(&mut vol, &[ok, bad]),
            Err(MaskError::WindowOutOfBounds(1))
        );
        assert_eq!(count(&vol), 0);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_fill_boxes_matches_sequential() {
        use super::par_fill_boxes;

        let shape = (12, 5, 5);
        let ws = [
            win((0, 0, 0), (4, 5, 5)),
            win((4, 0, 0), (9, 5, 5)),
            win((9, 0, 0), (12, 5, 5)),
        ];
        let disjoint: Vec<_> = (0..9)
            .map(|i| {
                let o = i as i64 - 3;
                BoxNodule::new(ws[i % 3], (o, o + 1, 2 - o), (2, 3, 2)).unwrap()
            })
            .collect();
        // 与第一个窗口在 z 上部分重叠, 触发顺序回退.
        let mut overlapping = disjoint.clone();
        overlapping.push(BoxNodule::new(win((2, 0, 0), (6, 5, 5)), (1, 1, 1), (2, 2, 2)).unwrap());

        for nodules in [&disjoint, &overlapping] {
            let mut seq = Array3::<u8>::zeros(shape);
            let mut par = Array3::<u8>::zeros(shape);
            fill_boxes(&mut seq, nodules).unwrap();
            par_fill_boxes(par.view_mut(), nodules).unwrap();
            assert_eq!(seq, par);
            assert!(count(&seq) > 0);
        }
    }
}
