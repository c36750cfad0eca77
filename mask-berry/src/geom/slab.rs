//! 沿 z 轴切分 "摩天楼" 式 batch.
//!
//! batch 中的病人沿 z 轴堆叠, 各自的窗口在 z 方向互不相交.
//! 同一病人的多个结节共享同一窗口, 因此按 z 区间分组:
//! 组内顺序处理, 组间可以拿到互不重叠的可变子视图并行处理.

use std::ops::Range;

use super::Window;

/// z 区间相同的一组 item.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Slab {
    z: Range<usize>,
    items: Vec<usize>,
}

/// 按窗口 z 区间对 item 的划分.
#[derive(Clone, Debug, Default)]
pub struct SlabPartition {
    /// 按 z 升序, 两两不相交.
    slabs: Vec<Slab>,
}

impl SlabPartition {
    /// 按窗口的 z 区间对 item 分组. `windows` 的迭代顺序即 item 下标.
    ///
    /// z 区间完全相同的 item 归入同一组; 不同组的 z 区间必须两两不相交,
    /// 否则返回 `None`. 空窗口不属于任何组.
    pub fn new<I: IntoIterator<Item = Window>>(windows: I) -> Option<Self> {
        let mut keyed: Vec<(usize, usize, usize)> = windows
            .into_iter()
            .enumerate()
            .filter(|(_, w)| !w.is_empty())
            .map(|(i, w)| (w.start().0, w.end().0, i))
            .collect();
        keyed.sort_unstable();

        let mut slabs: Vec<Slab> = Vec::with_capacity(keyed.len());
        for (z0, z1, i) in keyed {
            match slabs.last_mut() {
                Some(last) if last.z == (z0..z1) => last.items.push(i),
                // 已按起点排序, 只需与上一组比较.
                Some(last) if last.z.end > z0 => return None,
                _ => slabs.push(Slab {
                    z: z0..z1,
                    items: vec![i],
                }),
            }
        }
        Some(Self { slabs })
    }

    /// 组数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slabs.len()
    }

    /// 是否没有任何组.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    /// 按 z 升序迭代每组的 (z 区间, item 下标).
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Range<usize>, &[usize])> {
        self.slabs.iter().map(|s| (s.z.clone(), s.items.as_slice()))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::{ArrayViewMut3, Axis};
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl SlabPartition {
    /// 借助 `rayon`, 并行地对每组执行 `op(slab, z0, items)`.
    ///
    /// `slab` 是 `dst` 在 `[z0, z1)` 上的可变子视图, 各组之间互不重叠.
    /// 调用前须保证所有窗口都位于 `dst` 内.
    pub(crate) fn par_for_each<T, F>(&self, dst: ArrayViewMut3<'_, T>, op: F)
    where
        T: Send,
        F: Fn(ArrayViewMut3<'_, T>, usize, &[usize]) + Sync + Send,
    {
        let mut tasks = Vec::with_capacity(self.slabs.len());
        let (mut rest, mut offset) = (dst, 0usize);
        for slab in self.slabs.iter() {
            let (_, tail) = rest.split_at(Axis(0), slab.z.start - offset);
            let (head, tail) = tail.split_at(Axis(0), slab.z.len());
            tasks.push((head, slab));
            (rest, offset) = (tail, slab.z.end);
        }

        tasks
            .into_par_iter()
            .for_each(|(view, slab)| op(view, slab.z.start, &slab.items));
    }
}
