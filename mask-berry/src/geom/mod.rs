//! 体数据上的几何工具: 窗口与越界安全的裁剪插入.

use ndarray::{s, ArrayBase, ArrayView2, ArrayViewMut3, DataMut, Ix3};

use crate::consts::NDIM;
use crate::{Idx3d, Idx3dI64, MaskError, MaskResult};

mod clip;

pub use clip::{insert_cropped, CropPlan};
pub use slab::SlabPartition;

mod slab;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 大体数据中某个 item (病人 / crop) 所占据的子区域, 左闭右开.
///
/// 在 "摩天楼" 式拼接的 batch 中, 每个病人沿 z 轴堆叠,
/// 其窗口就是它在整个 batch 体数据中的 `[start, end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Window {
    start: Idx3d,
    end: Idx3d,
}

impl Window {
    /// 构建窗口. 任一轴上 `start > end` 时返回 `None`.
    pub fn new(start: Idx3d, end: Idx3d) -> Option<Self> {
        let ok = start.0 <= end.0 && start.1 <= end.1 && start.2 <= end.2;
        ok.then_some(Self { start, end })
    }

    /// 覆盖整个 `shape` 的窗口.
    #[inline]
    pub fn full(shape: Idx3d) -> Self {
        Self {
            start: (0, 0, 0),
            end: shape,
        }
    }

    /// 窗口起点.
    #[inline]
    pub fn start(&self) -> Idx3d {
        self.start
    }

    /// 窗口终点 (不含).
    #[inline]
    pub fn end(&self) -> Idx3d {
        self.end
    }

    /// 窗口形状, 即 `end - start`.
    #[inline]
    pub fn size(&self) -> Idx3d {
        (
            self.end.0 - self.start.0,
            self.end.1 - self.start.1,
            self.end.2 - self.start.2,
        )
    }

    /// 窗口是否不含任何体素.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let (z, y, x) = self.size();
        z == 0 || y == 0 || x == 0
    }

    /// 窗口是否完全位于形状为 `shape` 的体数据内.
    #[inline]
    pub fn fits(&self, shape: Idx3d) -> bool {
        self.end.0 <= shape.0 && self.end.1 <= shape.1 && self.end.2 <= shape.2
    }

    /// 将窗口沿 z 轴平移到以 `z0` 为原点的坐标系. 要求 `z0 <= self.start().0`.
    #[inline]
    pub(crate) fn rebase_z(&self, z0: usize) -> Self {
        Self {
            start: (self.start.0 - z0, self.start.1, self.start.2),
            end: (self.end.0 - z0, self.end.1, self.end.2),
        }
    }

    /// 获取 `volume` 上该窗口的可变子视图. 写入子视图即写入 `volume`.
    ///
    /// 窗口越界时 panic, 因此调用前应确保 `self.fits(volume.dim())`.
    #[inline]
    pub fn view_mut<'a, S, T>(&self, volume: &'a mut ArrayBase<S, Ix3>) -> ArrayViewMut3<'a, T>
    where
        S: DataMut<Elem = T>,
    {
        let (s, e) = (self.start, self.end);
        volume.slice_mut(s![s.0..e.0, s.1..e.1, s.2..e.2])
    }
}

/// 检查 `windows` 是否都位于形状为 `shape` 的体数据内.
pub(crate) fn check_windows<I>(windows: I, shape: Idx3d) -> MaskResult<()>
where
    I: IntoIterator<Item = Window>,
{
    match windows.into_iter().position(|w| !w.fits(shape)) {
        Some(i) => Err(MaskError::WindowOutOfBounds(i)),
        None => Ok(()),
    }
}

/// 检查一组并行数组: 每个都必须是 `n × 3`, 且 `n` 相同. 返回 `n`.
pub(crate) fn check_rows<T>(arrays: &[&ArrayView2<'_, T>]) -> MaskResult<usize> {
    let Some(first) = arrays.first() else {
        return Ok(0);
    };
    let expected = first.nrows();
    for a in arrays {
        if a.ncols() != NDIM {
            return Err(MaskError::BadColumns(a.ncols()));
        }
        if a.nrows() != expected {
            return Err(MaskError::LengthMismatch {
                expected,
                found: a.nrows(),
            });
        }
    }
    Ok(expected)
}

/// 读取第 `i` 行作为 `(z, y, x)` 三元组. 不检查越界.
#[inline]
pub(crate) fn row3<T: Copy>(a: &ArrayView2<'_, T>, i: usize) -> (T, T, T) {
    (a[[i, 0]], a[[i, 1]], a[[i, 2]])
}

/// 由 `i64` 窗口行构建 [`Window`]. 出现负坐标时视为越界.
pub(crate) fn window_from_rows(
    start: &ArrayView2<'_, i64>,
    end: &ArrayView2<'_, i64>,
    i: usize,
) -> MaskResult<Window> {
    let to_usize = |(z, y, x): Idx3dI64| -> Option<Idx3d> {
        Some((
            usize::try_from(z).ok()?,
            usize::try_from(y).ok()?,
            usize::try_from(x).ok()?,
        ))
    };
    let s = to_usize(row3(start, i)).ok_or(MaskError::WindowOutOfBounds(i))?;
    let e = to_usize(row3(end, i)).ok_or(MaskError::WindowOutOfBounds(i))?;
    Window::new(s, e).ok_or(MaskError::InvertedWindow(i))
}
