//! 结节描述符, 以及在大体数据窗口中填充结节掩膜的操作.
//!
//! 上层流水线以并行数组的形式提供结节信息 (每行一个 item, 每列一个轴).
//! `*::from_arrays` 负责一次性校验这些数组, 之后的填充循环不再做契约检查.

use ndarray::ArrayView2;

use crate::geom::{check_rows, row3, window_from_rows};
use crate::{Idx3d, Idx3dI64, MaskError, MaskResult, Window};

mod ellipse;
mod rect;

pub use ellipse::fill_ellipsoids;
pub use rect::fill_boxes;

#[cfg(feature = "rayon")]
pub use ellipse::par_fill_ellipsoids;

#[cfg(feature = "rayon")]
pub use rect::par_fill_boxes;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 将非负 `i64` 三元组转换为 `Idx3d`. 存在非正分量时返回 `None`.
fn positive3((z, y, x): Idx3dI64) -> Option<Idx3d> {
    let cast = |v: i64| usize::try_from(v).ok().filter(|&v| v > 0);
    Some((cast(z)?, cast(y)?, cast(x)?))
}

/// 长方体结节.
///
/// 结节占据窗口内 (窗口相对坐标) `[start, start + size)` 的区域,
/// 超出窗口的部分被裁剪.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxNodule {
    window: Window,
    start: Idx3dI64,
    size: Idx3d,
}

impl BoxNodule {
    /// 构建长方体结节. `start` 相对于窗口起点, 可以为负.
    /// `size` 存在 0 分量时返回 `None`.
    pub fn new(window: Window, start: Idx3dI64, size: Idx3d) -> Option<Self> {
        (size.0 > 0 && size.1 > 0 && size.2 > 0).then_some(Self {
            window,
            start,
            size,
        })
    }

    /// 由结节中心构建. 起点为 `center - size / 2` (整数除法).
    ///
    /// 起点无法用 `i64` 表示时返回 `None`.
    pub fn from_center_size(window: Window, center: Idx3dI64, size: Idx3d) -> Option<Self> {
        let half = |c: i64, s: usize| c.checked_sub(i64::try_from(s / 2).ok()?);
        let start = (
            half(center.0, size.0)?,
            half(center.1, size.1)?,
            half(center.2, size.2)?,
        );
        Self::new(window, start, size)
    }

    /// 从流水线的并行数组批量构建.
    ///
    /// 四个数组均为 `n × 3`, 依次是窗口起点、窗口终点、结节起点 (窗口相对)、结节尺寸.
    pub fn from_arrays(
        start: ArrayView2<'_, i64>,
        end: ArrayView2<'_, i64>,
        nodule_start: ArrayView2<'_, i64>,
        nodule_size: ArrayView2<'_, i64>,
    ) -> MaskResult<Vec<Self>> {
        let n = check_rows(&[
            &start.view(),
            &end.view(),
            &nodule_start.view(),
            &nodule_size.view(),
        ])?;
        (0..n)
            .map(|i| {
                let window = window_from_rows(&start, &end, i)?;
                let size = positive3(row3(&nodule_size, i)).ok_or(MaskError::NonPositiveSize(i))?;
                Ok(Self {
                    window,
                    start: row3(&nodule_start, i),
                    size,
                })
            })
            .collect()
    }

    /// 所在窗口.
    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    /// 结节起点 (窗口相对坐标).
    #[inline]
    pub fn start(&self) -> Idx3dI64 {
        self.start
    }

    /// 结节尺寸.
    #[inline]
    pub fn size(&self) -> Idx3d {
        self.size
    }
}

/// 椭球结节.
///
/// 窗口相对坐标 `p` 满足 `Σ ((p - center) / radius)² < 1` 时属于结节.
/// 注意是严格小于: 恰好落在椭球面上的体素不计入.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EllipsoidNodule {
    window: Window,
    center: Idx3dI64,
    radius: Idx3d,
}

impl EllipsoidNodule {
    /// 构建椭球结节. `center` 相对于窗口起点, 可以为负.
    /// `radius` 存在 0 分量时返回 `None`.
    pub fn new(window: Window, center: Idx3dI64, radius: Idx3d) -> Option<Self> {
        (radius.0 > 0 && radius.1 > 0 && radius.2 > 0).then_some(Self {
            window,
            center,
            radius,
        })
    }

    /// 从流水线的并行数组批量构建.
    ///
    /// 四个数组均为 `n × 3`, 依次是窗口起点、窗口终点、结节中心 (窗口相对)、半轴长.
    pub fn from_arrays(
        start: ArrayView2<'_, i64>,
        end: ArrayView2<'_, i64>,
        centers: ArrayView2<'_, i64>,
        radii: ArrayView2<'_, i64>,
    ) -> MaskResult<Vec<Self>> {
        let n = check_rows(&[&start.view(), &end.view(), &centers.view(), &radii.view()])?;
        (0..n)
            .map(|i| {
                let window = window_from_rows(&start, &end, i)?;
                let radius = positive3(row3(&radii, i)).ok_or(MaskError::NonPositiveSize(i))?;
                Ok(Self {
                    window,
                    center: row3(&centers, i),
                    radius,
                })
            })
            .collect()
    }

    /// 所在窗口.
    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    /// 中心 (窗口相对坐标).
    #[inline]
    pub fn center(&self) -> Idx3dI64 {
        self.center
    }

    /// 三个半轴长.
    #[inline]
    pub fn radius(&self) -> Idx3d {
        self.radius
    }
}
