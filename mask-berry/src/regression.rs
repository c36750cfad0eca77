//! 由回归模型的预测结果生成批量长方体掩膜.
//!
//! 模型对每个 crop 输出归一化到 `[0, 1]` 的中心与尺寸, 以及一个置信度.
//! 置信度严格大于门限的 item 会在自己的 crop 掩膜中填充对应长方体,
//! 其余 item 的掩膜保持全 0.
//!
//! 换算到体素坐标时采用 "四舍六入五成双" (round half to even).

use log::debug;
use ndarray::{s, Array4, ArrayView1, ArrayView2, ArrayViewMut3, Axis};
use num::{One, Zero};

use crate::geom::{check_rows, row3};
use crate::{Idx3d, MaskError, MaskResult, Vec3dF};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 回归掩膜的配置: 每个 crop 的形状与概率门限.
///
/// 该配置是只读的. 若要修改参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegressionConfig {
    crop_shape: Idx3d,
    threshold: f64,
}

impl RegressionConfig {
    /// 构建配置.
    ///
    /// - 当 `crop_shape` 存在长度为 0 的轴时, 返回 `Err(MaskError::InvalidCropShape)`;
    /// - 当 `threshold` 不是有限数时, 返回 `Err(MaskError::InvalidThreshold)`.
    pub fn new(crop_shape: Idx3d, threshold: f64) -> MaskResult<Self> {
        let (z, y, x) = crop_shape;
        if z == 0 || y == 0 || x == 0 {
            return Err(MaskError::InvalidCropShape);
        }
        if !threshold.is_finite() {
            return Err(MaskError::InvalidThreshold);
        }
        Ok(Self {
            crop_shape,
            threshold,
        })
    }

    /// 每个 crop 的形状.
    #[inline]
    pub fn crop_shape(&self) -> Idx3d {
        self.crop_shape
    }

    /// 概率门限.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 置信度 `prob` 是否通过门限 (严格大于).
    #[inline]
    pub fn accepts(&self, prob: f64) -> bool {
        prob > self.threshold
    }
}

/// 单个 crop 的回归预测.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prediction {
    center: Vec3dF,
    size: Vec3dF,
    prob: f64,
}

impl Prediction {
    /// 构建预测. `center` 与 `size` 均相对 crop 形状归一化.
    ///
    /// 中心或尺寸不是有限数, 或尺寸存在负分量时返回 `None`.
    /// `prob` 不做限制; `NaN` 永远不会通过门限.
    pub fn new(center: Vec3dF, size: Vec3dF, prob: f64) -> Option<Self> {
        let finite = |(a, b, c): Vec3dF| a.is_finite() && b.is_finite() && c.is_finite();
        let non_neg = size.0 >= 0.0 && size.1 >= 0.0 && size.2 >= 0.0;
        (finite(center) && finite(size) && non_neg).then_some(Self { center, size, prob })
    }

    /// 从流水线的并行数组批量构建.
    ///
    /// `centers` 与 `sizes` 为 `n × 3`, `probs` 长度为 `n`.
    pub fn from_arrays(
        centers: ArrayView2<'_, f64>,
        sizes: ArrayView2<'_, f64>,
        probs: ArrayView1<'_, f64>,
    ) -> MaskResult<Vec<Self>> {
        let n = check_rows(&[&centers.view(), &sizes.view()])?;
        if probs.len() != n {
            return Err(MaskError::LengthMismatch {
                expected: n,
                found: probs.len(),
            });
        }
        (0..n)
            .map(|i| {
                let (center, size) = (row3(&centers, i), row3(&sizes, i));
                Self::new(center, size, probs[i]).ok_or_else(|| {
                    if [center.0, center.1, center.2, size.0, size.1, size.2]
                        .iter()
                        .all(|v| v.is_finite())
                    {
                        MaskError::NegativeRegressionSize(i)
                    } else {
                        MaskError::NonFinitePrediction(i)
                    }
                })
            })
            .collect()
    }

    /// 归一化中心.
    #[inline]
    pub fn center(&self) -> Vec3dF {
        self.center
    }

    /// 归一化尺寸.
    #[inline]
    pub fn size(&self) -> Vec3dF {
        self.size
    }

    /// 置信度.
    #[inline]
    pub fn prob(&self) -> f64 {
        self.prob
    }

    /// 换算为 `crop_shape` 上的体素区间 `[start, end)`.
    ///
    /// 每轴先将 `center ∓ size / 2` 裁剪到 `[0, 1]`, 再乘以该轴长度并舍入到最近整数
    /// (恰为 .5 时取偶数). 结果保证 `start <= end <= crop_shape`.
    pub fn voxel_bounds(&self, crop_shape: Idx3d) -> (Idx3d, Idx3d) {
        let axis = |c: f64, s: f64, len: usize| {
            let to_voxel = |v: f64| (v.clamp(0.0, 1.0) * len as f64).round_ties_even() as usize;
            (to_voxel(c - s / 2.0), to_voxel(c + s / 2.0))
        };
        let (z0, z1) = axis(self.center.0, self.size.0, crop_shape.0);
        let (y0, y1) = axis(self.center.1, self.size.1, crop_shape.1);
        let (x0, x1) = axis(self.center.2, self.size.2, crop_shape.2);
        ((z0, y0, x0), (z1, y1, x1))
    }
}

/// 每个预测是否通过 `config` 的门限.
pub fn selected(predictions: &[Prediction], config: &RegressionConfig) -> Vec<bool> {
    predictions.iter().map(|p| config.accepts(p.prob)).collect()
}

/// 在单个 crop 掩膜中填充预测对应的长方体.
fn fill_prediction<T: Clone + One>(
    mut mask: ArrayViewMut3<'_, T>,
    p: &Prediction,
    crop_shape: Idx3d,
) {
    let ((z0, y0, x0), (z1, y1, x1)) = p.voxel_bounds(crop_shape);
    mask.slice_mut(s![z0..z1, y0..y1, x0..x1]).fill(T::one());
}

/// 生成批量回归掩膜.
///
/// 返回形状为 `(n, crop_z, crop_y, crop_x)` 的新数组. 第 `i` 个 crop 仅在
/// `predictions[i]` 通过门限时被填充, 否则保持全 0.
pub fn build_batch_masks<T>(predictions: &[Prediction], config: &RegressionConfig) -> Array4<T>
where
    T: Clone + Zero + One,
{
    let (z, y, x) = config.crop_shape;
    let mut masks = Array4::<T>::zeros((predictions.len(), z, y, x));

    let mut n_selected = 0usize;
    for (mask, p) in masks.axis_iter_mut(Axis(0)).zip(predictions) {
        if config.accepts(p.prob) {
            n_selected += 1;
            fill_prediction(mask, p, config.crop_shape);
        }
    }
    debug!(
        "regression masks: {n_selected} of {} predictions above threshold {}",
        predictions.len(),
        config.threshold
    );
    masks
}

/// 直接从流水线的并行数组生成批量回归掩膜.
///
/// 等价于依次调用 [`RegressionConfig::new`], [`Prediction::from_arrays`]
/// 和 [`build_batch_masks`].
pub fn build_batch_masks_from_arrays<T>(
    centers: ArrayView2<'_, f64>,
    sizes: ArrayView2<'_, f64>,
    probs: ArrayView1<'_, f64>,
    crop_shape: Idx3d,
    threshold: f64,
) -> MaskResult<Array4<T>>
where
    T: Clone + Zero + One,
{
    let config = RegressionConfig::new(crop_shape, threshold)?;
    let predictions = Prediction::from_arrays(centers, sizes, probs)?;
    Ok(build_batch_masks(&predictions, &config))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 借助 `rayon`, 并行地生成批量回归掩膜. 每个 crop 的掩膜互不重叠,
/// 结果与 [`build_batch_masks`] 完全一致.
#[cfg(feature = "rayon")]
pub fn par_build_batch_masks<T>(predictions: &[Prediction], config: &RegressionConfig) -> Array4<T>
where
    T: Clone + Zero + One + Send + Sync,
{
    let (z, y, x) = config.crop_shape;
    let mut masks = Array4::<T>::zeros((predictions.len(), z, y, x));

    let n_selected = AtomicUsize::new(0);
    masks
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mask)| {
            let p = &predictions[i];
            if config.accepts(p.prob) {
                n_selected.fetch_add(1, Ordering::Relaxed);
                fill_prediction(mask, p, config.crop_shape);
            }
        });
    debug!(
        "regression masks: {} of {} predictions above threshold {}",
        n_selected.load(Ordering::Relaxed),
        predictions.len(),
        config.threshold
    );
    masks
}
