//! 运行时错误.

use std::fmt::{self, Display, Formatter};

/// 掩膜生成的契约违规错误.
///
/// 除非特别说明, 携带的 `usize` 均为出错的 item 下标.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskError {
    /// 并行输入数组的 item 个数不一致.
    LengthMismatch {
        /// 第一个数组的 item 个数.
        expected: usize,
        /// 不一致数组的 item 个数.
        found: usize,
    },

    /// 逐 item 坐标数组的列数不是 3. 参数为实际列数.
    BadColumns(usize),

    /// 长方体尺寸或椭球半径存在非正分量.
    NonPositiveSize(usize),

    /// 回归预测尺寸存在负分量.
    NegativeRegressionSize(usize),

    /// 回归预测的中心或尺寸不是有限数.
    NonFinitePrediction(usize),

    /// 窗口在某个轴上 `start > end`.
    InvertedWindow(usize),

    /// 窗口超出目标体数据的范围.
    WindowOutOfBounds(usize),

    /// 概率门限不是有限数.
    InvalidThreshold,

    /// crop 形状存在长度为 0 的轴.
    InvalidCropShape,
}

impl Display for MaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, found } => {
                write!(f, "parallel inputs disagree: {expected} items vs {found}")
            }
            Self::BadColumns(c) => write!(f, "expected 3 coordinate columns, got {c}"),
            Self::NonPositiveSize(i) => write!(f, "item {i}: non-positive size or radius"),
            Self::NegativeRegressionSize(i) => write!(f, "item {i}: negative predicted size"),
            Self::NonFinitePrediction(i) => write!(f, "item {i}: non-finite center or size"),
            Self::InvertedWindow(i) => write!(f, "item {i}: window start exceeds end"),
            Self::WindowOutOfBounds(i) => write!(f, "item {i}: window exceeds destination"),
            Self::InvalidThreshold => f.write_str("probability threshold is not finite"),
            Self::InvalidCropShape => f.write_str("crop shape has a zero-length axis"),
        }
    }
}

impl std::error::Error for MaskError {}

/// 掩膜生成运行时结果.
pub type MaskResult<T> = Result<T, MaskError>;
