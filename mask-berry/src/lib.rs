#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 根据结节 (nodule) 的几何描述, 在 3D CT 体素数据上生成二值分割掩膜.
//!
//! 该 crate 仅提供 `safe` 接口, 不负责数据加载、标注解析和模型推理;
//! 这些由上层流水线负责, 本 crate 只接收已经整理好的数组.
//!
//! # 注意
//!
//! 1. 所有体素数据均按 `(z, y, x)` 顺序组织.
//! 2. 几何体部分或完全越出窗口/体数据时不是错误, 越界部分会被静默裁剪.
//! 3. 形状不一致、尺寸非正等契约违规会在调用入口处以 [`MaskError`] 返回,
//!    而不会进入逐体素循环.
//! 4. 所有填充操作只会把体素置为 "1", 从不清除已有体素 (并集语义).
//!
//! # 开发计划
//!
//! ### 越界安全的裁剪插入 ✅
//!
//! 将小块 3D 数组插入更大的 3D 数组, 原点可以为负或超出边界.
//!
//! 实现位于 `mask-berry/src/geom/clip.rs`.
//!
//! ### 长方体结节掩膜 ✅
//!
//! 在 "摩天楼" 式拼接的多病人体数据中, 按窗口填充长方体结节.
//!
//! 实现位于 `mask-berry/src/nodule/rect.rs`.
//!
//! ### 椭球结节掩膜 ✅
//!
//! 只扫描裁剪后的包围盒, 按二次型判定体素是否位于椭球内部 (严格小于 1).
//!
//! 实现位于 `mask-berry/src/nodule/ellipse.rs`.
//!
//! ### 回归预测批量掩膜 ✅
//!
//! 由归一化的中心/尺寸/置信度生成每个 crop 的长方体掩膜.
//!
//! 实现位于 `mask-berry/src/regression.rs`.
//!
//! ### `rayon` 并行版本 ✅
//!
//! 摩天楼按病人 z 区间切分后并行填充, 区间重叠时退化为顺序执行; 回归批量按 item 并行.
//!
//! 实现位于 `mask-berry/src/geom/slab.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 并行数组 (流水线的原始输入) 到描述符的转换与校验. ✅
//! 2. `serde` 序列化支持. ✅

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 三维有符号索引. 可以为负, 也可以超出体数据范围.
pub type Idx3dI64 = (i64, i64, i64);

/// 浮点三维向量, 通常是相对 crop 形状归一化后的坐标.
pub type Vec3dF = (f64, f64, f64);

pub mod consts;

mod error;

pub use error::{MaskError, MaskResult};

pub mod geom;

pub mod nodule;

pub mod regression;

pub mod prelude;

pub use geom::{insert_cropped, CropPlan, Window};
pub use nodule::{fill_boxes, fill_ellipsoids, BoxNodule, EllipsoidNodule};
pub use regression::{
    build_batch_masks, build_batch_masks_from_arrays, Prediction, RegressionConfig,
};

#[cfg(feature = "rayon")]
pub use nodule::{par_fill_boxes, par_fill_ellipsoids};

#[cfg(feature = "rayon")]
pub use regression::par_build_batch_masks;
