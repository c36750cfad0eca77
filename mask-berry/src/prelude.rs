//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Idx3dI64, Vec3dF};

pub use crate::consts::marker::{is_marked, NODULE_F32, NODULE_U8};
pub use crate::error::{MaskError, MaskResult};

pub use crate::geom::{insert_cropped, CropPlan, SlabPartition, Window};
pub use crate::nodule::{fill_boxes, fill_ellipsoids, BoxNodule, EllipsoidNodule};
pub use crate::regression::{
    build_batch_masks, build_batch_masks_from_arrays, selected, Prediction, RegressionConfig,
};

#[cfg(feature = "rayon")]
pub use crate::nodule::{par_fill_boxes, par_fill_ellipsoids};

#[cfg(feature = "rayon")]
pub use crate::regression::par_build_batch_masks;
