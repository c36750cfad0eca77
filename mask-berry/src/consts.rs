//! 通用常量.

/// 掩膜中前景体素的标记值.
pub mod marker {
    /// `u8` 标签中的背景.
    pub const BACKGROUND_U8: u8 = 0;

    /// `u8` 标签中的结节.
    pub const NODULE_U8: u8 = 1;

    /// 浮点掩膜中的背景.
    pub const BACKGROUND_F32: f32 = 0.0;

    /// 浮点掩膜中的结节.
    pub const NODULE_F32: f32 = 1.0;

    /// 体素是否被标记?
    #[inline]
    pub fn is_marked<T: num::Zero>(v: &T) -> bool {
        !v.is_zero()
    }
}

/// 坐标轴个数. 所有坐标均为 `(z, y, x)`.
pub const NDIM: usize = 3;
