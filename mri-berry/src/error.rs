//! 运行时错误.

use thiserror::Error;

/// ROI 提取 / 测量运行时错误.
///
/// 其中 [`RoiError::EmptyRegion`] 不是异常情况, 而是需要调用者显式分支处理的正常结果.
#[derive(Debug, Error)]
pub enum RoiError {
    /// 输入不是合法的灰度数组 (维数或通道数不对).
    #[error("输入形状 {shape:?} 不是合法的单通道灰度数组")]
    InvalidInputShape {
        /// 实际输入形状.
        shape: Vec<usize>,
    },

    /// 掩码或阈值没有选中任何体素.
    #[error("区域为空: 没有任何体素被选中")]
    EmptyRegion,

    /// 包围盒、体素分辨率或成对数据的形状与目标数组不匹配.
    #[error("形状不匹配: 期望 {expected:?}, 实际 {found:?}")]
    ShapeMismatch {
        /// 期望的形状 (或维数).
        expected: Vec<usize>,
        /// 实际的形状 (或维数).
        found: Vec<usize>,
    },

    /// 体素分辨率必须为正的有限数.
    #[error("非法的体素分辨率 {0}")]
    InvalidSpacing(f64),

    /// 中值滤波核大小必须为正奇数.
    #[error("非法的中值滤波核大小 {0}, 必须为正奇数")]
    InvalidKernel(usize),

    /// 读取 nifti 文件错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 读写图像错误.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// 写入 npy 文件错误.
    #[error(transparent)]
    Npy(#[from] ndarray_npy::WriteNpyError),

    /// 数组维数转换错误.
    #[error(transparent)]
    Array(#[from] ndarray::ShapeError),
}

impl RoiError {
    /// 是否为 "区域为空".
    #[inline]
    pub fn is_empty_region(&self) -> bool {
        matches!(self, Self::EmptyRegion)
    }

    /// 由数组形状构造 [`RoiError::InvalidInputShape`].
    #[inline]
    pub(crate) fn invalid_shape(shape: &[usize]) -> Self {
        Self::InvalidInputShape {
            shape: shape.to_vec(),
        }
    }
}

/// ROI 提取 / 测量运行时结果.
pub type RoiResult<T> = Result<T, RoiError>;
