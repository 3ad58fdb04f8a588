//! 2D 灰度切片的 ROI 提取.
//!
//! 流程依次为: 灰度检查 -> 中值滤波降噪 -> (可选) 线性归一化到 `[0, 255]`
//! -> 裁剪非零像素的包围盒. 归一化总是作用在降噪后的图像上,
//! 以免单个离群像素污染全局的最小/最大值.

mod denoise;
mod normalize;
mod roi;
mod save;

pub use denoise::median_filter;
pub use normalize::linear_normalization;
pub use roi::{as_grayscale, SliceRoi};
pub use save::ImgWriteVis;
