//! 图像的持久化存储.

use std::path::Path;

use image::{GrayImage, ImageResult, Luma};
use ndarray::ArrayView2;

use super::{linear_normalization, SliceRoi};

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 已归一化到 `[0, 255]` 的图像按原样保存; 仅降噪的原始强度图像在保存时会线性归一化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径. 图片格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// `(高, 宽)` 数组 -> 单通道灰度图.
fn to_gray_image(pixels: ArrayView2<u8>) -> GrayImage {
    let (height, width) = pixels.dim();
    let mut buf = GrayImage::new(width as u32, height as u32);
    for ((h, w), &pix) in pixels.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, Luma([pix]));
    }
    buf
}

impl ImgWriteVis for SliceRoi<u8> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        to_gray_image(self.roi().view()).save(path)
    }
}

/// 保存前先线性归一化.
impl ImgWriteVis for SliceRoi<f32> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        to_gray_image(linear_normalization(self.roi()).view()).save(path)
    }
}
