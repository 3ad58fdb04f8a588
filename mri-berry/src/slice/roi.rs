use log::debug;
use ndarray::{Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Ix2};
use num::ToPrimitive;

use super::{linear_normalization, median_filter};
use crate::crop::{compute_bounding_box, crop, BoundingBox};
use crate::mask::threshold_mask;
use crate::{RoiError, RoiResult};

/// 检查 `image` 是否为单通道灰度图, 并将其视为二维数组.
///
/// 只接受 `(H, W)` 或 `(H, W, 1)` 两种形状, 其余 (如 `(H, W, 3)` 的彩色图,
/// 或任意其它维数) 均返回 `Err(RoiError::InvalidInputShape)`, 不做任何隐式转换.
pub fn as_grayscale<A, S, D>(image: &ArrayBase<S, D>) -> RoiResult<ArrayView2<'_, A>>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    let view = image.view().into_dyn();
    let shape = view.shape().to_vec();
    match shape.as_slice() {
        [_, _] => Ok(view.into_dimensionality::<Ix2>()?),
        [_, _, 1] => Ok(view
            .index_axis_move(Axis(2), 0)
            .into_dimensionality::<Ix2>()?),
        shape => Err(RoiError::invalid_shape(shape)),
    }
}

/// 将任意数值类型的灰度图转换为 `f32`. 无法表示的值 (包括 NaN) 记为 0.
fn to_f32_image<A: ToPrimitive>(image: ArrayView2<A>) -> Array2<f32> {
    image.map(|v| v.to_f32().filter(|f| !f.is_nan()).unwrap_or(0.0))
}

/// 2D 灰度切片的 ROI.
///
/// 其中 `A` 为 `u8` 时表示经过了归一化, 为 `f32` 时表示仅做了降噪.
#[derive(Clone, Debug)]
pub struct SliceRoi<A> {
    roi: Array2<A>,
    bbox: BoundingBox,
}

impl<A> SliceRoi<A> {
    /// 裁剪后的 ROI 图像.
    #[inline]
    pub fn roi(&self) -> &Array2<A> {
        &self.roi
    }

    /// 取出 ROI 图像.
    #[inline]
    pub fn into_roi(self) -> Array2<A> {
        self.roi
    }

    /// ROI 在原图中的包围盒, 以 `(高, 宽)` 顺序排列.
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// ROI 形状 `(高, 宽)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.roi.dim()
    }
}

impl<A: Copy + PartialOrd + Default> SliceRoi<A> {
    /// 在已处理好的图像 `image` 上裁剪非零 (严格大于 0) 像素的包围盒.
    fn crop_nonzero(image: Array2<A>) -> RoiResult<Self> {
        let bbox = compute_bounding_box(&threshold_mask(&image, A::default()))?;
        let roi = crop(&image, &bbox)?.to_owned();
        debug!("Slice ROI {bbox} out of {:?}", image.dim());
        Ok(Self { roi, bbox })
    }
}

impl SliceRoi<u8> {
    /// 降噪、归一化并裁剪.
    ///
    /// 1. 检查 `image` 是否为单通道灰度图, 否则返回 `Err(RoiError::InvalidInputShape)`;
    /// 2. 以 `kernel` 为核大小做中值滤波, 核大小非法时返回 `Err(RoiError::InvalidKernel)`;
    /// 3. 将 **降噪后的** 图像线性归一化到 `[0, 255]`;
    /// 4. 裁剪非零像素的包围盒. 若没有非零像素则返回 `Err(RoiError::EmptyRegion)`.
    pub fn normalized<A, S, D>(image: &ArrayBase<S, D>, kernel: usize) -> RoiResult<Self>
    where
        A: ToPrimitive,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let gray = to_f32_image(as_grayscale(image)?);
        let filtered = median_filter(gray.view(), kernel)?;
        Self::crop_nonzero(linear_normalization(&filtered))
    }
}

impl SliceRoi<f32> {
    /// 同 [`SliceRoi::normalized`], 但跳过归一化, 保留降噪后的原始强度.
    pub fn denoised<A, S, D>(image: &ArrayBase<S, D>, kernel: usize) -> RoiResult<Self>
    where
        A: ToPrimitive,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let gray = to_f32_image(as_grayscale(image)?);
        Self::crop_nonzero(median_filter(gray.view(), kernel)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DEFAULT_MEDIAN_KERNEL;
    use ndarray::{s, Array1, Array3};

    #[test]
    fn test_grayscale_shapes() {
        assert!(as_grayscale(&Array2::<u8>::zeros((4, 5))).is_ok());

        let single = Array3::<u8>::zeros((4, 5, 1));
        assert_eq!(as_grayscale(&single).unwrap().dim(), (4, 5));

        for bad in [
            Array3::<u8>::zeros((4, 5, 3)).into_dyn(),
            Array3::<u8>::zeros((4, 5, 4)).into_dyn(),
            Array1::<u8>::zeros(7).into_dyn(),
        ] {
            assert!(matches!(
                as_grayscale(&bad),
                Err(RoiError::InvalidInputShape { .. })
            ));
        }
        assert!(SliceRoi::normalized(&Array3::<f32>::ones((3, 3, 3)), 3).is_err());
    }

    fn brain_like() -> Array2<f32> {
        let mut img = Array2::<f32>::zeros((20, 30));
        img.slice_mut(s![4..15, 6..25]).fill(100.0);
        img.slice_mut(s![7..10, 10..14]).fill(200.0);
        img
    }

    #[test]
    fn test_slice_roi_normalized() {
        let r = SliceRoi::normalized(&brain_like(), DEFAULT_MEDIAN_KERNEL).unwrap();
        assert_eq!(r.bounding_box().bounds(), &[(4, 14), (6, 24)]);
        assert_eq!(r.shape(), (11, 19));
        assert_eq!(r.roi().iter().copied().max(), Some(255));
    }

    /// 单个热点像素会被中值滤波去除, 不影响包围盒.
    #[test]
    fn test_slice_roi_hot_pixel_removed_before_normalization() {
        let mut img = brain_like();
        img[(0, 0)] = 1e6;
        let r = SliceRoi::normalized(&img, 3).unwrap();
        assert_eq!(r.bounding_box().bounds(), &[(4, 14), (6, 24)]);
        // 若热点参与了归一化, 组织区域会被压缩到 0 附近.
        assert_eq!(r.roi()[(1, 1)], 127);
    }

    #[test]
    fn test_slice_roi_denoised_keeps_intensity() {
        let r = SliceRoi::denoised(&brain_like().mapv(|v| v as u16), 3).unwrap();
        assert_eq!(r.shape(), (11, 19));
        assert_eq!(r.roi()[(1, 1)], 100.0);
    }

    #[test]
    fn test_slice_roi_empty_and_constant() {
        let blank = Array2::<f32>::zeros((8, 8));
        assert!(SliceRoi::normalized(&blank, 3)
            .unwrap_err()
            .is_empty_region());

        // 常数图像归一化后全零, 同样没有 ROI.
        let flat = Array2::<f32>::from_elem((8, 8), 7.0);
        assert!(SliceRoi::normalized(&flat, 3)
            .unwrap_err()
            .is_empty_region());
        assert!(SliceRoi::denoised(&flat, 3).is_ok());
    }
}
