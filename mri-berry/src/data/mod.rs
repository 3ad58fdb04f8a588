use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, warn};
use ndarray::{Array2, Array3, ArrayBase, ArrayView3, Data, Dimension, Ix3};
use ndarray_npy::WritableElement;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::DEFAULT_SPACING_MM;
use crate::measure::VoxelSpacing;
use crate::{Idx3d, RoiError, RoiResult};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// MRI nii 文件 header 的共用属性.
///
/// 体数据总是按照 nifti 的原生顺序 `(x, y, z)` 组织, 本 crate 不做任何轴变换.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取单个体素分辨率, 以毫米为单位, 按 `(x, y, z)` 排列. 值为 header 中的原始值.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, x, y, z, ..] = self.header().pixdim;
        [x as f64, y as f64, z as f64]
    }

    /// 获取可直接用于测量的体素分辨率.
    ///
    /// header 中非正或非有限的分辨率会回退为 1.0 毫米.
    fn spacing(&self) -> VoxelSpacing {
        let mm: Vec<f64> = self
            .pix_dim()
            .into_iter()
            .map(|v| {
                if v.is_finite() && v > 0.0 {
                    v
                } else {
                    warn!("Invalid pixdim {v}, falling back to {DEFAULT_SPACING_MM} mm");
                    DEFAULT_SPACING_MM
                }
            })
            .collect();
        VoxelSpacing::new(mm).unwrap_or_else(|_| VoxelSpacing::unit(3))
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.spacing().voxel_volume()
    }
}

/// 构造一个仅带有体素分辨率的 header.
fn header_with_spacing([x, y, z]: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    let [_, px, py, pz, ..] = &mut header.pixdim;
    (*px, *py, *pz) = (x, y, z);
    header
}

/// nii 格式 3D MRI 扫描 (如 FLAIR 序列), 包括 header 和强度值. 强度值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct MriVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for MriVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriVolume {
    /// 打开 nii 文件格式的 3D MRI 扫描. `path` 为 nii 文件的本地路径.
    ///
    /// 强度值中的 NaN 会被替换为 0.
    pub fn open<P: AsRef<Path>>(path: P) -> RoiResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());
        let mut data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .into_dimensionality::<Ix3>()?;
        data.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v });
        debug!("Loaded scan {:?} with shape {:?}", path.as_ref(), data.dim());
        Ok(Self { header, data })
    }

    /// 由内存中的 `(x, y, z)` 数组和体素分辨率直接创建.
    pub fn from_array(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        Self {
            header: header_with_spacing(pix_dim),
            data,
        }
    }

    /// 数据形状 `(x, y, z)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 取出数据.
    #[inline]
    pub fn into_data(self) -> Array3<f32> {
        self.data
    }
}

/// nii 格式 3D 分割标签 (BraTS 编码), 包括 header 和标签. 标签值以 `u8` 保存.
#[derive(Debug, Clone)]
pub struct MriLabel {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for MriLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriLabel {
    /// 打开 nii 文件格式的 3D 分割标签. `path` 为 nii 文件的本地路径.
    pub fn open<P: AsRef<Path>>(path: P) -> RoiResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());
        let data = obj
            .into_volume()
            .into_ndarray::<u8>()?
            .into_dimensionality::<Ix3>()?;
        debug!("Loaded label {:?} with shape {:?}", path.as_ref(), data.dim());
        Ok(Self { header, data })
    }

    /// 由内存中的 `(x, y, z)` 标签数组和体素分辨率直接创建.
    pub fn from_array(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        Self {
            header: header_with_spacing(pix_dim),
            data,
        }
    }

    /// 数据形状 `(x, y, z)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }
}

/// 同一病例的 FLAIR 扫描和分割标签. 二者形状必定一致.
#[derive(Debug, Clone)]
pub struct MriStudy {
    flair: MriVolume,
    seg: MriLabel,
}

impl MriStudy {
    /// 组合扫描和标签. 形状不一致时返回 `Err(RoiError::ShapeMismatch)`.
    pub fn new(flair: MriVolume, seg: MriLabel) -> RoiResult<Self> {
        if flair.data.shape() != seg.data.shape() {
            return Err(RoiError::ShapeMismatch {
                expected: flair.data.shape().to_vec(),
                found: seg.data.shape().to_vec(),
            });
        }
        Ok(Self { flair, seg })
    }

    /// 分别打开扫描和标签的 nii 文件.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(flair: P, seg: Q) -> RoiResult<Self> {
        Self::new(MriVolume::open(flair)?, MriLabel::open(seg)?)
    }

    /// FLAIR 扫描.
    #[inline]
    pub fn flair(&self) -> &MriVolume {
        &self.flair
    }

    /// 分割标签.
    #[inline]
    pub fn seg(&self) -> &MriLabel {
        &self.seg
    }

    /// 测量用的体素分辨率, 以分割标签的 header 为准.
    #[inline]
    pub fn spacing(&self) -> VoxelSpacing {
        self.seg.spacing()
    }
}

/// 打开单通道灰度图 (8 位或 16 位) 为 `(高, 宽)` 的 `f32` 数组.
///
/// 彩色图 (或带 alpha 通道的图) 返回 `Err(RoiError::InvalidInputShape)`.
pub fn open_gray_image<P: AsRef<Path>>(path: P) -> RoiResult<Array2<f32>> {
    let img = image::open(path)?;
    let (width, height) = (img.width() as usize, img.height() as usize);
    match img {
        DynamicImage::ImageLuma8(buf) => Ok(Array2::from_shape_fn((height, width), |(h, w)| {
            buf.get_pixel(w as u32, h as u32).0[0] as f32
        })),
        DynamicImage::ImageLuma16(buf) => Ok(Array2::from_shape_fn((height, width), |(h, w)| {
            buf.get_pixel(w as u32, h as u32).0[0] as f32
        })),
        other => Err(RoiError::invalid_shape(&[
            height,
            width,
            other.color().channel_count() as usize,
        ])),
    }
}

/// 将数组写入 `path` 处的 `.npy` 文件.
pub fn write_npy<P, A, S, D>(path: P, array: &ArrayBase<S, D>) -> RoiResult<()>
where
    P: AsRef<Path>,
    A: WritableElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    ndarray_npy::write_npy(path, array)?;
    Ok(())
}

/// 返回 `$HOME/dataset/` 下的路径. 无法获取家目录时返回 `None`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    fn tmp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mri-berry-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_spacing_fallback() {
        let v = MriVolume::from_array(Array3::zeros((2, 3, 4)), [0.5, 0.0, f32::NAN]);
        assert_eq!(v.pix_dim()[0], 0.5);
        assert_eq!(v.spacing().as_slice(), &[0.5, 1.0, 1.0]);
        assert_eq!(v.shape(), (2, 3, 4));
        assert_eq!(v.voxel(), 0.5);
    }

    #[test]
    fn test_study_shape_mismatch() {
        let flair = MriVolume::from_array(Array3::zeros((4, 4, 4)), [1.0; 3]);
        let seg = MriLabel::from_array(Array3::zeros((4, 4, 5)), [1.0; 3]);
        assert!(matches!(
            MriStudy::new(flair.clone(), seg),
            Err(RoiError::ShapeMismatch { .. })
        ));

        let seg = MriLabel::from_array(Array3::zeros((4, 4, 4)), [1.0, 1.0, 2.0]);
        let study = MriStudy::new(flair, seg).unwrap();
        assert_eq!(study.spacing().as_slice(), &[1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_open_gray_image() {
        let path = tmp("gray.png");
        let mut buf = GrayImage::new(3, 2);
        buf.put_pixel(2, 1, Luma([200]));
        buf.save(&path).unwrap();

        let arr = open_gray_image(&path).unwrap();
        assert_eq!(arr.dim(), (2, 3));
        assert_eq!(arr[(1, 2)], 200.0);
        assert_eq!(arr.sum(), 200.0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_color_image_rejected() {
        let path = tmp("rgb.png");
        RgbImage::new(4, 4).save(&path).unwrap();
        assert!(matches!(
            open_gray_image(&path),
            Err(RoiError::InvalidInputShape { shape }) if shape == vec![4, 4, 3]
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_npy() {
        let path = tmp("points.npy");
        let arr = ndarray::arr2(&[[1u64, 2, 3], [4, 5, 6]]);
        write_npy(&path, &arr).unwrap();
        let back: Array2<u64> = ndarray_npy::read_npy(&path).unwrap();
        assert_eq!(back, arr);
        std::fs::remove_file(&path).unwrap();
    }
}
