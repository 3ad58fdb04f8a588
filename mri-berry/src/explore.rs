//! 全脑 ROI 与肿瘤报告两条流水线.
//!
//! 二者都只是 [`crate::crop`], [`crate::mask`] 与 [`crate::measure`] 的组合:
//! 包围盒与体积总在完整掩码上计算, 降采样后的点云只用于显示.

use std::fmt::{Display, Formatter};

use log::info;
use ndarray::{Array3, ArrayBase, Data, Ix3};
use rand::Rng;

use crate::consts::{BRAIN_POINT_CAP, TUMOR_POINT_CAP};
use crate::crop::{crop, locate_signal, sample_points, BoundingBox, DisplayPoints};
use crate::mask::{threshold_mask, LabelSet};
use crate::measure::{measure, Measurement, VoxelSpacing};
use crate::{Idx3d, RoiResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 两条流水线的运行时配置.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExploreConfig {
    /// 全脑点云的最大显示点数.
    pub brain_cap: usize,

    /// 肿瘤点云的最大显示点数.
    pub tumor_cap: usize,

    /// 视为肿瘤的标签编码.
    pub labels: LabelSet,

    /// 强度严格大于该值的体素视为脑组织.
    pub intensity_threshold: f32,

    /// 若给出, 则覆盖 nii header 中的体素分辨率.
    pub spacing: Option<VoxelSpacing>,

    /// 降采样随机种子. 为 `None` 时由调用者自行决定随机源.
    pub seed: Option<u64>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            brain_cap: BRAIN_POINT_CAP,
            tumor_cap: TUMOR_POINT_CAP,
            labels: LabelSet::whole_tumor(),
            intensity_threshold: 0.0,
            spacing: None,
            seed: None,
        }
    }
}

/// 全脑 ROI.
#[derive(Clone, Debug)]
pub struct BrainRoi {
    bbox: BoundingBox,
    roi: Array3<f32>,
    points: DisplayPoints<Idx3d>,
    used_fallback: bool,
}

impl BrainRoi {
    /// 在完整体数据 `volume` 上求出脑组织 (强度大于阈值) 的包围盒, 裁剪,
    /// 并在裁剪结果上抽取至多 `config.brain_cap` 个显示点.
    ///
    /// 显示点坐标位于裁剪后的 ROI 坐标系中, 与 [`BrainRoi::local_box`] 一致.
    /// 没有任何脑组织时返回 `Err(RoiError::EmptyRegion)`.
    ///
    /// [`RoiError::EmptyRegion`]: crate::RoiError::EmptyRegion
    pub fn extract<S, R>(
        volume: &ArrayBase<S, Ix3>,
        config: &ExploreConfig,
        rng: &mut R,
    ) -> RoiResult<Self>
    where
        S: Data<Elem = f32>,
        R: Rng + ?Sized,
    {
        let region = locate_signal(volume, None, config.intensity_threshold)?;
        let roi = crop(volume, &region.bbox)?.to_owned();
        let mask = threshold_mask(&roi, config.intensity_threshold);
        let points = sample_points(&mask, config.brain_cap, rng);
        info!(
            "Brain ROI {} ({} voxels, {} shown)",
            region.bbox,
            region.points,
            points.len()
        );
        Ok(Self {
            bbox: region.bbox,
            roi,
            points,
            used_fallback: region.used_fallback,
        })
    }

    /// ROI 在原体数据中的包围盒.
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// ROI 在自身坐标系中的包围盒, 用于与显示点一起绘制.
    #[inline]
    pub fn local_box(&self) -> BoundingBox {
        self.bbox.local()
    }

    /// 裁剪后的体数据.
    #[inline]
    pub fn roi(&self) -> &Array3<f32> {
        &self.roi
    }

    /// 裁剪后的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.roi.dim()
    }

    /// 显示用的点云.
    #[inline]
    pub fn points(&self) -> &DisplayPoints<Idx3d> {
        &self.points
    }

    /// 是否触发了裁剪回退.
    #[inline]
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }
}

/// 以 `bounding box size a x b x c` 的形式输出.
impl Display for BrainRoi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (a, b, c) = self.shape();
        write!(f, "bounding box size {a} x {b} x {c}")
    }
}

/// 肿瘤测量报告.
#[derive(Clone, Debug)]
pub struct TumorReport {
    measurement: Measurement,
    points: DisplayPoints<Idx3d>,
}

impl TumorReport {
    /// 由分割标签 `seg` 中属于 `config.labels` 的体素构造肿瘤掩码, 测量其尺寸与体积,
    /// 并抽取至多 `config.tumor_cap` 个显示点 (原体数据坐标系).
    ///
    /// `config.spacing` 若给出则覆盖 `spacing`.
    /// 没有肿瘤时返回 `Err(RoiError::EmptyRegion)`, 调用者应当将其作为正常结果报告.
    ///
    /// [`RoiError::EmptyRegion`]: crate::RoiError::EmptyRegion
    pub fn measure<S, R>(
        seg: &ArrayBase<S, Ix3>,
        spacing: &VoxelSpacing,
        config: &ExploreConfig,
        rng: &mut R,
    ) -> RoiResult<Self>
    where
        S: Data<Elem = u8>,
        R: Rng + ?Sized,
    {
        let spacing = config.spacing.as_ref().unwrap_or(spacing);
        let mask = config.labels.mask(seg);
        let measurement = measure(&mask, spacing)?;
        let points = sample_points(&mask, config.tumor_cap, rng);
        info!("Tumor {measurement}");
        Ok(Self {
            measurement,
            points,
        })
    }

    /// 测量结果.
    #[inline]
    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    /// 显示用的点云.
    #[inline]
    pub fn points(&self) -> &DisplayPoints<Idx3d> {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::brats::*;
    use ndarray::s;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// (20, 24, 16) 的体数据, 脑组织位于 [3..=16, 4..=19, 2..=13].
    fn phantom() -> Array3<f32> {
        let mut v = Array3::<f32>::zeros((20, 24, 16));
        v.slice_mut(s![3..17, 4..20, 2..14]).fill(120.0);
        v
    }

    #[test]
    fn test_brain_roi() {
        let config = ExploreConfig::default();
        let roi = BrainRoi::extract(&phantom(), &config, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(roi.bounding_box().bounds(), &[(3, 16), (4, 19), (2, 13)]);
        assert_eq!(roi.shape(), (14, 16, 12));
        assert_eq!(roi.to_string(), "bounding box size 14 x 16 x 12");
        assert!(!roi.used_fallback());

        // 显示点位于 ROI 坐标系中.
        let local = roi.local_box();
        assert_eq!(roi.points().total(), 14 * 16 * 12);
        assert!(roi
            .points()
            .points()
            .iter()
            .all(|&(a, b, c)| local.contains(&[a, b, c])));
    }

    #[test]
    fn test_brain_roi_downsampled() {
        let config = ExploreConfig {
            brain_cap: 500,
            ..Default::default()
        };
        let roi = BrainRoi::extract(&phantom(), &config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(roi.points().len(), 500);
        // 降采样不影响包围盒.
        assert_eq!(roi.shape(), (14, 16, 12));
    }

    #[test]
    fn test_brain_roi_empty() {
        let blank = Array3::<f32>::zeros((5, 5, 5));
        let err = BrainRoi::extract(
            &blank,
            &ExploreConfig::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(err.is_empty_region());
    }

    fn seg_phantom() -> Array3<u8> {
        let mut seg = Array3::<u8>::zeros((20, 20, 20));
        seg.slice_mut(s![5..10, 5..10, 5..10]).fill(BRATS_EDEMA);
        seg.slice_mut(s![6..9, 6..9, 6..9]).fill(BRATS_ENHANCING);
        seg[(7, 7, 7)] = BRATS_NECROTIC;
        seg
    }

    #[test]
    fn test_tumor_report() {
        let config = ExploreConfig::default();
        let spacing = VoxelSpacing::new(vec![1.0, 1.0, 2.0]).unwrap();
        let report =
            TumorReport::measure(&seg_phantom(), &spacing, &config, &mut StdRng::seed_from_u64(0))
                .unwrap();
        let m = report.measurement();
        assert_eq!(m.extents_mm(), &[5.0, 5.0, 10.0]);
        assert_eq!(m.voxel_count(), 125);
        assert_eq!(m.volume_mm3(), 250.0);
        assert_eq!(report.points().len(), 125);
    }

    #[test]
    fn test_tumor_report_label_subset_and_override() {
        let config = ExploreConfig {
            labels: LabelSet::tumor_core(),
            spacing: Some(VoxelSpacing::isotropic(3, 0.5).unwrap()),
            ..Default::default()
        };
        let report = TumorReport::measure(
            &seg_phantom(),
            &VoxelSpacing::unit(3),
            &config,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        let m = report.measurement();
        assert_eq!(m.voxel_count(), 27);
        assert_eq!(m.extents_mm(), &[1.5, 1.5, 1.5]);
        assert_eq!(m.volume_mm3(), 27.0 * 0.125);
    }

    #[test]
    fn test_no_tumor_is_recoverable() {
        let mut seg = Array3::<u8>::zeros((8, 8, 8));
        seg[(1, 1, 1)] = BRATS_EDEMA;
        let config = ExploreConfig {
            labels: LabelSet::enhancing_tumor(),
            ..Default::default()
        };
        let err = TumorReport::measure(
            &seg,
            &VoxelSpacing::unit(3),
            &config,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(err.is_empty_region());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "brain_cap": 1000,
            "tumor_cap": 50,
            "labels": [4, 1, 2],
            "intensity_threshold": 0.0,
            "spacing": [1.0, 1.0, 2.0],
            "seed": 3
        }"#;
        let config: ExploreConfig = serde_json::from_str(json).unwrap();
        assert!(config.labels.contains(4));
        assert_eq!(config.labels, LabelSet::whole_tumor());

        let mut seg = Array3::<u8>::zeros((6, 6, 6));
        seg[(2, 3, 4)] = BRATS_ENHANCING;
        let report = TumorReport::measure(
            &seg,
            &VoxelSpacing::unit(3),
            &config,
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(report.measurement().voxel_count(), 1);
        assert_eq!(report.measurement().volume_mm3(), 2.0);

        let bad = json.replace("[1.0, 1.0, 2.0]", "[-1.0, 1.0, 1.0]");
        assert!(serde_json::from_str::<ExploreConfig>(&bad).is_err());
        let bad = json.replace("[4, 1, 2]", "[]");
        assert!(serde_json::from_str::<ExploreConfig>(&bad).is_err());
    }
}
