//! 掩码的几何测量.
//!
//! 所有测量值都是由 (掩码, 体素分辨率) 即时计算的派生值, 不缓存也不修改.
//! 毫米 -> 厘米等单位换算只是展示层面的事情, 不影响内部存储的值.

use std::fmt::{Display, Formatter};

use ndarray::{ArrayBase, Data, RemoveAxis};

use crate::consts::{DEFAULT_SPACING_MM, MM3_PER_CM3, MM_PER_CM};
use crate::crop::{compute_bounding_box, BoundingBox};
use crate::{RoiError, RoiResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 体素分辨率: 每条轴上相邻体素之间的物理距离, 以毫米为单位.
///
/// 该结构是只读的, 所有值均为正的有限数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct VoxelSpacing {
    mm: Vec<f64>,
}

impl VoxelSpacing {
    /// 由每条轴的分辨率构造.
    ///
    /// - 当 `mm` 为空时, 返回 `Err(RoiError::InvalidInputShape)`;
    /// - 当存在非正或非有限的值时, 返回 `Err(RoiError::InvalidSpacing)`.
    pub fn new(mm: Vec<f64>) -> RoiResult<Self> {
        if mm.is_empty() {
            return Err(RoiError::invalid_shape(&[]));
        }
        if let Some(&bad) = mm.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(RoiError::InvalidSpacing(bad));
        }
        Ok(Self { mm })
    }

    /// 各向同性的分辨率, 每条轴都是 `mm` 毫米.
    ///
    /// `ndim` 为 0 或 `mm` 非法时返回 `Err`.
    #[inline]
    pub fn isotropic(ndim: usize, mm: f64) -> RoiResult<Self> {
        Self::new(vec![mm; ndim])
    }

    /// 未知分辨率时的默认值: 每条轴 1.0 毫米.
    ///
    /// 分辨率至少有一条轴, 因此 `ndim` 为 0 时按 1 维处理.
    #[inline]
    pub fn unit(ndim: usize) -> Self {
        Self {
            mm: vec![DEFAULT_SPACING_MM; ndim.max(1)],
        }
    }

    /// 维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.mm.len()
    }

    /// 每条轴的分辨率, 以毫米为单位.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.mm
    }

    /// 第 `axis` 条轴的分辨率. 越界时 panic.
    #[inline]
    pub fn get(&self, axis: usize) -> f64 {
        self.mm[axis]
    }

    /// 单个体素的实际体积, 以立方毫米为单位 (2D 时为平方毫米).
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.mm.iter().product()
    }

    /// 分辨率在各个维度上是否是各向同的?
    #[inline]
    pub fn is_isotropic(&self) -> bool {
        self.mm.windows(2).all(|w| w[0] == w[1])
    }
}

/// 经由 [`VoxelSpacing::new`] 校验, 反序列化时同样拒绝非正或非有限的值.
impl TryFrom<Vec<f64>> for VoxelSpacing {
    type Error = RoiError;

    #[inline]
    fn try_from(mm: Vec<f64>) -> RoiResult<Self> {
        Self::new(mm)
    }
}

impl From<VoxelSpacing> for Vec<f64> {
    #[inline]
    fn from(s: VoxelSpacing) -> Self {
        s.mm
    }
}

/// 一次测量的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    bbox: BoundingBox,
    extents_mm: Vec<f64>,
    voxel_count: usize,
    voxel_volume_mm3: f64,
}

impl Measurement {
    /// 掩码的包围盒.
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// 每条轴上的物理尺寸, 以毫米为单位.
    #[inline]
    pub fn extents_mm(&self) -> &[f64] {
        &self.extents_mm
    }

    /// 每条轴上的物理尺寸, 以厘米为单位.
    pub fn extents_cm(&self) -> Vec<f64> {
        self.extents_mm.iter().map(|mm| mm / MM_PER_CM).collect()
    }

    /// 掩码中的体素个数.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.voxel_count
    }

    /// 单个体素的体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume_mm3(&self) -> f64 {
        self.voxel_volume_mm3
    }

    /// 掩码的实际体积, 以立方毫米为单位.
    ///
    /// 注意这不是包围盒的体积: 肿瘤形状不规则, 掩码在包围盒中往往是稀疏的.
    #[inline]
    pub fn volume_mm3(&self) -> f64 {
        self.voxel_count as f64 * self.voxel_volume_mm3
    }

    /// 掩码的实际体积, 以立方厘米为单位.
    #[inline]
    pub fn volume_cm3(&self) -> f64 {
        self.volume_mm3() / MM3_PER_CM3
    }
}

/// 以 `3.0 x 4.0 x 5.0 mm (0.30 x 0.40 x 0.50 cm), 60 voxels = 60.00 mm³ (0.060 cm³)` 的形式输出.
impl Display for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let join = |v: &[f64], prec: usize| {
            v.iter()
                .map(|x| format!("{x:.prec$}"))
                .collect::<Vec<_>>()
                .join(" x ")
        };
        write!(
            f,
            "{} mm ({} cm), {} voxels = {:.2} mm³ ({:.3} cm³)",
            join(&self.extents_mm, 1),
            join(&self.extents_cm(), 2),
            self.voxel_count,
            self.volume_mm3(),
            self.volume_cm3()
        )
    }
}

/// 测量掩码 `mask` 在分辨率 `spacing` 下的几何尺寸与体积.
///
/// - 每条轴的尺寸 = `(max - min + 1) * spacing[axis]`, 其中 `+1` 因为包围盒为闭区间;
/// - 体积 = 完整掩码中的 `true` 体素数 * 单个体素体积.
///
/// # 返回值
///
/// - `spacing` 维数与 `mask` 不一致时, 返回 `Err(RoiError::ShapeMismatch)`;
/// - 掩码为空时, 返回 `Err(RoiError::EmptyRegion)`. 这是正常的、可恢复的结果
///   (例如分割结果中没有肿瘤).
pub fn measure<S, D>(mask: &ArrayBase<S, D>, spacing: &VoxelSpacing) -> RoiResult<Measurement>
where
    S: Data<Elem = bool>,
    D: RemoveAxis,
{
    if spacing.ndim() != mask.ndim() {
        return Err(RoiError::ShapeMismatch {
            expected: vec![mask.ndim()],
            found: vec![spacing.ndim()],
        });
    }
    let bbox = compute_bounding_box(mask)?;
    let extents_mm = (0..bbox.ndim())
        .map(|axis| bbox.len_of(axis) as f64 * spacing.get(axis))
        .collect();

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let voxel_count = crate::mask::par_count_true(mask);
        } else {
            let voxel_count = crate::mask::count_true(mask);
        }
    }

    Ok(Measurement {
        bbox,
        extents_mm,
        voxel_count,
        voxel_volume_mm3: spacing.voxel_volume(),
    })
}
