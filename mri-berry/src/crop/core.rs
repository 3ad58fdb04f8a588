use log::{debug, warn};
use ndarray::{ArrayBase, ArrayView, Axis, Data, Dimension, RemoveAxis, Slice};

use super::BoundingBox;
use crate::mask::{count_true, threshold_mask};
use crate::{RoiError, RoiResult};

/// 求第 `axis` 条轴上第一个和最后一个包含 `true` 的索引.
///
/// 若该轴上没有任何 `true`, 返回 `None`.
#[inline]
fn axis_bounds<S, D>(mask: &ArrayBase<S, D>, axis: Axis) -> Option<(usize, usize)>
where
    S: Data<Elem = bool>,
    D: RemoveAxis,
{
    // 对其余轴做逻辑或投影.
    let has_signal = |lane: ArrayView<'_, bool, D::Smaller>| lane.iter().any(|&b| b);
    let min = mask.axis_iter(axis).position(has_signal)?;
    let max = mask.axis_iter(axis).rposition(has_signal)?;
    Some((min, max))
}

/// 求掩码 `mask` 中所有 `true` 体素的最小轴对齐包围盒.
///
/// # 返回值
///
/// - `mask` 为 0 维数组时, 返回 `Err(RoiError::InvalidInputShape)`;
/// - `mask` 中没有任何 `true` 时, 返回 `Err(RoiError::EmptyRegion)`,
///   而不是返回退化的空包围盒;
/// - 其他情况下返回每条轴上的 `(min, max)` 闭区间.
pub fn compute_bounding_box<S, D>(mask: &ArrayBase<S, D>) -> RoiResult<BoundingBox>
where
    S: Data<Elem = bool>,
    D: RemoveAxis,
{
    if mask.ndim() == 0 {
        return Err(RoiError::invalid_shape(mask.shape()));
    }
    let bounds = (0..mask.ndim())
        .map(|axis| axis_bounds(mask, Axis(axis)))
        .collect::<Option<Vec<_>>>()
        .ok_or(RoiError::EmptyRegion)?;
    let bbox = BoundingBox::from_valid(bounds);
    debug!("Bounding box of mask {:?}: {bbox}", mask.shape());
    Ok(bbox)
}

/// 借助 `rayon`, 并行地计算每条轴的范围. 结果与 [`compute_bounding_box`] 相同.
#[cfg(feature = "rayon")]
pub fn par_compute_bounding_box<S, D>(mask: &ArrayBase<S, D>) -> RoiResult<BoundingBox>
where
    S: Data<Elem = bool>,
    D: RemoveAxis,
{
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    if mask.ndim() == 0 {
        return Err(RoiError::invalid_shape(mask.shape()));
    }
    let view = mask.view();
    let bounds = (0..view.ndim())
        .into_par_iter()
        .map(|axis| axis_bounds(&view, Axis(axis)))
        .collect::<Option<Vec<_>>>()
        .ok_or(RoiError::EmptyRegion)?;
    Ok(BoundingBox::from_valid(bounds))
}

/// 按包围盒 `bbox` 裁剪 `volume`, 返回其子视图. 每条轴的上界均 **包含** 在内.
///
/// 若 `bbox` 维数与 `volume` 不一致, 或者越界, 则返回 `Err(RoiError::ShapeMismatch)`.
pub fn crop<'a, A, S, D>(
    volume: &'a ArrayBase<S, D>,
    bbox: &BoundingBox,
) -> RoiResult<ArrayView<'a, A, D>>
where
    S: Data<Elem = A>,
    D: Dimension,
{
    if !bbox.fits(volume.shape()) {
        return Err(RoiError::ShapeMismatch {
            expected: volume.shape().to_vec(),
            found: bbox.upper().into_iter().map(|hi| hi + 1).collect(),
        });
    }
    Ok(volume.slice_each_axis(|desc| {
        let (lo, hi) = bbox.axis(desc.axis.index());
        Slice::from(lo..=hi)
    }))
}

/// 一次裁剪尝试的结果.
#[derive(Debug)]
pub enum CropOutcome<'a, A, D: Dimension> {
    /// 裁剪区域内存在感兴趣的体素.
    Cropped {
        /// 实际使用的包围盒.
        bbox: BoundingBox,
        /// 裁剪后的子视图.
        view: ArrayView<'a, A, D>,
        /// 子视图中感兴趣的体素个数, 必定为正.
        points: usize,
    },

    /// 裁剪区域内没有任何感兴趣的体素.
    NoSignal,
}

impl<A, D: Dimension> CropOutcome<'_, A, D> {
    /// 裁剪是否得到了信号?
    #[inline]
    pub fn is_cropped(&self) -> bool {
        matches!(self, Self::Cropped { .. })
    }
}

/// 按 `bbox` 裁剪 `volume`, 并检查裁剪结果中是否仍有大于 `threshold` 的体素.
///
/// 形状错误以 `Err` 返回; 裁剪区域内没有信号时返回 `Ok(CropOutcome::NoSignal)`,
/// 由调用者决定如何回退.
pub fn try_crop<'a, A, S, D>(
    volume: &'a ArrayBase<S, D>,
    bbox: &BoundingBox,
    threshold: A,
) -> RoiResult<CropOutcome<'a, A, D>>
where
    A: PartialOrd + Copy,
    S: Data<Elem = A>,
    D: Dimension,
{
    let view = crop(volume, bbox)?;
    let points = count_true(&threshold_mask(&view, threshold));
    if points == 0 {
        return Ok(CropOutcome::NoSignal);
    }
    Ok(CropOutcome::Cropped {
        bbox: bbox.clone(),
        view,
        points,
    })
}

/// [`locate_signal`] 找到的信号区域.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalRegion {
    /// 信号区域的包围盒 (原数组坐标系).
    pub bbox: BoundingBox,

    /// 包围盒内大于阈值的体素个数.
    pub points: usize,

    /// 是否因为提示包围盒内没有信号而回退到了整个数组.
    pub used_fallback: bool,
}

/// 定位 `volume` 中大于 `threshold` 的信号区域.
///
/// 流程分为显式的两步:
///
/// 1. 以 `hint` (若给出) 或在完整数组上求得的包围盒调用 [`try_crop`];
/// 2. 若第一步得到 [`CropOutcome::NoSignal`], 则回退到在 **未裁剪** 的完整数组上
///   重新求包围盒, 并将 `used_fallback` 置为 `true`.
///
/// 完整数组上也没有信号时返回 `Err(RoiError::EmptyRegion)`.
pub fn locate_signal<A, S, D>(
    volume: &ArrayBase<S, D>,
    hint: Option<&BoundingBox>,
    threshold: A,
) -> RoiResult<SignalRegion>
where
    A: PartialOrd + Copy,
    S: Data<Elem = A>,
    D: RemoveAxis,
{
    let bbox = match hint {
        Some(b) => b.clone(),
        None => compute_bounding_box(&threshold_mask(volume, threshold))?,
    };

    match try_crop(volume, &bbox, threshold)? {
        CropOutcome::Cropped { bbox, points, .. } => Ok(SignalRegion {
            bbox,
            points,
            used_fallback: false,
        }),
        CropOutcome::NoSignal => {
            warn!("No signal inside {bbox}, falling back to the uncropped volume");
            let mask = threshold_mask(volume, threshold);
            let bbox = compute_bounding_box(&mask)?;
            Ok(SignalRegion {
                bbox,
                points: count_true(&mask),
                used_fallback: true,
            })
        }
    }
}
