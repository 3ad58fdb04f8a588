//! 可视化点云降采样.
//!
//! 这里得到的坐标 **只用于显示**. 包围盒与体积永远在完整掩码上计算.

use std::path::Path;

use log::debug;
use ndarray::{Array2, ArrayBase, Data, Dimension, IntoDimension};
use rand::Rng;

use crate::RoiResult;

/// 用于可视化的点云坐标集.
///
/// 该结构仅供渲染层使用, 不应再被拿去做任何测量.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayPoints<P> {
    points: Vec<P>,
    total: usize,
    cap: usize,
    ndim: usize,
}

impl<P> DisplayPoints<P> {
    /// 采样得到的坐标, 保持原数组中的行优先顺序.
    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// 取出全部坐标.
    #[inline]
    pub fn into_points(self) -> Vec<P> {
        self.points
    }

    /// 采样得到的点数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否没有任何点?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 降采样前的候选点总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// 采样上限.
    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// 坐标维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// 是否发生了降采样?
    #[inline]
    pub fn is_downsampled(&self) -> bool {
        self.points.len() < self.total
    }
}

impl<P> DisplayPoints<P>
where
    P: IntoDimension + Clone,
{
    /// 转换为 `N x ndim` 的坐标矩阵, 便于导出给外部渲染工具.
    pub fn to_array(&self) -> Array2<u64> {
        let dims: Vec<P::Dim> = self
            .points
            .iter()
            .cloned()
            .map(IntoDimension::into_dimension)
            .collect();
        Array2::from_shape_fn((dims.len(), self.ndim), |(i, k)| dims[i][k] as u64)
    }

    /// 将 [`DisplayPoints::to_array`] 的结果写入 `path` 处的 `.npy` 文件.
    pub fn write_points_npy<Q: AsRef<Path>>(&self, path: Q) -> RoiResult<()> {
        crate::write_npy(path, &self.to_array())
    }
}

/// 收集 `mask` 中所有 `true` 体素的坐标. 若个数超过 `cap`,
/// 则借助 `rng` 不放回地均匀抽取恰好 `cap` 个.
///
/// 抽样结果保持原数组中的行优先顺序, 且不含重复坐标.
pub fn sample_points<S, D, R>(
    mask: &ArrayBase<S, D>,
    cap: usize,
    rng: &mut R,
) -> DisplayPoints<D::Pattern>
where
    S: Data<Elem = bool>,
    D: Dimension,
    R: Rng + ?Sized,
{
    let candidates: Vec<D::Pattern> = mask
        .indexed_iter()
        .filter_map(|(pos, &b)| b.then_some(pos))
        .collect();
    let total = candidates.len();
    let ndim = mask.ndim();

    if total <= cap {
        return DisplayPoints {
            points: candidates,
            total,
            cap,
            ndim,
        };
    }

    let mut keep = vec![false; total];
    for i in rand::seq::index::sample(rng, total, cap).into_iter() {
        keep[i] = true;
    }
    let points: Vec<D::Pattern> = candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(pos, k)| k.then_some(pos))
        .collect();
    debug!("Downsampled {total} points to {} for display", points.len());

    DisplayPoints {
        points,
        total,
        cap,
        ndim,
    }
}
