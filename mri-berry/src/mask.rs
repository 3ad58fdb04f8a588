//! 布尔掩码的构造与统计.
//!
//! 掩码与原体数据同形状. 它可以由强度阈值 (`value > threshold`) 得到,
//! 也可以由分割标签的编码集合 ([`LabelSet`]) 得到.

use ndarray::{Array, ArrayBase, Data, Dimension};

use crate::consts::brats;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 由强度阈值构造掩码: 严格大于 `threshold` 的体素为 `true`.
///
/// NaN 与任何值比较都为假, 因此不会被选中.
pub fn threshold_mask<A, S, D>(volume: &ArrayBase<S, D>, threshold: A) -> Array<bool, D>
where
    A: PartialOrd + Copy,
    S: Data<Elem = A>,
    D: Dimension,
{
    volume.map(|v| *v > threshold)
}

/// 统计掩码中 `true` 体素的个数.
pub fn count_true<S, D>(mask: &ArrayBase<S, D>) -> usize
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    mask.iter().filter(|&&b| b).count()
}

/// 借助 `rayon`, 并行地统计掩码中 `true` 体素的个数.
#[cfg(feature = "rayon")]
pub fn par_count_true<S, D>(mask: &ArrayBase<S, D>) -> usize
where
    S: Data<Elem = bool>,
    D: Dimension,
{
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    mask.view().into_par_iter().filter(|&&b| b).count()
}

/// 分割标签中代表某一 (组合) 区域的编码集合.
///
/// 集合非空, 内部保持升序且无重复. 哪些编码代表 "肿瘤" 由调用者决定,
/// 测量逻辑本身不写死任何编码.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<u8>", into = "Vec<u8>"))]
pub struct LabelSet {
    codes: Vec<u8>,
}

impl LabelSet {
    /// 由编码构造集合. 若 `codes` 为空则返回 `None`.
    pub fn new<I: IntoIterator<Item = u8>>(codes: I) -> Option<Self> {
        let mut codes: Vec<u8> = codes.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        (!codes.is_empty()).then_some(Self { codes })
    }

    /// 全肿瘤: 坏死核心 + 水肿 + 增强肿瘤 (1, 2, 4).
    #[inline]
    pub fn whole_tumor() -> Self {
        Self {
            codes: brats::WHOLE_TUMOR.to_vec(),
        }
    }

    /// 肿瘤核心: 坏死核心 + 增强肿瘤 (1, 4).
    #[inline]
    pub fn tumor_core() -> Self {
        Self {
            codes: brats::TUMOR_CORE.to_vec(),
        }
    }

    /// 增强肿瘤 (4).
    #[inline]
    pub fn enhancing_tumor() -> Self {
        Self {
            codes: brats::ENHANCING_TUMOR.to_vec(),
        }
    }

    /// 升序排列的全部编码.
    #[inline]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// 编码 `code` 是否属于该集合?
    #[inline]
    pub fn contains(&self, code: u8) -> bool {
        self.codes.binary_search(&code).is_ok()
    }

    /// 构造分割标签 `seg` 的掩码: 编码属于该集合的体素为 `true`.
    pub fn mask<S, D>(&self, seg: &ArrayBase<S, D>) -> Array<bool, D>
    where
        S: Data<Elem = u8>,
        D: Dimension,
    {
        seg.map(|&v| self.contains(v))
    }
}

/// 经由 [`LabelSet::new`] 构造, 反序列化时同样排序去重.
impl TryFrom<Vec<u8>> for LabelSet {
    type Error = &'static str;

    fn try_from(codes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(codes).ok_or("标签编码集合不能为空")
    }
}

impl From<LabelSet> for Vec<u8> {
    #[inline]
    fn from(s: LabelSet) -> Self {
        s.codes
    }
}

impl Default for LabelSet {
    /// 默认为全肿瘤.
    #[inline]
    fn default() -> Self {
        Self::whole_tumor()
    }
}
