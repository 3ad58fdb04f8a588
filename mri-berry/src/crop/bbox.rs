use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 轴对齐包围盒. 每条轴上记录 `(min, max)` 闭区间索引.
///
/// 该结构是只读的, 且总是非空的: 每条轴上都有 `min <= max`.
/// 空区域不通过包围盒表达, 而是通过 [`crate::RoiError::EmptyRegion`] 表达.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<(usize, usize)>", into = "Vec<(usize, usize)>")
)]
pub struct BoundingBox {
    bounds: Vec<(usize, usize)>,
}

impl BoundingBox {
    /// 由每条轴的 `(min, max)` 闭区间构造包围盒.
    ///
    /// 若 `bounds` 为空, 或存在 `min > max` 的轴, 则返回 `None`.
    pub fn new(bounds: Vec<(usize, usize)>) -> Option<Self> {
        if bounds.is_empty() || bounds.iter().any(|(lo, hi)| lo > hi) {
            return None;
        }
        Some(Self { bounds })
    }

    /// 由已知合法的区间直接构造.
    #[inline]
    pub(crate) fn from_valid(bounds: Vec<(usize, usize)>) -> Self {
        debug_assert!(!bounds.is_empty() && bounds.iter().all(|(lo, hi)| lo <= hi));
        Self { bounds }
    }

    /// 维数.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.bounds.len()
    }

    /// 每条轴的 `(min, max)` 闭区间.
    #[inline]
    pub fn bounds(&self) -> &[(usize, usize)] {
        &self.bounds
    }

    /// 第 `axis` 条轴的 `(min, max)` 闭区间. 越界时 panic.
    #[inline]
    pub fn axis(&self, axis: usize) -> (usize, usize) {
        self.bounds[axis]
    }

    /// 第 `axis` 条轴上包含的体素个数, 即 `max - min + 1`. 越界时 panic.
    #[inline]
    pub fn len_of(&self, axis: usize) -> usize {
        let (lo, hi) = self.bounds[axis];
        hi - lo + 1
    }

    /// 裁剪后的数组形状.
    pub fn shape(&self) -> Vec<usize> {
        (0..self.ndim()).map(|axis| self.len_of(axis)).collect()
    }

    /// 包围盒内的体素总数.
    #[inline]
    pub fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// 下角点.
    pub fn lower(&self) -> Vec<usize> {
        self.bounds.iter().map(|&(lo, _)| lo).collect()
    }

    /// 上角点 (包含).
    pub fn upper(&self) -> Vec<usize> {
        self.bounds.iter().map(|&(_, hi)| hi).collect()
    }

    /// 索引 `pos` 是否落在包围盒内? 维数不一致时返回 `false`.
    pub fn contains(&self, pos: &[usize]) -> bool {
        pos.len() == self.ndim()
            && self
                .bounds
                .iter()
                .zip(pos)
                .all(|(&(lo, hi), p)| (lo..=hi).contains(p))
    }

    /// 包围盒能否完整地放进形状为 `shape` 的数组?
    pub fn fits(&self, shape: &[usize]) -> bool {
        shape.len() == self.ndim() && self.bounds.iter().zip(shape).all(|(&(_, hi), &n)| hi < n)
    }

    /// 平移到以原点为下角点的包围盒. 用于在裁剪后的局部坐标系下绘制.
    pub fn local(&self) -> Self {
        Self::from_valid(self.shape().into_iter().map(|n| (0, n - 1)).collect())
    }

    /// 将裁剪后局部坐标 `local` 转换为原数组中的全局坐标.
    ///
    /// 维数不一致时 panic.
    pub fn to_global(&self, local: &[usize]) -> Vec<usize> {
        assert_eq!(local.len(), self.ndim(), "坐标维数与包围盒不一致");
        self.bounds
            .iter()
            .zip(local)
            .map(|(&(lo, _), &p)| lo + p)
            .collect()
    }

    /// 包围盒的 `2^ndim` 个角点.
    ///
    /// 第 `c` 个角点在第 `k` 条轴上取 `max` 当且仅当 `c` 的第 `k` 位为 1.
    pub fn corners(&self) -> Vec<Vec<usize>> {
        (0..1usize << self.ndim())
            .map(|c| {
                self.bounds
                    .iter()
                    .enumerate()
                    .map(|(k, &(lo, hi))| if (c >> k) & 1 == 1 { hi } else { lo })
                    .collect()
            })
            .collect()
    }

    /// 包围盒线框的所有棱, 以 [`Self::corners`] 中的角点下标对表示.
    ///
    /// 3D 时共 12 条, 2D 时共 4 条.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.ndim();
        (0..1usize << n)
            .flat_map(|a| {
                (0..n)
                    .filter(move |k| (a >> k) & 1 == 0)
                    .map(move |k| (a, a | (1 << k)))
            })
            .collect()
    }
}

/// 以 `[2..=4, 3..=6, 1..=5]` 的形式输出.
impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, (lo, hi)) in self.bounds.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{lo}..={hi}")?;
        }
        f.write_str("]")
    }
}

/// 经由 [`BoundingBox::new`] 校验, 反序列化时同样拒绝 `min > max` 的轴.
impl TryFrom<Vec<(usize, usize)>> for BoundingBox {
    type Error = &'static str;

    fn try_from(bounds: Vec<(usize, usize)>) -> Result<Self, Self::Error> {
        Self::new(bounds).ok_or("包围盒必须非空, 且每条轴上 min <= max")
    }
}

impl From<BoundingBox> for Vec<(usize, usize)> {
    #[inline]
    fn from(b: BoundingBox) -> Self {
        b.bounds
    }
}
