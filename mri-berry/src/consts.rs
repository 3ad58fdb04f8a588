//! 通用常量.

/// BraTS 分割标签中各子区域的编码.
pub mod brats {
    /// 背景 (包括正常脑组织).
    pub const BRATS_BACKGROUND: u8 = 0;

    /// 坏死 / 非增强肿瘤核心 (NCR/NET).
    pub const BRATS_NECROTIC: u8 = 1;

    /// 瘤周水肿 (ED).
    pub const BRATS_EDEMA: u8 = 2;

    /// 增强肿瘤 (ET).
    pub const BRATS_ENHANCING: u8 = 4;

    /// 全肿瘤 (whole tumor) 包含的全部编码.
    pub const WHOLE_TUMOR: [u8; 3] = [BRATS_NECROTIC, BRATS_EDEMA, BRATS_ENHANCING];

    /// 肿瘤核心 (tumor core) 包含的全部编码.
    pub const TUMOR_CORE: [u8; 2] = [BRATS_NECROTIC, BRATS_ENHANCING];

    /// 增强肿瘤 (enhancing tumor) 包含的全部编码.
    pub const ENHANCING_TUMOR: [u8; 1] = [BRATS_ENHANCING];

    /// 体素是否属于全肿瘤?
    #[inline]
    pub const fn is_whole_tumor(p: u8) -> bool {
        matches!(p, BRATS_NECROTIC | BRATS_EDEMA | BRATS_ENHANCING)
    }
}

/// 全脑点云可视化的最大点数.
pub const BRAIN_POINT_CAP: usize = 100_000;

/// 肿瘤点云可视化的最大点数.
pub const TUMOR_POINT_CAP: usize = 50_000;

/// 中值滤波的默认核大小.
pub const DEFAULT_MEDIAN_KERNEL: usize = 3;

/// 未知体素分辨率时使用的默认值, 以毫米为单位.
pub const DEFAULT_SPACING_MM: f64 = 1.0;

/// 毫米 -> 厘米.
pub const MM_PER_CM: f64 = 10.0;

/// 立方毫米 -> 立方厘米.
pub const MM3_PER_CM3: f64 = 1000.0;
