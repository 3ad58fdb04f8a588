//! 轴对齐包围盒的求取与裁剪.
//!
//! 包围盒按轴独立计算: 对每一条轴, 先在其余所有轴上做逻辑或投影,
//! 然后取该轴上第一个与最后一个为 `true` 的索引. 索引均为闭区间.
//!
//! 本模块对维数不做限制, 2D 切片和 3D 体数据共用同一实现.

mod bbox;
mod core;
mod sample;

pub use bbox::BoundingBox;

pub use self::core::{
    compute_bounding_box, crop, locate_signal, try_crop, CropOutcome, SignalRegion,
};

#[cfg(feature = "rayon")]
pub use self::core::par_compute_bounding_box;

pub use sample::{sample_points, DisplayPoints};
