//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};
pub use crate::{RoiError, RoiResult};

pub use crate::consts::brats::{BRATS_BACKGROUND, BRATS_EDEMA, BRATS_ENHANCING, BRATS_NECROTIC};
pub use crate::consts::{BRAIN_POINT_CAP, DEFAULT_MEDIAN_KERNEL, TUMOR_POINT_CAP};

pub use crate::crop::{
    compute_bounding_box, crop, locate_signal, sample_points, try_crop, BoundingBox, CropOutcome,
    DisplayPoints, SignalRegion,
};
pub use crate::mask::{threshold_mask, LabelSet};
pub use crate::measure::{measure, Measurement, VoxelSpacing};
pub use crate::slice::{ImgWriteVis, SliceRoi};

pub use crate::explore::{BrainRoi, ExploreConfig, TumorReport};

pub use crate::{
    home_dataset_dir_with, open_gray_image, write_npy, MriLabel, MriStudy, MriVolume,
    NiftiHeaderAttr,
};
