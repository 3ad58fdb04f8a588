#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供脑部 MRI 体数据 (FLAIR 扫描及 BraTS 格式分割标签) 的
//! ROI 提取与基础几何测量算法.
//!
//! 该 crate 仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 文件格式解析 (NIfTI) 交由 `nifti` crate 完成, 本 crate 只负责薄薄的一层适配.
//!   本 crate 的核心算法只依赖内存中的 `ndarray` 数组.
//! 2. 核心算法无状态、同步、单线程 (`rayon` feature 仅提供可选的并行版本).
//!   随机降采样的随机源总是由调用者显式传入, 便于复现.
//! 3. "区域为空" ([`RoiError::EmptyRegion`]) 是正常的、可恢复的结果
//!   (例如分割标签中根本没有肿瘤), 调用者需要显式分支处理它.
//!
//! # 功能
//!
//! ### 包围盒与裁剪 ✅
//!
//! 逐轴投影求出掩码的最小轴对齐包围盒 (闭区间), 并按包围盒裁剪原体数据.
//! 支持任意维数 (2D 切片与 3D 体数据共用同一套算法).
//!
//! 实现位于 `mri-berry/src/crop`.
//!
//! ### 点云降采样 ✅
//!
//! 仅用于可视化. 降采样 **绝不** 参与包围盒和体积计算.
//!
//! 实现位于 `mri-berry/src/crop/sample.rs`.
//!
//! ### 2D 切片 ROI ✅
//!
//! 中值滤波降噪, 线性归一化到 8-bit, 然后裁剪非零区域.
//!
//! 实现位于 `mri-berry/src/slice`.
//!
//! ### 几何测量 ✅
//!
//! 逐轴物理尺寸 (mm / cm) 以及按体素计数得到的体积 (mm³ / cm³).
//!
//! 实现位于 `mri-berry/src/measure.rs`.
//!
//! ### 全脑 ROI & 肿瘤报告 ✅
//!
//! 将上述组件串联为两条流水线, 实现位于 `mri-berry/src/explore.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{RoiError, RoiResult};

pub mod mask;

pub mod crop;

pub mod measure;

pub mod slice;

/// MRI nii 文件的加载与导出.
mod data;

pub use data::{
    home_dataset_dir_with, open_gray_image, write_npy, MriLabel, MriStudy, MriVolume,
    NiftiHeaderAttr,
};

pub mod explore;

pub mod prelude;
