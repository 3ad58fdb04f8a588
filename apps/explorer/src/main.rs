//! 脑部 MRI ROI 提取与肿瘤测量的命令行工具.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use mri_berry::prelude::*;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod loader;
mod report;

#[derive(Parser, Debug)]
#[command(name = "explorer", version, about, long_about = None)]
struct Cli {
    /// 日志等级 (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// 点云降采样的随机种子. 缺省时每次运行结果不同.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

/// 肿瘤子区域.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Region {
    /// 全肿瘤 (1, 2, 4).
    Whole,
    /// 肿瘤核心 (1, 4).
    Core,
    /// 增强肿瘤 (4).
    Enhancing,
}

impl From<Region> for LabelSet {
    fn from(r: Region) -> Self {
        match r {
            Region::Whole => LabelSet::whole_tumor(),
            Region::Core => LabelSet::tumor_core(),
            Region::Enhancing => LabelSet::enhancing_tumor(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 裁剪全脑 ROI, 并导出显示点云.
    Brain {
        /// FLAIR 扫描 nii 文件.
        #[arg(long, env = "MRI_BERRY_FLAIR")]
        flair: PathBuf,

        /// 输出目录, 缺省为 `$HOME/dataset/mri-berry`.
        #[arg(long, env = "MRI_BERRY_OUT")]
        out: Option<PathBuf>,

        /// 最大显示点数.
        #[arg(long, default_value_t = BRAIN_POINT_CAP)]
        cap: usize,
    },

    /// 测量分割标签中的肿瘤, 并导出显示点云.
    Tumor {
        /// 分割标签 nii 文件.
        #[arg(long, env = "MRI_BERRY_SEG")]
        seg: PathBuf,

        /// FLAIR 扫描 nii 文件. 若给出, 则检查其与标签形状一致.
        #[arg(long, env = "MRI_BERRY_FLAIR")]
        flair: Option<PathBuf>,

        /// 输出目录, 缺省为 `$HOME/dataset/mri-berry`.
        #[arg(long, env = "MRI_BERRY_OUT")]
        out: Option<PathBuf>,

        /// 视为肿瘤的子区域.
        #[arg(long, value_enum, default_value_t = Region::Whole)]
        region: Region,

        /// 覆盖 header 中的体素分辨率 (毫米), 按 x y z 给出.
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        spacing: Option<Vec<f64>>,

        /// 最大显示点数.
        #[arg(long, default_value_t = TUMOR_POINT_CAP)]
        cap: usize,
    },

    /// 提取 2D 灰度切片的 ROI 并保存为图片.
    Slice {
        /// 单通道灰度图.
        image: PathBuf,

        /// 输出图片路径, 缺省为输出目录下的 `slice_roi.png`.
        #[arg(long)]
        output: Option<PathBuf>,

        /// 输出目录, 缺省为 `$HOME/dataset/mri-berry`.
        #[arg(long, env = "MRI_BERRY_OUT")]
        out: Option<PathBuf>,

        /// 中值滤波核大小, 必须为正奇数.
        #[arg(long, default_value_t = DEFAULT_MEDIAN_KERNEL)]
        kernel: usize,

        /// 跳过线性归一化, 仅降噪.
        #[arg(long)]
        no_norm: bool,
    },
}

/// 包围盒的 `2^n` 个角点 -> `2^n x n` 矩阵, 供外部渲染线框.
fn corners_array(bbox: &BoundingBox) -> Array2<u64> {
    let corners = bbox.corners();
    Array2::from_shape_fn((corners.len(), bbox.ndim()), |(i, k)| corners[i][k] as u64)
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn run_brain(flair: &Path, out: Option<PathBuf>, config: &ExploreConfig) -> anyhow::Result<()> {
    loader::check_input(flair)?;
    let out = loader::out_dir_from_arg_or_home(out)?;
    let volume = MriVolume::open(flair).with_context(|| format!("Loading {}", flair.display()))?;

    let mut rng = rng_from(config.seed);
    let roi = BrainRoi::extract(&volume.data(), config, &mut rng)?;

    let mut stdout = io::stdout().lock();
    report::sep_to(&mut stdout)?;
    report::describe_brain_into(&roi, &mut stdout)?;
    report::sep_to(&mut stdout)?;

    roi.points()
        .write_points_npy(out.join("brain_points.npy"))?;
    write_npy(out.join("brain_box.npy"), &corners_array(&roi.local_box()))?;
    info!("Results saved to {}", out.display());
    Ok(())
}

fn run_tumor(
    seg: &Path,
    flair: Option<&Path>,
    out: Option<PathBuf>,
    config: &ExploreConfig,
) -> anyhow::Result<()> {
    loader::check_input(seg)?;
    let label = match flair {
        Some(flair) => {
            loader::check_input(flair)?;
            MriStudy::open(flair, seg)?.seg().clone()
        }
        None => MriLabel::open(seg).with_context(|| format!("Loading {}", seg.display()))?,
    };

    let mut rng = rng_from(config.seed);
    let result = TumorReport::measure(&label.data(), &label.spacing(), config, &mut rng);

    let mut stdout = io::stdout().lock();
    report::sep_to(&mut stdout)?;
    report::describe_tumor_into(result.as_ref(), &mut stdout)?;
    report::sep_to(&mut stdout)?;
    stdout.flush()?;

    match result {
        Ok(report) => {
            let out = loader::out_dir_from_arg_or_home(out)?;
            report
                .points()
                .write_points_npy(out.join("tumor_points.npy"))?;
            write_npy(
                out.join("tumor_box.npy"),
                &corners_array(report.measurement().bounding_box()),
            )?;
            info!("Results saved to {}", out.display());
            Ok(())
        }
        // 没有肿瘤是正常结果, 已经在报告中说明.
        Err(e) if e.is_empty_region() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn run_slice(
    image: &Path,
    output: Option<PathBuf>,
    out: Option<PathBuf>,
    kernel: usize,
    no_norm: bool,
) -> anyhow::Result<()> {
    loader::check_input(image)?;
    let output = match output {
        Some(p) => p,
        None => loader::out_dir_from_arg_or_home(out)?.join("slice_roi.png"),
    };
    let gray = open_gray_image(image).with_context(|| format!("Loading {}", image.display()))?;

    let mut stdout = io::stdout().lock();
    report::sep_to(&mut stdout)?;
    if no_norm {
        let roi = SliceRoi::denoised(&gray, kernel)?;
        report::describe_slice_into(&roi, &mut stdout)?;
        roi.save(&output)?;
    } else {
        let roi = SliceRoi::normalized(&gray, kernel)?;
        report::describe_slice_into(&roi, &mut stdout)?;
        roi.save(&output)?;
    }
    report::sep_to(&mut stdout)?;
    info!("ROI saved to {}", output.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(cli.log_level)
        .init()?;

    let mut config = ExploreConfig {
        seed: cli.seed,
        ..Default::default()
    };

    match cli.command {
        Command::Brain { flair, out, cap } => {
            config.brain_cap = cap;
            run_brain(&flair, out, &config)
        }
        Command::Tumor {
            seg,
            flair,
            out,
            region,
            spacing,
            cap,
        } => {
            config.tumor_cap = cap;
            config.labels = region.into();
            config.spacing = spacing.map(VoxelSpacing::new).transpose()?;
            run_tumor(&seg, flair.as_deref(), out, &config)
        }
        Command::Slice {
            image,
            output,
            out,
            kernel,
            no_norm,
        } => run_slice(&image, output, out, kernel, no_norm),
    }
}
