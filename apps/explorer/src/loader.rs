//! 输入输出路径的解析.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};

/// 获取输出目录, 必要时创建.
///
/// 1. 若命令行给出了 `--out` (或环境变量 `$MRI_BERRY_OUT` 非空), 则使用其值;
/// 2. 否则, 使用 `$HOME/dataset/mri-berry`.
pub fn out_dir_from_arg_or_home(out: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match out {
        Some(d) => d,
        None => mri_berry::home_dataset_dir_with(["mri-berry"])
            .context("Cannot locate home directory, please specify `--out`")?,
    };
    fs::create_dir_all(&dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    Ok(dir)
}

/// 检查输入文件是否存在.
pub fn check_input(path: &Path) -> anyhow::Result<()> {
    ensure!(path.is_file(), "Input file {} does not exist", path.display());
    Ok(())
}
