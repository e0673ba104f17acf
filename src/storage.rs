//! 输出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理掩码、报告等导出文件的存放路径，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用用户指定的自定义目录。
//! - 未设置时回退到当前工作目录下的 `tamper_output` 子目录。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const DEFAULT_OUTPUT_DIR: &str = "tamper_output";

/// 输出目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取输出目录
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的输出目录
/// - `Err(AppError::Storage)` — 无法获取或创建目录
pub fn get_output_dir(custom_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir {
        if !dir.as_os_str().is_empty() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    AppError::Storage(format!("创建自定义目录 '{}' 失败: {}", dir.display(), e))
                })?;
            }
            return Ok(dir.to_path_buf());
        }
    }

    let cwd = std::env::current_dir()
        .map_err(|e| AppError::Storage(format!("获取当前目录失败: {}", e)))?;
    let output_dir = cwd.join(DEFAULT_OUTPUT_DIR);
    if !output_dir.exists() {
        fs::create_dir_all(&output_dir)
            .map_err(|e| AppError::Storage(format!("创建输出目录失败: {}", e)))?;
    }
    Ok(output_dir)
}

/// 获取输出目录信息（路径 + 占用大小 + 文件数）
pub fn output_dir_info(dir: &Path) -> StorageInfo {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("a").join("b");

        let dir = get_output_dir(Some(&target)).unwrap();
        assert_eq!(dir, target);
        assert!(dir.is_dir());
    }

    #[test]
    fn info_counts_files() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("one.png"), [0u8; 10]).unwrap();
        fs::write(root.path().join("two.png"), [0u8; 5]).unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();

        let info = output_dir_info(root.path());
        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 15);
    }
}
