//! 设置文件读写
//!
//! 设置以 JSON 形式保存 `DetectConfig`，缺省字段回落到默认值，文件不存在时直接使用默认配置。

use std::fs;
use std::path::{Path, PathBuf};

use crate::detector::DetectConfig;
use crate::error::AppError;

const SETTINGS_FILE_NAME: &str = "settings.json";

/// 目录下设置文件的路径（目录不存在时自动创建）。
pub fn settings_file_path(dir: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::Settings(format!("创建设置目录失败: {}", e)))?;
    Ok(dir.join(SETTINGS_FILE_NAME))
}

pub fn load_settings(path: &Path) -> Result<DetectConfig, AppError> {
    if !path.exists() {
        log::debug!("设置文件不存在，使用默认配置: {}", path.display());
        return Ok(DetectConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<DetectConfig>(&content)
        .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;

    log::info!("已加载设置: {} (threshold={})", path.display(), parsed.threshold);
    Ok(parsed)
}

pub fn save_settings(path: &Path, config: &DetectConfig) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}
