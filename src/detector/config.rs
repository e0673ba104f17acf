//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `DetectConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中灵敏度档位（strict / balanced / lenient）作为高层语义，映射到底层阈值与滤镜组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供与原始工具一致的默认值（阈值 10、256 个直方图桶）。
//! - `SensitivityProfile` 负责档位字符串解析与反向输出。
//! - `apply_sensitivity_profile` 将档位转换为具体参数。
//! - `infer_sensitivity_profile` 用于从当前配置反推档位（给 CLI 展示状态）。

use fast_image_resize as fr;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::DetectError;

/// 差分掩码默认阈值：差值严格大于该值才视为“被篡改”。
pub const DEFAULT_THRESHOLD: u8 = 10;

/// 直方图桶数量，每个整数灰度一个桶。
pub const HISTOGRAM_BINS: usize = 256;

/// 尺寸对齐时使用的重采样滤镜。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub(crate) fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub(crate) fn to_fast_filter(self) -> fr::FilterType {
        match self {
            Self::Nearest => fr::FilterType::Box,
            Self::Triangle => fr::FilterType::Bilinear,
            Self::CatmullRom => fr::FilterType::CatmullRom,
            Self::Gaussian => fr::FilterType::Gaussian,
            Self::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

/// 检测配置。
///
/// 字段覆盖了加载限制、尺寸对齐与掩码阈值三个阶段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// 掩码阈值，`|a - b| > threshold` 的像素记为 255。
    pub threshold: u8,
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 尺寸对齐使用的滤镜。
    pub resize_filter: ResizeFilter,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: ResizeFilter::Lanczos3,
        }
    }
}

/// 检测灵敏度档位（面向用户语义）。
///
/// - `Strict`：任何像素变化都计入掩码
/// - `Balanced`：默认阈值，过滤轻微噪声
/// - `Lenient`：压制有损压缩带来的细小差异
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitivityProfile {
    Strict,
    Balanced,
    Lenient,
}

impl SensitivityProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use tamper_detect::detector::SensitivityProfile;
    ///
    /// let p = SensitivityProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), tamper_detect::detector::DetectError>(())
    /// ```
    pub fn from_str(profile: &str) -> Result<Self, DetectError> {
        match profile.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "balanced" => Ok(Self::Balanced),
            "lenient" => Ok(Self::Lenient),
            other => Err(DetectError::InvalidFormat(format!(
                "未知灵敏度档位：{}（可选：strict / balanced / lenient）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Lenient => "lenient",
        }
    }
}

const LENIENT_THRESHOLD: u8 = 25;

impl DetectConfig {
    /// 基于当前参数反推灵敏度档位。
    pub fn infer_sensitivity_profile(&self) -> SensitivityProfile {
        if self.threshold == 0 {
            return SensitivityProfile::Strict;
        }

        if self.threshold >= LENIENT_THRESHOLD {
            return SensitivityProfile::Lenient;
        }

        SensitivityProfile::Balanced
    }

    /// 应用指定灵敏度档位到实际参数。
    pub fn apply_sensitivity_profile(&mut self, profile: SensitivityProfile) {
        match profile {
            SensitivityProfile::Strict => {
                self.threshold = 0;
                self.resize_filter = ResizeFilter::Lanczos3;
            }
            SensitivityProfile::Balanced => {
                self.threshold = DEFAULT_THRESHOLD;
                self.resize_filter = ResizeFilter::Lanczos3;
            }
            SensitivityProfile::Lenient => {
                self.threshold = LENIENT_THRESHOLD;
                self.resize_filter = ResizeFilter::CatmullRom;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_constants() {
        let config = DetectConfig::default();
        assert_eq!(config.threshold, 10);
        assert_eq!(config.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.infer_sensitivity_profile(), SensitivityProfile::Balanced);
    }

    #[test]
    fn fast_and_fallback_filters_agree() {
        assert!(matches!(ResizeFilter::Gaussian.to_fast_filter(), fr::FilterType::Gaussian));
        assert!(matches!(ResizeFilter::Gaussian.to_image_filter(), FilterType::Gaussian));
        assert!(matches!(ResizeFilter::CatmullRom.to_fast_filter(), fr::FilterType::CatmullRom));
        assert!(matches!(ResizeFilter::Lanczos3.to_fast_filter(), fr::FilterType::Lanczos3));
    }

    #[test]
    fn profile_round_trips_through_config() {
        for profile in [
            SensitivityProfile::Strict,
            SensitivityProfile::Balanced,
            SensitivityProfile::Lenient,
        ] {
            let mut config = DetectConfig::default();
            config.apply_sensitivity_profile(profile);
            assert_eq!(config.infer_sensitivity_profile(), profile);
            assert_eq!(SensitivityProfile::from_str(profile.as_str()).unwrap(), profile);
        }
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result = SensitivityProfile::from_str("paranoid");
        assert!(matches!(result, Err(DetectError::InvalidFormat(_))));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DetectConfig =
            serde_json::from_str(r#"{"threshold": 42, "resize_filter": "catmull_rom"}"#).unwrap();
        assert_eq!(config.threshold, 42);
        assert_eq!(config.resize_filter, ResizeFilter::CatmullRom);
        assert_eq!(config.max_file_size, DetectConfig::default().max_file_size);
    }
}
