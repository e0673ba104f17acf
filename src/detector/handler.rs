//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `TamperDetector` 只负责流程编排与配置管理，不直接与 CLI / 数据库绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 加载两张图的原生表示，比较形状与摘要（一致则提前返回）
//! 3. 灰度化
//! 4. 将待检图对齐到原图尺寸
//! 5. 差分 + 阈值掩码
//! 6. 三张图分别统计直方图
//!
//! ## 实现思路
//!
//! - 配置通过 `RwLock<DetectConfig>` 支持运行时切档，`&TamperDetector` 可跨线程共享。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 每张图只解码一次，原生表示与灰度表示都由同一个解码结果派生。
//! - 记录 `load/diff/histogram/total` 阶段耗时，便于性能诊断。

use std::sync::RwLock;
use std::time::Instant;

use super::array::{GrayArray, NativeImage};
use super::loader::ImageLoader;
use super::outcome::{DetectionOutcome, HistogramSet};
use super::{diff, hasher, histogram, reconcile};
use super::{DetectConfig, DetectError, ImageSource, SensitivityProfile};

/// 图片篡改检测器。
pub struct TamperDetector {
    config: RwLock<DetectConfig>,
}

impl Default for TamperDetector {
    fn default() -> Self {
        Self::new(DetectConfig::default())
    }
}

impl TamperDetector {
    pub fn new(config: DetectConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<DetectConfig, DetectError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| DetectError::Internal("配置读取锁已中毒".to_string()))
    }

    pub fn set_threshold(&self, threshold: u8) -> Result<(), DetectError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| DetectError::Internal("配置写入锁已中毒".to_string()))?;
        config.threshold = threshold;
        Ok(())
    }

    /// 设置灵敏度档位。
    ///
    /// # 示例
    /// ```rust
    /// use tamper_detect::detector::{SensitivityProfile, TamperDetector};
    ///
    /// let detector = TamperDetector::default();
    /// detector.set_sensitivity_profile(SensitivityProfile::Lenient)?;
    /// assert_eq!(detector.sensitivity_profile()?, SensitivityProfile::Lenient);
    /// # Ok::<(), tamper_detect::detector::DetectError>(())
    /// ```
    pub fn set_sensitivity_profile(&self, profile: SensitivityProfile) -> Result<(), DetectError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| DetectError::Internal("配置写入锁已中毒".to_string()))?;
        config.apply_sensitivity_profile(profile);

        log::info!(
            "⚙️ 已切换灵敏度档位：{:?}（threshold={}, filter={:?}）",
            profile,
            config.threshold,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn sensitivity_profile(&self) -> Result<SensitivityProfile, DetectError> {
        let config = self
            .config
            .read()
            .map_err(|_| DetectError::Internal("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_sensitivity_profile())
    }

    /// 使用当前配置的阈值执行检测。
    pub fn detect(
        &self,
        original: &ImageSource,
        tampered: &ImageSource,
    ) -> Result<DetectionOutcome, DetectError> {
        let config = self.config_snapshot()?;
        Self::run(original, tampered, &config)
    }

    /// 使用指定阈值执行检测（不修改检测器配置）。
    pub fn detect_with_threshold(
        &self,
        original: &ImageSource,
        tampered: &ImageSource,
        threshold: u8,
    ) -> Result<DetectionOutcome, DetectError> {
        let mut config = self.config_snapshot()?;
        config.threshold = threshold;
        Self::run(original, tampered, &config)
    }

    fn run(
        original: &ImageSource,
        tampered: &ImageSource,
        config: &DetectConfig,
    ) -> Result<DetectionOutcome, DetectError> {
        let total_start = Instant::now();
        let loader = ImageLoader::new(config);

        let load_start = Instant::now();
        let original_image = loader.load_dynamic(original)?;
        let tampered_image = loader.load_dynamic(tampered)?;

        let original_native = NativeImage::from_dynamic(&original_image);
        let tampered_native = NativeImage::from_dynamic(&tampered_image);
        let original_digest = hasher::digest_native(&original_native);
        let tampered_digest = hasher::digest_native(&tampered_native);
        let load_elapsed = load_start.elapsed();

        // 形状必须先于摘要比较：摘要只覆盖内容字节
        if original_native.shape() == tampered_native.shape() && original_digest == tampered_digest {
            log::info!(
                "✅ 两张图完全一致，跳过差分 - digest={} load={}ms",
                original_digest,
                load_elapsed.as_millis()
            );
            return Ok(DetectionOutcome::identical(
                config.threshold,
                original_digest,
                original_native.shape(),
            ));
        }

        let original_shape = original_native.shape();
        let tampered_shape = tampered_native.shape();
        drop(original_native);
        drop(tampered_native);

        let original_gray = GrayArray::from_dynamic(original_image);
        let tampered_gray = GrayArray::from_dynamic(tampered_image);

        let diff_start = Instant::now();
        let tampered_gray = reconcile::reconcile(&original_gray, tampered_gray, config.resize_filter);
        let difference = diff::diff(&original_gray, &tampered_gray, config.threshold)?;
        let diff_elapsed = diff_start.elapsed();

        let histogram_start = Instant::now();
        let histograms = HistogramSet {
            original: histogram::histogram(&original_gray),
            tampered: histogram::histogram(&tampered_gray),
            mask: histogram::histogram(&difference.mask),
        };
        let histogram_elapsed = histogram_start.elapsed();

        let outcome = DetectionOutcome {
            identical: false,
            original: Some(original_gray),
            tampered: Some(tampered_gray),
            mask: Some(difference.mask),
            histograms: Some(histograms),
            threshold: config.threshold,
            original_digest,
            tampered_digest,
            original_shape,
            tampered_shape,
        };

        log::info!(
            "✅ 检测完成 - changed={} ({:.4}%) threshold={} load={}ms diff={}ms histogram={}ms total={}ms",
            outcome.changed_pixels(),
            outcome.changed_ratio() * 100.0,
            config.threshold,
            load_elapsed.as_millis(),
            diff_elapsed.as_millis(),
            histogram_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(outcome)
    }
}
