//! # 检测结果模型
//!
//! 每次检测构造一个 `DetectionOutcome`，构造后只读。
//! 展示、导出、持久化等下游只读取这里的字段，不回调流水线。

use serde::Serialize;

use super::array::GrayArray;
use super::diff::MASK_ON;
use super::hasher::ImageDigest;
use super::histogram::Histogram;

/// 三张图各自的直方图。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramSet {
    pub original: Histogram,
    pub tampered: Histogram,
    pub mask: Histogram,
}

/// 单次检测结果。
///
/// `identical == true` 时流水线在摘要比较处提前返回，数组与直方图均为 `None`。
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub identical: bool,
    pub original: Option<GrayArray>,
    /// 已对齐到原图尺寸的待检图。
    pub tampered: Option<GrayArray>,
    pub mask: Option<GrayArray>,
    pub histograms: Option<HistogramSet>,
    pub threshold: u8,
    pub original_digest: ImageDigest,
    pub tampered_digest: ImageDigest,
    /// 加载后（灰度化之前）的 `(height, width, channels)`。
    pub original_shape: (usize, usize, usize),
    pub tampered_shape: (usize, usize, usize),
}

impl DetectionOutcome {
    pub(crate) fn identical(
        threshold: u8,
        digest: ImageDigest,
        shape: (usize, usize, usize),
    ) -> Self {
        Self {
            identical: true,
            original: None,
            tampered: None,
            mask: None,
            histograms: None,
            threshold,
            original_digest: digest,
            tampered_digest: digest,
            original_shape: shape,
            tampered_shape: shape,
        }
    }

    /// 掩码中被标记的像素数量；完全一致时为 0。
    pub fn changed_pixels(&self) -> u64 {
        self.histograms
            .as_ref()
            .map(|set| set.mask.count(MASK_ON))
            .unwrap_or(0)
    }

    /// 被标记像素占比，范围 `[0, 1]`。
    pub fn changed_ratio(&self) -> f64 {
        let total = self
            .histograms
            .as_ref()
            .map(|set| set.mask.total())
            .unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        self.changed_pixels() as f64 / total as f64
    }

    /// 是否存在任意被标记的像素。
    pub fn has_tampering(&self) -> bool {
        self.changed_pixels() > 0
    }
}
