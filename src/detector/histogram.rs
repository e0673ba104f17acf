//! # 直方图模块
//!
//! 每个整数灰度一个桶（0..=255），只返回纯数据，绘制交给展示 / 导出层。

use serde::Serialize;

use super::array::GrayArray;
use super::config::HISTOGRAM_BINS;

/// 256 桶灰度直方图，`bins[k]` 为灰度恰好为 `k` 的样本数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    #[serde(with = "bins_as_seq")]
    bins: [u64; HISTOGRAM_BINS],
}

impl Histogram {
    pub fn bins(&self) -> &[u64; HISTOGRAM_BINS] {
        &self.bins
    }

    pub fn count(&self, level: u8) -> u64 {
        self.bins[level as usize]
    }

    /// 样本总数，恒等于源数组的 `height * width`。
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().copied().max().unwrap_or(0)
    }

    /// 非空桶的 `(最小灰度, 最大灰度)`；空直方图返回 `None`。
    pub fn occupied_range(&self) -> Option<(u8, u8)> {
        let first = self.bins.iter().position(|&count| count > 0)?;
        let last = self.bins.iter().rposition(|&count| count > 0)?;
        Some((first as u8, last as u8))
    }

    /// 按样本计算的平均灰度；空直方图返回 `None`。
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(level, &count)| level as f64 * count as f64)
            .sum();
        Some(weighted / total as f64)
    }
}

/// 统计数组的灰度直方图。
pub fn histogram(image: &GrayArray) -> Histogram {
    let mut bins = [0u64; HISTOGRAM_BINS];
    for &sample in image.as_bytes() {
        bins[sample as usize] += 1;
    }
    Histogram { bins }
}

mod bins_as_seq {
    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(bins: &[u64; super::HISTOGRAM_BINS], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(bins.iter())
    }
}
