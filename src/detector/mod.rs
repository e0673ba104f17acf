//! # 篡改检测模块（detector）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 摘要快速判等 → 灰度化 → 尺寸对齐 → 差分掩码 → 直方图统计”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条检测流水线
//! - `loader`：负责文件 / 内存 / Base64 加载与安全校验、解码
//! - `hasher`：像素内容摘要（SHA-256）
//! - `reconcile`：尺寸对齐（只缩放待检图）
//! - `diff`：绝对差分与阈值掩码
//! - `histogram`：256 桶灰度直方图
//! - `array/outcome`：像素数组与检测结果模型
//! - `config/error/source`：配置、错误、输入来源
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方（CLI / 测试）
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积 / 像素限制 + 解码）
//!    ├─ hasher.rs（形状相同且摘要相同 → 提前返回 identical）
//!    ├─ reconcile.rs（待检图缩放到原图尺寸）
//!    ├─ diff.rs（|a-b| 与掩码）
//!    └─ histogram.rs（原图 / 待检图 / 掩码）
//!    ↓
//! DetectionOutcome（只读，交给展示 / 导出 / 持久化）
//! ```
//!
//! ## 分层职责建议
//!
//! - 阈值与滤镜策略变更优先改 `config.rs`
//! - 流程顺序变更优先改 `handler.rs`
//! - 单阶段行为优化分别改 `loader/reconcile/diff/histogram`

mod array;
mod config;
pub mod diff;
mod error;
mod handler;
pub mod hasher;
pub mod histogram;
mod loader;
mod outcome;
pub mod reconcile;
mod source;

pub use array::{GrayArray, NativeImage};
pub use config::{DEFAULT_THRESHOLD, DetectConfig, HISTOGRAM_BINS, ResizeFilter, SensitivityProfile};
pub use diff::{DifferenceResult, diff};
pub use error::DetectError;
pub use handler::TamperDetector;
pub use hasher::{ImageDigest, digest};
pub use histogram::{Histogram, histogram};
pub use loader::ImageLoader;
pub use outcome::{DetectionOutcome, HistogramSet};
pub use reconcile::reconcile;
pub use source::ImageSource;
