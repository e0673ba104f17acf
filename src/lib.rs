//! # 图片篡改检测工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CLI (main.rs, clap)                      │
//! │   detect / history / export-mask                          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            核心 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ detector ─── 加载·摘要·对齐·差分·直方图              │
//! │  │                                                       │
//! │  ├─ report ───── PNG 报告 + JSON 摘要                    │
//! │  ├─ db ───────── SQLite (rusqlite) 掩码存储              │
//! │  ├─ storage      输出目录 (返回 Result)                   │
//! │  └─ settings     JSON 设置文件 → DetectConfig             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`detector`] | 检测流水线与 `DetectionOutcome` |
//! | [`report`] | 将检测结果导出为 PNG 报告与 JSON 摘要 |
//! | [`db`] | 掩码 PNG 的 SQLite 持久化 |
//! | [`storage`] | 输出目录的获取与自动创建 |
//! | [`settings`] | 设置文件读写 |

pub mod error;
pub mod db;
pub mod detector;
pub mod report;
pub mod settings;
pub mod storage;
