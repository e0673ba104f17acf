//! 数据库模块
//!
//! # 设计思路
//!
//! 检测核心只负责产出掩码，不关心存储结构；本模块接收掩码（或其 PNG 字节）与调用方给出的
//! 用户 id，写入 SQLite 的 `images` 表。使用 `rusqlite` 直接操作 SQLite。
//!
//! # 优势
//!
//! - **类型安全**：Rust struct + serde，编译期保证数据结构正确
//! - **一致性**：Schema 版本化迁移，旧库可直接升级
//! - **隔离性**：持久化失败不影响已经得到的检测结果

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;

use crate::error::AppError;

mod masks;
mod schema;

// ============================================================================
// 数据模型
// ============================================================================

/// 已保存掩码的元数据（不含图像字节）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskRecord {
    pub id: i64,
    pub user_id: i64,
    pub width: i64,
    pub height: i64,
    pub changed_pixels: i64,
    pub created_at: i64,
    pub byte_size: i64,
}

// ============================================================================
// 数据库状态
// ============================================================================

/// 掩码存储，内部以互斥锁包装单个连接
pub struct MaskStore(pub Mutex<Connection>);

impl MaskStore {
    pub(crate) fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> Result<T, AppError>) -> Result<T, AppError> {
        let conn = self.0.lock().map_err(|e| {
            AppError::Database(format!("获取数据库锁失败: {}", e))
        })?;
        op(&conn)
    }
}

// ============================================================================
// 数据库初始化
// ============================================================================

/// 打开（必要时创建）数据库文件并初始化 Schema
pub fn open_store(db_path: &Path) -> Result<MaskStore, AppError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("创建数据库目录失败: {}", e))
            })?;
        }
    }
    log::info!("数据库路径: {}", db_path.display());

    let conn = Connection::open(db_path).map_err(|e| {
        AppError::Database(format!("打开数据库失败: {}", e))
    })?;

    schema::initialize_schema(&conn)?;

    Ok(MaskStore(Mutex::new(conn)))
}

/// 内存数据库，主要用于测试
pub fn open_in_memory() -> Result<MaskStore, AppError> {
    let conn = Connection::open_in_memory().map_err(|e| {
        AppError::Database(format!("打开内存数据库失败: {}", e))
    })?;

    schema::initialize_schema(&conn)?;

    Ok(MaskStore(Mutex::new(conn)))
}
