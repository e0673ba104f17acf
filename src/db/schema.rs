//! Schema 初始化子模块
//!
//! ## 职责
//! - 创建/迁移 `images` 表结构与索引
//! - 设置 SQLite 运行参数（WAL）
//!
//! ## 版本
//! - v1：`images(id, image_data, user_id)`，与早期只存掩码字节的库兼容
//! - v2：补充 `width / height / changed_pixels / created_at` 元数据列与索引
//!
//! ## 错误语义
//! - DDL 失败统一映射为 `AppError::Database`

use rusqlite::Connection;

use crate::error::AppError;

const SCHEMA_VERSION: i64 = 2;

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Database(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Database(format!("写入数据库版本失败: {}", e)))
}

fn create_images_table(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            image_data BLOB NOT NULL,
            user_id INTEGER NOT NULL
        );"
    ).map_err(|e| AppError::Database(format!("创建掩码表失败: {}", e)))
}

fn add_metadata_columns(conn: &Connection) -> Result<(), AppError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Database(format!("开始 v2 迁移事务失败: {}", e)))?;

    tx.execute_batch(
        "ALTER TABLE images ADD COLUMN width INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE images ADD COLUMN height INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE images ADD COLUMN changed_pixels INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE images ADD COLUMN created_at INTEGER NOT NULL DEFAULT 0;
         CREATE INDEX IF NOT EXISTS idx_images_user_created ON images(user_id, created_at DESC);"
    ).map_err(|e| AppError::Database(format!("执行 v2 元数据迁移失败: {}", e)))?;

    tx.commit()
        .map_err(|e| AppError::Database(format!("提交 v2 迁移事务失败: {}", e)))
}

pub(super) fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .ok();

    create_images_table(conn)?;

    let mut version = get_user_version(conn)?;
    if version < 1 {
        set_user_version(conn, 1)?;
        version = 1;
    }

    if version < 2 {
        add_metadata_columns(conn)?;
        set_user_version(conn, 2)?;
        version = 2;
    }

    if version != SCHEMA_VERSION {
        return Err(AppError::Database(format!(
            "数据库版本不匹配: current={}, expected={}",
            version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::{params, Connection};

    use super::initialize_schema;

    #[test]
    fn initialize_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("create memory db");

        initialize_schema(&conn).expect("first init should succeed");
        initialize_schema(&conn).expect("second init should succeed");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='images'", [], |row| row.get(0))
            .expect("query table count");
        assert_eq!(count, 1);

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .expect("query user_version");
        assert_eq!(version, 2);
    }

    #[test]
    fn v1_rows_survive_migration() {
        let conn = Connection::open_in_memory().expect("create memory db");
        conn.execute_batch(
            "CREATE TABLE images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image_data BLOB NOT NULL,
                user_id INTEGER NOT NULL
             );
             PRAGMA user_version = 1;"
        ).expect("create legacy table");
        conn.execute(
            "INSERT INTO images (image_data, user_id) VALUES (?1, ?2)",
            params![vec![1u8, 2, 3], 7],
        ).expect("insert legacy row");

        initialize_schema(&conn).expect("migration should succeed");

        let (user_id, width): (i64, i64) = conn
            .query_row("SELECT user_id, width FROM images", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("read migrated row");
        assert_eq!(user_id, 7);
        assert_eq!(width, 0);
    }
}
