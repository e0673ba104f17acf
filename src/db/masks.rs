//! 掩码读写子模块
//!
//! ## 职责
//! - 保存掩码 PNG 与元数据
//! - 按用户列出、按 id 读取 / 删除
//!
//! ## 错误语义
//! - SQL 失败统一映射为 `AppError::Database`
//! - PNG 编解码失败以 `AppError::Detect` 透传

use rusqlite::{params, Connection, OptionalExtension};

use crate::detector::GrayArray;
use crate::detector::diff::MASK_ON;
use crate::error::AppError;

use super::{MaskRecord, MaskStore};

fn insert_mask(
    conn: &Connection,
    user_id: i64,
    png: &[u8],
    width: usize,
    height: usize,
    changed_pixels: usize,
) -> Result<i64, AppError> {
    let now = chrono::Local::now().timestamp_millis();
    conn.execute(
        "INSERT INTO images (image_data, user_id, width, height, changed_pixels, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![png, user_id, width as i64, height as i64, changed_pixels as i64, now],
    ).map_err(|e| AppError::Database(format!("保存掩码失败: {}", e)))?;

    Ok(conn.last_insert_rowid())
}

fn list_masks(conn: &Connection, user_id: i64, limit: i64) -> Result<Vec<MaskRecord>, AppError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, user_id, width, height, changed_pixels, created_at, length(image_data)
             FROM images
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        )
        .map_err(|e| AppError::Database(format!("准备查询失败: {}", e)))?;

    let records = stmt
        .query_map(params![user_id, limit], |row| {
            Ok(MaskRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                width: row.get(2)?,
                height: row.get(3)?,
                changed_pixels: row.get(4)?,
                created_at: row.get(5)?,
                byte_size: row.get(6)?,
            })
        })
        .map_err(|e| AppError::Database(format!("查询掩码失败: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(format!("读取行失败: {}", e)))?;

    Ok(records)
}

fn load_mask_bytes(conn: &Connection, id: i64) -> Result<Option<Vec<u8>>, AppError> {
    conn.query_row(
        "SELECT image_data FROM images WHERE id = ?1",
        params![id],
        |row| row.get::<_, Vec<u8>>(0),
    )
    .optional()
    .map_err(|e| AppError::Database(format!("读取掩码失败: {}", e)))
}

impl MaskStore {
    /// 编码为 PNG 后保存，返回新行 id。
    pub fn save_mask(&self, user_id: i64, mask: &GrayArray) -> Result<i64, AppError> {
        let png = mask.encode_png()?;
        let changed = mask.count_value(MASK_ON);
        let id = self.with_conn(|conn| {
            insert_mask(conn, user_id, &png, mask.width(), mask.height(), changed)
        })?;

        log::info!(
            "💾 掩码已保存 - id={} user={} {}x{} changed={} size={}KB",
            id,
            user_id,
            mask.width(),
            mask.height(),
            changed,
            png.len() / 1024
        );
        Ok(id)
    }

    /// 保存已编码好的 PNG 字节；字节必须能解码为图像。
    pub fn save_mask_bytes(&self, user_id: i64, png: &[u8]) -> Result<i64, AppError> {
        let mask = GrayArray::decode_png(png)?;
        self.with_conn(|conn| {
            insert_mask(conn, user_id, png, mask.width(), mask.height(), mask.count_value(MASK_ON))
        })
    }

    pub fn list_masks(&self, user_id: i64, limit: i64) -> Result<Vec<MaskRecord>, AppError> {
        self.with_conn(|conn| list_masks(conn, user_id, limit))
    }

    pub fn load_mask_bytes(&self, id: i64) -> Result<Option<Vec<u8>>, AppError> {
        self.with_conn(|conn| load_mask_bytes(conn, id))
    }

    pub fn load_mask(&self, id: i64) -> Result<Option<GrayArray>, AppError> {
        match self.load_mask_bytes(id)? {
            Some(bytes) => Ok(Some(GrayArray::decode_png(&bytes)?)),
            None => Ok(None),
        }
    }

    /// 删除指定掩码，返回是否确有删除。
    pub fn delete_mask(&self, id: i64) -> Result<bool, AppError> {
        self.with_conn(|conn| {
            let affected = conn
                .execute("DELETE FROM images WHERE id = ?1", params![id])
                .map_err(|e| AppError::Database(format!("删除掩码失败: {}", e)))?;
            Ok(affected > 0)
        })
    }

    pub fn count_masks(&self, user_id: i64) -> Result<i64, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM images WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Database(format!("查询掩码数量失败: {}", e)))
        })
    }
}
