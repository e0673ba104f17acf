//! # 加载与解码模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / 内存字节 / Base64）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! 1. 文件：存在性 + metadata 体积限制 + 读取（句柄只在本函数内存活）
//! 2. Base64：格式解析 + 解码前体积估算
//! 3. 文件签名校验（`infer`，未知签名再交给 `image::guess_format`）
//! 4. 读取 header 尺寸，按像素 / 内存上限快速拒绝
//! 5. 完整解码，输出 `NativeImage` 或灰度 `GrayArray`

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

use super::array::{GrayArray, NativeImage};
use super::source::RawImageData;
use super::{DetectConfig, DetectError, ImageSource};

/// 图片加载器：来源 → 原始字节 → 解码图像。
pub struct ImageLoader<'a> {
    config: &'a DetectConfig,
}

impl<'a> ImageLoader<'a> {
    pub fn new(config: &'a DetectConfig) -> Self {
        Self { config }
    }

    /// 加载并转换为单通道 8 位灰度数组。
    pub fn load(&self, source: &ImageSource) -> Result<GrayArray, DetectError> {
        let decoded = self.load_dynamic(source)?;
        Ok(GrayArray::from_dynamic(decoded))
    }

    /// 加载并保留原始通道数（用于快速相等判断）。
    pub fn load_native(&self, source: &ImageSource) -> Result<NativeImage, DetectError> {
        let decoded = self.load_dynamic(source)?;
        Ok(NativeImage::from_dynamic(&decoded))
    }

    /// 加载并完整解码，供流水线在一次解码后同时产出原生表示与灰度表示。
    pub(crate) fn load_dynamic(&self, source: &ImageSource) -> Result<DynamicImage, DetectError> {
        let raw = self.load_raw(source)?;
        self.decode(raw)
    }

    fn load_raw(&self, source: &ImageSource) -> Result<RawImageData, DetectError> {
        let bytes = match source {
            ImageSource::FilePath(path) => self.read_file(path)?,
            ImageSource::Bytes(bytes) => {
                if bytes.len() as u64 > self.config.max_file_size {
                    return Err(Self::size_limit_error("内存图片", bytes.len() as u64, self.config.max_file_size));
                }
                bytes.clone()
            }
            ImageSource::Base64(data) => {
                log::debug!("📝 开始处理 base64 图片");
                Self::parse_base64_with_limit(data, self.config.max_file_size)?
            }
        };

        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: source.hint(),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, DetectError> {
        log::debug!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(DetectError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| DetectError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if !metadata.is_file() {
            return Err(DetectError::FileSystem(format!("不是普通文件：{}", path.display())));
        }

        if metadata.len() > self.config.max_file_size {
            return Err(Self::size_limit_error("文件", metadata.len(), self.config.max_file_size));
        }

        std::fs::read(path).map_err(|e| DetectError::FileSystem(format!("无法读取图片文件：{}", e)))
    }

    fn decode(&self, raw: RawImageData) -> Result<DynamicImage, DetectError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(header_width, header_height)?;
        self.validate_decoded_memory_limits(header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| DetectError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(width, height)?;

        log::debug!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{} 颜色: {:?}",
            raw.source_hint,
            width,
            height,
            decoded.color()
        );

        Ok(decoded)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), DetectError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DetectError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| DetectError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), DetectError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| DetectError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > self.config.max_decoded_pixels {
            return Err(DetectError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(&self, width: u32, height: u32) -> Result<(), DetectError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| DetectError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > self.config.max_decoded_bytes {
            return Err(DetectError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn validate_image_signature(bytes: &[u8]) -> Result<(), DetectError> {
        if bytes.is_empty() {
            return Err(DetectError::InvalidFormat("图片内容为空".to_string()));
        }

        match infer::get(bytes) {
            Some(kind) if kind.matcher_type() != infer::MatcherType::Image => {
                Err(DetectError::InvalidFormat(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )))
            }
            Some(_) => Ok(()),
            None => image::guess_format(bytes)
                .map(|_| ())
                .map_err(|_| DetectError::InvalidFormat("无法识别图片类型".to_string())),
        }
    }

    fn size_limit_error(what: &str, size: u64, limit: u64) -> DetectError {
        DetectError::ResourceLimit(format!(
            "{}过大：{:.2} MB（限制：{:.2} MB）",
            what,
            size as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        ))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, DetectError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| DetectError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| DetectError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    pub(crate) fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, DetectError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| DetectError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(DetectError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| DetectError::Decode(format!("Base64 解码失败：{}", e)))
    }
}
