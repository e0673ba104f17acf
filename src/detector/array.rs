//! # 像素数组模型
//!
//! ## 设计思路
//!
//! 流水线内部只流转两种数据：
//! - `NativeImage`：按原始通道数保留的 8 位像素，仅用于快速相等判断
//! - `GrayArray`：单通道灰度数组，差分、掩码、直方图都基于它
//!
//! 两者都按行优先（row-major）存储，构造后不再修改；每一步变换都产出新数组。

use std::io::Cursor;

use image::{ColorType, DynamicImage, GrayImage, ImageFormat};

use super::DetectError;

/// 单通道 8 位灰度数组，尺寸为 `(height, width)`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayArray {
    height: usize,
    width: usize,
    data: Vec<u8>,
}

impl GrayArray {
    /// 由行优先的样本构造数组，长度必须等于 `height * width`。
    pub fn new(height: usize, width: usize, data: Vec<u8>) -> Result<Self, DetectError> {
        let expected = height
            .checked_mul(width)
            .ok_or_else(|| DetectError::ResourceLimit("数组尺寸溢出".to_string()))?;

        if data.len() != expected {
            return Err(DetectError::InvalidFormat(format!(
                "样本数量与尺寸不符：{} 个样本，期望 {}x{}={}",
                data.len(),
                height,
                width,
                expected
            )));
        }

        Ok(Self { height, width, data })
    }

    /// 所有样本均为 `value` 的数组。
    pub fn filled(height: usize, width: usize, value: u8) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// 按 `(row, col)` 逐个生成样本。
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self { height, width, data }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`。
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }

    /// 行优先的原始样本。
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// 从 `image` 的灰度缓冲构造（零拷贝）。
    pub fn from_gray_image(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            height: height as usize,
            width: width as usize,
            data: image.into_raw(),
        }
    }

    /// 解码结果统一转为灰度。
    ///
    /// 彩色图按 ITU-R 601-2 权重（0.299 / 0.587 / 0.114）定点计算并四舍五入，
    /// alpha 通道忽略；本身就是灰度的图只做位深转换。
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
                Self::from_gray_image(image.into_luma8())
            }
            _ => {
                let rgb = image.into_rgb8();
                let (width, height) = rgb.dimensions();
                let data = rgb
                    .pixels()
                    .map(|pixel| {
                        let [r, g, b] = pixel.0;
                        rec601_luma(r, g, b)
                    })
                    .collect();
                Self {
                    height: height as usize,
                    width: width as usize,
                    data,
                }
            }
        }
    }

    /// 转回 `image` 的灰度缓冲，供缩放与编码使用。
    pub fn to_gray_image(&self) -> Result<GrayImage, DetectError> {
        let width = u32::try_from(self.width)
            .map_err(|_| DetectError::ResourceLimit(format!("宽度超出范围：{}", self.width)))?;
        let height = u32::try_from(self.height)
            .map_err(|_| DetectError::ResourceLimit(format!("高度超出范围：{}", self.height)))?;

        GrayImage::from_raw(width, height, self.data.clone())
            .ok_or_else(|| DetectError::InvalidFormat("灰度缓冲长度异常".to_string()))
    }

    /// 编码为 PNG 字节，供持久化与导出使用。
    pub fn encode_png(&self) -> Result<Vec<u8>, DetectError> {
        let image = self.to_gray_image()?;
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image)
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| DetectError::Encode(format!("PNG 编码失败：{}", e)))?;
        Ok(cursor.into_inner())
    }

    /// 从 PNG 字节还原灰度数组（多通道会被转换为亮度）。
    pub fn decode_png(bytes: &[u8]) -> Result<Self, DetectError> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| DetectError::Decode(format!("PNG 解码失败：{}", e)))?;
        Ok(Self::from_dynamic(decoded))
    }

    /// 取值为 `value` 的样本数量，用于统计掩码面积。
    pub fn count_value(&self, value: u8) -> usize {
        self.data.iter().filter(|&&sample| sample == value).count()
    }
}

fn rec601_luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471;
    ((weighted + 0x8000) >> 16) as u8
}

/// 解码后、尚未灰度化的图像：形状 `(height, width, channels)` 加交错样本。
///
/// 高位深或浮点图像在构造时统一转换为 8 位，通道数保持不变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeImage {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<u8>,
}

impl NativeImage {
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let channels = image.color().channel_count() as usize;

        let data = match channels {
            1 => image.to_luma8().into_raw(),
            2 => image.to_luma_alpha8().into_raw(),
            3 => image.to_rgb8().into_raw(),
            _ => image.to_rgba8().into_raw(),
        };

        Self {
            height,
            width,
            channels: channels.min(4),
            data,
        }
    }

    /// `(height, width, channels)`。
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};

    #[test]
    fn new_rejects_length_mismatch() {
        let result = GrayArray::new(2, 3, vec![0; 5]);
        assert!(matches!(result, Err(DetectError::InvalidFormat(_))));
    }

    #[test]
    fn from_fn_is_row_major() {
        let array = GrayArray::from_fn(2, 3, |row, col| (row * 10 + col) as u8);
        assert_eq!(array.as_bytes(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(array.get(1, 2), Some(12));
        assert_eq!(array.get(2, 0), None);
    }

    #[test]
    fn png_encoding_preserves_samples() {
        let array = GrayArray::from_fn(7, 5, |row, col| ((row * 31 + col * 17) % 256) as u8);
        let png = array.encode_png().expect("encode should succeed");
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);

        let decoded = GrayArray::decode_png(&png).expect("decode should succeed");
        assert_eq!(decoded, array);
    }

    #[test]
    fn color_uses_rec601_weights() {
        let cases: [([u8; 3], u8); 6] = [
            ([255, 0, 0], 76),
            ([0, 255, 0], 150),
            ([0, 0, 255], 29),
            ([0, 0, 120], 14),
            ([255, 255, 255], 255),
            ([12, 200, 77], 130),
        ];

        for (rgb, expected) in cases {
            let image = ImageBuffer::from_pixel(3, 2, Rgb(rgb));
            let gray = GrayArray::from_dynamic(DynamicImage::ImageRgb8(image));
            assert_eq!(gray.shape(), (2, 3));
            assert!(gray.as_bytes().iter().all(|&v| v == expected), "rgb={rgb:?} gray={:?}", gray.get(0, 0));
        }
    }

    #[test]
    fn alpha_is_ignored_and_gray_passes_through() {
        let rgba = ImageBuffer::from_pixel(2, 2, Rgba([0, 255, 0, 0]));
        assert_eq!(GrayArray::from_dynamic(DynamicImage::ImageRgba8(rgba)).get(1, 1), Some(150));

        let luma = ImageBuffer::from_fn(4, 1, |x, _| Luma([x as u8 * 60]));
        let gray = GrayArray::from_dynamic(DynamicImage::ImageLuma8(luma));
        assert_eq!(gray.as_bytes(), &[0, 60, 120, 180]);
    }

    #[test]
    fn native_image_keeps_channel_count() {
        let rgb = ImageBuffer::from_fn(4, 2, |x, y| Rgb([x as u8, y as u8, 9]));
        let native = NativeImage::from_dynamic(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(native.shape(), (2, 4, 3));
        assert_eq!(native.as_bytes().len(), 2 * 4 * 3);
        assert_eq!(&native.as_bytes()[..3], &[0, 0, 9]);
    }
}
