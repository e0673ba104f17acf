//! # 尺寸对齐模块
//!
//! ## 设计思路
//!
//! 差分前两张图必须同尺寸。以“原图”尺寸为准，只缩放“待检图”，原图永不缩放。
//!
//! ## 实现思路
//!
//! - 尺寸一致：原样返回，不产生任何重采样误差。
//! - 尺寸不一致：优先使用 `fast_image_resize` 的卷积缩放（单通道 U8）。
//! - 快速缩放失败时回退 `image::imageops::resize`，同一滤镜。
//! - 回退路径本身不会失败：尺寸在进入缩放前已换算为 `u32`。
//!   数组尺寸超出 `u32`（无法来自任何解码结果）时不缩放，原样返回，
//!   由差分阶段报告 `ShapeMismatch`，而不是伪造一张全黑图造成整图“被篡改”。

use fast_image_resize as fr;
use image::{GrayImage, imageops};

use super::array::GrayArray;
use super::config::ResizeFilter;
use super::DetectError;

/// 将 `target` 对齐到 `reference` 的 `(height, width)`。
pub fn reconcile(reference: &GrayArray, target: GrayArray, filter: ResizeFilter) -> GrayArray {
    if reference.shape() == target.shape() {
        return target;
    }

    let (height, width) = reference.shape();

    if height == 0 || width == 0 || target.pixel_count() == 0 {
        log::warn!("⚠️ 空尺寸图像无法重采样，按目标尺寸填充 0");
        return GrayArray::filled(height, width, 0);
    }

    let prepared = to_u32(width)
        .and_then(|w| Ok((w, to_u32(height)?)))
        .and_then(|dims| Ok((dims, target.to_gray_image()?)));
    let ((dst_width, dst_height), source) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            log::error!("❌ 尺寸超出可重采样范围，保持原尺寸：{}", err);
            return target;
        }
    };

    log::info!(
        "🧩 尺寸对齐：{}x{} -> {}x{}（filter={:?}）",
        target.width(),
        target.height(),
        width,
        height,
        filter
    );

    match resize_with_fast_image_resize(&source, dst_width, dst_height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            resize_with_image(&source, dst_width, dst_height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    source: &GrayImage,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> Result<GrayArray, DetectError> {
    let (src_width, src_height) = source.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        source.as_raw().clone(),
        fr::PixelType::U8,
    )
    .map_err(|e| DetectError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter.to_fast_filter()));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| DetectError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    GrayArray::new(target_height as usize, target_width as usize, dst_image.into_vec())
}

fn resize_with_image(
    source: &GrayImage,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> GrayArray {
    GrayArray::from_gray_image(imageops::resize(
        source,
        target_width,
        target_height,
        filter.to_image_filter(),
    ))
}

fn to_u32(value: usize) -> Result<u32, DetectError> {
    u32::try_from(value).map_err(|_| DetectError::ResourceLimit(format!("尺寸超出范围：{}", value)))
}
