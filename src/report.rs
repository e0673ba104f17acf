//! # 报告导出模块
//!
//! ## 设计思路
//!
//! 导出层只读取 `DetectionOutcome`，不回调检测流水线。提供两种产物：
//! - PNG 报告：2×3 网格，上排原图 / 待检图 / 掩码，下排对应直方图柱状图
//! - JSON 摘要：判定结果、摘要、变更像素统计与三组 256 桶直方图
//!
//! ## 实现思路
//!
//! - 每个格子固定 300×200，图像用 Lanczos3 拉伸到格子大小（与预览显示一致）。
//! - 直方图按最大桶线性归一化，白底黑柱，每个灰度占 1 像素宽。
//! - 导出失败只返回错误，检测结果本身保持可用。

use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use serde::Serialize;

use crate::detector::{DetectionOutcome, GrayArray, Histogram, HistogramSet, HISTOGRAM_BINS};
use crate::error::AppError;

const CELL_WIDTH: u32 = 300;
const CELL_HEIGHT: u32 = 200;
const GUTTER: u32 = 20;
const COLUMNS: u32 = 3;
const ROWS: u32 = 2;
const BACKGROUND: Rgb<u8> = Rgb([0x2b, 0x2a, 0x2a]);
const PLOT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const AXIS_COLOR: Rgb<u8> = Rgb([160, 160, 160]);
/// 直方图绘图区左右留白，使 256 个灰度各占 1 像素。
const PLOT_MARGIN_X: u32 = (CELL_WIDTH - HISTOGRAM_BINS as u32) / 2;
const PLOT_MARGIN_Y: u32 = 12;

/// JSON 摘要，字段与 `DetectionOutcome` 一一对应（不含像素数组）。
#[derive(Debug, Serialize)]
pub struct OutcomeSummary<'a> {
    pub identical: bool,
    pub threshold: u8,
    pub original_shape: (usize, usize, usize),
    pub tampered_shape: (usize, usize, usize),
    pub original_digest: String,
    pub tampered_digest: String,
    pub changed_pixels: u64,
    pub changed_ratio: f64,
    pub histograms: Option<&'a HistogramSet>,
}

impl<'a> OutcomeSummary<'a> {
    pub fn from_outcome(outcome: &'a DetectionOutcome) -> Self {
        Self {
            identical: outcome.identical,
            threshold: outcome.threshold,
            original_shape: outcome.original_shape,
            tampered_shape: outcome.tampered_shape,
            original_digest: outcome.original_digest.to_hex(),
            tampered_digest: outcome.tampered_digest.to_hex(),
            changed_pixels: outcome.changed_pixels(),
            changed_ratio: outcome.changed_ratio(),
            histograms: outcome.histograms.as_ref(),
        }
    }
}

pub fn summary_json(outcome: &DetectionOutcome) -> Result<String, AppError> {
    serde_json::to_string_pretty(&OutcomeSummary::from_outcome(outcome))
        .map_err(|e| AppError::Export(format!("序列化摘要失败: {}", e)))
}

pub fn write_summary_json(outcome: &DetectionOutcome, path: &Path) -> Result<(), AppError> {
    let content = summary_json(outcome)?;
    fs::write(path, content)?;
    log::info!("📝 摘要已写入: {}", path.display());
    Ok(())
}

/// 将掩码单独保存为 PNG。
pub fn write_mask_png(outcome: &DetectionOutcome, path: &Path) -> Result<(), AppError> {
    let mask = outcome
        .mask
        .as_ref()
        .ok_or_else(|| AppError::Export("两张图完全一致，没有可导出的掩码".to_string()))?;

    fs::write(path, mask.encode_png()?)?;
    log::info!("🖼️ 掩码已写入: {}", path.display());
    Ok(())
}

/// 渲染 2×3 报告图。
pub fn render_report(outcome: &DetectionOutcome) -> Result<RgbImage, AppError> {
    let (original, tampered, mask, histograms) = match (
        outcome.original.as_ref(),
        outcome.tampered.as_ref(),
        outcome.mask.as_ref(),
        outcome.histograms.as_ref(),
    ) {
        (Some(o), Some(t), Some(m), Some(h)) => (o, t, m, h),
        _ => {
            return Err(AppError::Export(
                "两张图完全一致，没有可导出的报告".to_string(),
            ));
        }
    };

    let width = COLUMNS * CELL_WIDTH + (COLUMNS + 1) * GUTTER;
    let height = ROWS * CELL_HEIGHT + (ROWS + 1) * GUTTER;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let images = [original, tampered, mask];
    for (column, array) in images.into_iter().enumerate() {
        let cell = render_image_cell(array)?;
        let (x, y) = cell_origin(column as u32, 0);
        imageops::replace(&mut canvas, &cell, x as i64, y as i64);
    }

    let plots = [&histograms.original, &histograms.tampered, &histograms.mask];
    for (column, hist) in plots.into_iter().enumerate() {
        let cell = render_histogram_cell(hist);
        let (x, y) = cell_origin(column as u32, 1);
        imageops::replace(&mut canvas, &cell, x as i64, y as i64);
    }

    Ok(canvas)
}

pub fn export_report_png(outcome: &DetectionOutcome, path: &Path) -> Result<(), AppError> {
    let canvas = render_report(outcome)?;
    DynamicImage::ImageRgb8(canvas)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AppError::Export(format!("写入报告失败: {}", e)))?;

    log::info!("📄 报告已写入: {}", path.display());
    Ok(())
}

fn cell_origin(column: u32, row: u32) -> (u32, u32) {
    (
        GUTTER + column * (CELL_WIDTH + GUTTER),
        GUTTER + row * (CELL_HEIGHT + GUTTER),
    )
}

fn render_image_cell(array: &GrayArray) -> Result<RgbImage, AppError> {
    if array.pixel_count() == 0 {
        return Ok(RgbImage::from_pixel(CELL_WIDTH, CELL_HEIGHT, PLOT_BACKGROUND));
    }

    let gray: GrayImage = array.to_gray_image()?;
    let scaled = imageops::resize(&gray, CELL_WIDTH, CELL_HEIGHT, FilterType::Lanczos3);
    Ok(DynamicImage::ImageLuma8(scaled).into_rgb8())
}

fn render_histogram_cell(hist: &Histogram) -> RgbImage {
    let mut cell = RgbImage::from_pixel(CELL_WIDTH, CELL_HEIGHT, PLOT_BACKGROUND);
    let baseline = CELL_HEIGHT - PLOT_MARGIN_Y;
    let plot_height = baseline - PLOT_MARGIN_Y;

    for x in PLOT_MARGIN_X..PLOT_MARGIN_X + HISTOGRAM_BINS as u32 {
        cell.put_pixel(x, baseline, AXIS_COLOR);
    }

    let max = hist.max_count();
    if max == 0 {
        return cell;
    }

    for (level, &count) in hist.bins().iter().enumerate() {
        if count == 0 {
            continue;
        }
        // 非零桶至少画 1 像素，避免小计数在图上消失
        let bar = ((count as f64 / max as f64) * plot_height as f64).ceil().max(1.0) as u32;
        let x = PLOT_MARGIN_X + level as u32;
        for y in (baseline - bar)..baseline {
            cell.put_pixel(x, y, BAR_COLOR);
        }
    }

    cell
}
