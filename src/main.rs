//! # 图片篡改检测工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与结果展示。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tamper_detect::detector::{DetectionOutcome, ImageSource, SensitivityProfile, TamperDetector};
use tamper_detect::error::AppError;
use tamper_detect::{db, report, settings, storage};

#[derive(Parser)]
#[command(name = "tamper-detect")]
#[command(version, about = "Pixel-level image tamper detection", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an original image with a possibly tampered copy
    Detect {
        /// Reference image
        #[arg(value_name = "ORIGINAL")]
        original: PathBuf,

        /// Candidate image
        #[arg(value_name = "TAMPERED")]
        tampered: PathBuf,

        /// Mask threshold: pixels whose difference is greater than this are marked
        #[arg(short, long, value_name = "0-255")]
        threshold: Option<u8>,

        /// Sensitivity profile: strict, balanced or lenient
        #[arg(short, long, value_name = "PROFILE")]
        profile: Option<String>,

        /// JSON settings file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output directory for exported files
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Write the difference mask as PNG
        #[arg(long)]
        mask: bool,

        /// Write the 2x3 report sheet as PNG
        #[arg(long)]
        report: bool,

        /// Print the JSON summary instead of the text summary
        #[arg(long)]
        json: bool,

        /// Store the mask in this SQLite database
        #[arg(long, value_name = "FILE")]
        db: Option<PathBuf>,

        /// Owner id recorded with the stored mask
        #[arg(long, value_name = "ID", default_value = "1")]
        user_id: i64,
    },

    /// List masks stored for a user
    History {
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(long, value_name = "ID", default_value = "1")]
        user_id: i64,

        #[arg(long, value_name = "N", default_value = "20")]
        limit: i64,
    },

    /// Write a stored mask back to a PNG file
    ExportMask {
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(long, value_name = "ID")]
        id: i64,

        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
}

struct DetectArgs {
    original: PathBuf,
    tampered: PathBuf,
    threshold: Option<u8>,
    profile: Option<String>,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    mask: bool,
    report: bool,
    json: bool,
    db: Option<PathBuf>,
    user_id: i64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Detect {
            original,
            tampered,
            threshold,
            profile,
            config,
            out,
            mask,
            report,
            json,
            db,
            user_id,
        } => run_detect(DetectArgs {
            original,
            tampered,
            threshold,
            profile,
            config,
            out,
            mask,
            report,
            json,
            db,
            user_id,
        }),
        Commands::History { db, user_id, limit } => run_history(&db, user_id, limit),
        Commands::ExportMask { db, id, out } => run_export_mask(&db, id, &out),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_detect(args: DetectArgs) -> Result<(), AppError> {
    let config = match args.config.as_deref() {
        Some(path) => settings::load_settings(path)?,
        None => Default::default(),
    };

    let detector = TamperDetector::new(config);
    if let Some(profile) = args.profile.as_deref() {
        detector.set_sensitivity_profile(SensitivityProfile::from_str(profile)?)?;
    }
    if let Some(threshold) = args.threshold {
        detector.set_threshold(threshold)?;
    }

    let outcome = detector.detect(
        &ImageSource::FilePath(args.original),
        &ImageSource::FilePath(args.tampered),
    )?;

    if args.json {
        println!("{}", report::summary_json(&outcome)?);
    } else {
        print_summary(&outcome);
    }

    if outcome.identical {
        return Ok(());
    }

    // 导出与持久化互不影响：任一失败都只记录，检测结果本身已输出
    let mut failures = 0usize;

    if args.mask || args.report {
        let dir = storage::get_output_dir(args.out.as_deref())?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        if args.mask {
            let path = dir.join(format!("mask_{stamp}.png"));
            if let Err(err) = report::write_mask_png(&outcome, &path) {
                log::warn!("掩码导出失败: {err}");
                failures += 1;
            }
        }
        if args.report {
            let path = dir.join(format!("report_{stamp}.png"));
            if let Err(err) = report::export_report_png(&outcome, &path) {
                log::warn!("报告导出失败: {err}");
                failures += 1;
            }
        }

        let info = storage::output_dir_info(&dir);
        log::debug!("输出目录: {} ({} 个文件, {} 字节)", info.path, info.file_count, info.total_size);
    }

    if let (Some(db_path), Some(mask)) = (args.db.as_deref(), outcome.mask.as_ref()) {
        let saved = db::open_store(db_path).and_then(|store| store.save_mask(args.user_id, mask));
        match saved {
            Ok(id) => println!("mask stored: id={id}"),
            Err(err) => {
                log::warn!("掩码入库失败: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(AppError::Export(format!("{failures} 项导出 / 存储失败")));
    }

    Ok(())
}

fn print_summary(outcome: &DetectionOutcome) {
    if outcome.identical {
        println!("No tampering detected. The images are identical.");
        println!("digest:    {}", outcome.original_digest);
        return;
    }

    let (h, w, c) = outcome.original_shape;
    let (th, tw, tc) = outcome.tampered_shape;
    println!("original:  {w}x{h} ({c} ch)  {}", outcome.original_digest);
    println!("tampered:  {tw}x{th} ({tc} ch)  {}", outcome.tampered_digest);
    if (h, w) != (th, tw) {
        println!("tampered image was resized to {w}x{h} before comparison");
    }
    println!("threshold: {}", outcome.threshold);
    if outcome.has_tampering() {
        println!(
            "changed:   {} pixels ({:.4}%)",
            outcome.changed_pixels(),
            outcome.changed_ratio() * 100.0
        );
    } else {
        println!("changed:   none above threshold");
    }

    if let Some(set) = outcome.histograms.as_ref() {
        for (name, hist) in [("original", &set.original), ("tampered", &set.tampered)] {
            let mean = hist.mean().unwrap_or(0.0);
            let range = hist
                .occupied_range()
                .map(|(lo, hi)| format!("{lo}-{hi}"))
                .unwrap_or_else(|| "-".to_string());
            println!("{name:<9}  mean={mean:.2} range={range}");
        }
    }
}

fn run_history(db_path: &Path, user_id: i64, limit: i64) -> Result<(), AppError> {
    let store = db::open_store(db_path)?;
    let records = store.list_masks(user_id, limit)?;

    if records.is_empty() {
        println!("no masks stored for user {user_id}");
        return Ok(());
    }

    for record in records {
        let created = chrono::DateTime::from_timestamp_millis(record.created_at)
            .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "#{:<5} {}x{:<6} changed={:<8} {:>6}B  {}",
            record.id, record.width, record.height, record.changed_pixels, record.byte_size, created
        );
    }

    Ok(())
}

fn run_export_mask(db_path: &Path, id: i64, out: &Path) -> Result<(), AppError> {
    let store = db::open_store(db_path)?;
    let bytes = store
        .load_mask_bytes(id)?
        .ok_or_else(|| AppError::Database(format!("掩码不存在: id={id}")))?;

    std::fs::write(out, bytes)?;
    log::info!("🖼️ 掩码已导出: {}", out.display());
    Ok(())
}
