//! ssdetect - 截图内容启发式分析
//!
//! 主入口程序

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ssdetect::bitmap::Bitmap;
use ssdetect::config::AnalyzerConfig;
use ssdetect::game::GameClassifier;
use ssdetect::idleness::{validate_filenames, IdlenessDiffEngine};
use ssdetect::software::SoftwareTextClassifier;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use tracing::Level;

/// ssdetect - 命令行参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    verbose: Option<u8>,

    /// 紧凑 JSON 输出 (默认为带缩进的格式)
    #[arg(long)]
    compact: bool,
}

/// 子命令
#[derive(Subcommand, Debug)]
enum Commands {
    /// 分析单张截图: 游戏与软件识别
    Analyze {
        /// 截图文件路径
        image: PathBuf,

        /// 仅运行游戏识别
        #[arg(long)]
        game_only: bool,

        /// 仅运行软件识别
        #[arg(long)]
        software_only: bool,
    },

    /// 分析截图批次的空闲情况
    Idleness {
        /// 截图文件或目录 (文件名须带 14 位时间戳)
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 加载配置 (缺失时使用默认值)
    let config = match args.config {
        Some(ref path) => AnalyzerConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path))?,
        None => AnalyzerConfig::load_or_default(AnalyzerConfig::default_path()),
    };

    init_logging(&effective_log_level(args.verbose, &config));

    match args.command {
        Commands::Analyze {
            image,
            game_only,
            software_only,
        } => run_analyze(&config, &image, game_only, software_only, args.compact),
        Commands::Idleness { paths } => run_idleness(&config, &paths, args.compact),
    }
}

/// -v 计数到日志级别名
fn verbosity_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// --verbose 优先，未给出时用配置文件的日志级别
fn effective_log_level(verbose: Option<u8>, config: &AnalyzerConfig) -> String {
    match verbose {
        Some(v) => verbosity_level(v).to_string(),
        None => config.logging.level.clone(),
    }
}

/// 初始化日志
fn init_logging(log_level: &str) {
    let level = Level::from_str(log_level).unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();
}

/// 单图分析: 解码后依次运行游戏分类与软件识别
fn run_analyze(
    config: &AnalyzerConfig,
    image_path: &Path,
    game_only: bool,
    software_only: bool,
    compact: bool,
) -> Result<()> {
    info!("分析截图: {}", image_path.display());

    let image = image::open(image_path)
        .with_context(|| format!("无法打开图片: {}", image_path.display()))?;
    let bitmap = Bitmap::from_image(&image.to_rgba8());

    info!("图片尺寸: {}x{}", bitmap.width, bitmap.height);

    let mut output = serde_json::Map::new();

    if !software_only {
        let classifier = GameClassifier::new(config.game.clone());
        let report = classifier.classify(&bitmap);
        if report.is_gaming {
            info!(
                "判定为游戏画面, 置信度 {:.2}, 最佳匹配: {}",
                report.confidence,
                report
                    .detections
                    .first()
                    .map(|d| d.name.as_str())
                    .unwrap_or("未知")
            );
        }
        output.insert("game".to_string(), serde_json::to_value(&report)?);
    }

    if !game_only {
        let classifier =
            SoftwareTextClassifier::new(config.software.clone(), config.ocr.clone());
        // 命令行模式不注入 OCR 引擎, 仅做视觉识别
        let report = classifier.analyze(&bitmap, None);
        if report.software.is_empty() {
            info!("未识别出已知软件");
        } else {
            for det in &report.software {
                info!("识别到软件: {} ({:.2})", det.name, det.confidence);
            }
        }
        output.insert("software".to_string(), serde_json::to_value(&report)?);
    }

    print_json(&serde_json::Value::Object(output), compact)
}

/// 空闲分析: 收集文件、校验命名、逐张喂入差分引擎
fn run_idleness(config: &AnalyzerConfig, paths: &[PathBuf], compact: bool) -> Result<()> {
    let files = collect_screenshot_paths(paths)?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();

    validate_filenames(&names)?;
    info!("共 {} 张截图待分析", files.len());

    let mut engine = IdlenessDiffEngine::new(config.idleness.clone());
    for (path, name) in files.iter().zip(&names) {
        let image = image::open(path)
            .with_context(|| format!("无法打开图片: {}", path.display()))?;
        let bitmap = Bitmap::from_image(&image.to_rgba8());
        engine.add_screenshot(name, &bitmap)?;
    }

    let report = engine.analyze();
    if report.insufficient_data {
        warn!("截图数量不足, 无法计算空闲度");
    } else {
        info!(
            "空闲占比 {:.1}%, {}",
            report.idle_percentage, report.summary
        );
    }

    print_json(&serde_json::to_value(&report)?, compact)
}

/// 展开目录参数为截图文件列表, 并按文件名排序
fn collect_screenshot_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in std::fs::read_dir(path)
                .with_context(|| format!("无法读取目录: {}", path.display()))?
            {
                let entry = entry?;
                if entry.path().is_file() {
                    files.push(entry.path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }

    files.sort();
    Ok(files)
}

fn print_json(value: &serde_json::Value, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_falls_back_to_config() {
        let mut config = AnalyzerConfig::default();
        config.logging.level = "debug".to_string();

        // 未给 --verbose 时采用配置文件级别
        assert_eq!(effective_log_level(None, &config), "debug");
        // --verbose 覆盖配置
        assert_eq!(effective_log_level(Some(0), &config), "warn");
        assert_eq!(effective_log_level(Some(3), &config), "trace");
    }
}
