//! 空闲度分析引擎
//!
//! 对按文件名时间戳排序的截图批次做相邻差分，划分活跃 / 空闲时段，
//! 汇总出空闲百分比、活动层级、逐小时分布与工作模式。
//!
//! ## 特点
//! - 感知哈希预判: 哈希相同的相邻截图差异直接记 0
//! - 3x3 网格差分: 颜色 0.5 + 方差 0.3 + 边缘 0.2
//! - 输入顺序无关: 分析前按时间戳排序

use crate::bitmap::Bitmap;
use crate::config::IdlenessConfig;
use crate::error::ValidationError;
use crate::region::{RegionAnalyzer, RegionStats};
use chrono::{NaiveDateTime, Timelike};
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// 支持的截图扩展名
const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_(\d{14})").expect("静态正则"))
}

/// 从文件名解析 `_YYYYMMDDHHMMSS` 时间戳
pub fn parse_timestamp(filename: &str) -> Option<NaiveDateTime> {
    let captures = timestamp_pattern().captures(filename)?;
    NaiveDateTime::parse_from_str(&captures[1], "%Y%m%d%H%M%S").ok()
}

/// 扩展名是否受支持
pub fn is_supported_file(filename: &str) -> bool {
    filename
        .rsplit('.')
        .next()
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// 批次校验: 收集所有违规文件后一次性报告
pub fn validate_filenames<S: AsRef<str>>(filenames: &[S]) -> Result<(), ValidationError> {
    if filenames.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let unsupported: Vec<String> = filenames
        .iter()
        .filter(|f| !is_supported_file(f.as_ref()))
        .map(|f| f.as_ref().to_string())
        .collect();
    if !unsupported.is_empty() {
        return Err(ValidationError::UnsupportedFileType { files: unsupported });
    }

    let invalid: Vec<String> = filenames
        .iter()
        .filter(|f| parse_timestamp(f.as_ref()).is_none())
        .map(|f| f.as_ref().to_string())
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::InvalidTimestamp { files: invalid });
    }

    Ok(())
}

/// 已登记的截图
struct Screenshot {
    filename: String,
    timestamp: NaiveDateTime,
    hash: ImageHash,
    grid: [RegionStats; 9],
}

/// 相邻截图间的一次转换
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    /// 归一化差异 (0.0 - 1.0)
    pub diff: f32,
    /// 时间间隔 (毫秒)，整段归入活跃或空闲
    pub duration_ms: i64,
    pub is_active: bool,
}

/// 按差异大小划分的活动层级累计
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityTiers {
    pub very_low_ms: i64,
    pub low_ms: i64,
    pub moderate_ms: i64,
    pub high_ms: i64,
}

/// 长空闲时段
#[derive(Debug, Clone, Serialize)]
pub struct IdlePeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_ms: i64,
}

/// 逐小时活动分布
#[derive(Debug, Clone, Serialize)]
pub struct HourlyActivity {
    /// 一天中的小时 (0 - 23)
    pub hour: u32,
    pub active_ms: i64,
    pub idle_ms: i64,
    /// 该小时内的活动层级累计
    pub tiers: ActivityTiers,
}

/// 批次统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchAnalysis {
    /// 批次内的截图数量
    pub total_screenshots: usize,
    /// 首尾截图的时间跨度 (毫秒)
    pub time_span_ms: i64,
    /// 相邻截图的平均间隔 (毫秒)
    pub average_interval_ms: i64,
}

/// 工作模式汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkPatterns {
    /// 最长空闲时段 (毫秒)
    pub longest_idle_ms: i64,
    /// 最长连续空闲 (分钟)
    pub max_consecutive_idle_min: i64,
    /// 空闲时段平均长度 (毫秒)
    pub avg_idle_interval_ms: i64,
    /// 活跃比例高的小时
    pub productive_hours: Vec<u32>,
    /// 活跃比例低的小时
    pub unproductive_hours: Vec<u32>,
}

/// 空闲度分析报告
#[derive(Debug, Clone, Serialize)]
pub struct IdlenessReport {
    /// 是否判定为空闲 (空闲百分比达到中度下限)
    pub is_idle: bool,
    /// 空闲时间百分比 (0 - 100)
    pub idle_percentage: f32,
    /// 覆盖的总时间 (毫秒)
    pub total_time_ms: i64,
    pub idle_time_ms: i64,
    pub active_time_ms: i64,
    /// 全部相邻转换
    pub transitions: Vec<Transition>,
    /// 活动层级累计
    pub tiers: ActivityTiers,
    /// 达到最短时长的空闲时段
    pub long_idle_periods: Vec<IdlePeriod>,
    /// 逐小时分布
    pub hourly: Vec<HourlyActivity>,
    /// 批次统计
    pub analysis: BatchAnalysis,
    /// 工作模式
    pub work_patterns: WorkPatterns,
    /// 人读摘要
    pub summary: String,
    /// 截图不足两张时为 true，其余字段为零值
    pub insufficient_data: bool,
    /// 分析过程记录
    pub diagnostics: Vec<String>,
}

impl IdlenessReport {
    fn insufficient(count: usize) -> Self {
        Self {
            is_idle: false,
            idle_percentage: 0.0,
            total_time_ms: 0,
            idle_time_ms: 0,
            active_time_ms: 0,
            transitions: Vec::new(),
            tiers: ActivityTiers::default(),
            long_idle_periods: Vec::new(),
            hourly: Vec::new(),
            analysis: BatchAnalysis {
                total_screenshots: count,
                ..Default::default()
            },
            work_patterns: WorkPatterns::default(),
            summary: "截图不足，无法分析".to_string(),
            insufficient_data: true,
            diagnostics: vec![format!("需要至少 2 张截图，当前 {}", count)],
        }
    }
}

/// 空闲运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// 没有进行中的空闲段
    NoRun,
    /// 空闲段进行中
    InIdleRun,
}

/// 空闲度差分引擎
///
/// 截图通过 `add_screenshot` 累积，`analyze` 汇总，`clear` 复位。
/// 单写者语义: 引擎不做内部同步。
pub struct IdlenessDiffEngine {
    config: IdlenessConfig,
    hasher: Hasher,
    screenshots: Vec<Screenshot>,
}

impl IdlenessDiffEngine {
    pub fn new(config: IdlenessConfig) -> Self {
        tracing::info!(
            "初始化空闲度引擎: 差异阈值={:.3}, 长空闲下限={}s",
            config.change_threshold,
            config.min_idle_period_secs
        );
        Self {
            config,
            hasher: HasherConfig::new()
                .hash_alg(HashAlg::DoubleGradient)
                .hash_size(8, 8)
                .to_hasher(),
            screenshots: Vec::new(),
        }
    }

    /// 登记一张截图
    ///
    /// 文件名必须带受支持扩展名和 `_YYYYMMDDHHMMSS` 时间戳段。
    pub fn add_screenshot(&mut self, filename: &str, bitmap: &Bitmap) -> Result<(), ValidationError> {
        if !is_supported_file(filename) {
            return Err(ValidationError::UnsupportedFileType {
                files: vec![filename.to_string()],
            });
        }
        let timestamp = parse_timestamp(filename).ok_or_else(|| ValidationError::InvalidTimestamp {
            files: vec![filename.to_string()],
        })?;

        let hash = self.hash_bitmap(bitmap);
        let grid = RegionAnalyzer::grid3x3(bitmap, self.config.sample_stride);

        self.screenshots.push(Screenshot {
            filename: filename.to_string(),
            timestamp,
            hash,
            grid,
        });
        Ok(())
    }

    /// 已登记的截图数量
    pub fn len(&self) -> usize {
        self.screenshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
    }

    /// 清空累积状态
    pub fn clear(&mut self) {
        self.screenshots.clear();
    }

    fn hash_bitmap(&self, bitmap: &Bitmap) -> ImageHash {
        let img = image::RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.data.clone())
            .unwrap_or_else(|| image::RgbaImage::new(1, 1));
        self.hasher.hash_image(&img)
    }

    /// 分析累积的截图批次
    ///
    /// 内部按时间戳升序排序，结果与登记顺序无关。
    pub fn analyze(&self) -> IdlenessReport {
        if self.screenshots.len() < 2 {
            return IdlenessReport::insufficient(self.screenshots.len());
        }

        let mut order: Vec<&Screenshot> = self.screenshots.iter().collect();
        order.sort_by_key(|s| s.timestamp);

        let mut diagnostics = Vec::new();
        let mut transitions = Vec::new();
        let mut tiers = ActivityTiers::default();
        let mut idle_time = 0i64;
        let mut active_time = 0i64;
        let mut hourly: BTreeMap<u32, HourlyActivity> = BTreeMap::new();

        // 空闲段状态机
        let mut run_state = RunState::NoRun;
        let mut run_start: Option<NaiveDateTime> = None;
        let mut idle_periods: Vec<IdlePeriod> = Vec::new();

        for pair in order.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let duration_ms = (next.timestamp - prev.timestamp).num_milliseconds();

            let diff = if prev.hash == next.hash {
                0.0
            } else {
                grid_difference(&prev.grid, &next.grid)
            };

            let is_active = diff >= self.config.change_threshold;
            if is_active {
                active_time += duration_ms;
            } else {
                idle_time += duration_ms;
            }

            // 层级按差异大小归类，整段时间同时记入全局层级与所在小时
            let hour = prev.timestamp.hour();
            let entry = hourly.entry(hour).or_insert_with(|| HourlyActivity {
                hour,
                active_ms: 0,
                idle_ms: 0,
                tiers: ActivityTiers::default(),
            });
            self.accumulate_tier(diff, duration_ms, &mut tiers);
            self.accumulate_tier(diff, duration_ms, &mut entry.tiers);

            if is_active {
                entry.active_ms += duration_ms;
            } else {
                entry.idle_ms += duration_ms;
            }

            // 空闲段开闭
            match (run_state, is_active) {
                (RunState::NoRun, false) => {
                    run_state = RunState::InIdleRun;
                    run_start = Some(prev.timestamp);
                }
                (RunState::InIdleRun, true) => {
                    if let Some(start) = run_start.take() {
                        push_idle_period(&mut idle_periods, start, prev.timestamp, &self.config);
                    }
                    run_state = RunState::NoRun;
                }
                _ => {}
            }

            transitions.push(Transition {
                from: prev.filename.clone(),
                to: next.filename.clone(),
                diff,
                duration_ms,
                is_active,
            });
        }

        // 序列结束时强制关闭进行中的空闲段
        if run_state == RunState::InIdleRun {
            if let (Some(start), Some(last)) = (run_start, order.last()) {
                push_idle_period(&mut idle_periods, start, last.timestamp, &self.config);
            }
        }

        let total_time = idle_time + active_time;
        let idle_percentage = if total_time > 0 {
            idle_time as f32 / total_time as f32 * 100.0
        } else {
            0.0
        };

        let hourly: Vec<HourlyActivity> = hourly.into_values().collect();

        let time_span_ms = match (order.first(), order.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        };
        let analysis = BatchAnalysis {
            total_screenshots: order.len(),
            time_span_ms,
            average_interval_ms: time_span_ms / (order.len() as i64 - 1).max(1),
        };

        let work_patterns = self.work_patterns(&idle_periods, &hourly);
        let summary = self.summarize(idle_percentage, idle_time, &work_patterns);

        diagnostics.push(format!(
            "{} 张截图, {} 次转换, 空闲 {:.1}%",
            order.len(),
            transitions.len(),
            idle_percentage
        ));
        tracing::debug!(
            "空闲度分析完成: 空闲 {:.1}% ({} / {} ms)",
            idle_percentage,
            idle_time,
            total_time
        );

        IdlenessReport {
            is_idle: idle_percentage >= self.config.moderate_band,
            idle_percentage,
            total_time_ms: total_time,
            idle_time_ms: idle_time,
            active_time_ms: active_time,
            transitions,
            tiers,
            long_idle_periods: idle_periods,
            hourly,
            analysis,
            work_patterns,
            summary,
            insufficient_data: false,
            diagnostics,
        }
    }

    /// 按差异大小把整段时间记入对应层
    fn accumulate_tier(&self, diff: f32, duration_ms: i64, tiers: &mut ActivityTiers) {
        if diff < self.config.tier_very_low {
            tiers.very_low_ms += duration_ms;
        } else if diff < self.config.tier_low {
            tiers.low_ms += duration_ms;
        } else if diff < self.config.tier_moderate {
            tiers.moderate_ms += duration_ms;
        } else {
            tiers.high_ms += duration_ms;
        }
    }

    fn work_patterns(&self, idle_periods: &[IdlePeriod], hourly: &[HourlyActivity]) -> WorkPatterns {
        let longest_idle_ms = idle_periods.iter().map(|p| p.duration_ms).max().unwrap_or(0);
        let avg_idle_interval_ms = if idle_periods.is_empty() {
            0
        } else {
            idle_periods.iter().map(|p| p.duration_ms).sum::<i64>() / idle_periods.len() as i64
        };

        let mut productive_hours = Vec::new();
        let mut unproductive_hours = Vec::new();
        for h in hourly {
            let total = h.active_ms + h.idle_ms;
            if total == 0 {
                continue;
            }
            let active_ratio = h.active_ms as f32 / total as f32;
            if active_ratio > self.config.productive_ratio {
                productive_hours.push(h.hour);
            } else if active_ratio < self.config.unproductive_ratio {
                unproductive_hours.push(h.hour);
            }
        }

        WorkPatterns {
            longest_idle_ms,
            max_consecutive_idle_min: longest_idle_ms / 60_000,
            avg_idle_interval_ms,
            productive_hours,
            unproductive_hours,
        }
    }

    fn summarize(&self, idle_percentage: f32, idle_time_ms: i64, patterns: &WorkPatterns) -> String {
        if idle_percentage >= self.config.high_band {
            format!(
                "高度空闲: {:.0}% 的时间无活动 (共 {}), 最长空闲 {}",
                idle_percentage,
                format_duration(idle_time_ms),
                format_duration(patterns.longest_idle_ms)
            )
        } else if idle_percentage >= self.config.moderate_band {
            format!(
                "中度空闲: {:.0}% 的时间无活动 (共 {})",
                idle_percentage,
                format_duration(idle_time_ms)
            )
        } else {
            format!("活动正常: 空闲仅 {:.0}%", idle_percentage)
        }
    }
}

fn push_idle_period(
    periods: &mut Vec<IdlePeriod>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &IdlenessConfig,
) {
    let duration_ms = (end - start).num_milliseconds();
    if duration_ms >= config.min_idle_period_secs as i64 * 1000 {
        periods.push(IdlePeriod { start, end, duration_ms });
    }
}

/// 3x3 网格差分: 每格颜色 0.5 + 方差 0.3 + 边缘 0.2，九格取平均
pub fn grid_difference(a: &[RegionStats; 9], b: &[RegionStats; 9]) -> f32 {
    let mut total = 0.0f32;
    for (cell_a, cell_b) in a.iter().zip(b.iter()) {
        let color_diff = cell_a
            .average_color
            .iter()
            .zip(cell_b.average_color.iter())
            .map(|(&x, &y)| (x as f32 - y as f32).abs())
            .sum::<f32>()
            / 3.0
            / 255.0;

        let max_variance = cell_a.color_variance.max(cell_b.color_variance).max(1.0);
        let variance_diff = (cell_a.color_variance - cell_b.color_variance).abs() / max_variance;

        let edge_diff = (cell_a.edge_density - cell_b.edge_density).abs();

        total += color_diff * 0.5 + variance_diff * 0.3 + edge_diff * 0.2;
    }
    total / 9.0
}

/// 毫秒时长转人读格式
pub fn format_duration(ms: i64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h{}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(color: u8) -> Bitmap {
        Bitmap::new(90, 90, [color, color, color, 255])
    }

    /// 中心格换成黑白条纹 (场景: 中心有明显变化)
    fn center_striped(base: u8) -> Bitmap {
        let mut bmp = uniform(base);
        for y in 30..60u32 {
            for x in 30..60u32 {
                let offset = ((y * 90 + x) * 4) as usize;
                let v = if x % 2 == 0 { 255 } else { 0 };
                bmp.data[offset] = v;
                bmp.data[offset + 1] = v;
                bmp.data[offset + 2] = v;
            }
        }
        bmp
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("screen_20240115093000.png").unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-15 09:30:00");
        assert!(parse_timestamp("screen.png").is_none());
        assert!(parse_timestamp("screen_2024011509.png").is_none());
    }

    #[test]
    fn test_validate_filenames_collects_all() {
        let err = validate_filenames(&["a_20240101000000.png", "b.png", "c.png"]).unwrap_err();
        match err {
            ValidationError::InvalidTimestamp { files } => {
                assert_eq!(files, vec!["b.png".to_string(), "c.png".to_string()]);
            }
            other => panic!("意外错误类型: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_unsupported_extension() {
        let err = validate_filenames(&["a_20240101000000.gif"]).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFileType { .. }));
    }

    #[test]
    fn test_validate_empty_batch() {
        assert!(matches!(
            validate_filenames::<&str>(&[]),
            Err(ValidationError::EmptyBatch)
        ));
    }

    #[test]
    fn test_single_screenshot_is_insufficient() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        let report = engine.analyze();
        assert!(report.insufficient_data);
        assert!(!report.is_idle);
        assert_eq!(report.total_time_ms, 0);
    }

    #[test]
    fn test_identical_pair_is_fully_idle() {
        // 相隔 5 分钟的两张相同截图: 哈希相同，差异 0，全程空闲
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101100500.png", &uniform(128))
            .unwrap();

        let report = engine.analyze();
        assert!(!report.insufficient_data);
        assert!(report.is_idle);
        assert_eq!(report.idle_time_ms, 300_000);
        assert_eq!(report.active_time_ms, 0);
        assert!((report.idle_percentage - 100.0).abs() < f32::EPSILON);
        assert_eq!(report.transitions[0].diff, 0.0);
        // 5 分钟达到长空闲下限
        assert_eq!(report.long_idle_periods.len(), 1);
    }

    #[test]
    fn test_changed_pair_is_active() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(40))
            .unwrap();
        engine
            .add_screenshot("a_20240101100500.png", &center_striped(40))
            .unwrap();

        let report = engine.analyze();
        assert!(!report.is_idle);
        assert_eq!(report.active_time_ms, 300_000);
        assert!(report.transitions[0].is_active);
        assert!(report.transitions[0].diff >= 0.05);
    }

    #[test]
    fn test_order_independence() {
        let make = |names: [&str; 3]| {
            let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
            for name in names {
                let bmp = if name.contains("103000") {
                    center_striped(40)
                } else {
                    uniform(40)
                };
                engine.add_screenshot(name, &bmp).unwrap();
            }
            engine.analyze()
        };

        let a = make([
            "s_20240101100000.png",
            "s_20240101101500.png",
            "s_20240101103000.png",
        ]);
        let b = make([
            "s_20240101103000.png",
            "s_20240101100000.png",
            "s_20240101101500.png",
        ]);

        assert_eq!(a.idle_time_ms, b.idle_time_ms);
        assert_eq!(a.active_time_ms, b.active_time_ms);
        assert_eq!(a.transitions.len(), b.transitions.len());
        assert_eq!(a.transitions[0].from, b.transitions[0].from);
    }

    #[test]
    fn test_clear_resets_state() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101100500.png", &uniform(128))
            .unwrap();
        assert_eq!(engine.len(), 2);

        engine.clear();
        assert!(engine.is_empty());
        assert!(engine.analyze().insufficient_data);
    }

    #[test]
    fn test_grid_difference_zero_for_equal() {
        let stats: [RegionStats; 9] = std::array::from_fn(|_| RegionStats {
            average_color: [100, 100, 100],
            edge_density: 0.2,
            color_variance: 50.0,
            complexity: 0.1,
        });
        assert_eq!(grid_difference(&stats, &stats.clone()), 0.0);
    }

    #[test]
    fn test_grid_difference_scales_with_change() {
        let black: [RegionStats; 9] = std::array::from_fn(|_| RegionStats::zeroed());
        let white: [RegionStats; 9] = std::array::from_fn(|_| RegionStats {
            average_color: [255, 255, 255],
            edge_density: 0.0,
            color_variance: 0.0,
            complexity: 0.0,
        });
        let diff = grid_difference(&black, &white);
        // 颜色分量满格: 0.5
        assert!((diff - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_tier_accumulation() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101100500.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101101000.png", &center_striped(128))
            .unwrap();

        let report = engine.analyze();
        // 第一段差异 0 → 极低层; 第二段有变化
        assert_eq!(report.tiers.very_low_ms, 300_000);
        assert!(report.tiers.low_ms + report.tiers.moderate_ms + report.tiers.high_ms >= 300_000);
    }

    #[test]
    fn test_hourly_distribution() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101105000.png", &uniform(128))
            .unwrap();

        let report = engine.analyze();
        assert_eq!(report.hourly.len(), 1);
        assert_eq!(report.hourly[0].hour, 10);
        assert_eq!(report.hourly[0].idle_ms, 3_000_000);
        // 层级同时按小时累计
        assert_eq!(report.hourly[0].tiers.very_low_ms, 3_000_000);
    }

    #[test]
    fn test_batch_analysis_block() {
        let mut engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        engine
            .add_screenshot("a_20240101100000.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101101500.png", &uniform(128))
            .unwrap();
        engine
            .add_screenshot("a_20240101103000.png", &uniform(128))
            .unwrap();

        let report = engine.analyze();
        assert_eq!(report.analysis.total_screenshots, 3);
        assert_eq!(report.analysis.time_span_ms, 1_800_000);
        assert_eq!(report.analysis.average_interval_ms, 900_000);
    }

    #[test]
    fn test_change_threshold_monotonicity() {
        // 提高差异阈值只会把转换从活跃挪向空闲
        let run = |config: IdlenessConfig| {
            let mut engine = IdlenessDiffEngine::new(config);
            engine
                .add_screenshot("a_20240101100000.png", &uniform(128))
                .unwrap();
            engine
                .add_screenshot("a_20240101100500.png", &center_striped(128))
                .unwrap();
            engine
                .add_screenshot("a_20240101101000.png", &center_striped(40))
                .unwrap();
            engine.analyze()
        };

        let sensitive = run(IdlenessConfig::high_sensitivity());
        let tolerant = run(IdlenessConfig::low_sensitivity());

        assert!(tolerant.idle_time_ms >= sensitive.idle_time_ms);
        assert!(tolerant.active_time_ms <= sensitive.active_time_ms);
        assert!(tolerant.idle_percentage >= sensitive.idle_percentage);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5_000), "5s");
        assert_eq!(format_duration(300_000), "5m");
        assert_eq!(format_duration(3_900_000), "1h5m");
    }

    #[test]
    fn test_summary_bands() {
        let engine = IdlenessDiffEngine::new(IdlenessConfig::default());
        let patterns = WorkPatterns::default();
        assert!(engine.summarize(80.0, 1_000_000, &patterns).contains("高度空闲"));
        assert!(engine.summarize(50.0, 1_000_000, &patterns).contains("中度空闲"));
        assert!(engine.summarize(10.0, 1_000_000, &patterns).contains("活动正常"));
    }
}
