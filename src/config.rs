//! 配置管理模块
//!
//! 负责加载和管理分析器配置。所有经验阈值与权重都在这里给出默认值，
//! 可通过 TOML 文件整体覆盖。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 分析器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// 游戏识别配置
    #[serde(default)]
    pub game: GameDetectionConfig,
    /// 软件 / URL 识别配置
    #[serde(default)]
    pub software: SoftwareDetectionConfig,
    /// OCR 预处理配置
    #[serde(default)]
    pub ocr: OcrPrepConfig,
    /// 空闲度分析配置
    #[serde(default)]
    pub idleness: IdlenessConfig,
    /// NSFW 判定阈值
    #[serde(default)]
    pub nsfw: NsfwThresholds,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            game: GameDetectionConfig::default(),
            software: SoftwareDetectionConfig::default(),
            ocr: OcrPrepConfig::default(),
            idleness: IdlenessConfig::default(),
            nsfw: NsfwThresholds::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// 默认配置文件路径 (当前目录下的 ssdetect.toml)
    pub fn default_path() -> &'static str {
        "ssdetect.toml"
    }

    /// 从 TOML 文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: AnalyzerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，文件不存在时返回默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("加载配置失败，使用默认配置: {}", e);
                Self::default()
            }
        }
    }

    /// 保存配置到 TOML 文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

/// 游戏识别配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameDetectionConfig {
    /// 采样步长 (像素)
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,
    /// 调色板命中的颜色距离阈值
    #[serde(default = "default_palette_distance")]
    pub palette_distance: f32,
    /// 触发饱和度奖励的平均饱和度下限
    #[serde(default = "default_saturation_floor")]
    pub saturation_floor: f32,
    /// 饱和度奖励
    #[serde(default = "default_saturation_bonus")]
    pub saturation_bonus: f32,
    /// 颜色因子权重
    #[serde(default = "default_weight_color")]
    pub weight_color: f32,
    /// HUD 区域因子权重
    #[serde(default = "default_weight_region")]
    pub weight_region: f32,
    /// 模式因子权重
    #[serde(default = "default_weight_pattern")]
    pub weight_pattern: f32,
    /// 密度因子权重
    #[serde(default = "default_weight_density")]
    pub weight_density: f32,
    /// 判定为游戏的总分阈值
    #[serde(default = "default_game_threshold")]
    pub detection_threshold: f32,
    /// HUD 区域颜色匹配的距离阈值
    #[serde(default = "default_region_color_distance")]
    pub region_color_distance: f32,
    /// HUD 区域边缘判定的亮度差阈值
    #[serde(default = "default_region_edge_strength")]
    pub region_edge_strength: f32,
    /// 字符串模式不一致时的部分得分
    #[serde(default = "default_pattern_partial_credit")]
    pub pattern_partial_credit: f32,
}

impl Default for GameDetectionConfig {
    fn default() -> Self {
        Self {
            sample_stride: default_sample_stride(),
            palette_distance: default_palette_distance(),
            saturation_floor: default_saturation_floor(),
            saturation_bonus: default_saturation_bonus(),
            weight_color: default_weight_color(),
            weight_region: default_weight_region(),
            weight_pattern: default_weight_pattern(),
            weight_density: default_weight_density(),
            detection_threshold: default_game_threshold(),
            region_color_distance: default_region_color_distance(),
            region_edge_strength: default_region_edge_strength(),
            pattern_partial_credit: default_pattern_partial_credit(),
        }
    }
}

impl GameDetectionConfig {
    /// 高灵敏度配置 (宁可误报)
    pub fn high_sensitivity() -> Self {
        Self {
            detection_threshold: 0.2,
            ..Default::default()
        }
    }

    /// 低灵敏度配置 (避免误判)
    pub fn low_sensitivity() -> Self {
        Self {
            detection_threshold: 0.45,
            ..Default::default()
        }
    }
}

/// 软件 / URL 识别配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoftwareDetectionConfig {
    /// 采样步长 (像素)
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,
    /// 签名颜色匹配的默认距离阈值
    #[serde(default = "default_software_color_distance")]
    pub color_distance: f32,
    /// 地址栏合理性检查: 亮像素的亮度下限
    #[serde(default = "default_light_luminance")]
    pub light_luminance: f32,
    /// 地址栏合理性检查: 亮像素比例下限
    #[serde(default = "default_light_ratio")]
    pub light_ratio: f32,
    /// 顶部条带的最大像素高度
    #[serde(default = "default_top_strip_max")]
    pub top_strip_max: u32,
    /// 顶部条带占图像高度的比例
    #[serde(default = "default_top_strip_ratio")]
    pub top_strip_ratio: f32,
    /// 置信度: 发现 URL 的贡献
    #[serde(default = "default_url_weight")]
    pub url_weight: f32,
    /// 置信度: 识别到服务的贡献
    #[serde(default = "default_service_weight")]
    pub service_weight: f32,
    /// 置信度: 多重证据奖励
    #[serde(default = "default_multi_bonus")]
    pub multi_bonus: f32,
}

impl Default for SoftwareDetectionConfig {
    fn default() -> Self {
        Self {
            sample_stride: default_sample_stride(),
            color_distance: default_software_color_distance(),
            light_luminance: default_light_luminance(),
            light_ratio: default_light_ratio(),
            top_strip_max: default_top_strip_max(),
            top_strip_ratio: default_top_strip_ratio(),
            url_weight: default_url_weight(),
            service_weight: default_service_weight(),
            multi_bonus: default_multi_bonus(),
        }
    }
}

/// OCR 预处理配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrPrepConfig {
    /// 放大倍数
    #[serde(default = "default_upscale")]
    pub upscale: u32,
    /// 低亮度侧的对比度系数
    #[serde(default = "default_contrast_low")]
    pub contrast_low: f32,
    /// 高亮度侧的对比度系数
    #[serde(default = "default_contrast_high")]
    pub contrast_high: f32,
    /// 是否启用锐化
    #[serde(default = "default_true")]
    pub sharpen: bool,
    /// 是否启用 Otsu 二值化
    #[serde(default = "default_true")]
    pub binarize: bool,
    /// 是否启用中值去噪
    #[serde(default = "default_true")]
    pub denoise: bool,
}

impl Default for OcrPrepConfig {
    fn default() -> Self {
        Self {
            upscale: default_upscale(),
            contrast_low: default_contrast_low(),
            contrast_high: default_contrast_high(),
            sharpen: true,
            binarize: true,
            denoise: true,
        }
    }
}

/// 空闲度分析配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdlenessConfig {
    /// 判定为活动的差异阈值
    #[serde(default = "default_change_threshold")]
    pub change_threshold: f32,
    /// 长空闲时段的最短时长 (秒)
    #[serde(default = "default_min_idle_period")]
    pub min_idle_period_secs: u64,
    /// 中度空闲的百分比下限
    #[serde(default = "default_moderate_band")]
    pub moderate_band: f32,
    /// 高度空闲的百分比下限
    #[serde(default = "default_high_band")]
    pub high_band: f32,
    /// 极低活动层的差异上限
    #[serde(default = "default_tier_very_low")]
    pub tier_very_low: f32,
    /// 低活动层的差异上限
    #[serde(default = "default_tier_low")]
    pub tier_low: f32,
    /// 中活动层的差异上限
    #[serde(default = "default_tier_moderate")]
    pub tier_moderate: f32,
    /// 高效小时的活跃比例下限
    #[serde(default = "default_productive_ratio")]
    pub productive_ratio: f32,
    /// 低效小时的活跃比例上限
    #[serde(default = "default_unproductive_ratio")]
    pub unproductive_ratio: f32,
    /// 网格统计采样步长 (像素)
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,
}

impl Default for IdlenessConfig {
    fn default() -> Self {
        Self {
            change_threshold: default_change_threshold(),
            min_idle_period_secs: default_min_idle_period(),
            moderate_band: default_moderate_band(),
            high_band: default_high_band(),
            tier_very_low: default_tier_very_low(),
            tier_low: default_tier_low(),
            tier_moderate: default_tier_moderate(),
            productive_ratio: default_productive_ratio(),
            unproductive_ratio: default_unproductive_ratio(),
            sample_stride: default_sample_stride(),
        }
    }
}

impl IdlenessConfig {
    /// 高灵敏度配置 (轻微变化即视为活动)
    pub fn high_sensitivity() -> Self {
        Self {
            change_threshold: 0.02,
            ..Default::default()
        }
    }

    /// 低灵敏度配置 (忽略光标闪烁等微小变化)
    pub fn low_sensitivity() -> Self {
        Self {
            change_threshold: 0.1,
            ..Default::default()
        }
    }
}

/// NSFW 判定阈值
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NsfwThresholds {
    /// Porn 概率阈值
    #[serde(default = "default_porn_threshold")]
    pub porn: f32,
    /// Hentai 概率阈值
    #[serde(default = "default_porn_threshold")]
    pub hentai: f32,
    /// Sexy 概率阈值
    #[serde(default = "default_sexy_threshold")]
    pub sexy: f32,
    /// 游戏画面豁免: Drawing 概率下限
    #[serde(default = "default_drawing_threshold")]
    pub drawing_for_game: f32,
    /// 游戏画面豁免: 游戏置信度下限
    #[serde(default = "default_game_confidence")]
    pub game_confidence: f32,
}

impl Default for NsfwThresholds {
    fn default() -> Self {
        Self {
            porn: default_porn_threshold(),
            hentai: default_porn_threshold(),
            sexy: default_sexy_threshold(),
            drawing_for_game: default_drawing_threshold(),
            game_confidence: default_game_confidence(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 日志文件路径 (None = 仅控制台)
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_sample_stride() -> u32 { 4 }
fn default_palette_distance() -> f32 { 60.0 }
fn default_saturation_floor() -> f32 { 0.3 }
fn default_saturation_bonus() -> f32 { 0.2 }
fn default_weight_color() -> f32 { 0.20 }
fn default_weight_region() -> f32 { 0.40 }
fn default_weight_pattern() -> f32 { 0.25 }
fn default_weight_density() -> f32 { 0.15 }
fn default_game_threshold() -> f32 { 0.30 }
fn default_region_color_distance() -> f32 { 80.0 }
fn default_region_edge_strength() -> f32 { 60.0 }
fn default_pattern_partial_credit() -> f32 { 0.5 }
fn default_software_color_distance() -> f32 { 50.0 }
fn default_light_luminance() -> f32 { 200.0 }
fn default_light_ratio() -> f32 { 0.6 }
fn default_top_strip_max() -> u32 { 120 }
fn default_top_strip_ratio() -> f32 { 0.15 }
fn default_url_weight() -> f32 { 0.6 }
fn default_service_weight() -> f32 { 0.3 }
fn default_multi_bonus() -> f32 { 0.1 }
fn default_upscale() -> u32 { 2 }
fn default_contrast_low() -> f32 { 0.7 }
fn default_contrast_high() -> f32 { 1.3 }
fn default_true() -> bool { true }
fn default_change_threshold() -> f32 { 0.05 }
fn default_min_idle_period() -> u64 { 300 }
fn default_moderate_band() -> f32 { 40.0 }
fn default_high_band() -> f32 { 70.0 }
fn default_tier_very_low() -> f32 { 0.01 }
fn default_tier_low() -> f32 { 0.15 }
fn default_tier_moderate() -> f32 { 0.30 }
fn default_productive_ratio() -> f32 { 0.6 }
fn default_unproductive_ratio() -> f32 { 0.3 }
fn default_porn_threshold() -> f32 { 0.5 }
fn default_sexy_threshold() -> f32 { 0.7 }
fn default_drawing_threshold() -> f32 { 0.6 }
fn default_game_confidence() -> f32 { 0.2 }
fn default_log_level() -> String { "info".to_string() }
