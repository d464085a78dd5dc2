//! 游戏画面分类器
//!
//! 对单张截图按签名目录逐一评分，四个因子加权合成：
//! - 颜色因子: 签名调色板命中率 + 饱和度奖励
//! - 区域因子: HUD 区域的颜色与边缘匹配
//! - 模式因子: 透视 / 复杂度 / 文本密度描述符比对
//! - 密度因子: 整体复杂度与特效边缘带
//!
//! 分类器无状态，同一输入重复分类结果一致。

pub mod signatures;

use crate::bitmap::Bitmap;
use crate::color;
use crate::config::GameDetectionConfig;
use crate::pattern::PatternFeatures;
use serde::Serialize;
use signatures::{GameSignature, HudRegion, Level, Perspective};

/// 单个签名的因子得分
#[derive(Debug, Clone, Serialize)]
pub struct GameFactors {
    /// 颜色因子
    pub color: f32,
    /// HUD 区域因子
    pub region: f32,
    /// 模式因子
    pub pattern: f32,
    /// 密度因子
    pub density: f32,
}

/// 单个游戏的检测结果
#[derive(Debug, Clone, Serialize)]
pub struct GameDetection {
    /// 游戏名称
    pub name: String,
    /// 加权总分 (0.0 - 1.0)
    pub confidence: f32,
    /// 因子明细
    pub factors: GameFactors,
}

/// 游戏分类报告
#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    /// 是否判定为游戏画面
    pub is_gaming: bool,
    /// 最高签名得分
    pub confidence: f32,
    /// 按得分降序的完整签名列表
    pub detections: Vec<GameDetection>,
    /// 通用游戏调色板命中率 (与具体签名无关)
    pub generic_palette: color::PaletteMatch,
    /// 全图模式特征
    pub features: PatternFeatures,
    /// 评分过程记录
    pub diagnostics: Vec<String>,
}

/// 游戏分类器
pub struct GameClassifier {
    config: GameDetectionConfig,
    signatures: Vec<GameSignature>,
}

impl GameClassifier {
    /// 使用内置签名目录创建分类器
    pub fn new(config: GameDetectionConfig) -> Self {
        tracing::info!(
            "初始化游戏分类器: 阈值={:.2}, 权重=颜色{:.2}/区域{:.2}/模式{:.2}/密度{:.2}",
            config.detection_threshold,
            config.weight_color,
            config.weight_region,
            config.weight_pattern,
            config.weight_density
        );
        Self {
            config,
            signatures: signatures::catalogue(),
        }
    }

    /// 使用自定义签名目录创建分类器
    pub fn with_signatures(config: GameDetectionConfig, signatures: Vec<GameSignature>) -> Self {
        Self { config, signatures }
    }

    /// 对截图分类
    pub fn classify(&self, bitmap: &Bitmap) -> GameReport {
        let features = PatternFeatures::extract(bitmap, self.config.sample_stride);
        let generic_palette = color::palette_match(
            bitmap,
            &signatures::GENERIC_GAME_COLORS,
            self.config.sample_stride,
            self.config.palette_distance,
            self.config.saturation_floor,
            self.config.saturation_bonus,
        );

        let mut diagnostics = Vec::new();
        let mut detections: Vec<GameDetection> = self
            .signatures
            .iter()
            .map(|sig| {
                let factors = GameFactors {
                    color: self.color_factor(bitmap, sig),
                    region: self.region_factor(bitmap, sig),
                    pattern: self.pattern_factor(&features, sig),
                    density: self.density_factor(&features, sig),
                };
                // 权重可配置，加权和可能越界，统一收敛到 [0, 1]
                let confidence = (factors.color * self.config.weight_color
                    + factors.region * self.config.weight_region
                    + factors.pattern * self.config.weight_pattern
                    + factors.density * self.config.weight_density)
                    .clamp(0.0, 1.0);

                diagnostics.push(format!(
                    "{}: 总分 {:.1}% (颜色 {:.1}%, 区域 {:.1}%, 模式 {:.1}%, 密度 {:.1}%)",
                    sig.name,
                    confidence * 100.0,
                    factors.color * 100.0,
                    factors.region * 100.0,
                    factors.pattern * 100.0,
                    factors.density * 100.0
                ));

                GameDetection {
                    name: sig.name.to_string(),
                    confidence,
                    factors,
                }
            })
            .collect();

        detections.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let confidence = detections.first().map(|d| d.confidence).unwrap_or(0.0);
        let is_gaming = confidence > self.config.detection_threshold;

        tracing::debug!(
            "游戏分类完成: {} (最高分 {:.1}%)",
            if is_gaming { "游戏画面" } else { "非游戏画面" },
            confidence * 100.0
        );

        GameReport {
            is_gaming,
            confidence,
            detections,
            generic_palette,
            features,
            diagnostics,
        }
    }

    /// 颜色因子: 签名主题色 + 特效色的调色板命中
    fn color_factor(&self, bitmap: &Bitmap, sig: &GameSignature) -> f32 {
        let palette: Vec<[u8; 3]> = sig
            .primary_colors
            .iter()
            .chain(sig.effects_colors.iter())
            .copied()
            .collect();
        color::palette_match(
            bitmap,
            &palette,
            self.config.sample_stride,
            self.config.palette_distance,
            self.config.saturation_floor,
            self.config.saturation_bonus,
        )
        .score
    }

    /// 区域因子: 各 HUD 区域得分的加权和
    fn region_factor(&self, bitmap: &Bitmap, sig: &GameSignature) -> f32 {
        let total: f32 = sig
            .hud_regions
            .iter()
            .map(|hud| hud_region_score(bitmap, hud, &self.config) * hud.weight)
            .sum();
        total.min(1.0)
    }

    /// 模式因子: 签名描述符与观测特征的比对
    ///
    /// 描述符一致计 1 分，不一致给部分分 (透视与等级类同等对待)。
    fn pattern_factor(&self, features: &PatternFeatures, sig: &GameSignature) -> f32 {
        let observed_perspective = observe_perspective(features);
        let observed_hud = Level::from_score(features.complexity);
        let observed_text = Level::from_score(features.text_density);

        let partial = self.config.pattern_partial_credit;
        let mut matches = 0.0f32;
        let mut total = 0.0f32;

        total += 1.0;
        matches += if sig.patterns.perspective == observed_perspective {
            1.0
        } else {
            partial
        };

        total += 1.0;
        matches += if sig.patterns.hud_complexity == observed_hud {
            1.0
        } else {
            partial
        };

        total += 1.0;
        matches += if sig.patterns.text_density == observed_text {
            1.0
        } else {
            partial
        };

        if let Some(effects) = sig.patterns.effects_intensity {
            total += 1.0;
            let observed_effects = Level::from_score(features.edge_ratio);
            matches += if effects == observed_effects { 1.0 } else { partial };
        }

        matches / total
    }

    /// 密度因子: 复杂度带 + 特效边缘带各 0.5 分
    fn density_factor(&self, features: &PatternFeatures, sig: &GameSignature) -> f32 {
        let c = features.complexity;
        let mut score = 0.0f32;

        let band_hit = match sig.patterns.hud_complexity {
            Level::High => c > 0.7,
            Level::Medium => c > 0.4 && c < 0.8,
            Level::Low => c < 0.5,
        };
        if band_hit {
            score += 0.5;
        }

        if sig.patterns.effects_intensity == Some(Level::High) && features.edge_ratio > 0.3 {
            score += 0.5;
        }

        score.min(1.0)
    }
}

/// 从观测特征推断透视类型
fn observe_perspective(features: &PatternFeatures) -> Perspective {
    if features.grid > 0.5 {
        Perspective::Pixelated
    } else if features.diagonal > 0.3 {
        Perspective::Isometric
    } else {
        Perspective::FirstPerson
    }
}

/// 单个 HUD 区域得分: 颜色匹配 0.6 + 边缘强度 0.4
///
/// 区域完全越界时得 0 分。
pub fn hud_region_score(bitmap: &Bitmap, hud: &HudRegion, config: &GameDetectionConfig) -> f32 {
    let rect = hud.region.to_pixel_rect(bitmap);
    if rect.is_empty() {
        return 0.0;
    }

    let step = config.sample_stride.max(1);
    let mut color_hits = 0u32;
    let mut edge_hits = 0u32;
    let mut total = 0u32;
    let mut edge_samples = 0u32;

    for y in (rect.y..rect.y + rect.height).step_by(step as usize) {
        for x in (rect.x..rect.x + rect.width).step_by(step as usize) {
            let Some([r, g, b, _]) = bitmap.pixel(x, y) else { continue };
            let rgb = [r, g, b];

            if hud
                .expected_colors
                .iter()
                .any(|c| color::color_distance(rgb, *c) < config.region_color_distance)
            {
                color_hits += 1;
            }

            // UI 元素有密集边缘，用通道绝对差之和衡量
            if let Some([nr, ng, nb, _]) = bitmap.pixel(x + step, y) {
                let strength = (r as i32 - nr as i32).abs()
                    + (g as i32 - ng as i32).abs()
                    + (b as i32 - nb as i32).abs();
                if strength as f32 > config.region_edge_strength {
                    edge_hits += 1;
                }
                edge_samples += 1;
            }

            total += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }

    let color_score = color_hits as f32 / total as f32;
    let edge_score = if edge_samples > 0 {
        edge_hits as f32 / edge_samples as f32
    } else {
        0.0
    };

    color_score * 0.6 + edge_score * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Region;

    fn fill_region(bmp: &mut Bitmap, region: &Region, rgb: [u8; 3]) {
        let rect = region.to_pixel_rect(bmp);
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let offset = ((y * bmp.width + x) * 4) as usize;
                bmp.data[offset] = rgb[0];
                bmp.data[offset + 1] = rgb[1];
                bmp.data[offset + 2] = rgb[2];
            }
        }
    }

    #[test]
    fn test_uniform_gray_is_not_gaming() {
        let classifier = GameClassifier::new(GameDetectionConfig::default());
        let bmp = Bitmap::new(200, 200, [128, 128, 128, 255]);
        let report = classifier.classify(&bmp);
        assert!(!report.is_gaming);
        assert!(report.generic_palette.ratio < 0.1);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = GameClassifier::new(GameDetectionConfig::default());
        let mut bmp = Bitmap::new(100, 100, [30, 30, 30, 255]);
        fill_region(&mut bmp, &Region::new(0.75, 0.75, 0.25, 0.25), [0, 100, 0]);

        let a = classifier.classify(&bmp);
        let b = classifier.classify(&bmp);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.is_gaming, b.is_gaming);
        assert_eq!(a.detections.len(), b.detections.len());
    }

    #[test]
    fn test_detections_are_ranked() {
        let classifier = GameClassifier::new(GameDetectionConfig::default());
        let bmp = Bitmap::new(100, 100, [50, 205, 50, 255]);
        let report = classifier.classify(&bmp);
        assert_eq!(report.detections.len(), 3);
        for pair in report.detections.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert_eq!(report.diagnostics.len(), 3);
    }

    #[test]
    fn test_minimap_region_scores_high() {
        // 右下角小地图区域填充典型小地图配色
        let config = GameDetectionConfig::default();
        let mut bmp = Bitmap::new(100, 100, [20, 20, 20, 255]);
        let hud = HudRegion {
            name: "minimap",
            region: Region::new(0.75, 0.75, 0.25, 0.25),
            weight: 0.35,
            expected_colors: &[[0, 100, 0], [0, 0, 100], [100, 100, 100], [139, 69, 19]],
        };
        fill_region(&mut bmp, &hud.region, [0, 100, 0]);

        let score = hud_region_score(&bmp, &hud, &config);
        assert!(score >= 0.5, "小地图区域得分 {:.2} 应不低于 0.5", score);
    }

    #[test]
    fn test_hud_region_out_of_bounds_scores_zero() {
        let config = GameDetectionConfig::default();
        let bmp = Bitmap::new(100, 100, [0, 100, 0, 255]);
        let hud = HudRegion {
            name: "offscreen",
            region: Region::new(1.5, 1.5, 0.2, 0.2),
            weight: 1.0,
            expected_colors: &[[0, 100, 0]],
        };
        assert_eq!(hud_region_score(&bmp, &hud, &config), 0.0);
    }

    #[test]
    fn test_threshold_monotonicity() {
        // 降低阈值不会让已检出的画面变为未检出
        let mut bmp = Bitmap::new(200, 200, [50, 205, 50, 255]);
        fill_region(&mut bmp, &Region::new(0.75, 0.75, 0.25, 0.25), [0, 100, 0]);
        fill_region(&mut bmp, &Region::new(0.3, 0.85, 0.4, 0.1), [0, 255, 0]);

        let default_report = GameClassifier::new(GameDetectionConfig::default()).classify(&bmp);
        let sensitive_report =
            GameClassifier::new(GameDetectionConfig::high_sensitivity()).classify(&bmp);

        if default_report.is_gaming {
            assert!(sensitive_report.is_gaming);
        }
        // 阈值不影响得分本身
        assert_eq!(default_report.confidence, sensitive_report.confidence);
    }

    #[test]
    fn test_confidence_clamped_with_custom_weights() {
        // 权重和超过 1 时总分仍收敛在 [0, 1]
        let config = GameDetectionConfig {
            weight_color: 1.0,
            weight_region: 1.0,
            weight_pattern: 1.0,
            weight_density: 1.0,
            ..Default::default()
        };
        let classifier = GameClassifier::new(config);
        let bmp = Bitmap::new(200, 200, [0, 191, 255, 255]);
        let report = classifier.classify(&bmp);

        assert!(report.confidence <= 1.0);
        for det in &report.detections {
            assert!(
                det.confidence >= 0.0 && det.confidence <= 1.0,
                "{} 总分 {} 越界",
                det.name,
                det.confidence
            );
        }
    }

    #[test]
    fn test_pattern_factor_partial_credit_on_perspective_mismatch() {
        // 全描述符不一致时各得部分分，不会归零
        let classifier = GameClassifier::new(GameDetectionConfig::default());
        let features = PatternFeatures {
            diagonal: 0.0,
            grid: 0.0,
            text_density: 0.0,
            complexity: 0.0,
            edge_ratio: 0.0,
        };
        // 观测为第一人称低复杂度; LoL 签名四个描述符全部不一致
        let sigs = signatures::catalogue();
        let lol = sigs.iter().find(|s| s.name == "League of Legends").unwrap();
        let factor = classifier.pattern_factor(&features, lol);
        assert!((factor - classifier.config.pattern_partial_credit).abs() < 1e-6);
    }

    #[test]
    fn test_saturated_game_palette_raises_color_factor() {
        let classifier = GameClassifier::new(GameDetectionConfig::default());

        // 全屏 LoL 主题色
        let lol_bmp = Bitmap::new(100, 100, [0, 191, 255, 255]);
        let lol = classifier
            .classify(&lol_bmp)
            .detections
            .into_iter()
            .find(|d| d.name == "League of Legends")
            .unwrap();

        let gray_bmp = Bitmap::new(100, 100, [128, 128, 128, 255]);
        let gray = classifier
            .classify(&gray_bmp)
            .detections
            .into_iter()
            .find(|d| d.name == "League of Legends")
            .unwrap();

        assert!(lol.factors.color > gray.factors.color);
    }
}
