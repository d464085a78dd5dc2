//! 软件 / URL 识别
//!
//! 两条证据链合成一份报告：
//! - 文本链: OCR 策略按序尝试 (地址栏 → 顶部条带 → 整图)，
//!   第一个产出 URL 或关键词的策略即停止
//! - 视觉链: 浏览器界面特征 + 各软件的颜色 / UI 签名
//!
//! 单个策略或签名失败只降级，不会让整次分析失败。

pub mod keywords;
pub mod ocr_prep;
pub mod steam;
pub mod url_fix;

use crate::bitmap::{luminance, Bitmap, Region};
use crate::capability::{OcrEngine, OcrOptions};
use crate::config::{OcrPrepConfig, SoftwareDetectionConfig};
use crate::pattern::PatternDetector;
use serde::Serialize;
use steam::StrictCriteria;
use url_fix::{ServiceMatch, SystemMatch};

/// 检测途径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    /// 浏览器界面特征
    Browser,
    /// 视觉签名
    Visual,
    /// 文本模式
    TextPattern,
}

/// 单个软件的检测结果
#[derive(Debug, Clone, Serialize)]
pub struct SoftwareDetection {
    pub name: String,
    pub confidence: f32,
    pub kind: DetectionKind,
}

/// 软件识别报告
#[derive(Debug, Clone, Serialize)]
pub struct SoftwareReport {
    /// 提取到的 URL
    pub urls: Vec<String>,
    /// URL 对应的域名
    pub domains: Vec<String>,
    /// 检测到的软件 (按置信度降序)
    pub software: Vec<SoftwareDetection>,
    /// 关键词命中的服务
    pub services: Vec<ServiceMatch>,
    /// 综合置信度 (0.0 - 1.0)
    pub confidence: f32,
    /// 分析过程记录
    pub diagnostics: Vec<String>,
}

/// UI 风格类别，决定签名的 UI 得分怎么算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiKind {
    /// 浏览器式 (标签页 + 地址栏)
    Browser,
    /// 深色游戏客户端
    GamingDark,
    /// 其他应用 (聊天、媒体)
    Generic,
}

/// 视觉软件签名
struct VisualSignature {
    name: &'static str,
    colors: &'static [[u8; 3]],
    ui: UiKind,
    /// 淘汰制级联 (仅深色客户端类签名使用)
    strict: Option<StrictCriteria>,
}

fn visual_catalogue() -> Vec<VisualSignature> {
    vec![
        VisualSignature {
            name: "Google Chrome",
            colors: &[[66, 133, 244], [234, 67, 53], [251, 188, 5], [52, 168, 83]],
            ui: UiKind::Browser,
            strict: None,
        },
        VisualSignature {
            name: "Firefox",
            colors: &[[255, 149, 0], [0, 96, 223]],
            ui: UiKind::Browser,
            strict: None,
        },
        VisualSignature {
            name: "WhatsApp",
            colors: &[[37, 211, 102], [18, 140, 126]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Discord",
            colors: &[[88, 101, 242], [54, 57, 63]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "YouTube",
            colors: &[[255, 0, 0], [33, 33, 33]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Instagram",
            colors: &[[225, 48, 108], [255, 220, 128]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Facebook",
            colors: &[[24, 119, 242], [66, 103, 178]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Twitter/X",
            colors: &[[29, 155, 240], [0, 0, 0]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Telegram",
            colors: &[[40, 159, 217], [54, 175, 232]],
            ui: UiKind::Generic,
            strict: None,
        },
        VisualSignature {
            name: "Steam",
            colors: &[[23, 26, 33], [27, 40, 56], [102, 192, 244], [16, 20, 24]],
            ui: UiKind::GamingDark,
            strict: Some(StrictCriteria::default()),
        },
    ]
}

/// Steam 这类签名要求更紧的颜色距离
const STRICT_COLOR_DISTANCE: f32 = 30.0;
/// 视觉签名进入结果的最低得分
const VISUAL_THRESHOLD: f32 = 0.2;
/// 浏览器界面进入结果的最低得分
const BROWSER_THRESHOLD: f32 = 0.3;
/// 视觉签名采样步长
const SIGNATURE_STRIDE: u32 = 15;

/// 软件 / URL 识别器
pub struct SoftwareTextClassifier {
    config: SoftwareDetectionConfig,
    ocr_config: OcrPrepConfig,
    signatures: Vec<VisualSignature>,
}

impl SoftwareTextClassifier {
    pub fn new(config: SoftwareDetectionConfig, ocr_config: OcrPrepConfig) -> Self {
        tracing::info!(
            "初始化软件识别器: 颜色距离={:.0}, 顶部条带={}px/{:.0}%",
            config.color_distance,
            config.top_strip_max,
            config.top_strip_ratio * 100.0
        );
        Self {
            config,
            ocr_config,
            signatures: visual_catalogue(),
        }
    }

    /// 分析截图
    ///
    /// OCR 引擎可选，未提供时只走视觉链。
    pub fn analyze(&self, bitmap: &Bitmap, ocr: Option<&dyn OcrEngine>) -> SoftwareReport {
        let mut diagnostics = Vec::new();

        let (urls, services, systems) = match ocr {
            Some(engine) => self.run_ocr_strategies(bitmap, engine, &mut diagnostics),
            None => {
                diagnostics.push("OCR 引擎未注入，跳过文本链".to_string());
                (Vec::new(), Vec::new(), Vec::new())
            }
        };

        let domains: Vec<String> = {
            let mut seen = Vec::new();
            for url in &urls {
                if let Some(domain) = url_fix::extract_domain(url) {
                    if !seen.contains(&domain) {
                        seen.push(domain);
                    }
                }
            }
            seen
        };

        let mut software = self.detect_visual(bitmap, &mut diagnostics);

        // 已知域名直接判定服务
        for domain in &domains {
            if let Some(service) = url_fix::service_for_domain(domain) {
                if !software.iter().any(|s| s.name == service) {
                    software.push(SoftwareDetection {
                        name: service.to_string(),
                        confidence: 0.9,
                        kind: DetectionKind::TextPattern,
                    });
                }
            }
        }
        for system in &systems {
            if !software.iter().any(|s| s.name == system.name) {
                software.push(SoftwareDetection {
                    name: system.name.clone(),
                    confidence: system.confidence,
                    kind: DetectionKind::TextPattern,
                });
            }
        }

        software.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let confidence = self.overall_confidence(&urls, &services);

        tracing::debug!(
            "软件识别完成: {} URL, {} 域名, {} 软件, 置信度 {:.1}%",
            urls.len(),
            domains.len(),
            software.len(),
            confidence * 100.0
        );

        SoftwareReport {
            urls,
            domains,
            software,
            services,
            confidence,
            diagnostics,
        }
    }

    /// OCR 策略折叠: 第一个产出证据的策略获胜
    fn run_ocr_strategies(
        &self,
        bitmap: &Bitmap,
        engine: &dyn OcrEngine,
        diagnostics: &mut Vec<String>,
    ) -> (Vec<String>, Vec<ServiceMatch>, Vec<SystemMatch>) {
        let strategies: Vec<(&str, Bitmap, OcrOptions)> = vec![
            (
                "地址栏",
                self.address_bar_strip(bitmap),
                OcrOptions::address_bar(),
            ),
            ("顶部条带", self.top_strip(bitmap), OcrOptions::free_text()),
            ("整图", bitmap.clone(), OcrOptions::free_text()),
        ];

        for (name, strip, options) in strategies {
            let prepared = ocr_prep::prepare(&strip, &self.ocr_config);
            match engine.recognize(&prepared, &options) {
                Ok(outcome) => {
                    let urls: Vec<String> = url_fix::extract_urls(&outcome.text)
                        .into_iter()
                        .map(|u| url_fix::post_process_url(&u))
                        .collect();
                    let services = url_fix::detect_keywords(&outcome.text);
                    let systems = url_fix::detect_systems(&outcome.text);

                    if !urls.is_empty() || !services.is_empty() || !systems.is_empty() {
                        diagnostics.push(format!(
                            "OCR 策略 [{}] 成功: {} URL, {} 服务",
                            name,
                            urls.len(),
                            services.len()
                        ));
                        return (urls, services, systems);
                    }
                    diagnostics.push(format!("OCR 策略 [{}] 无结果", name));
                }
                Err(e) => {
                    tracing::warn!("OCR 策略 [{}] 失败: {}", name, e);
                    diagnostics.push(format!("OCR 策略 [{}] 失败: {}", name, e));
                }
            }
        }

        (Vec::new(), Vec::new(), Vec::new())
    }

    /// 地址栏条带: 多个候选区域里选第一个通过合理性检查的
    fn address_bar_strip(&self, bitmap: &Bitmap) -> Bitmap {
        let w = bitmap.width as f32;
        let h = bitmap.height as f32;

        let candidates = [
            (w * 0.05, h * 0.06, w * 0.9, (h * 0.06).min(40.0)),
            (w * 0.08, h * 0.04, w * 0.85, (h * 0.05).min(35.0)),
            (w * 0.1, h * 0.08, w * 0.8, (h * 0.07).min(45.0)),
        ];

        for (x, y, cw, ch) in candidates {
            let crop = bitmap.crop(x as u32, y as u32, cw.max(1.0) as u32, ch.max(1.0) as u32);
            if !crop.data.is_empty() && self.is_likely_address_bar(&crop) {
                return crop;
            }
        }

        // 没有候选通过检查时退回默认顶部条带
        self.top_strip(bitmap)
    }

    /// 地址栏通常是浅色底，亮像素比例要足够高
    fn is_likely_address_bar(&self, strip: &Bitmap) -> bool {
        let mut light = 0u32;
        let mut total = 0u32;

        for y in (0..strip.height).step_by(2) {
            for x in (0..strip.width).step_by(4) {
                let Some([r, g, b, _]) = strip.pixel(x, y) else { continue };
                if luminance(r, g, b) > self.config.light_luminance {
                    light += 1;
                }
                total += 1;
            }
        }

        total > 0 && light as f32 / total as f32 > self.config.light_ratio
    }

    /// 顶部条带: min(上限像素, 高度比例)
    fn top_strip(&self, bitmap: &Bitmap) -> Bitmap {
        let strip_h = (self.config.top_strip_max as f32)
            .min(bitmap.height as f32 * self.config.top_strip_ratio)
            .max(1.0) as u32;
        bitmap.crop(0, 0, bitmap.width, strip_h)
    }

    /// 视觉链: 浏览器界面 + 签名目录
    fn detect_visual(&self, bitmap: &Bitmap, diagnostics: &mut Vec<String>) -> Vec<SoftwareDetection> {
        let mut detected = Vec::new();

        let browser_score = self.browser_interface_score(bitmap);
        diagnostics.push(format!("浏览器界面得分: {:.1}%", browser_score * 100.0));
        if browser_score > BROWSER_THRESHOLD {
            detected.push(SoftwareDetection {
                name: "Web Browser".to_string(),
                confidence: browser_score,
                kind: DetectionKind::Browser,
            });
        }

        for sig in &self.signatures {
            let color_score = self.signature_color_score(bitmap, sig);
            let ui_score = self.signature_ui_score(bitmap, sig, browser_score);
            let combined = color_score * 0.6 + ui_score * 0.4;

            let final_score = match &sig.strict {
                Some(criteria) => {
                    let outcome =
                        steam::evaluate(bitmap, criteria, color_score, ui_score, browser_score);
                    for penalty in &outcome.penalties {
                        diagnostics.push(format!("[{}] {}", sig.name, penalty));
                    }
                    outcome.score
                }
                None => combined,
            };

            diagnostics.push(format!(
                "[{}] 颜色 {:.1}%, UI {:.1}%, 最终 {:.1}%",
                sig.name,
                color_score * 100.0,
                ui_score * 100.0,
                final_score * 100.0
            ));

            if final_score > VISUAL_THRESHOLD {
                detected.push(SoftwareDetection {
                    name: sig.name.to_string(),
                    confidence: final_score,
                    kind: DetectionKind::Visual,
                });
            }
        }

        detected
    }

    /// 签名颜色得分: 采样像素对签名颜色表的命中率
    fn signature_color_score(&self, bitmap: &Bitmap, sig: &VisualSignature) -> f32 {
        let threshold = if sig.strict.is_some() {
            STRICT_COLOR_DISTANCE
        } else {
            self.config.color_distance
        };

        let mut hits = 0u32;
        let mut total = 0u32;

        for y in (0..bitmap.height).step_by(SIGNATURE_STRIDE as usize) {
            for x in (0..bitmap.width).step_by(SIGNATURE_STRIDE as usize) {
                let Some([r, g, b, _]) = bitmap.pixel(x, y) else { continue };
                let rgb = [r, g, b];
                if sig
                    .colors
                    .iter()
                    .any(|c| crate::color::color_distance(rgb, *c) < threshold)
                {
                    hits += 1;
                }
                total += 1;
            }
        }

        if total > 0 {
            hits as f32 / total as f32
        } else {
            0.0
        }
    }

    /// 签名 UI 得分，按 UI 风格选取对应的特征
    fn signature_ui_score(&self, bitmap: &Bitmap, sig: &VisualSignature, browser_score: f32) -> f32 {
        match sig.ui {
            UiKind::Browser => browser_score,
            UiKind::GamingDark => steam::gaming_ui_score(bitmap),
            UiKind::Generic => {
                let text = PatternDetector::text_density(bitmap);
                let complexity =
                    PatternDetector::visual_complexity(bitmap, self.config.sample_stride);
                (text * 0.5 + complexity * 0.5).min(1.0)
            }
        }
    }

    /// 浏览器界面得分: 标签区 0.4 + 地址栏 0.4 + 网页内容 0.2
    pub fn browser_interface_score(&self, bitmap: &Bitmap) -> f32 {
        let tab_h = (bitmap.height as f32 * 0.1).min(80.0).max(1.0) as u32;
        let tab_score = self.tab_region_score(bitmap, tab_h);

        let bar_h = (bitmap.height as f32 * 0.15).min(120.0).max(1.0) as u32;
        let bar_strip = bitmap.crop(0, tab_h.min(bitmap.height.saturating_sub(1)), bitmap.width, bar_h);
        let bar_score = self.light_ratio(&bar_strip);

        let content = Region::new(0.1, 0.25, 0.8, 0.6).to_pixel_rect(bitmap);
        let content_score = if content.is_empty() {
            0.0
        } else {
            let crop = bitmap.crop(content.x, content.y, content.width, content.height);
            PatternDetector::visual_complexity(&crop, self.config.sample_stride)
        };

        (tab_score * 0.4 + bar_score * 0.4 + content_score * 0.2).min(1.0)
    }

    /// 标签区: 同一行里明暗像素混合是标签页的典型特征
    fn tab_region_score(&self, bitmap: &Bitmap, height: u32) -> f32 {
        let mut tab_rows = 0u32;
        let mut total_rows = 0u32;

        for y in (0..height.min(bitmap.height)).step_by(5) {
            let mut dark = 0u32;
            let mut light = 0u32;
            let mut total = 0u32;

            for x in (0..bitmap.width).step_by(10) {
                let Some([r, g, b, _]) = bitmap.pixel(x, y) else { continue };
                let luma = luminance(r, g, b);
                if luma < 100.0 {
                    dark += 1;
                } else if luma > 180.0 {
                    light += 1;
                }
                total += 1;
            }

            if total > 0 {
                let dark_ratio = dark as f32 / total as f32;
                let light_ratio = light as f32 / total as f32;
                if dark_ratio > 0.1 && light_ratio > 0.1 {
                    tab_rows += 1;
                }
            }
            total_rows += 1;
        }

        if total_rows > 0 {
            tab_rows as f32 / total_rows as f32
        } else {
            0.0
        }
    }

    fn light_ratio(&self, strip: &Bitmap) -> f32 {
        let mut light = 0u32;
        let mut total = 0u32;
        for chunk in strip.data.chunks_exact(4).step_by(4) {
            if luminance(chunk[0], chunk[1], chunk[2]) > self.config.light_luminance {
                light += 1;
            }
            total += 1;
        }
        if total > 0 {
            light as f32 / total as f32
        } else {
            0.0
        }
    }

    /// 综合置信度: URL 证据 + 服务证据 + 多重证据奖励
    fn overall_confidence(&self, urls: &[String], services: &[ServiceMatch]) -> f32 {
        let mut confidence = 0.0f32;
        if !urls.is_empty() {
            confidence += self.config.url_weight;
        }
        if !services.is_empty() {
            confidence += self.config.service_weight;
        }
        if urls.len() > 1 || services.len() > 1 {
            confidence += self.config.multi_bonus;
        }
        confidence.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::OcrOutcome;
    use anyhow::Result;

    /// 固定返回预设文本的假引擎
    struct FakeOcr {
        text: String,
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, _bitmap: &Bitmap, _options: &OcrOptions) -> Result<OcrOutcome> {
            Ok(OcrOutcome {
                text: self.text.clone(),
                confidence: 0.9,
            })
        }
    }

    /// 永远失败的引擎
    struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn recognize(&self, _bitmap: &Bitmap, _options: &OcrOptions) -> Result<OcrOutcome> {
            anyhow::bail!("引擎崩溃")
        }
    }

    fn classifier() -> SoftwareTextClassifier {
        SoftwareTextClassifier::new(
            SoftwareDetectionConfig::default(),
            OcrPrepConfig::default(),
        )
    }

    #[test]
    fn test_no_ocr_engine_still_works() {
        let report = classifier().analyze(&Bitmap::new(100, 100, [128, 128, 128, 255]), None);
        assert!(report.urls.is_empty());
        assert!(report.diagnostics.iter().any(|d| d.contains("OCR")));
    }

    #[test]
    fn test_url_found_via_ocr() {
        let ocr = FakeOcr {
            text: "https://5docs.google.com/document abc".to_string(),
        };
        let report = classifier().analyze(&Bitmap::new(200, 150, [255, 255, 255, 255]), Some(&ocr));

        assert!(report.urls.iter().any(|u| u.contains("docs.google.com")));
        assert!(report.domains.iter().any(|d| d == "docs.google.com"));
        assert!(report.confidence >= 0.6);
    }

    #[test]
    fn test_keyword_service_detection() {
        let ocr = FakeOcr {
            text: "Subscribe youtube channel playlist upload".to_string(),
        };
        let report = classifier().analyze(&Bitmap::new(200, 150, [255, 255, 255, 255]), Some(&ocr));
        assert!(report.services.iter().any(|s| s.service == "YouTube"));
        assert!(report.confidence >= 0.3);
    }

    #[test]
    fn test_broken_ocr_degrades_gracefully() {
        // 引擎全部失败时返回空而有效的结果
        let report = classifier().analyze(&Bitmap::new(100, 100, [255, 255, 255, 255]), Some(&BrokenOcr));
        assert!(report.urls.is_empty());
        assert!(report.services.is_empty());
        assert_eq!(report.confidence, 0.0);
        assert!(report.diagnostics.iter().any(|d| d.contains("失败")));
    }

    #[test]
    fn test_system_pattern_detection() {
        let ocr = FakeOcr {
            text: "Redmine - issue #42 atualizado".to_string(),
        };
        let report = classifier().analyze(&Bitmap::new(200, 150, [255, 255, 255, 255]), Some(&ocr));
        let redmine = report.software.iter().find(|s| s.name == "Redmine").unwrap();
        assert_eq!(redmine.kind, DetectionKind::TextPattern);
        assert!((redmine.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bright_page_never_detected_as_steam() {
        let report = classifier().analyze(&Bitmap::new(200, 200, [250, 250, 250, 255]), None);
        assert!(!report.software.iter().any(|s| s.name == "Steam"));
    }

    #[test]
    fn test_confidence_capped_at_one() {
        let c = classifier();
        let urls = vec!["https://a.com".to_string(), "https://b.com".to_string()];
        let services = vec![
            ServiceMatch { service: "A".into(), matches: 2, confidence: 0.5 },
            ServiceMatch { service: "B".into(), matches: 2, confidence: 0.5 },
        ];
        let score = c.overall_confidence(&urls, &services);
        assert!(score <= 1.0);
        assert!((score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_software_sorted_by_confidence() {
        let ocr = FakeOcr {
            text: "github.com redmine jira".to_string(),
        };
        let report = classifier().analyze(&Bitmap::new(200, 150, [255, 255, 255, 255]), Some(&ocr));
        for pair in report.software.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}
