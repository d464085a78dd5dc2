//! 外部能力接口
//!
//! OCR 与 NSFW 分类由宿主应用实现并注入，库只定义接口与
//! 判定逻辑。未注入时相应流程跳过，不构成错误。

use crate::bitmap::Bitmap;
use crate::config::NsfwThresholds;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 页面分割模式 (对应常见 OCR 引擎的参数)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    /// 单行文本 (地址栏)
    SingleLine,
    /// 统一文本块
    SingleBlock,
    /// 自动分割
    Auto,
}

/// OCR 调用选项
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrOptions {
    /// 字符白名单 (None = 不限制)
    pub char_whitelist: Option<String>,
    /// 页面分割模式
    pub page_seg_mode: PageSegMode,
}

impl OcrOptions {
    /// 地址栏识别: 单行 + URL 字符白名单
    pub fn address_bar() -> Self {
        Self {
            char_whitelist: Some(
                "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789./:-_?=&#%".to_string(),
            ),
            page_seg_mode: PageSegMode::SingleLine,
        }
    }

    /// 自由文本识别
    pub fn free_text() -> Self {
        Self {
            char_whitelist: None,
            page_seg_mode: PageSegMode::Auto,
        }
    }
}

/// OCR 识别结果
#[derive(Debug, Clone, Serialize)]
pub struct OcrOutcome {
    /// 识别出的文本
    pub text: String,
    /// 引擎报告的置信度 (0.0 - 1.0)
    pub confidence: f32,
}

/// OCR 引擎接口
pub trait OcrEngine {
    /// 对位图做文本识别
    fn recognize(&self, bitmap: &Bitmap, options: &OcrOptions) -> Result<OcrOutcome>;
}

/// NSFW 标签集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NsfwLabel {
    Porn,
    Hentai,
    Sexy,
    Drawing,
    Neutral,
}

/// 单个标签的概率
#[derive(Debug, Clone, Serialize)]
pub struct NsfwScore {
    pub label: NsfwLabel,
    pub probability: f32,
}

/// NSFW 分类器接口
pub trait NsfwClassifier {
    /// 返回各标签的概率分布
    fn classify(&self, bitmap: &Bitmap) -> Result<Vec<NsfwScore>>;
}

/// 按阈值判定是否为不当内容
///
/// 游戏画面豁免: Drawing 概率高且游戏置信度足够时，Hentai 命中
/// 视为游戏渲染而非不当内容。
pub fn is_explicit(
    scores: &[NsfwScore],
    thresholds: &NsfwThresholds,
    game_confidence: f32,
) -> bool {
    let prob = |label: NsfwLabel| {
        scores
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.probability)
            .unwrap_or(0.0)
    };

    let looks_like_game =
        prob(NsfwLabel::Drawing) > thresholds.drawing_for_game && game_confidence > thresholds.game_confidence;

    if prob(NsfwLabel::Porn) > thresholds.porn {
        return true;
    }
    if prob(NsfwLabel::Hentai) > thresholds.hentai && !looks_like_game {
        return true;
    }
    if prob(NsfwLabel::Sexy) > thresholds.sexy {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(porn: f32, hentai: f32, sexy: f32, drawing: f32) -> Vec<NsfwScore> {
        vec![
            NsfwScore { label: NsfwLabel::Porn, probability: porn },
            NsfwScore { label: NsfwLabel::Hentai, probability: hentai },
            NsfwScore { label: NsfwLabel::Sexy, probability: sexy },
            NsfwScore { label: NsfwLabel::Drawing, probability: drawing },
            NsfwScore {
                label: NsfwLabel::Neutral,
                probability: (1.0 - porn - hentai - sexy - drawing).max(0.0),
            },
        ]
    }

    #[test]
    fn test_neutral_is_not_explicit() {
        let t = NsfwThresholds::default();
        assert!(!is_explicit(&scores(0.1, 0.1, 0.2, 0.1), &t, 0.0));
    }

    #[test]
    fn test_porn_over_threshold() {
        let t = NsfwThresholds::default();
        assert!(is_explicit(&scores(0.6, 0.0, 0.0, 0.0), &t, 0.0));
    }

    #[test]
    fn test_sexy_needs_higher_threshold() {
        let t = NsfwThresholds::default();
        assert!(!is_explicit(&scores(0.0, 0.0, 0.6, 0.0), &t, 0.0));
        assert!(is_explicit(&scores(0.0, 0.0, 0.8, 0.0), &t, 0.0));
    }

    #[test]
    fn test_game_render_exemption() {
        let t = NsfwThresholds::default();
        // Hentai 命中但 Drawing 高且游戏置信度高: 豁免
        assert!(!is_explicit(&scores(0.0, 0.6, 0.0, 0.7), &t, 0.5));
        // 没有游戏置信度: 不豁免
        assert!(is_explicit(&scores(0.0, 0.6, 0.0, 0.7), &t, 0.0));
    }
}
