//! ssdetect - 截图内容启发式分析库
//!
//! 对截图进行纯启发式的内容分析，不依赖任何外部模型：
//! - 游戏画面识别（颜色签名 + HUD 区域 + 透视模式 + 密度特征）
//! - 软件 / URL 识别（OCR 预处理 + 文本修复 + 关键词字典）
//! - 空闲度分析（按时间戳排序的截图批次差分）
//!
//! OCR 引擎与 NSFW 分类器通过 `capability` 模块的 trait 由宿主应用注入，
//! 库本身不链接任何识别引擎。

pub mod bitmap;
pub mod capability;
pub mod color;
pub mod config;
pub mod error;
pub mod game;
pub mod idleness;
pub mod pattern;
pub mod region;
pub mod software;

pub use bitmap::{Bitmap, Region};
pub use capability::{NsfwClassifier, OcrEngine};
pub use config::AnalyzerConfig;
pub use error::ValidationError;
pub use game::{GameClassifier, GameDetection};
pub use idleness::{IdlenessDiffEngine, IdlenessReport};
pub use software::{SoftwareReport, SoftwareTextClassifier};
