//! 游戏签名目录
//!
//! 静态签名：每个游戏的特征颜色、HUD 区域与模式描述。
//! 区域坐标与颜色来自对实际游戏截图的标定。

use crate::bitmap::Region;
use serde::Serialize;

/// 模式强度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// 将 0.0 - 1.0 的观测值映射到等级
    pub fn from_score(score: f32) -> Self {
        if score < 0.33 {
            Level::Low
        } else if score < 0.66 {
            Level::Medium
        } else {
            Level::High
        }
    }
}

/// 透视类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    /// 等距视角 (MOBA / 策略)
    Isometric,
    /// 第一人称
    FirstPerson,
    /// 像素化方块渲染
    Pixelated,
}

/// 模式签名
#[derive(Debug, Clone)]
pub struct PatternSignature {
    /// 期望的透视类型
    pub perspective: Perspective,
    /// HUD 复杂度
    pub hud_complexity: Level,
    /// 文本密度
    pub text_density: Level,
    /// 特效强度 (部分游戏未标定)
    pub effects_intensity: Option<Level>,
}

/// HUD 区域签名
#[derive(Debug, Clone)]
pub struct HudRegion {
    /// 区域名称
    pub name: &'static str,
    /// 归一化位置
    pub region: Region,
    /// 在区域因子中的权重
    pub weight: f32,
    /// 区域内期望出现的颜色
    pub expected_colors: &'static [[u8; 3]],
}

/// 游戏签名
#[derive(Debug, Clone)]
pub struct GameSignature {
    pub name: &'static str,
    /// 主题色 (画面主体)
    pub primary_colors: &'static [[u8; 3]],
    /// UI 色 (界面底色)
    pub ui_colors: &'static [[u8; 3]],
    /// 特效色
    pub effects_colors: &'static [[u8; 3]],
    /// HUD 区域
    pub hud_regions: Vec<HudRegion>,
    /// 模式描述
    pub patterns: PatternSignature,
}

/// 通用游戏调色板
///
/// 与具体游戏无关的典型游戏颜色：魔法特效、血条、资源、地形。
pub const GENERIC_GAME_COLORS: [[u8; 3]; 12] = [
    [0, 191, 255],   // 青色 (法力、魔法特效)
    [50, 205, 50],   // 绿色 (生命、地形)
    [255, 215, 0],   // 金色 (资源、物品)
    [138, 43, 226],  // 紫色 (技能、魔法)
    [255, 69, 0],    // 红橙 (伤害、警示)
    [30, 144, 255],  // 蓝色 (UI)
    [255, 165, 0],   // 橙色 (经验、警示)
    [255, 20, 147],  // 粉色 (特效)
    [0, 255, 255],   // 亮青 (特效)
    [255, 255, 0],   // 黄色 (金币、资源)
    [128, 0, 128],   // 深紫 (魔法)
    [34, 139, 34],   // 森林绿 (地形)
];

// 各 HUD 区域的期望颜色
const MINIMAP_COLORS: [[u8; 3]; 4] = [[0, 100, 0], [0, 0, 100], [100, 100, 100], [139, 69, 19]];
const HEALTHBAR_COLORS: [[u8; 3]; 4] = [[0, 255, 0], [0, 0, 255], [255, 215, 0], [255, 0, 0]];
const INVENTORY_COLORS: [[u8; 3]; 4] = [[64, 64, 64], [128, 128, 128], [255, 215, 0], [139, 69, 19]];
const TOPRIGHT_COLORS: [[u8; 3]; 3] = [[255, 255, 255], [255, 255, 0], [0, 255, 0]];

/// 内置签名目录
pub fn catalogue() -> Vec<GameSignature> {
    vec![
        GameSignature {
            name: "League of Legends",
            primary_colors: &[
                [0, 191, 255],
                [50, 205, 50],
                [255, 215, 0],
                [138, 43, 226],
            ],
            ui_colors: &[[23, 26, 33], [45, 45, 45], [255, 255, 255]],
            effects_colors: &[[255, 69, 0], [0, 255, 255], [255, 20, 147]],
            hud_regions: vec![
                HudRegion {
                    name: "minimap",
                    region: Region::new(0.75, 0.75, 0.25, 0.25),
                    weight: 0.35,
                    expected_colors: &MINIMAP_COLORS,
                },
                HudRegion {
                    name: "health_bar",
                    region: Region::new(0.3, 0.85, 0.4, 0.1),
                    weight: 0.30,
                    expected_colors: &HEALTHBAR_COLORS,
                },
                HudRegion {
                    name: "inventory",
                    region: Region::new(0.25, 0.8, 0.5, 0.15),
                    weight: 0.25,
                    expected_colors: &INVENTORY_COLORS,
                },
                HudRegion {
                    name: "top_right",
                    region: Region::new(0.7, 0.0, 0.3, 0.15),
                    weight: 0.10,
                    expected_colors: &TOPRIGHT_COLORS,
                },
            ],
            patterns: PatternSignature {
                perspective: Perspective::Isometric,
                hud_complexity: Level::High,
                text_density: Level::Medium,
                effects_intensity: Some(Level::High),
            },
        },
        GameSignature {
            name: "Counter-Strike",
            primary_colors: &[[255, 165, 0], [255, 0, 0], [0, 255, 0]],
            ui_colors: &[[0, 0, 0], [64, 64, 64], [255, 255, 255]],
            effects_colors: &[[255, 255, 0], [255, 0, 0]],
            hud_regions: vec![
                HudRegion {
                    name: "radar",
                    region: Region::new(0.02, 0.02, 0.2, 0.2),
                    weight: 0.35,
                    expected_colors: &MINIMAP_COLORS,
                },
                HudRegion {
                    name: "health_bar",
                    region: Region::new(0.02, 0.85, 0.3, 0.1),
                    weight: 0.35,
                    expected_colors: &HEALTHBAR_COLORS,
                },
                HudRegion {
                    name: "ammo",
                    region: Region::new(0.7, 0.85, 0.28, 0.1),
                    weight: 0.30,
                    expected_colors: &TOPRIGHT_COLORS,
                },
            ],
            patterns: PatternSignature {
                perspective: Perspective::FirstPerson,
                hud_complexity: Level::Medium,
                text_density: Level::Low,
                effects_intensity: Some(Level::Medium),
            },
        },
        GameSignature {
            name: "Minecraft",
            primary_colors: &[[139, 69, 19], [34, 139, 34], [135, 206, 235]],
            ui_colors: &[[0, 0, 0], [85, 85, 85], [255, 255, 255]],
            effects_colors: &[[165, 42, 42], [255, 215, 0], [128, 128, 128]],
            hud_regions: vec![
                HudRegion {
                    name: "hotbar",
                    region: Region::new(0.25, 0.9, 0.5, 0.08),
                    weight: 0.40,
                    expected_colors: &INVENTORY_COLORS,
                },
                HudRegion {
                    name: "health",
                    region: Region::new(0.02, 0.85, 0.2, 0.05),
                    weight: 0.30,
                    expected_colors: &HEALTHBAR_COLORS,
                },
                HudRegion {
                    name: "hunger",
                    region: Region::new(0.78, 0.85, 0.2, 0.05),
                    weight: 0.30,
                    expected_colors: &HEALTHBAR_COLORS,
                },
            ],
            patterns: PatternSignature {
                perspective: Perspective::Pixelated,
                hud_complexity: Level::Low,
                text_density: Level::Low,
                effects_intensity: None,
            },
        },
    ]
}
