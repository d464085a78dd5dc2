//! 区域统计分析
//!
//! 对位图的任意归一化区域计算颜色与边缘统计，供游戏分类器的
//! HUD 因子和空闲度引擎的网格差分使用。

use crate::bitmap::{luminance, Bitmap, Region};
use serde::Serialize;

/// 区域统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    /// 平均颜色
    pub average_color: [u8; 3],
    /// 水平边缘密度 (0.0 - 1.0)
    pub edge_density: f32,
    /// 亮度方差
    pub color_variance: f32,
    /// 复杂度: 亮度标准差 / 255
    pub complexity: f32,
}

impl RegionStats {
    /// 空区域的零统计
    pub fn zeroed() -> Self {
        Self {
            average_color: [0, 0, 0],
            edge_density: 0.0,
            color_variance: 0.0,
            complexity: 0.0,
        }
    }
}

/// 水平相邻像素亮度差超过此值计为边缘
const EDGE_LUMA_DELTA: f32 = 30.0;

/// 区域分析器
pub struct RegionAnalyzer;

impl RegionAnalyzer {
    /// 计算区域统计
    ///
    /// 区域完全越界时返回零统计而不是错误。
    pub fn analyze(bitmap: &Bitmap, region: &Region, stride: u32) -> RegionStats {
        let rect = region.to_pixel_rect(bitmap);
        if rect.is_empty() {
            return RegionStats::zeroed();
        }

        let step = stride.max(1);
        let mut sum = [0u64; 3];
        let mut lumas: Vec<f32> = Vec::new();
        let mut edges = 0u32;
        let mut edge_samples = 0u32;

        for y in (rect.y..rect.y + rect.height).step_by(step as usize) {
            for x in (rect.x..rect.x + rect.width).step_by(step as usize) {
                let Some([r, g, b, _]) = bitmap.pixel(x, y) else { continue };
                sum[0] += r as u64;
                sum[1] += g as u64;
                sum[2] += b as u64;

                let luma = luminance(r, g, b);
                lumas.push(luma);

                // 一维水平边缘检测
                if let Some([nr, ng, nb, _]) = bitmap.pixel(x + 1, y) {
                    if (luminance(nr, ng, nb) - luma).abs() > EDGE_LUMA_DELTA {
                        edges += 1;
                    }
                    edge_samples += 1;
                }
            }
        }

        let n = lumas.len();
        if n == 0 {
            return RegionStats::zeroed();
        }

        let average_color = [
            (sum[0] / n as u64) as u8,
            (sum[1] / n as u64) as u8,
            (sum[2] / n as u64) as u8,
        ];

        let mean = lumas.iter().sum::<f32>() / n as f32;
        let variance = lumas.iter().map(|l| (l - mean) * (l - mean)).sum::<f32>() / n as f32;

        RegionStats {
            average_color,
            edge_density: if edge_samples > 0 {
                edges as f32 / edge_samples as f32
            } else {
                0.0
            },
            color_variance: variance,
            complexity: variance.sqrt() / 255.0,
        }
    }

    /// 固定 3x3 网格统计 (空闲度引擎的差分输入)
    pub fn grid3x3(bitmap: &Bitmap, stride: u32) -> [RegionStats; 9] {
        let mut out: Vec<RegionStats> = Vec::with_capacity(9);
        for row in 0..3 {
            for col in 0..3 {
                let region = Region::new(
                    col as f32 / 3.0,
                    row as f32 / 3.0,
                    1.0 / 3.0,
                    1.0 / 3.0,
                );
                out.push(Self::analyze(bitmap, &region, stride));
            }
        }
        out.try_into().expect("3x3 网格恒为 9 个区域")
    }
}

/// 标准九区屏幕划分
///
/// 四角、中心与四条边带，游戏分类器按名称取对应区域。
pub fn screen_partition() -> Vec<(&'static str, Region)> {
    vec![
        ("top_left", Region::new(0.0, 0.0, 0.3, 0.3)),
        ("top_right", Region::new(0.7, 0.0, 0.3, 0.3)),
        ("bottom_left", Region::new(0.0, 0.7, 0.3, 0.3)),
        ("bottom_right", Region::new(0.7, 0.7, 0.3, 0.3)),
        ("center", Region::new(0.35, 0.35, 0.3, 0.3)),
        ("top_bar", Region::new(0.0, 0.0, 1.0, 0.15)),
        ("bottom_bar", Region::new(0.0, 0.85, 1.0, 0.15)),
        ("left_bar", Region::new(0.0, 0.0, 0.15, 1.0)),
        ("right_bar", Region::new(0.85, 0.0, 0.15, 1.0)),
    ]
}
