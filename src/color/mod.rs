//! 颜色签名分析
//!
//! 主色调提取、颜色签名匹配与调色板命中率统计。
//!
//! ## 特点
//! - 每通道 32 级量化，统计前 20 个主色调
//! - 欧氏 RGB 距离的签名相似度
//! - 颜色多样性与饱和度统计

use crate::bitmap::{Bitmap, PixelSampler, Region};
use serde::Serialize;

/// 主色调条目
#[derive(Debug, Clone, Serialize)]
pub struct DominantColor {
    /// 量化后的 RGB
    pub rgb: [u8; 3],
    /// 采样命中次数
    pub count: u32,
    /// 占采样总数的百分比 (0 - 100)
    pub percentage: f32,
}

/// 调色板命中统计
#[derive(Debug, Clone, Serialize)]
pub struct PaletteMatch {
    /// 命中调色板的采样像素比例 (0.0 - 1.0)
    pub ratio: f32,
    /// 采样像素平均饱和度 (0.0 - 1.0)
    pub avg_saturation: f32,
    /// 命中率加饱和度奖励后的得分 (0.0 - 1.0)
    pub score: f32,
}

/// 两个 RGB 颜色的欧氏距离 (0 - 441.67)
#[inline]
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// RGB 饱和度: (max - min) / max，黑色为 0
#[inline]
pub fn saturation(r: u8, g: u8, b: u8) -> f32 {
    let max = r.max(g).max(b) as f32;
    let min = r.min(g).min(b) as f32;
    if max > 0.0 {
        (max - min) / max
    } else {
        0.0
    }
}

/// 提取主色调
///
/// 每通道量化到 32 级 (值向下取整到 32 的倍数)，按出现次数
/// 排序取前 20 个。
pub fn dominant_colors(bitmap: &Bitmap, stride: u32) -> Vec<DominantColor> {
    use std::collections::HashMap;

    let mut buckets: HashMap<[u8; 3], u32> = HashMap::new();
    let mut total = 0u32;

    for px in PixelSampler::sample(bitmap, &Region::full(), stride) {
        let key = [
            (px.r / 32) * 32,
            (px.g / 32) * 32,
            (px.b / 32) * 32,
        ];
        *buckets.entry(key).or_insert(0) += 1;
        total += 1;
    }

    let mut colors: Vec<DominantColor> = buckets
        .into_iter()
        .map(|(rgb, count)| DominantColor {
            rgb,
            count,
            percentage: if total > 0 {
                count as f32 / total as f32 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    colors.sort_by(|a, b| b.count.cmp(&a.count));
    colors.truncate(20);
    colors
}

/// 颜色签名匹配
///
/// 对每个目标色在主色调中找最佳相似度 max(0, 1 - dist/255)，
/// 再对所有目标色取平均。目标为空时返回 0。
pub fn match_colors(dominant: &[DominantColor], targets: &[[u8; 3]]) -> f32 {
    if targets.is_empty() || dominant.is_empty() {
        return 0.0;
    }

    let sum: f32 = targets
        .iter()
        .map(|target| {
            dominant
                .iter()
                .map(|d| (1.0 - color_distance(d.rgb, *target) / 255.0).max(0.0))
                .fold(0.0f32, f32::max)
        })
        .sum();

    sum / targets.len() as f32
}

/// 颜色多样性: 主色调两两距离的平均值 / 255
pub fn color_diversity(dominant: &[DominantColor]) -> f32 {
    if dominant.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0f32;
    let mut pairs = 0u32;
    for i in 0..dominant.len() {
        for j in (i + 1)..dominant.len() {
            total += color_distance(dominant[i].rgb, dominant[j].rgb);
            pairs += 1;
        }
    }
    total / pairs as f32 / 255.0
}

/// 采样像素对调色板的命中率
///
/// 与任意调色板颜色距离小于阈值的采样像素计为命中。
/// 平均饱和度超过 `saturation_floor` 时加 `saturation_bonus`。
pub fn palette_match(
    bitmap: &Bitmap,
    palette: &[[u8; 3]],
    stride: u32,
    distance_threshold: f32,
    saturation_floor: f32,
    saturation_bonus: f32,
) -> PaletteMatch {
    let mut hits = 0u32;
    let mut total = 0u32;
    let mut sat_sum = 0.0f32;

    for px in PixelSampler::sample(bitmap, &Region::full(), stride) {
        let rgb = [px.r, px.g, px.b];
        if palette
            .iter()
            .any(|c| color_distance(rgb, *c) < distance_threshold)
        {
            hits += 1;
        }
        sat_sum += saturation(px.r, px.g, px.b);
        total += 1;
    }

    if total == 0 {
        return PaletteMatch {
            ratio: 0.0,
            avg_saturation: 0.0,
            score: 0.0,
        };
    }

    let ratio = hits as f32 / total as f32;
    let avg_saturation = sat_sum / total as f32;
    let bonus = if avg_saturation > saturation_floor {
        saturation_bonus
    } else {
        0.0
    };

    PaletteMatch {
        ratio,
        avg_saturation,
        score: (ratio + bonus).min(1.0),
    }
}
