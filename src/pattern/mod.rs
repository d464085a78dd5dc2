//! 视觉模式检测
//!
//! 亮度梯度边缘图、网格 / 对角线 / 文本密度等结构特征，
//! 供游戏分类器的模式因子与软件界面评分使用。

use crate::bitmap::{luminance, Bitmap, PixelSampler, Region};
use crate::color;
use serde::Serialize;

/// 边缘图采样步长 (像素)
const EDGE_SAMPLE_STEP: u32 = 4;
/// 梯度幅值超过此值计为边缘点
const EDGE_MAGNITUDE_THRESHOLD: f32 = 50.0;

/// 降采样梯度边缘图
///
/// 每个格点的梯度为 gx = |Δ左| + |Δ右|, gy = |Δ上| + |Δ下|,
/// 幅值为 sqrt(gx² + gy²)。
#[derive(Debug, Clone)]
pub struct EdgeMap {
    /// 格点列数
    pub cols: u32,
    /// 格点行数
    pub rows: u32,
    /// 行优先的梯度幅值
    pub magnitudes: Vec<f32>,
}

impl EdgeMap {
    /// 从位图构建边缘图
    pub fn build(bitmap: &Bitmap) -> Self {
        let step = EDGE_SAMPLE_STEP;
        let cols = bitmap.width / step;
        let rows = bitmap.height / step;
        let mut magnitudes = Vec::with_capacity((cols * rows) as usize);

        let luma_at = |x: i64, y: i64| -> f32 {
            let x = x.clamp(0, bitmap.width as i64 - 1) as u32;
            let y = y.clamp(0, bitmap.height as i64 - 1) as u32;
            bitmap
                .pixel(x, y)
                .map(|[r, g, b, _]| luminance(r, g, b))
                .unwrap_or(0.0)
        };

        for row in 0..rows {
            for col in 0..cols {
                let x = (col * step) as i64;
                let y = (row * step) as i64;
                let center = luma_at(x, y);
                let gx = (center - luma_at(x - 1, y)).abs() + (center - luma_at(x + 1, y)).abs();
                let gy = (center - luma_at(x, y - 1)).abs() + (center - luma_at(x, y + 1)).abs();
                magnitudes.push((gx * gx + gy * gy).sqrt());
            }
        }

        Self { cols, rows, magnitudes }
    }

    /// 幅值超过边缘阈值的格点比例
    pub fn edge_ratio(&self) -> f32 {
        if self.magnitudes.is_empty() {
            return 0.0;
        }
        let edges = self
            .magnitudes
            .iter()
            .filter(|&&m| m > EDGE_MAGNITUDE_THRESHOLD)
            .count();
        edges as f32 / self.magnitudes.len() as f32
    }

    #[inline]
    fn is_edge(&self, col: u32, row: u32) -> bool {
        self.magnitudes[(row * self.cols + col) as usize] > EDGE_MAGNITUDE_THRESHOLD
    }
}

/// 模式检测器
pub struct PatternDetector;

impl PatternDetector {
    /// 网格结构得分
    ///
    /// 边缘点超过行/列长度 30% 的行或列计为网格线，
    /// 每条 0.1 分，封顶 1.0。
    pub fn grid_score(edges: &EdgeMap) -> f32 {
        if edges.cols == 0 || edges.rows == 0 {
            return 0.0;
        }

        let mut lines = 0u32;

        for row in 0..edges.rows {
            let count = (0..edges.cols).filter(|&c| edges.is_edge(c, row)).count();
            if count as f32 > edges.cols as f32 * 0.3 {
                lines += 1;
            }
        }
        for col in 0..edges.cols {
            let count = (0..edges.rows).filter(|&r| edges.is_edge(col, r)).count();
            if count as f32 > edges.rows as f32 * 0.3 {
                lines += 1;
            }
        }

        (lines as f32 * 0.1).min(1.0)
    }

    /// 对角线 / 透视得分
    ///
    /// 采样对角相邻亮度差超过 40 的比例，与深度梯度指示
    /// (差值落在 20 - 100 区间) 按 0.7 / 0.3 混合。
    pub fn diagonal_score(bitmap: &Bitmap) -> f32 {
        let step = EDGE_SAMPLE_STEP;
        let mut diagonal_hits = 0u32;
        let mut depth_hits = 0u32;
        let mut total = 0u32;

        for y in (0..bitmap.height.saturating_sub(step)).step_by(step as usize) {
            for x in (0..bitmap.width.saturating_sub(step)).step_by(step as usize) {
                let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
                    (bitmap.pixel(x, y), bitmap.pixel(x + step, y + step))
                else {
                    continue;
                };
                let delta = (luminance(r1, g1, b1) - luminance(r2, g2, b2)).abs();
                if delta > 40.0 {
                    diagonal_hits += 1;
                }
                if delta > 20.0 && delta < 100.0 {
                    depth_hits += 1;
                }
                total += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }
        let diagonal = diagonal_hits as f32 / total as f32;
        let depth = depth_hits as f32 / total as f32;
        diagonal * 0.7 + depth * 0.3
    }

    /// 文本密度得分
    ///
    /// 按 20 像素方块划分，水平边缘 (亮度差 > 40) 比例超过 0.3
    /// 的方块计为文本块。方块比例放大 2 倍后封顶 1.0。
    pub fn text_density(bitmap: &Bitmap) -> f32 {
        const BLOCK: u32 = 20;
        if bitmap.width < BLOCK || bitmap.height < BLOCK {
            return 0.0;
        }

        let mut text_blocks = 0u32;
        let mut total_blocks = 0u32;

        for by in (0..bitmap.height - BLOCK + 1).step_by(BLOCK as usize) {
            for bx in (0..bitmap.width - BLOCK + 1).step_by(BLOCK as usize) {
                let mut edges = 0u32;
                let mut samples = 0u32;
                for y in by..by + BLOCK {
                    for x in bx..bx + BLOCK - 1 {
                        let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
                            (bitmap.pixel(x, y), bitmap.pixel(x + 1, y))
                        else {
                            continue;
                        };
                        if (luminance(r1, g1, b1) - luminance(r2, g2, b2)).abs() > 40.0 {
                            edges += 1;
                        }
                        samples += 1;
                    }
                }
                if samples > 0 && edges as f32 / samples as f32 > 0.3 {
                    text_blocks += 1;
                }
                total_blocks += 1;
            }
        }

        if total_blocks == 0 {
            return 0.0;
        }
        (text_blocks as f32 / total_blocks as f32 * 2.0).min(1.0)
    }

    /// 视觉复杂度
    ///
    /// 采样序列的颜色变化率与主色调多样性按 0.6 / 0.4 混合。
    pub fn visual_complexity(bitmap: &Bitmap, stride: u32) -> f32 {
        let mut changes = 0u32;
        let mut total = 0u32;
        let mut prev: Option<[u8; 3]> = None;

        for px in PixelSampler::sample(bitmap, &Region::full(), stride.max(1)) {
            let rgb = [px.r, px.g, px.b];
            if let Some(p) = prev {
                if color::color_distance(rgb, p) > 30.0 {
                    changes += 1;
                }
                total += 1;
            }
            prev = Some(rgb);
        }

        let change_rate = if total > 0 {
            changes as f32 / total as f32
        } else {
            0.0
        };
        let diversity = color::color_diversity(&color::dominant_colors(bitmap, stride.max(1)));

        change_rate * 0.6 + diversity * 0.4
    }

    /// 对称性检测: 未实现的扩展点，恒为 0
    ///
    /// 接入真实实现前不参与任何评分。
    pub fn symmetry_score(_bitmap: &Bitmap) -> f32 {
        0.0
    }

    /// 圆形元素检测: 未实现的扩展点，恒为 0
    pub fn circular_elements(_bitmap: &Bitmap) -> f32 {
        0.0
    }

    /// 矩形元素检测: 未实现的扩展点，恒为 0
    pub fn rectangular_elements(_bitmap: &Bitmap) -> f32 {
        0.0
    }
}

/// 模式特征汇总 (游戏分类器的模式与密度因子输入)
#[derive(Debug, Clone, Serialize)]
pub struct PatternFeatures {
    /// 对角线 / 透视得分
    pub diagonal: f32,
    /// 网格结构得分
    pub grid: f32,
    /// 文本密度
    pub text_density: f32,
    /// 视觉复杂度
    pub complexity: f32,
    /// 全图边缘比例
    pub edge_ratio: f32,
}

impl PatternFeatures {
    /// 一次性提取全部模式特征
    pub fn extract(bitmap: &Bitmap, stride: u32) -> Self {
        let edges = EdgeMap::build(bitmap);
        Self {
            diagonal: PatternDetector::diagonal_score(bitmap),
            grid: PatternDetector::grid_score(&edges),
            text_density: PatternDetector::text_density(bitmap),
            complexity: PatternDetector::visual_complexity(bitmap, stride),
            edge_ratio: edges.edge_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32, period: u32) -> Bitmap {
        let mut bmp = Bitmap::new(width, height, [0, 0, 0, 255]);
        for y in 0..height {
            for x in 0..width {
                if (x / period) % 2 == 0 {
                    let offset = ((y * width + x) * 4) as usize;
                    bmp.data[offset] = 255;
                    bmp.data[offset + 1] = 255;
                    bmp.data[offset + 2] = 255;
                }
            }
        }
        bmp
    }

    #[test]
    fn test_edge_map_uniform_is_flat() {
        let bmp = Bitmap::new(64, 64, [128, 128, 128, 255]);
        let edges = EdgeMap::build(&bmp);
        assert_eq!(edges.edge_ratio(), 0.0);
    }

    #[test]
    fn test_edge_map_stripes_have_edges() {
        let bmp = striped(64, 64, 4);
        let edges = EdgeMap::build(&bmp);
        assert!(edges.edge_ratio() > 0.0);
    }

    #[test]
    fn test_grid_score_on_stripes() {
        // 周期 4 竖条纹在每个采样列上都是边缘，列线得分拉满
        let bmp = striped(128, 128, 4);
        let edges = EdgeMap::build(&bmp);
        let score = PatternDetector::grid_score(&edges);
        assert!(score > 0.5);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_grid_score_uniform_is_zero() {
        let bmp = Bitmap::new(64, 64, [50, 50, 50, 255]);
        let edges = EdgeMap::build(&bmp);
        assert_eq!(PatternDetector::grid_score(&edges), 0.0);
    }

    #[test]
    fn test_diagonal_score_gradient() {
        // 对角亮度渐变产生深度梯度信号
        let mut bmp = Bitmap::new(64, 64, [0, 0, 0, 255]);
        for y in 0..64u32 {
            for x in 0..64u32 {
                let v = (((x + y) * 2) as u32).min(255) as u8;
                let offset = ((y * 64 + x) * 4) as usize;
                bmp.data[offset] = v;
                bmp.data[offset + 1] = v;
                bmp.data[offset + 2] = v;
            }
        }
        assert!(PatternDetector::diagonal_score(&bmp) > 0.0);
    }

    #[test]
    fn test_text_density_bounds() {
        let flat = Bitmap::new(100, 100, [255, 255, 255, 255]);
        assert_eq!(PatternDetector::text_density(&flat), 0.0);

        // 细条纹像文字一样水平边缘密集
        let busy = striped(100, 100, 1);
        let score = PatternDetector::text_density(&busy);
        assert!(score > 0.5);
        assert!(score <= 1.0);

        // 小于一个方块的图像
        let tiny = Bitmap::new(10, 10, [0, 0, 0, 255]);
        assert_eq!(PatternDetector::text_density(&tiny), 0.0);
    }

    #[test]
    fn test_visual_complexity_ordering() {
        let flat = Bitmap::new(64, 64, [128, 128, 128, 255]);
        let busy = striped(64, 64, 1);
        assert!(
            PatternDetector::visual_complexity(&busy, 2)
                > PatternDetector::visual_complexity(&flat, 2)
        );
    }

    #[test]
    fn test_placeholders_contribute_nothing() {
        let bmp = striped(64, 64, 2);
        assert_eq!(PatternDetector::symmetry_score(&bmp), 0.0);
        assert_eq!(PatternDetector::circular_elements(&bmp), 0.0);
        assert_eq!(PatternDetector::rectangular_elements(&bmp), 0.0);
    }
}
