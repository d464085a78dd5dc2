//! Steam 严格判定
//!
//! Steam 客户端的深色界面很容易和深色网页混淆，所以对它使用
//! 淘汰制级联：任一判据不过直接得 0 分，全部通过且总分达标才保留。

use crate::bitmap::{luminance, Bitmap};

/// 严格判定参数 (仅选择加入的签名使用)
#[derive(Debug, Clone)]
pub struct StrictCriteria {
    /// 暗像素比例下限
    pub min_dark_ratio: f32,
    /// 游戏类 UI 元素得分下限
    pub min_gaming_ui: f32,
    /// 浏览器元素得分上限
    pub max_browser_elements: f32,
    /// 颜色得分下限
    pub min_color_score: f32,
    /// UI 得分下限
    pub min_ui_score: f32,
    /// 最终得分下限
    pub min_final_score: f32,
}

impl Default for StrictCriteria {
    fn default() -> Self {
        Self {
            min_dark_ratio: 0.5,
            min_gaming_ui: 0.4,
            max_browser_elements: 0.2,
            min_color_score: 0.25,
            min_ui_score: 0.3,
            min_final_score: 0.7,
        }
    }
}

/// 级联评估结果
#[derive(Debug, Clone)]
pub struct StrictOutcome {
    /// 通过级联后的得分 (未通过为 0)
    pub score: f32,
    /// 未通过的判据说明
    pub penalties: Vec<String>,
}

/// 亮度低于 80 的采样像素比例
pub fn dark_pixel_ratio(bitmap: &Bitmap) -> f32 {
    let mut dark = 0u32;
    let mut total = 0u32;

    for chunk in bitmap.data.chunks_exact(4).step_by(4) {
        if luminance(chunk[0], chunk[1], chunk[2]) < 80.0 {
            dark += 1;
        }
        total += 1;
    }

    if total > 0 {
        dark as f32 / total as f32
    } else {
        0.0
    }
}

/// 平滑渐变区域比例 (10 像素对角差落在 20 - 100 之间)
pub fn gradient_score(bitmap: &Bitmap) -> f32 {
    const STEP: u32 = 10;
    if bitmap.width <= STEP || bitmap.height <= STEP {
        return 0.0;
    }

    let mut gradient_regions = 0u32;
    let mut total = 0u32;

    for y in (0..bitmap.height - STEP).step_by(STEP as usize) {
        for x in (0..bitmap.width - STEP).step_by(STEP as usize) {
            let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
                (bitmap.pixel(x, y), bitmap.pixel(x + STEP, y + STEP))
            else {
                continue;
            };
            let diff = (r1 as i32 - r2 as i32).abs()
                + (g1 as i32 - g2 as i32).abs()
                + (b1 as i32 - b2 as i32).abs();
            if diff > 20 && diff < 100 {
                gradient_regions += 1;
            }
            total += 1;
        }
    }

    if total > 0 {
        (gradient_regions as f32 / total as f32 * 5.0).min(1.0)
    } else {
        0.0
    }
}

/// 圆角按钮样式的区域数量 (上边缘对比明显的矩形块)
pub fn rounded_button_score(bitmap: &Bitmap) -> f32 {
    const BTN_W: u32 = 60;
    const BTN_H: u32 = 30;
    if bitmap.width < BTN_W + 40 || bitmap.height < BTN_H + 60 {
        return 0.0;
    }

    let mut button_like = 0u32;

    for y in (20..bitmap.height - BTN_H - 10).step_by(20) {
        for x in (20..bitmap.width - BTN_W).step_by(20) {
            if is_button_like(bitmap, x, y, BTN_W) {
                button_like += 1;
            }
        }
    }

    (button_like as f32 / 20.0).min(1.0)
}

/// 区域上边缘与内侧亮度差超过 30 的比例大于 0.3 视为按钮样式
fn is_button_like(bitmap: &Bitmap, start_x: u32, start_y: u32, width: u32) -> bool {
    let mut edge = 0u32;
    let mut total = 0u32;

    for x in start_x..(start_x + width).min(bitmap.width) {
        let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
            (bitmap.pixel(x, start_y), bitmap.pixel(x, start_y + 2))
        else {
            continue;
        };
        if (luminance(r1, g1, b1) - luminance(r2, g2, b2)).abs() > 30.0 {
            edge += 1;
        }
        total += 1;
    }

    total > 0 && edge as f32 / total as f32 > 0.3
}

/// 网格布局: 规则的纵横分隔线各不少于 2 条时得 0.8
pub fn grid_layout_score(bitmap: &Bitmap) -> f32 {
    let width = bitmap.width as f32;
    let height = bitmap.height as f32;

    let mut vertical = 0u32;
    let mut x = width * 0.2;
    while x < width * 0.8 {
        if has_vertical_line(bitmap, x as u32) {
            vertical += 1;
        }
        x += width * 0.15;
    }

    let mut horizontal = 0u32;
    let mut y = height * 0.2;
    while y < height * 0.8 {
        if has_horizontal_line(bitmap, y as u32) {
            horizontal += 1;
        }
        y += height * 0.2;
    }

    if vertical >= 2 && horizontal >= 2 {
        0.8
    } else {
        0.0
    }
}

fn has_vertical_line(bitmap: &Bitmap, x: u32) -> bool {
    if bitmap.height < 20 {
        return false;
    }
    let mut edge_points = 0u32;
    let mut total = 0u32;

    for y in (10..bitmap.height - 10).step_by(5) {
        let left = x.saturating_sub(2);
        let right = (x + 2).min(bitmap.width - 1);
        let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
            (bitmap.pixel(left, y), bitmap.pixel(right, y))
        else {
            continue;
        };
        if (luminance(r1, g1, b1) - luminance(r2, g2, b2)).abs() > 25.0 {
            edge_points += 1;
        }
        total += 1;
    }

    total > 0 && edge_points as f32 / total as f32 > 0.3
}

fn has_horizontal_line(bitmap: &Bitmap, y: u32) -> bool {
    if bitmap.width < 20 {
        return false;
    }
    let mut edge_points = 0u32;
    let mut total = 0u32;

    for x in (10..bitmap.width - 10).step_by(5) {
        let top = y.saturating_sub(2);
        let bottom = (y + 2).min(bitmap.height - 1);
        let (Some([r1, g1, b1, _]), Some([r2, g2, b2, _])) =
            (bitmap.pixel(x, top), bitmap.pixel(x, bottom))
        else {
            continue;
        };
        if (luminance(r1, g1, b1) - luminance(r2, g2, b2)).abs() > 25.0 {
            edge_points += 1;
        }
        total += 1;
    }

    total > 0 && edge_points as f32 / total as f32 > 0.3
}

/// 游戏类 UI 元素综合得分: 渐变 0.3 + 圆角按钮 0.3 + 网格布局 0.4
pub fn gaming_ui_score(bitmap: &Bitmap) -> f32 {
    let score = gradient_score(bitmap) * 0.3
        + rounded_button_score(bitmap) * 0.3
        + grid_layout_score(bitmap) * 0.4;
    score.min(1.0)
}

/// 运行淘汰制级联
///
/// 五项判据必须全部通过，且组合得分不低于最终阈值，否则得 0。
pub fn evaluate(
    bitmap: &Bitmap,
    criteria: &StrictCriteria,
    color_score: f32,
    ui_score: f32,
    browser_score: f32,
) -> StrictOutcome {
    let mut penalties = Vec::new();
    let mut score = color_score * 0.6 + ui_score * 0.4;

    let dark = dark_pixel_ratio(bitmap);
    if dark < criteria.min_dark_ratio {
        penalties.push(format!(
            "暗像素不足 ({:.1}% < {:.0}%)",
            dark * 100.0,
            criteria.min_dark_ratio * 100.0
        ));
        score = 0.0;
    }

    let gaming = gaming_ui_score(bitmap);
    if gaming < criteria.min_gaming_ui {
        penalties.push(format!(
            "游戏类 UI 元素不足 ({:.1}% < {:.0}%)",
            gaming * 100.0,
            criteria.min_gaming_ui * 100.0
        ));
        score = 0.0;
    }

    if browser_score > criteria.max_browser_elements {
        penalties.push(format!(
            "浏览器元素过多 ({:.1}% > {:.0}%)",
            browser_score * 100.0,
            criteria.max_browser_elements * 100.0
        ));
        score = 0.0;
    }

    if color_score < criteria.min_color_score {
        penalties.push(format!(
            "颜色得分不足 ({:.1}% < {:.0}%)",
            color_score * 100.0,
            criteria.min_color_score * 100.0
        ));
        score = 0.0;
    }

    if ui_score < criteria.min_ui_score {
        penalties.push(format!(
            "UI 得分不足 ({:.1}% < {:.0}%)",
            ui_score * 100.0,
            criteria.min_ui_score * 100.0
        ));
        score = 0.0;
    }

    if score > 0.0 && score < criteria.min_final_score {
        penalties.push(format!(
            "最终得分不足 ({:.1}% < {:.0}%)",
            score * 100.0,
            criteria.min_final_score * 100.0
        ));
        score = 0.0;
    }

    StrictOutcome { score, penalties }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_pixel_ratio() {
        let dark = Bitmap::new(32, 32, [10, 12, 16, 255]);
        assert!(dark_pixel_ratio(&dark) > 0.99);

        let light = Bitmap::new(32, 32, [240, 240, 240, 255]);
        assert!(dark_pixel_ratio(&light) < 0.01);
    }

    #[test]
    fn test_gradient_score_on_gradient() {
        // 垂直亮度渐变
        let mut bmp = Bitmap::new(100, 100, [0, 0, 0, 255]);
        for y in 0..100u32 {
            for x in 0..100u32 {
                let v = (y * 255 / 100) as u8;
                let offset = ((y * 100 + x) * 4) as usize;
                bmp.data[offset] = v;
                bmp.data[offset + 1] = v;
                bmp.data[offset + 2] = v;
            }
        }
        assert!(gradient_score(&bmp) > 0.5);

        let flat = Bitmap::new(100, 100, [40, 40, 40, 255]);
        assert_eq!(gradient_score(&flat), 0.0);
    }

    #[test]
    fn test_bright_page_fails_cascade() {
        // 亮色页面: 暗像素判据直接淘汰
        let bmp = Bitmap::new(100, 100, [240, 240, 240, 255]);
        let outcome = evaluate(&bmp, &StrictCriteria::default(), 0.9, 0.9, 0.0);
        assert_eq!(outcome.score, 0.0);
        assert!(!outcome.penalties.is_empty());
    }

    #[test]
    fn test_low_color_score_fails_cascade() {
        let bmp = Bitmap::new(100, 100, [10, 12, 16, 255]);
        let outcome = evaluate(&bmp, &StrictCriteria::default(), 0.1, 0.9, 0.0);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.penalties.iter().any(|p| p.contains("颜色")));
    }

    #[test]
    fn test_browser_elements_fail_cascade() {
        let bmp = Bitmap::new(100, 100, [10, 12, 16, 255]);
        let outcome = evaluate(&bmp, &StrictCriteria::default(), 0.9, 0.9, 0.5);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.penalties.iter().any(|p| p.contains("浏览器")));
    }

    #[test]
    fn test_all_criteria_must_pass() {
        // 放宽所有判据时高分输入通过级联
        let bmp = Bitmap::new(100, 100, [10, 12, 16, 255]);
        let lenient = StrictCriteria {
            min_dark_ratio: 0.0,
            min_gaming_ui: 0.0,
            max_browser_elements: 1.0,
            min_color_score: 0.0,
            min_ui_score: 0.0,
            min_final_score: 0.0,
        };
        let outcome = evaluate(&bmp, &lenient, 0.9, 0.9, 0.0);
        assert!(outcome.score > 0.8);
        assert!(outcome.penalties.is_empty());
    }
}
