//! OCR 预处理
//!
//! 提升小字号截图文本的可识别性：放大、锐化、自适应对比度、
//! Otsu 二值化、中值去噪。流水线各步可单独关闭。

use crate::bitmap::{luminance, Bitmap};
use crate::config::OcrPrepConfig;

/// 运行完整预处理流水线
pub fn prepare(bitmap: &Bitmap, config: &OcrPrepConfig) -> Bitmap {
    let mut gray = to_grayscale(bitmap);

    if config.upscale > 1 {
        gray = upscale(&gray, config.upscale);
    }
    if config.sharpen {
        gray = sharpen(&gray);
    }
    gray = adaptive_contrast(&gray, config.contrast_low, config.contrast_high);
    if config.binarize {
        let threshold = otsu_threshold(&gray);
        gray = binarize(&gray, threshold);
    }
    if config.denoise {
        gray = median_denoise(&gray);
    }

    to_bitmap(&gray)
}

/// 灰度图 (亮度通道)
#[derive(Debug, Clone)]
pub struct GrayImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl GrayImage {
    #[inline]
    fn get(&self, x: i64, y: i64) -> u8 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }
}

/// RGBA 转灰度
pub fn to_grayscale(bitmap: &Bitmap) -> GrayImage {
    let mut data = Vec::with_capacity((bitmap.width * bitmap.height) as usize);
    for chunk in bitmap.data.chunks_exact(4) {
        data.push(luminance(chunk[0], chunk[1], chunk[2]).round().min(255.0) as u8);
    }
    GrayImage {
        width: bitmap.width,
        height: bitmap.height,
        data,
    }
}

/// 灰度转 RGBA 位图 (OCR 引擎的输入形态)
pub fn to_bitmap(gray: &GrayImage) -> Bitmap {
    let mut data = Vec::with_capacity(gray.data.len() * 4);
    for &v in &gray.data {
        data.extend_from_slice(&[v, v, v, 255]);
    }
    Bitmap {
        width: gray.width,
        height: gray.height,
        data,
    }
}

/// 最近邻放大
pub fn upscale(gray: &GrayImage, factor: u32) -> GrayImage {
    let factor = factor.max(1);
    let width = gray.width * factor;
    let height = gray.height * factor;
    let mut data = Vec::with_capacity((width * height) as usize);

    for y in 0..height {
        for x in 0..width {
            data.push(gray.data[((y / factor) * gray.width + x / factor) as usize]);
        }
    }
    GrayImage { width, height, data }
}

/// 3x3 锐化 (中心 5，四邻 -1)
pub fn sharpen(gray: &GrayImage) -> GrayImage {
    let mut data = Vec::with_capacity(gray.data.len());
    for y in 0..gray.height as i64 {
        for x in 0..gray.width as i64 {
            let v = 5 * gray.get(x, y) as i32
                - gray.get(x - 1, y) as i32
                - gray.get(x + 1, y) as i32
                - gray.get(x, y - 1) as i32
                - gray.get(x, y + 1) as i32;
            data.push(v.clamp(0, 255) as u8);
        }
    }
    GrayImage {
        width: gray.width,
        height: gray.height,
        data,
    }
}

/// 自适应对比度: 中灰以下压暗、以上提亮
pub fn adaptive_contrast(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let data = gray
        .data
        .iter()
        .map(|&v| {
            let factor = if (v as f32) < 128.0 { low } else { high };
            (v as f32 * factor).clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage {
        width: gray.width,
        height: gray.height,
        data,
    }
}

/// Otsu 阈值: 直方图类间方差最大处
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in &gray.data {
        histogram[v as usize] += 1;
    }

    let total = gray.data.len() as f64;
    if total == 0.0 {
        return 128;
    }

    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_bg = 0.0f64;
    let mut weight_bg = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_threshold = 128u8;

    for t in 0..256usize {
        weight_bg += histogram[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        sum_bg += t as f64 * histogram[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// 按阈值二值化
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let data = gray
        .data
        .iter()
        .map(|&v| if v > threshold { 255 } else { 0 })
        .collect();
    GrayImage {
        width: gray.width,
        height: gray.height,
        data,
    }
}

/// 3x3 中值去噪
pub fn median_denoise(gray: &GrayImage) -> GrayImage {
    let mut data = Vec::with_capacity(gray.data.len());
    for y in 0..gray.height as i64 {
        for x in 0..gray.width as i64 {
            let mut window = [0u8; 9];
            let mut i = 0;
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    window[i] = gray.get(x + dx, y + dy);
                    i += 1;
                }
            }
            window.sort_unstable();
            data.push(window[4]);
        }
    }
    GrayImage {
        width: gray.width,
        height: gray.height,
        data,
    }
}
