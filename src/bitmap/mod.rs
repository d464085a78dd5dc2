//! 位图与像素采样
//!
//! 所有分析器的共同输入：RGBA 行优先位图、归一化区域、带步长的像素采样器。
//!
//! ## 特点
//! - 归一化区域坐标 (0.0 - 1.0)，越界自动裁剪
//! - 采样器保证不读越界像素
//! - Rec.601 亮度换算

use serde::{Deserialize, Serialize};

/// RGBA 位图 (行优先，每像素 4 字节)
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// RGBA 像素数据
    pub data: Vec<u8>,
}

impl Bitmap {
    /// 创建纯色位图
    pub fn new(width: u32, height: u32, fill: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&fill);
        }
        Self { width, height, data }
    }

    /// 从原始 RGBA 数据创建
    ///
    /// 数据长度必须为 width * height * 4。
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            anyhow::bail!("RGBA 数据长度不匹配: 期望 {}, 实际 {}", expected, data.len());
        }
        Ok(Self { width, height, data })
    }

    /// 从解码后的图像创建
    pub fn from_image(img: &image::RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }

    /// 读取单个像素 (越界返回 None)
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// 裁剪子区域为新位图 (像素坐标，自动截断到边界)
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Bitmap {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let w = w.min(self.width - x);
        let h = h.min(self.height - y);

        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for row in y..y + h {
            let start = ((row * self.width + x) * 4) as usize;
            let end = start + (w * 4) as usize;
            data.extend_from_slice(&self.data[start..end]);
        }
        Bitmap { width: w, height: h, data }
    }
}

/// 归一化区域 (相对坐标，0.0 - 1.0)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Region {
    /// 左上角 x (相对)
    pub x: f32,
    /// 左上角 y (相对)
    pub y: f32,
    /// 宽度 (相对)
    pub width: f32,
    /// 高度 (相对)
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// 整幅图像
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// 换算为像素矩形并裁剪到图像边界
    ///
    /// 完全越界时返回零尺寸矩形，调用方得到空统计而不是错误。
    pub fn to_pixel_rect(&self, bitmap: &Bitmap) -> PixelRect {
        let img_w = bitmap.width as f32;
        let img_h = bitmap.height as f32;

        let x0 = (self.x * img_w).max(0.0).min(img_w) as u32;
        let y0 = (self.y * img_h).max(0.0).min(img_h) as u32;
        let x1 = ((self.x + self.width) * img_w).max(0.0).min(img_w) as u32;
        let y1 = ((self.y + self.height) * img_h).max(0.0).min(img_h) as u32;

        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// 像素矩形 (裁剪后的绝对坐标)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// 是否为空 (区域完全在图像外时发生)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 采样到的像素
#[derive(Debug, Clone, Copy)]
pub struct Px {
    pub x: u32,
    pub y: u32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Px {
    /// Rec.601 亮度
    #[inline]
    pub fn luminance(&self) -> f32 {
        luminance(self.r, self.g, self.b)
    }
}

/// Rec.601 亮度换算
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// 像素采样器
///
/// 按固定步长遍历区域内像素，步长最小为 1。
pub struct PixelSampler;

impl PixelSampler {
    /// 采样区域内像素
    pub fn sample<'a>(
        bitmap: &'a Bitmap,
        region: &Region,
        stride: u32,
    ) -> impl Iterator<Item = Px> + 'a {
        let rect = region.to_pixel_rect(bitmap);
        let step = stride.max(1);

        (rect.y..rect.y + rect.height)
            .step_by(step as usize)
            .flat_map(move |y| {
                (rect.x..rect.x + rect.width)
                    .step_by(step as usize)
                    .map(move |x| (x, y))
            })
            .filter_map(move |(x, y)| {
                bitmap.pixel(x, y).map(|[r, g, b, a]| Px { x, y, r, g, b, a })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Bitmap {
        let mut bmp = Bitmap::new(width, height, [0, 0, 0, 255]);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
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
    fn test_from_raw_length_check() {
        assert!(Bitmap::from_raw(2, 2, vec![0; 16]).is_ok());
        assert!(Bitmap::from_raw(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let bmp = Bitmap::new(4, 4, [10, 20, 30, 255]);
        assert_eq!(bmp.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(bmp.pixel(4, 0), None);
        assert_eq!(bmp.pixel(0, 4), None);
    }

    #[test]
    fn test_region_clamping() {
        let bmp = Bitmap::new(100, 50, [0, 0, 0, 255]);

        // 部分越界: 裁剪到边界
        let rect = Region::new(0.5, 0.5, 1.0, 1.0).to_pixel_rect(&bmp);
        assert_eq!(rect.x, 50);
        assert_eq!(rect.y, 25);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 25);

        // 完全越界: 零尺寸而不是错误
        let rect = Region::new(2.0, 2.0, 0.5, 0.5).to_pixel_rect(&bmp);
        assert!(rect.is_empty());
    }

    #[test]
    fn test_sampler_never_out_of_bounds() {
        let bmp = checker(10, 10);
        let count = PixelSampler::sample(&bmp, &Region::new(0.8, 0.8, 5.0, 5.0), 1).count();
        // 区域超出边界，实际采样只覆盖 2x2
        assert_eq!(count, 4);
    }

    #[test]
    fn test_sampler_stride() {
        let bmp = checker(8, 8);
        let all = PixelSampler::sample(&bmp, &Region::full(), 1).count();
        let half = PixelSampler::sample(&bmp, &Region::full(), 2).count();
        assert_eq!(all, 64);
        assert_eq!(half, 16);

        // 步长 0 按 1 处理
        let zero = PixelSampler::sample(&bmp, &Region::full(), 0).count();
        assert_eq!(zero, 64);
    }

    #[test]
    fn test_luminance_weights() {
        assert!((luminance(255, 255, 255) - 255.0).abs() < 0.5);
        assert!((luminance(0, 0, 0)).abs() < f32::EPSILON);
        // 绿色通道权重最高
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn test_crop_clamps() {
        let bmp = checker(10, 10);
        let sub = bmp.crop(8, 8, 10, 10);
        assert_eq!(sub.width, 2);
        assert_eq!(sub.height, 2);
        assert_eq!(sub.data.len(), 16);
    }
}
