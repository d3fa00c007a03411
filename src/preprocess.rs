use crate::caption::Captioner;
use crate::config::RenderConfig;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use log::debug;

/// A frame that is ready for character mapping.
#[derive(Debug, Clone)]
pub enum PreparedFrame {
    /// Grayscale pixels for monochrome output
    Gray(GrayImage),
    /// RGB pixels for color output
    Color(RgbImage),
}

impl PreparedFrame {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PreparedFrame::Gray(img) => img.dimensions(),
            PreparedFrame::Color(img) => img.dimensions(),
        }
    }
}

/// Run the fixed preprocessing chain on one decoded frame:
/// captions, resize, contrast, brightness, then grayscale for monochrome output.
pub fn prepare(
    frame: DynamicImage,
    config: &RenderConfig,
    captioner: Option<&Captioner>,
) -> PreparedFrame {
    let frame = frame.into_rgb8();
    let frame = match captioner {
        Some(captioner) => captioner.apply(frame),
        None => frame,
    };

    let mut frame = resize_to_width(&frame, config.width);

    if config.contrast != 1.0 {
        adjust_contrast(&mut frame, config.contrast);
    }
    if config.brightness != 1.0 {
        adjust_brightness(&mut frame, config.brightness);
    }

    if config.color {
        PreparedFrame::Color(frame)
    } else {
        PreparedFrame::Gray(to_grayscale(&frame))
    }
}

/// Height for a resize to `width` columns.
///
/// Terminal cells are roughly twice as tall as wide, so the height is halved.
/// Never returns less than one row.
pub fn target_height(width: u32, src_width: u32, src_height: u32) -> u32 {
    if src_width == 0 {
        return 1;
    }
    let ratio = f64::from(src_height) / (f64::from(src_width) * 2.0);
    ((f64::from(width) * ratio).round() as u32).max(1)
}

/// Resize preserving the aspect ratio (with the cell-height correction).
pub fn resize_to_width(image: &RgbImage, width: u32) -> RgbImage {
    let (src_width, src_height) = image.dimensions();
    let height = target_height(width, src_width, src_height);
    debug!("Resizing {}x{} -> {}x{}", src_width, src_height, width, height);
    imageops::resize(image, width, height, FilterType::CatmullRom)
}

/// Scale contrast around the mean gray level of the image.
///
/// A factor of 0.0 yields a flat gray image, 1.0 leaves the image unchanged.
pub fn adjust_contrast(image: &mut RgbImage, factor: f32) {
    let pixel_count = u64::from(image.width()) * u64::from(image.height());
    if pixel_count == 0 {
        return;
    }
    let sum: u64 = image
        .pixels()
        .map(|p| u64::from(luminance(p[0], p[1], p[2])))
        .sum();
    let mean = (sum as f64 / pixel_count as f64).round() as f32;

    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = mean + factor * (f32::from(*channel) - mean);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Scale brightness; 0.0 is black, 1.0 leaves the image unchanged.
pub fn adjust_brightness(image: &mut RgbImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (f32::from(*channel) * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// ITU-R BT.601 luma, rounded to the nearest integer.
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        Luma([luminance(p[0], p[1], p[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_target_height_formula() {
        assert_eq!(target_height(100, 200, 100), 25);
        assert_eq!(target_height(3, 3, 2), 1);
        assert_eq!(target_height(80, 640, 480), 30);
        // 10 * 3 / (4 * 2) = 3.75
        assert_eq!(target_height(10, 4, 3), 4);
    }

    #[test]
    fn test_target_height_never_zero() {
        assert_eq!(target_height(10, 1000, 1), 1);
        assert_eq!(target_height(10, 0, 10), 1);
    }

    #[test]
    fn test_resize_dimensions() {
        let image = RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]));
        let resized = resize_to_width(&image, 32);
        assert_eq!(resized.dimensions(), (32, 12));
    }

    #[test]
    fn test_luminance() {
        assert_eq!(luminance(0, 0, 0), 0);
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(125, 125, 125), 125);
        assert_eq!(luminance(255, 0, 0), 76);
        assert_eq!(luminance(0, 255, 0), 150);
        assert_eq!(luminance(0, 0, 255), 29);
    }

    #[test]
    fn test_contrast_zero_flattens_to_mean() {
        let mut image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([200, 200, 200])
            }
        });
        adjust_contrast(&mut image, 0.0);
        assert_eq!(image.get_pixel(0, 0), &Rgb([100, 100, 100]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([100, 100, 100]));
    }

    #[test]
    fn test_contrast_increase_spreads_values() {
        let mut image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([90, 90, 90])
            } else {
                Rgb([110, 110, 110])
            }
        });
        adjust_contrast(&mut image, 2.0);
        assert_eq!(image.get_pixel(0, 0), &Rgb([80, 80, 80]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([120, 120, 120]));
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let mut image = RgbImage::from_pixel(1, 1, Rgb([100, 200, 0]));
        adjust_brightness(&mut image, 1.5);
        assert_eq!(image.get_pixel(0, 0), &Rgb([150, 255, 0]));
    }

    #[test]
    fn test_prepare_monochrome() {
        let config = RenderConfig {
            width: 4,
            ..Default::default()
        };
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, Rgb([50, 50, 50])));
        match prepare(frame, &config, None) {
            PreparedFrame::Gray(img) => {
                assert_eq!(img.dimensions(), (4, 1));
                assert!(img.pixels().all(|p| p[0] == 50));
            }
            PreparedFrame::Color(_) => panic!("expected grayscale output"),
        }
    }

    #[test]
    fn test_prepare_color_keeps_rgb() {
        let config = RenderConfig {
            width: 2,
            color: true,
            ..Default::default()
        };
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 200, 30])));
        let prepared = prepare(frame, &config, None);
        assert_eq!(prepared.dimensions(), (2, 1));
        match prepared {
            PreparedFrame::Color(img) => assert_eq!(img.get_pixel(0, 0), &Rgb([10, 200, 30])),
            PreparedFrame::Gray(_) => panic!("expected color output"),
        }
    }
}
