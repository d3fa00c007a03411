use crate::caption::{Captioner, TrueTypeFace};
use crate::config::RenderConfig;
use crate::density::DensityTable;
use crate::preprocess::{self, luminance, PreparedFrame};
use crate::Result;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::Command;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use log::debug;

/// A frame converted to text, ready to be written to the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Newline-joined rows; color frames carry escape codes inline
    pub text: String,
    /// Frame width in characters
    pub width: u32,
    /// Frame height in characters
    pub height: u32,
}

impl RenderedFrame {
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }
}

/// Decoded frame to character-art converter
pub struct FrameConverter {
    config: RenderConfig,
    table: DensityTable,
    captioner: Option<Captioner>,
}

impl FrameConverter {
    /// Create a converter, loading the caption font when captions are requested.
    ///
    /// Fails with `FontUnavailable` before any frame is touched if the font
    /// cannot be loaded.
    pub fn new(config: RenderConfig) -> Result<Self> {
        let captioner = if config.has_captions() {
            let face = TrueTypeFace::load(&config.resolved_font_path())?;
            Some(Captioner::new(
                Box::new(face),
                config.text_above.clone(),
                config.text_below.clone(),
                config.text_margin,
            ))
        } else {
            None
        };
        Ok(Self::with_captioner(config, captioner))
    }

    /// Create a converter with an explicit caption compositor
    pub fn with_captioner(config: RenderConfig, captioner: Option<Captioner>) -> Self {
        Self {
            table: DensityTable::new(config.inverse),
            config,
            captioner,
        }
    }

    /// Convert one decoded frame into text
    pub fn convert(&self, frame: DynamicImage) -> RenderedFrame {
        debug!("Converting frame {}x{}", frame.width(), frame.height());
        match preprocess::prepare(frame, &self.config, self.captioner.as_ref()) {
            PreparedFrame::Gray(image) => {
                render_monochrome(&image, &self.table, self.config.pixel_density)
            }
            PreparedFrame::Color(image) => {
                render_color(&image, &self.table, self.config.pixel_density)
            }
        }
    }
}

/// Map every grayscale pixel to a character, one text line per pixel row.
pub fn render_monochrome(image: &GrayImage, table: &DensityTable, bias: i32) -> RenderedFrame {
    let (width, height) = image.dimensions();
    let chars: Vec<char> = image.pixels().map(|p| table.map(p[0], bias)).collect();

    let text = chars
        .chunks(width.max(1) as usize)
        .map(|row| row.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    RenderedFrame {
        text,
        width,
        height,
    }
}

/// Map every RGB pixel to a character drawn in that pixel's color.
///
/// A foreground escape is only emitted when the color differs from the
/// previous pixel in the same row; every row ends with a reset.
pub fn render_color(image: &RgbImage, table: &DensityTable, bias: i32) -> RenderedFrame {
    let (width, height) = image.dimensions();
    let text = image
        .rows()
        .map(|row| render_color_row(row, table, bias))
        .collect::<Vec<_>>()
        .join("\n");

    RenderedFrame {
        text,
        width,
        height,
    }
}

fn render_color_row<'a>(
    row: impl Iterator<Item = &'a Rgb<u8>>,
    table: &DensityTable,
    bias: i32,
) -> String {
    let mut line = String::new();
    let mut last: Option<Rgb<u8>> = None;

    for pixel in row {
        let [r, g, b] = pixel.0;
        if last != Some(*pixel) {
            // formatting into a String cannot fail
            let _ = SetForegroundColor(Color::Rgb { r, g, b }).write_ansi(&mut line);
            last = Some(*pixel);
        }
        line.push(table.map(luminance(r, g, b), bias));
    }

    let _ = ResetColor.write_ansi(&mut line);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const RESET: &str = "\x1b[0m";

    fn escape_count(text: &str) -> usize {
        text.matches("\x1b[").count()
    }

    #[test]
    fn test_mid_gray_monochrome_grid() {
        let image = GrayImage::from_pixel(3, 2, Luma([125]));
        let frame = render_monochrome(&image, &DensityTable::new(false), 0);
        assert_eq!(frame.text, "***\n***");
        assert_eq!((frame.width, frame.height), (3, 2));
    }

    #[test]
    fn test_monochrome_row_major_order() {
        let image = GrayImage::from_fn(2, 2, |x, y| Luma([(x * 100 + y * 30) as u8]));
        let frame = render_monochrome(&image, &DensityTable::new(false), 0);
        // 0 -> '.', 100 -> '+', 30 -> ',', 130 -> '*'
        assert_eq!(frame.text, ".+\n,*");
        assert_eq!(frame.lines().count(), 2);
        assert!(frame.lines().all(|line| line.chars().count() == 2));
    }

    #[test]
    fn test_monochrome_inverse() {
        let image = GrayImage::from_pixel(2, 1, Luma([0]));
        let frame = render_monochrome(&image, &DensityTable::new(true), 0);
        assert_eq!(frame.text, "@@");
    }

    #[test]
    fn test_color_escape_per_run() {
        let red = Rgb([255, 0, 0]);
        let blue = Rgb([0, 0, 255]);
        let row = [red, red, blue, blue, red];
        let image = RgbImage::from_fn(5, 1, |x, _| row[x as usize]);
        let frame = render_color(&image, &DensityTable::new(false), 0);

        // three runs plus one reset
        assert_eq!(escape_count(&frame.text), 4);
        assert_eq!(frame.text.matches("\x1b[38;2;255;0;0m").count(), 2);
        assert_eq!(frame.text.matches("\x1b[38;2;0;0;255m").count(), 1);
        assert!(frame.text.ends_with(RESET));
        assert_eq!(
            frame.text,
            "\x1b[38;2;255;0;0m;;\x1b[38;2;0;0;255m,,\x1b[38;2;255;0;0m;\x1b[0m"
        );
    }

    #[test]
    fn test_color_reset_per_row_and_no_bleed() {
        let image = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        let frame = render_color(&image, &DensityTable::new(false), 0);
        let lines: Vec<&str> = frame.text.split('\n').collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            // color restated on every row
            assert!(line.starts_with("\x1b[38;2;10;20;30m"));
            assert!(line.ends_with(RESET));
            assert_eq!(escape_count(line), 2);
        }
    }

    #[test]
    fn test_color_escape_count_bounded_by_pixels() {
        let image = RgbImage::from_fn(4, 2, |x, y| Rgb([(x * 60) as u8, (y * 60) as u8, 0]));
        let frame = render_color(&image, &DensityTable::new(false), 0);
        let color_codes = frame.text.matches("\x1b[38;2;").count();
        // all adjacent pixels differ: one code per pixel
        assert_eq!(color_codes, 8);
        assert_eq!(frame.text.matches(RESET).count(), 2);
    }

    #[test]
    fn test_color_uses_luminance_for_character() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let frame = render_color(&image, &DensityTable::new(false), 0);
        assert!(frame.text.contains('@'));
    }

    #[test]
    fn test_convert_end_to_end() {
        let config = RenderConfig {
            width: 3,
            pixel_density: 0,
            ..Default::default()
        };
        let converter = FrameConverter::new(config).unwrap();
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([125, 125, 125])));
        let rendered = converter.convert(frame);
        assert_eq!(rendered.text, "***");
    }

    #[test]
    fn test_missing_caption_font_fails_early() {
        let config = RenderConfig {
            text_above: "hello".to_string(),
            font_path: Some("/no/such/font.ttf".into()),
            ..Default::default()
        };
        assert!(matches!(
            FrameConverter::new(config),
            Err(crate::AsciifyError::FontUnavailable { .. })
        ));
    }
}
