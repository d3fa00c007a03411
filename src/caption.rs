//! Caption bands above and below a frame.
//!
//! Each caption is drawn at the largest font size whose rendered width stays
//! within `image_width - 2 * margin`. Rendered width grows monotonically with
//! font size, so the search is a binary search over a bounded size range that
//! keeps the reject-on-first-exceed rule: the accepted size is the smallest
//! exceeding size minus one.

use crate::{AsciifyError, Result};
use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgb, RgbImage};
use log::{debug, info};
use std::path::Path;

/// First font size tried by the search
pub const MIN_FONT_SIZE: u32 = 10;

/// Upper bound of the search; captions that still fit here are drawn at this size
pub const MAX_FONT_SIZE: u32 = 400;

/// Horizontal inset of caption text, in pixels
pub const CAPTION_INSET: i32 = 10;

const BAND_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Font operations needed to fit and draw captions.
pub trait CaptionFace {
    /// Rendered `(width, height)` of `text` at `size` pixels.
    fn measure(&self, text: &str, size: u32) -> (u32, u32);

    /// Draw `text` in white with its top-left corner at `(x, y)`.
    fn draw(&self, canvas: &mut RgbImage, text: &str, size: u32, x: i32, y: i32);
}

/// A TrueType/OpenType font loaded from disk.
pub struct TrueTypeFace {
    font: FontVec,
}

impl TrueTypeFace {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| AsciifyError::FontUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| AsciifyError::FontUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("Loaded caption font '{}'", path.display());
        Ok(Self { font })
    }
}

impl CaptionFace for TrueTypeFace {
    fn measure(&self, text: &str, size: u32) -> (u32, u32) {
        imageproc::drawing::text_size(PxScale::from(size as f32), &self.font, text)
    }

    fn draw(&self, canvas: &mut RgbImage, text: &str, size: u32, x: i32, y: i32) {
        imageproc::drawing::draw_text_mut(
            canvas,
            TEXT_COLOR,
            x,
            y,
            PxScale::from(size as f32),
            &self.font,
            text,
        );
    }
}

/// Largest font size at which `text` is no wider than `target_width`.
///
/// Returns `MIN_FONT_SIZE - 1` when the text is already too wide at the first
/// size, and `MAX_FONT_SIZE` when it never exceeds the target.
pub fn fit_font_size(face: &dyn CaptionFace, text: &str, target_width: i64) -> u32 {
    let exceeds = |size: u32| i64::from(face.measure(text, size).0) > target_width;

    // sizes below `low` fit; sizes at or above `high` exceed
    let (mut low, mut high) = (MIN_FONT_SIZE, MAX_FONT_SIZE + 1);
    while low < high {
        let mid = low + (high - low) / 2;
        if exceeds(mid) {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    low - 1
}

/// A caption fitted to a particular frame width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedCaption {
    pub size: u32,
    /// Band height: text height plus margin
    pub band_height: u32,
}

/// Composites caption bands onto frames.
pub struct Captioner {
    face: Box<dyn CaptionFace>,
    top: String,
    bottom: String,
    margin: u32,
}

impl Captioner {
    pub fn new(
        face: Box<dyn CaptionFace>,
        top: impl Into<String>,
        bottom: impl Into<String>,
        margin: u32,
    ) -> Self {
        Self {
            face,
            top: top.into(),
            bottom: bottom.into(),
            margin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.bottom.is_empty()
    }

    /// Fit one caption to `image_width`; `None` when the caption is empty.
    pub fn fit(&self, text: &str, image_width: u32) -> Option<FittedCaption> {
        if text.is_empty() {
            return None;
        }
        let target_width = i64::from(image_width) - 2 * i64::from(self.margin);
        let size = fit_font_size(self.face.as_ref(), text, target_width);
        let (_, text_height) = self.face.measure(text, size);
        Some(FittedCaption {
            size,
            band_height: text_height + self.margin,
        })
    }

    /// Return a taller canvas with the caption bands and the frame pasted between them.
    ///
    /// The frame is returned untouched when no caption is set.
    pub fn apply(&self, frame: RgbImage) -> RgbImage {
        if self.is_empty() {
            return frame;
        }

        let (width, height) = frame.dimensions();
        let top = self.fit(&self.top, width);
        let bottom = self.fit(&self.bottom, width);
        let top_height = top.as_ref().map_or(0, |c| c.band_height);
        let bottom_height = bottom.as_ref().map_or(0, |c| c.band_height);

        debug!(
            "Caption sizes: top={:?} bottom={:?} for width {}",
            top.as_ref().map(|c| c.size),
            bottom.as_ref().map(|c| c.size),
            width
        );

        let mut canvas = RgbImage::from_pixel(width, height + top_height + bottom_height, BAND_COLOR);
        imageops::overlay(&mut canvas, &frame, 0, i64::from(top_height));

        let margin = self.margin as i32;
        if let Some(caption) = &top {
            let y = margin - (top_height / 3) as i32;
            self.face
                .draw(&mut canvas, &self.top, caption.size, CAPTION_INSET, y);
        }
        if let Some(caption) = &bottom {
            let baseline = (height + top_height) as i32 + margin / 2;
            let y = baseline - (bottom_height / 3) as i32;
            self.face
                .draw(&mut canvas, &self.bottom, caption.size, CAPTION_INSET, y);
        }

        canvas
    }
}
