use crate::{AsciifyError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

/// Default caption font on Unix-like systems
pub const DEFAULT_UNIX_FONT: &str = "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttf";

/// Default caption font on Windows
pub const DEFAULT_WINDOWS_FONT: &str = "C:/Windows/Fonts/arialbd.ttf";

/// Settings for turning one frame into character art.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output width in characters
    pub width: u32,
    /// Contrast factor (1.0 = unchanged)
    pub contrast: f32,
    /// Brightness factor (1.0 = unchanged)
    pub brightness: f32,
    /// Bias added to every luminance value before mapping
    pub pixel_density: i32,
    /// Read the density table from dense to sparse
    pub inverse: bool,
    /// Emit truecolor escape codes
    pub color: bool,
    /// Caption drawn above the image
    pub text_above: String,
    /// Caption drawn below the image
    pub text_below: String,
    /// Caption margin in pixels
    pub text_margin: u32,
    /// Caption font; platform default when unset
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 100,
            contrast: 1.0,
            brightness: 1.0,
            pixel_density: 1,
            inverse: false,
            color: false,
            text_above: String::new(),
            text_below: String::new(),
            text_margin: 10,
            font_path: None,
        }
    }
}

impl RenderConfig {
    /// Whether any caption was requested
    pub fn has_captions(&self) -> bool {
        !self.text_above.is_empty() || !self.text_below.is_empty()
    }

    /// Font to load for captions, falling back to the platform default
    pub fn resolved_font_path(&self) -> PathBuf {
        match &self.font_path {
            Some(path) => path.clone(),
            None if cfg!(windows) => PathBuf::from(DEFAULT_WINDOWS_FONT),
            None => PathBuf::from(DEFAULT_UNIX_FONT),
        }
    }
}

/// How many times the frame sequence is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    Times(NonZeroU32),
    Forever,
}

impl Repeat {
    /// Map the command-line convention (`-1` = forever) to a repeat count.
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            -1 => Some(Repeat::Forever),
            n => u32::try_from(n).ok().and_then(NonZeroU32::new).map(Repeat::Times),
        }
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Repeat::Forever)
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Times(NonZeroU32::MIN)
    }
}

/// Playback settings for multi-frame sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Frames dropped after each retained frame
    pub skip_frames: u32,
    /// Outer loop count
    pub repeat: Repeat,
    /// Delay after each frame, in seconds
    pub frame_delay_secs: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            skip_frames: 0,
            repeat: Repeat::default(),
            frame_delay_secs: 0.15,
        }
    }
}

impl AnimationConfig {
    /// Delay after each frame; fails when the seconds value is not representable
    pub fn frame_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.frame_delay_secs).map_err(|e| {
            AsciifyError::InvalidConfig(format!(
                "time between frames {} is out of range: {e}",
                self.frame_delay_secs
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_from_count() {
        assert_eq!(Repeat::from_count(-1), Some(Repeat::Forever));
        assert_eq!(Repeat::from_count(0), None);
        assert_eq!(Repeat::from_count(-2), None);
        assert_eq!(
            Repeat::from_count(3),
            Some(Repeat::Times(NonZeroU32::new(3).unwrap()))
        );
    }

    #[test]
    fn test_defaults_match_cli() {
        let render = RenderConfig::default();
        assert_eq!(render.width, 100);
        assert_eq!(render.pixel_density, 1);
        assert_eq!(render.text_margin, 10);
        assert!(!render.has_captions());

        let anim = AnimationConfig::default();
        assert_eq!(anim.repeat, Repeat::Times(NonZeroU32::MIN));
        assert_eq!(anim.frame_delay().unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn test_unrepresentable_delay_is_rejected() {
        for secs in [1e300, f64::MAX, f64::INFINITY, f64::NAN, -0.5] {
            let anim = AnimationConfig {
                frame_delay_secs: secs,
                ..Default::default()
            };
            assert!(
                matches!(anim.frame_delay(), Err(AsciifyError::InvalidConfig(_))),
                "secs={secs}"
            );
        }
        let zero = AnimationConfig {
            frame_delay_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(zero.frame_delay().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_font_path_override() {
        let config = RenderConfig {
            font_path: Some(PathBuf::from("fonts/custom.ttf")),
            ..Default::default()
        };
        assert_eq!(config.resolved_font_path(), PathBuf::from("fonts/custom.ttf"));
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_string(&AnimationConfig {
            repeat: Repeat::Forever,
            ..Default::default()
        })
        .unwrap();
        assert!(json.contains("\"forever\""));
    }
}
