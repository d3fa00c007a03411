use crate::config::{AnimationConfig, RenderConfig, Repeat};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the image or video to show
    #[arg(required = true)]
    pub file_path: PathBuf,

    /// Width of the generated art in characters
    #[arg(long, default_value_t = 100)]
    pub width: u32,

    /// Contrast factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f32,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub brightness: f32,

    /// Bias added to each pixel's luminance before mapping
    #[arg(long, alias = "pixel_density", default_value_t = 1, allow_hyphen_values = true)]
    pub pixel_density: i32,

    /// Text to add above the image
    #[arg(long, alias = "text_above", default_value = "")]
    pub text_above: String,

    /// Text to add below the image
    #[arg(long, alias = "text_below", default_value = "")]
    pub text_below: String,

    /// Frames to drop after each shown frame of a video
    #[arg(long, alias = "skip_frames", default_value_t = 0)]
    pub skip_frames: u32,

    /// Number of times to play a video (-1 for infinite)
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub repeat: i64,

    /// Time between video frames in seconds
    #[arg(long, alias = "time_between_frames", default_value_t = 0.15)]
    pub time_between_frames: f64,

    /// Print colored art based on the original image colors
    #[arg(long)]
    pub color: bool,

    /// Map darker pixels to denser characters
    #[arg(long)]
    pub inverse: bool,

    /// Font used for captions (defaults to a common system font)
    #[arg(long, alias = "font_path")]
    pub font_path: Option<PathBuf>,

    /// Caption margin in pixels
    #[arg(long, alias = "text_margin", default_value_t = 10)]
    pub text_margin: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show video information only (don't play)
    #[arg(long)]
    pub info_only: bool,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if !self.file_path.exists() {
            return Err(format!("File does not exist: {}", self.file_path.display()));
        }

        if self.width == 0 {
            return Err("Width must be greater than 0".to_string());
        }

        if Repeat::from_count(self.repeat).is_none() {
            return Err("Repeat must be at least 1, or -1 for infinite".to_string());
        }

        if !self.time_between_frames.is_finite() || self.time_between_frames < 0.0 {
            return Err("Time between frames must be a non-negative number".to_string());
        }
        self.animation_config()
            .frame_delay()
            .map_err(|e| e.to_string())?;

        for (name, factor) in [("Contrast", self.contrast), ("Brightness", self.brightness)] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(format!("{name} factor must be a non-negative number"));
            }
        }

        Ok(())
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            contrast: self.contrast,
            brightness: self.brightness,
            pixel_density: self.pixel_density,
            inverse: self.inverse,
            color: self.color,
            text_above: self.text_above.clone(),
            text_below: self.text_below.clone(),
            text_margin: self.text_margin,
            font_path: self.font_path.clone(),
        }
    }

    /// Playback settings; an invalid repeat count falls back to a single pass
    pub fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            skip_frames: self.skip_frames,
            repeat: Repeat::from_count(self.repeat).unwrap_or_default(),
            frame_delay_secs: self.time_between_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("asciify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["image.png"]);
        assert_eq!(cli.render_config(), RenderConfig::default());
        assert_eq!(cli.animation_config(), AnimationConfig::default());
    }

    #[test]
    fn test_negative_values_and_aliases() {
        let cli = parse(&["clip.mp4", "--pixel_density", "-30", "--repeat", "-1", "--skip_frames", "2"]);
        assert_eq!(cli.pixel_density, -30);
        assert_eq!(cli.animation_config().repeat, Repeat::Forever);
        assert_eq!(cli.animation_config().skip_frames, 2);
    }

    #[test]
    fn test_validate() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        assert!(parse(&[path]).validate().is_ok());
        assert!(parse(&[path, "--width", "0"]).validate().is_err());
        assert!(parse(&[path, "--repeat", "0"]).validate().is_err());
        assert!(parse(&[path, "--repeat", "-2"]).validate().is_err());
        assert!(parse(&[path, "--time-between-frames=-0.5"]).validate().is_err());
        assert!(parse(&[path, "--time-between-frames", "1e300"]).validate().is_err());
        assert!(parse(&[path, "--contrast=-1"]).validate().is_err());
        assert!(parse(&["/no/such/file.png"]).validate().is_err());
    }
}
