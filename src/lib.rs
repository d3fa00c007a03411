//! Asciify - render images and short videos as character art in the terminal
//!
//! Frames come from a still image or a sampled video, get optional caption
//! bands, are resized for terminal cells and mapped onto a density ramp,
//! optionally with truecolor escape codes, then printed once or looped in place.

pub mod caption;
pub mod cli;
pub mod config;
pub mod converter;
pub mod decoder;
pub mod density;
pub mod player;
pub mod preprocess;

pub use caption::{CaptionFace, Captioner, TrueTypeFace};
pub use cli::Cli;
pub use config::{AnimationConfig, RenderConfig, Repeat};
pub use converter::{render_color, render_monochrome, FrameConverter, RenderedFrame};
pub use decoder::{FrameSource, VideoDecoder};
pub use density::{map_intensity, DensityTable, DENSITY_CHARS};
pub use player::{cancel_pair, CancelHandle, CancelToken, PlaybackOutcome, Player};

use std::path::PathBuf;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum AsciifyError {
    #[error("Unable to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unable to open video '{path}': {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Caption font '{path}' is unavailable: {reason}")]
    FontUnavailable { path: PathBuf, reason: String },

    #[error("No frames found in the source")]
    EmptySequence,

    #[error("Video decoding error: {0}")]
    VideoDecoding(#[from] ffmpeg_next::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AsciifyError>;

/// Utility functions
pub mod utils {
    /// Format duration in a human-readable way
    pub fn format_duration(seconds: f64) -> String {
        let total_seconds = seconds.max(0.0) as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        cancel_pair, map_intensity, render_color, render_monochrome, utils::*, AnimationConfig,
        AsciifyError, CancelToken, Cli, DensityTable, FrameConverter, FrameSource,
        PlaybackOutcome, Player, RenderConfig, RenderedFrame, Repeat, Result,
    };
}
