use crate::{AsciifyError, Result};
use ffmpeg_next as ffmpeg;
use image::{DynamicImage, RgbImage};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// File extensions routed to the video decoder
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "gif", "mkv", "mov", "webm"];

/// Whether `path` should be decoded as a video rather than a still image
pub fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|video| video.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// A decoder that hands out raw frames and converts only the ones asked for.
pub trait FrameDecoder {
    type Raw;

    /// Next raw frame, `None` at end of stream
    fn next_raw(&mut self) -> Result<Option<Self::Raw>>;

    /// Convert a retained raw frame to RGB
    fn to_image(&mut self, raw: &Self::Raw) -> Result<DynamicImage>;
}

/// Video decoder that extracts frames from video files
pub struct VideoDecoder {
    path: PathBuf,
    input_context: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    frame_count: u64,
    eof_sent: bool,
    fps: f64,
    duration: f64,
}

impl VideoDecoder {
    /// Open a video file, failing with `SourceUnavailable` if it cannot be decoded
    pub fn new(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| AsciifyError::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        ffmpeg::init().map_err(|e| unavailable(format!("FFmpeg initialization failed: {e}")))?;

        debug!("Attempting to open video file: {}", path.display());
        let input_context = ffmpeg::format::input(&path).map_err(|e| unavailable(e.to_string()))?;

        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| unavailable("no video stream found".to_string()))?;
        let stream_index = stream.index();

        let context_decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable(format!("failed to create codec context: {e}")))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| unavailable(format!("failed to create video decoder: {e}")))?;

        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            25.0
        };

        let duration = if stream.duration() != ffmpeg::ffi::AV_NOPTS_VALUE {
            stream.duration() as f64 * stream.time_base().numerator() as f64
                / stream.time_base().denominator() as f64
        } else {
            0.0
        };

        info!(
            "Opened video stream {} in '{}': {}x{}, {:.2} FPS, {:.2}s",
            stream_index,
            path.display(),
            decoder.width(),
            decoder.height(),
            fps,
            duration
        );

        Ok(Self {
            path: path.to_path_buf(),
            input_context,
            stream_index,
            decoder,
            scaler: None,
            frame_count: 0,
            eof_sent: false,
            fps,
            duration,
        })
    }

    /// Get video FPS
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Get video duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Get video dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        for (stream, packet) in self.input_context.packets() {
            if stream.index() == self.stream_index {
                return Some(packet);
            }
        }
        None
    }
}

impl FrameDecoder for VideoDecoder {
    type Raw = ffmpeg::frame::Video;

    fn next_raw(&mut self) -> Result<Option<Self::Raw>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    self.frame_count += 1;
                    return Ok(Some(decoded));
                }
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => {
                    if self.eof_sent {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e.into()),
            }

            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn to_image(&mut self, raw: &Self::Raw) -> Result<DynamicImage> {
        let (width, height) = (raw.width(), raw.height());

        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg::software::scaling::Context::get(
                raw.format(),
                width,
                height,
                ffmpeg::format::Pixel::RGB24,
                width,
                height,
                ffmpeg::software::scaling::Flags::BILINEAR,
            )?);
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        if let Some(ref mut scaler) = self.scaler {
            scaler.run(raw, &mut rgb_frame)?;
        }

        // rows may be padded past width * 3
        let row_bytes = width as usize * 3;
        let stride = rgb_frame.stride(0).max(row_bytes).max(1);
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in rgb_frame.data(0).chunks(stride).take(height as usize) {
            let pixels = row
                .get(..row_bytes)
                .ok_or(AsciifyError::VideoDecoding(ffmpeg::Error::InvalidData))?;
            data.extend_from_slice(pixels);
        }

        debug!("Decoded frame {}: {}x{}", self.frame_count, width, height);

        RgbImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgb8)
            .ok_or(AsciifyError::VideoDecoding(ffmpeg::Error::InvalidData))
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        debug!(
            "Releasing video decoder for '{}' after {} frames",
            self.path.display(),
            self.frame_count
        );
    }
}

/// Whether the frame at `index` survives sampling with `skip_frames`
pub fn is_retained(index: u64, skip_frames: u32) -> bool {
    index % (u64::from(skip_frames) + 1) == 0
}

/// Keeps every `skip_frames + 1`-th frame of a decoder, in order.
///
/// Dropped frames are never converted.
pub struct SampledFrames<D: FrameDecoder> {
    decoder: D,
    skip_frames: u32,
    index: u64,
    finished: bool,
}

impl<D: FrameDecoder> SampledFrames<D> {
    pub fn new(decoder: D, skip_frames: u32) -> Self {
        Self {
            decoder,
            skip_frames,
            index: 0,
            finished: false,
        }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: FrameDecoder> Iterator for SampledFrames<D> {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let raw = match self.decoder.next_raw() {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            let index = self.index;
            self.index += 1;
            if is_retained(index, self.skip_frames) {
                let image = self.decoder.to_image(&raw);
                if image.is_err() {
                    self.finished = true;
                }
                return Some(image);
            }
        }
        None
    }
}

/// Ordered raw frames from either a still image or a sampled video
pub enum FrameSource {
    Still(Option<DynamicImage>),
    Video(SampledFrames<VideoDecoder>),
}

impl FrameSource {
    /// Open `path`, routing by extension to the video or still-image path
    pub fn open(path: &Path, skip_frames: u32) -> Result<Self> {
        if is_video_path(path) {
            let decoder = VideoDecoder::new(path)?;
            Ok(FrameSource::Video(SampledFrames::new(decoder, skip_frames)))
        } else {
            let image = image::open(path).map_err(|source| AsciifyError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Opened image '{}': {}x{}", path.display(), image.width(), image.height());
            Ok(FrameSource::Still(Some(image)))
        }
    }
}

impl Iterator for FrameSource {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            FrameSource::Still(image) => image.take().map(Ok),
            FrameSource::Video(frames) => frames.next(),
        }
    }
}
