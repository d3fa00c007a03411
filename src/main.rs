use asciify::cli::Cli;
use asciify::converter::{FrameConverter, RenderedFrame};
use asciify::decoder::{is_video_path, FrameSource, VideoDecoder};
use asciify::player::{cancel_pair, PlaybackOutcome, Player};
use asciify::utils::format_duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use std::io::stdout;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still overrides the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // Validate CLI arguments
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    info!("Starting asciify v{}", asciify::VERSION);

    let render_config = cli.render_config();
    let animation_config = cli.animation_config();

    if cli.print_config {
        let resolved = serde_json::json!({
            "file_path": cli.file_path,
            "render": render_config,
            "animation": animation_config,
        });
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    if cli.info_only {
        return print_video_info(&cli);
    }

    if render_config.color && !atty::is(atty::Stream::Stdout) {
        warn!("stdout is not a terminal; color escape codes will be written verbatim");
    }

    let converter = FrameConverter::new(render_config)?;
    let source = FrameSource::open(&cli.file_path, animation_config.skip_frames)?;

    // Convert everything up front so a bad frame aborts before any output
    let frames = source
        .map(|frame| frame.map(|frame| converter.convert(frame)))
        .collect::<asciify::Result<Vec<RenderedFrame>>>()
        .with_context(|| format!("Failed to read frames from '{}'", cli.file_path.display()))?;
    debug!("Converted {} frames", frames.len());

    let (cancel, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut player = Player::new(stdout(), animation_config, token);
    match player.play(&frames).await? {
        PlaybackOutcome::Completed => info!("Playback finished. Total frames: {}", frames.len()),
        PlaybackOutcome::Cancelled => info!("Playback interrupted"),
    }

    Ok(())
}

fn print_video_info(cli: &Cli) -> Result<()> {
    if !is_video_path(&cli.file_path) {
        println!("{} is not a video file", cli.file_path.display());
        return Ok(());
    }

    let decoder = VideoDecoder::new(&cli.file_path)?;
    let (width, height) = decoder.dimensions();

    println!("Video Information:");
    println!("  File: {}", cli.file_path.display());
    println!("  Dimensions: {}x{}", width, height);
    println!("  Frame Rate: {:.2} FPS", decoder.fps());
    println!("  Duration: {}", format_duration(decoder.duration()));
    Ok(())
}
