use crate::config::{AnimationConfig, Repeat};
use crate::converter::RenderedFrame;
use crate::{AsciifyError, Result};
use crossterm::{
    cursor::{MoveTo, MoveToPreviousLine},
    queue,
    style::ResetColor,
    terminal::{Clear, ClearType},
};
use log::{debug, info};
use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;

/// Lines moved up after each frame; enough to cover any frame block
pub const REDRAW_LINES: u16 = 999;

/// Pause after each finite loop before the next one starts
pub const LOOP_PAUSE: Duration = Duration::from_secs(1);

/// Requests a stop of a running playback
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by the player between frames and during sleeps
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                // handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Where the player is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    SingleShot,
    Looping { iteration: u64 },
    Done,
}

/// How playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled,
}

/// Writes rendered frames to a terminal stream
pub struct Player<W: Write> {
    out: W,
    config: AnimationConfig,
    cancel: CancelToken,
    loop_pause: Duration,
    state: PlayerState,
}

impl<W: Write> Player<W> {
    pub fn new(out: W, config: AnimationConfig, cancel: CancelToken) -> Self {
        Self {
            out,
            config,
            cancel,
            loop_pause: LOOP_PAUSE,
            state: PlayerState::Idle,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Play `frames` in order.
    ///
    /// A single frame is printed once with no terminal control. Several
    /// frames are looped in place, redrawn over the previous block.
    pub async fn play(&mut self, frames: &[RenderedFrame]) -> Result<PlaybackOutcome> {
        match frames {
            [] => Err(AsciifyError::EmptySequence),
            [frame] => {
                self.state = PlayerState::SingleShot;
                writeln!(self.out, "{}", frame.text)?;
                self.out.flush()?;
                self.state = PlayerState::Done;
                Ok(PlaybackOutcome::Completed)
            }
            _ => {
                let outcome = self.run_loop(frames).await?;
                self.state = PlayerState::Done;
                Ok(outcome)
            }
        }
    }

    async fn run_loop(&mut self, frames: &[RenderedFrame]) -> Result<PlaybackOutcome> {
        let delay = self.config.frame_delay()?;
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        info!(
            "Playing {} frames, repeat {:?}, delay {:?}",
            frames.len(),
            self.config.repeat,
            delay
        );

        let mut iteration: u64 = 0;
        loop {
            self.state = PlayerState::Looping { iteration };
            debug!("Starting loop iteration {}", iteration + 1);

            for (i, frame) in frames.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return self.stop();
                }
                write!(self.out, "Frame {}/{}\n{}", i + 1, frames.len(), frame.text)?;
                self.out.flush()?;
                if self.pause(delay).await {
                    return self.stop();
                }
                queue!(self.out, MoveToPreviousLine(REDRAW_LINES))?;
            }
            iteration += 1;

            match self.config.repeat {
                Repeat::Forever => {}
                Repeat::Times(count) => {
                    if iteration >= u64::from(count.get()) {
                        self.out.flush()?;
                        return Ok(PlaybackOutcome::Completed);
                    }
                    if self.pause(self.loop_pause).await {
                        return self.stop();
                    }
                }
            }
        }
    }

    /// Sleep for `duration`; true if cancelled meanwhile
    async fn pause(&mut self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }

    fn stop(&mut self) -> Result<PlaybackOutcome> {
        info!("Playback cancelled");
        queue!(self.out, ResetColor)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(PlaybackOutcome::Cancelled)
    }
}
