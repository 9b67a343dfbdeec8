use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};

use super::frame::FrameEncoder;
use super::sink::FrameSink;
use crate::engine::Engine;
use crate::error::ConsoleError;

pub type SharedEngine = Arc<Mutex<Engine>>;

/// How long to back off between attempts to take a contended engine lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Seconds of output between status lines.
const STATUS_INTERVAL_SECS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Shutdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_sent: u64,
    pub write_failures: u64,
    pub missed_deadlines: u64,
}

/// What the loop hands back when it stops, so the caller can close the
/// transport after the loop is gone.
pub struct LoopExit {
    pub sink: Box<dyn FrameSink>,
    pub stats: LoopStats,
}

/// Periodic task that advances the engine, encodes the live output and
/// writes it to the transport once per frame period.
pub struct OutputLoop {
    engine: SharedEngine,
    sink: Box<dyn FrameSink>,
    period: Duration,
    control: mpsc::Receiver<LoopControl>,
    encoder: FrameEncoder,
    stats: LoopStats,
}

impl OutputLoop {
    pub fn new(
        engine: SharedEngine,
        sink: Box<dyn FrameSink>,
        period: Duration,
        control: mpsc::Receiver<LoopControl>,
    ) -> Self {
        let channel_count = engine.lock().config().channel_count;
        Self {
            engine,
            sink,
            period,
            control,
            encoder: FrameEncoder::new(channel_count),
            stats: LoopStats::default(),
        }
    }

    pub async fn run(mut self) -> LoopExit {
        log::info!(
            "DMX output started on {}, frame period {:?}",
            self.sink.describe(),
            self.period
        );
        let status_every = (STATUS_INTERVAL_SECS / self.period.as_secs_f64()).round().max(1.0) as u64;
        let mut overrun = Duration::ZERO;

        loop {
            tokio::select! {
                biased;
                // A closed channel means the console is gone; stop as well.
                _ = self.control.recv() => {
                    log::info!("DMX output received shutdown signal");
                    break;
                }
                _ = sleep(self.period.saturating_sub(overrun)) => {}
            }

            let started = Instant::now();
            if !self.render_frame().await {
                log::info!("DMX output received shutdown signal while waiting for engine");
                break;
            }
            self.transmit().await;

            let elapsed = started.elapsed();
            overrun = if elapsed > self.period {
                self.stats.missed_deadlines += 1;
                log::warn!(
                    "Missed DMX frame deadline: frame took {:?}, period is {:?}",
                    elapsed,
                    self.period
                );
                self.period
            } else {
                elapsed
            };

            let ticks = self.stats.frames_sent + self.stats.write_failures;
            if ticks > 0 && ticks % status_every == 0 {
                log::debug!(
                    "DMX: {} frames sent, {} write failures, {} missed deadlines",
                    self.stats.frames_sent,
                    self.stats.write_failures,
                    self.stats.missed_deadlines
                );
            }
        }

        log::info!(
            "DMX output stopped after {} frames ({} write failures, {} missed deadlines)",
            self.stats.frames_sent,
            self.stats.write_failures,
            self.stats.missed_deadlines
        );
        LoopExit {
            sink: self.sink,
            stats: self.stats,
        }
    }

    /// Take the engine lock without blocking, checking for shutdown between
    /// attempts. Returns false if shutdown was requested first.
    async fn render_frame(&mut self) -> bool {
        loop {
            if shutdown_requested(&mut self.control) {
                return false;
            }
            if self.try_render() {
                return true;
            }
            sleep(LOCK_RETRY_INTERVAL).await;
        }
    }

    fn try_render(&mut self) -> bool {
        let Some(mut engine) = self.engine.try_lock() else {
            return false;
        };
        if engine.is_transitioning() {
            engine.advance(self.period.as_secs_f64());
        }
        self.encoder.encode(engine.output());
        true
    }

    /// Write the encoded frame, giving up after one frame period. Failed
    /// frames are dropped, not retried.
    async fn transmit(&mut self) {
        match timeout(self.period, self.sink.send_frame(self.encoder.frame())).await {
            Ok(Ok(())) => self.stats.frames_sent += 1,
            Ok(Err(e)) => {
                self.stats.write_failures += 1;
                log::warn!("Failed to write DMX frame to {}: {}", self.sink.describe(), e);
            }
            Err(_) => {
                self.stats.write_failures += 1;
                log::warn!(
                    "DMX frame write to {} timed out, frame dropped",
                    self.sink.describe()
                );
            }
        }
    }
}

fn shutdown_requested(control: &mut mpsc::Receiver<LoopControl>) -> bool {
    match control.try_recv() {
        Ok(LoopControl::Shutdown) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// A running output loop.
pub struct OutputHandle {
    control: mpsc::Sender<LoopControl>,
    task: JoinHandle<LoopExit>,
}

impl OutputHandle {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn(engine: SharedEngine, sink: Box<dyn FrameSink>, period: Duration) -> Self {
        let (control, control_rx) = mpsc::channel(8);
        let task = tokio::spawn(OutputLoop::new(engine, sink, period, control_rx).run());
        Self { control, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop, wait for it to exit, then close the transport.
    pub async fn shutdown(self) -> Result<LoopStats, ConsoleError> {
        if self.control.send(LoopControl::Shutdown).await.is_err() {
            log::debug!("DMX output already stopped");
        }
        let exit = self.task.await.map_err(|e| {
            log::error!("DMX output task failed: {}", e);
            ConsoleError::Transport(std::io::Error::other(e.to_string()))
        })?;

        let LoopExit { mut sink, stats } = exit;
        sink.close().await?;
        log::info!("Closed DMX transport {}", sink.describe());
        Ok(stats)
    }
}
