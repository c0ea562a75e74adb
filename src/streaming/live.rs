//! Live frame loop: routes decoded frames to their sessions and sweeps idle ones

use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::LiveConfig;
use crate::error::PipelineResult;
use crate::metrics::PipelineMetrics;
use crate::models::InferenceEngine;
use crate::types::{LetterEvent, LiveFrame};

use super::session::SessionRegistry;

/// Single owner of the session registry. Letters leave through a channel so
/// publishing never blocks frame ordering on the transport.
pub struct LiveSessions {
    engine: Arc<InferenceEngine>,
    registry: SessionRegistry,
    metrics: Arc<PipelineMetrics>,
    letters: mpsc::Sender<LetterEvent>,
}

impl LiveSessions {
    pub fn new(
        engine: Arc<InferenceEngine>,
        config: &LiveConfig,
        metrics: Arc<PipelineMetrics>,
        letters: mpsc::Sender<LetterEvent>,
    ) -> Self {
        Self {
            engine,
            registry: SessionRegistry::new(config),
            metrics,
            letters,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Handle frames in arrival order until the stream ends. Idle sessions
    /// are swept every `sweep_every`, whether or not frames keep arriving.
    pub async fn run<S>(&mut self, frames: S, sweep_every: Duration)
    where
        S: Stream<Item = PipelineResult<LiveFrame>>,
    {
        let mut frames = std::pin::pin!(frames);
        let mut sweep = tokio::time::interval(sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = frames.next() => match frame {
                    Some(frame) => self.handle(frame).await,
                    None => break,
                },
                _ = sweep.tick() => self.sweep(),
            }
        }
    }

    async fn handle(&mut self, frame: PipelineResult<LiveFrame>) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to decode live frame");
                self.metrics.record_live_error();
                return;
            }
        };

        self.metrics.record_live_tick(frame.landmarks.is_some());
        let session_id = frame.session_id.clone();
        let start_time = Instant::now();

        match self.registry.handle(&self.engine, frame) {
            Ok(Some(event)) => {
                self.metrics.record_live_inference(
                    start_time.elapsed(),
                    event.frame_index,
                    event.confidence,
                );
                if self.letters.send(event).await.is_err() {
                    warn!(session_id = %session_id, "Letter channel closed, dropping letter");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Live frame rejected");
                self.metrics.record_live_error();
            }
        }
    }

    fn sweep(&mut self) {
        let evicted = self.registry.evict_idle();
        if evicted > 0 {
            info!(
                evicted = evicted,
                active = self.registry.session_count(),
                "Idle live sessions evicted"
            );
        }
    }
}
