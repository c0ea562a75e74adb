//! Live session registry

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::LiveConfig;
use crate::error::PipelineResult;
use crate::models::InferenceEngine;
use crate::types::{LetterEvent, LiveFrame};

use super::predictor::StreamingPredictor;

struct Session {
    predictor: StreamingPredictor,
    last_seen: Instant,
}

/// Owns every live session's predictor. Driven by a single task, so sessions
/// see their frames in arrival order and need no locking.
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
    vote_window: usize,
    reset_after_misses: u32,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(config: &LiveConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            vote_window: config.vote_window,
            reset_after_misses: config.reset_after_misses,
            idle_timeout: Duration::from_secs(config.session_idle_secs),
        }
    }

    /// Route one tick to its session, creating the session on first sight.
    ///
    /// Returns the letter event to publish when an inference fired.
    pub fn handle(
        &mut self,
        engine: &InferenceEngine,
        frame: LiveFrame,
    ) -> PipelineResult<Option<LetterEvent>> {
        self.handle_at(engine, frame, Instant::now())
    }

    fn handle_at(
        &mut self,
        engine: &InferenceEngine,
        frame: LiveFrame,
        now: Instant,
    ) -> PipelineResult<Option<LetterEvent>> {
        let LiveFrame {
            session_id,
            landmarks,
        } = frame;

        let vote_window = self.vote_window;
        let reset_after_misses = self.reset_after_misses;
        let session = self.sessions.entry(session_id.clone()).or_insert_with(|| {
            info!(session_id = %session_id, "Live session started");
            Session {
                predictor: StreamingPredictor::for_engine(engine, vote_window)
                    .with_reset_after_misses(reset_after_misses),
                last_seen: now,
            }
        });
        session.last_seen = now;

        let prediction = session.predictor.tick(engine, landmarks)?;

        Ok(prediction.map(|p| {
            debug!(
                session_id = %session_id,
                letter = %p.letter,
                stable_index = p.stable_index,
                frame_index = p.frame_index,
                confidence = p.confidence,
                "Live prediction"
            );
            LetterEvent::new(session_id, p.stable_index, p.frame_index, p.confidence)
        }))
    }

    /// Drop sessions idle for longer than the configured timeout; returns how many
    pub fn evict_idle(&mut self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        let timeout = self.idle_timeout;
        self.sessions.retain(|id, session| {
            let keep = now.saturating_duration_since(session.last_seen) < timeout;
            if !keep {
                info!(session_id = %id, "Live session expired");
            }
            keep
        });
        before - self.sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn predictor(&self, session_id: &str) -> Option<&StreamingPredictor> {
        self.sessions.get(session_id).map(|s| &s.predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::tests::{frame_for_class, stub_engine};

    fn live_config() -> LiveConfig {
        LiveConfig {
            vote_window: 4,
            reset_after_misses: 0,
            session_idle_secs: 60,
        }
    }

    fn frame(session: &str, class: Option<usize>) -> LiveFrame {
        LiveFrame {
            session_id: session.to_string(),
            landmarks: class.map(frame_for_class),
        }
    }

    #[test]
    fn test_sessions_are_independent() {
        let engine = stub_engine(2);
        let mut registry = SessionRegistry::new(&live_config());

        assert!(registry.handle(&engine, frame("a", Some(1))).unwrap().is_none());
        assert!(registry.handle(&engine, frame("b", Some(2))).unwrap().is_none());

        let event = registry
            .handle(&engine, frame("a", Some(1)))
            .unwrap()
            .unwrap();
        assert_eq!(event.session_id, "a");
        assert_eq!(event.letter, "A");

        assert_eq!(registry.session_count(), 2);
        assert_eq!(registry.predictor("b").unwrap().buffered_frames(), 1);
    }

    #[test]
    fn test_missing_hand_creates_no_event() {
        let engine = stub_engine(1);
        let mut registry = SessionRegistry::new(&live_config());
        assert!(registry.handle(&engine, frame("a", None)).unwrap().is_none());
        assert_eq!(registry.predictor("a").unwrap().consecutive_misses(), 1);
    }

    #[test]
    fn test_bad_frame_only_affects_its_session() {
        let engine = stub_engine(1);
        let mut registry = SessionRegistry::new(&live_config());
        let bad = LiveFrame {
            session_id: "a".to_string(),
            landmarks: Some(vec![0.0; 5]),
        };
        assert!(registry.handle(&engine, bad).is_err());
        assert!(registry.handle(&engine, frame("b", Some(3))).unwrap().is_some());
    }

    #[test]
    fn test_evict_idle() {
        let engine = stub_engine(2);
        let mut registry = SessionRegistry::new(&live_config());
        let start = Instant::now();

        registry
            .handle_at(&engine, frame("old", Some(1)), start)
            .unwrap();
        registry
            .handle_at(&engine, frame("new", Some(1)), start + Duration::from_secs(50))
            .unwrap();

        let evicted = registry.evict_idle_at(start + Duration::from_secs(90));
        assert_eq!(evicted, 1);
        assert!(registry.predictor("old").is_none());
        assert!(registry.predictor("new").is_some());
    }
}
