//! Per-session streaming predictor.
//!
//! Frames accumulate in a sliding window of `seq_len` frames. Once the window
//! is full the session is `Ready` for good: every further frame slides the
//! window by one and triggers an inference whose class feeds the voter.

use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::models::InferenceEngine;
use crate::normalizer::wrist_relative;
use crate::types::{letter_for, Frame, NormalizedSequence};

use super::ring_buffer::RingBuffer;
use super::voter::TemporalVoter;

/// Window fill state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Fewer than `seq_len` frames buffered
    Filling,
    /// Window full; inference fires on every frame
    Ready,
}

/// Outcome of one live inference
#[derive(Debug, Clone, PartialEq)]
pub struct LivePrediction {
    /// Class predicted for this frame's window
    pub frame_index: usize,
    /// Confidence of that per-frame prediction
    pub confidence: f32,
    /// Majority vote over recent per-frame predictions
    pub stable_index: usize,
    /// Letter for `stable_index`
    pub letter: &'static str,
}

/// Sliding window plus vote history for one live session
#[derive(Debug, Clone)]
pub struct StreamingPredictor {
    window: RingBuffer<Frame>,
    voter: TemporalVoter,
    features_per_frame: usize,
    state: StreamState,
    consecutive_misses: u32,
    /// Clear the session after this many consecutive misses (`None` = never)
    reset_after_misses: Option<u32>,
}

impl StreamingPredictor {
    pub fn new(seq_len: usize, features_per_frame: usize, vote_window: usize) -> Self {
        Self {
            window: RingBuffer::with_capacity(seq_len),
            voter: TemporalVoter::new(vote_window),
            features_per_frame,
            state: StreamState::Filling,
            consecutive_misses: 0,
            reset_after_misses: None,
        }
    }

    /// Predictor sized for the engine's model
    pub fn for_engine(engine: &InferenceEngine, vote_window: usize) -> Self {
        Self::new(engine.seq_len(), engine.features_per_frame(), vote_window)
    }

    /// Opt into clearing the session after `misses` ticks without a hand (0 disables)
    pub fn with_reset_after_misses(mut self, misses: u32) -> Self {
        self.reset_after_misses = (misses > 0).then_some(misses);
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn buffered_frames(&self) -> usize {
        self.window.len()
    }

    pub fn voter(&self) -> &TemporalVoter {
        &self.voter
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    /// Handle one tick: `Some(values)` when a hand was detected, `None` otherwise
    pub fn tick(
        &mut self,
        engine: &InferenceEngine,
        landmarks: Option<Vec<f32>>,
    ) -> PipelineResult<Option<LivePrediction>> {
        match landmarks {
            Some(values) => self.push_frame(engine, values),
            None => {
                self.record_miss();
                Ok(None)
            }
        }
    }

    /// Add a detected frame; returns a prediction once the window is full.
    ///
    /// A frame of the wrong width is rejected and leaves the session untouched.
    pub fn push_frame(
        &mut self,
        engine: &InferenceEngine,
        values: Vec<f32>,
    ) -> PipelineResult<Option<LivePrediction>> {
        let frame = Frame::new(values, self.features_per_frame)?;
        self.consecutive_misses = 0;
        self.window.push(frame);

        if !self.window.is_full() {
            return Ok(None);
        }
        if self.state == StreamState::Filling {
            debug!(frames = self.window.len(), "Sliding window full");
            self.state = StreamState::Ready;
        }

        let seq = NormalizedSequence::from_frames(wrist_relative(&self.window.to_vec()));
        let classification = engine.classify(&seq)?;
        self.voter.record(classification.index);

        let stable_index = self.voter.vote().unwrap_or(classification.index);

        Ok(Some(LivePrediction {
            frame_index: classification.index,
            confidence: classification.confidence,
            stable_index,
            letter: letter_for(stable_index),
        }))
    }

    /// Tick without a hand: no frame, no inference, buffers kept.
    ///
    /// Returns true when the miss limit was reached and the session was reset.
    pub fn record_miss(&mut self) -> bool {
        self.consecutive_misses = self.consecutive_misses.saturating_add(1);

        match self.reset_after_misses {
            Some(limit) if self.consecutive_misses >= limit => {
                info!(misses = self.consecutive_misses, "Hand lost, resetting session buffers");
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Drop buffered frames and votes, back to `Filling`
    pub fn reset(&mut self) {
        self.window.clear();
        self.voter.clear();
        self.state = StreamState::Filling;
        self.consecutive_misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::inference::tests::{frame_for_class, stub_engine};
    use crate::types::FEATURES_PER_FRAME;

    #[test]
    fn test_filling_then_ready() {
        let engine = stub_engine(3);
        let mut predictor = StreamingPredictor::for_engine(&engine, 8);

        assert_eq!(predictor.push_frame(&engine, frame_for_class(1)).unwrap(), None);
        assert_eq!(predictor.push_frame(&engine, frame_for_class(1)).unwrap(), None);
        assert_eq!(predictor.state(), StreamState::Filling);

        let prediction = predictor
            .push_frame(&engine, frame_for_class(1))
            .unwrap()
            .unwrap();
        assert_eq!(predictor.state(), StreamState::Ready);
        assert_eq!(prediction.frame_index, 1);
        assert_eq!(prediction.stable_index, 1);
        assert_eq!(prediction.letter, "A");

        // window slides instead of resetting
        assert!(predictor.push_frame(&engine, frame_for_class(1)).unwrap().is_some());
        assert_eq!(predictor.buffered_frames(), 3);
        assert_eq!(predictor.voter().len(), 2);
    }

    #[test]
    fn test_vote_smooths_changes() {
        let engine = stub_engine(1);
        let mut predictor = StreamingPredictor::for_engine(&engine, 5);

        for _ in 0..4 {
            predictor.push_frame(&engine, frame_for_class(3)).unwrap();
        }
        let p = predictor
            .push_frame(&engine, frame_for_class(9))
            .unwrap()
            .unwrap();
        assert_eq!(p.frame_index, 9);
        assert_eq!(p.stable_index, 3);
        assert_eq!(p.letter, "C");
    }

    #[test]
    fn test_wrong_width_rejected() {
        let engine = stub_engine(2);
        let mut predictor = StreamingPredictor::for_engine(&engine, 8);
        predictor.push_frame(&engine, frame_for_class(1)).unwrap();

        let err = predictor.push_frame(&engine, vec![0.0; 10]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::FrameShape {
                expected: FEATURES_PER_FRAME,
                actual: 10
            }
        );
        assert_eq!(predictor.buffered_frames(), 1);
    }

    #[test]
    fn test_miss_keeps_buffers_by_default() {
        let engine = stub_engine(2);
        let mut predictor = StreamingPredictor::for_engine(&engine, 8);
        predictor.push_frame(&engine, frame_for_class(4)).unwrap();
        predictor.push_frame(&engine, frame_for_class(4)).unwrap();

        for _ in 0..100 {
            assert_eq!(predictor.tick(&engine, None).unwrap(), None);
        }
        assert_eq!(predictor.buffered_frames(), 2);
        assert_eq!(predictor.voter().len(), 1);
        assert_eq!(predictor.state(), StreamState::Ready);

        // next hand continues the stream immediately
        let p = predictor
            .tick(&engine, Some(frame_for_class(4)))
            .unwrap()
            .unwrap();
        assert_eq!(p.stable_index, 4);
        assert_eq!(predictor.consecutive_misses(), 0);
    }

    #[test]
    fn test_reset_after_misses() {
        let engine = stub_engine(2);
        let mut predictor = StreamingPredictor::for_engine(&engine, 8).with_reset_after_misses(3);
        predictor.push_frame(&engine, frame_for_class(4)).unwrap();
        predictor.push_frame(&engine, frame_for_class(4)).unwrap();

        assert!(!predictor.record_miss());
        assert!(!predictor.record_miss());
        assert!(predictor.record_miss());

        assert_eq!(predictor.buffered_frames(), 0);
        assert!(predictor.voter().is_empty());
        assert_eq!(predictor.state(), StreamState::Filling);
    }

    #[test]
    fn test_frame_resets_miss_counter() {
        let engine = stub_engine(2);
        let mut predictor = StreamingPredictor::for_engine(&engine, 8).with_reset_after_misses(2);

        predictor.record_miss();
        predictor.push_frame(&engine, frame_for_class(1)).unwrap();
        assert!(!predictor.record_miss());
        assert_eq!(predictor.buffered_frames(), 1);
    }
}
