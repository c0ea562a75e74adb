//! Sequence normalization for model inference.
//!
//! Turns a variable-length landmark sequence into the fixed `[seq_len, features]`
//! shape the classifier was trained on, then removes absolute hand position by
//! expressing every landmark relative to the wrist. Rotation and scale are left
//! untouched, matching the training pipeline.

use crate::error::PipelineResult;
use crate::types::{Frame, NormalizedSequence, RawSequence};

/// Stateless normalizer bound to the model's sequence shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceNormalizer {
    seq_len: usize,
    features_per_frame: usize,
}

impl SequenceNormalizer {
    /// Create a normalizer for the given sequence shape.
    pub fn new(seq_len: usize, features_per_frame: usize) -> Self {
        Self {
            seq_len,
            features_per_frame,
        }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn features_per_frame(&self) -> usize {
        self.features_per_frame
    }

    /// Normalize a flat landmark list.
    ///
    /// Fails when the list is empty or its length is not a multiple of the
    /// frame width, since frame boundaries cannot be recovered.
    pub fn normalize_flat(&self, landmarks: &[f32]) -> PipelineResult<NormalizedSequence> {
        let raw = RawSequence::from_flat(landmarks, self.features_per_frame)?;
        Ok(self.normalize(&raw))
    }

    /// Resample/pad to `seq_len` frames and apply the wrist-relative transform.
    pub fn normalize(&self, raw: &RawSequence) -> NormalizedSequence {
        let resampled = resample_or_pad(raw.frames(), self.seq_len);
        NormalizedSequence::from_frames(wrist_relative(&resampled))
    }
}

/// Reconcile a sequence to exactly `target_len` frames.
///
/// - equal length: returned unchanged
/// - shorter: the last frame is repeated (the hand "holds still")
/// - longer: `target_len` evenly spaced frames are picked, no averaging
pub fn resample_or_pad(frames: &[Frame], target_len: usize) -> Vec<Frame> {
    let Some(last) = frames.last() else {
        return Vec::new();
    };

    if frames.len() == target_len {
        return frames.to_vec();
    }

    if frames.len() < target_len {
        let mut out = Vec::with_capacity(target_len);
        out.extend_from_slice(frames);
        out.resize(target_len, last.clone());
        return out;
    }

    resample_indices(frames.len(), target_len)
        .into_iter()
        .map(|i| frames[i].clone())
        .collect()
}

/// Evenly spaced indices across `[0, frames - 1]`, rounded to nearest.
///
/// Non-decreasing; duplicates are possible when `target_len` approaches `frames`.
pub fn resample_indices(frames: usize, target_len: usize) -> Vec<usize> {
    if frames == 0 || target_len == 0 {
        return Vec::new();
    }
    if target_len == 1 {
        return vec![0];
    }

    let last = (frames - 1) as f64;
    let step = last / (target_len - 1) as f64;

    (0..target_len)
        .map(|i| ((i as f64 * step).round() as usize).min(frames - 1))
        .collect()
}

/// Subtract each frame's wrist landmark from all of its landmarks.
///
/// Applying this to its own output is a no-op since the wrist is already zero.
pub fn wrist_relative(frames: &[Frame]) -> Vec<Frame> {
    frames.iter().map(Frame::to_wrist_relative).collect()
}
