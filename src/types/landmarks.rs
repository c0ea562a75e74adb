//! Hand landmark frames and sequences

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Number of tracked points per hand
pub const LANDMARKS_PER_HAND: usize = 21;

/// Coordinates per landmark (x, y, z)
pub const COORDS_PER_LANDMARK: usize = 3;

/// Flattened width of one frame
pub const FEATURES_PER_FRAME: usize = LANDMARKS_PER_HAND * COORDS_PER_LANDMARK;

/// Landmark index of the wrist
pub const WRIST: usize = 0;

/// One tracked 3D point on a hand
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Flattened landmark values for one time instant.
///
/// Always holds the exact frame width it was constructed with; a wrong width
/// is rejected instead of truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    values: Vec<f32>,
}

impl Frame {
    /// Create a frame, validating its width
    pub fn new(values: Vec<f32>, features_per_frame: usize) -> PipelineResult<Self> {
        if values.len() != features_per_frame {
            return Err(PipelineError::FrameShape {
                expected: features_per_frame,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    /// Build a frame from exactly one hand's worth of landmarks
    pub fn from_landmarks(landmarks: &[Landmark]) -> PipelineResult<Self> {
        let values = landmarks
            .iter()
            .flat_map(|lm| [lm.x, lm.y, lm.z])
            .collect();
        Self::new(values, FEATURES_PER_FRAME)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate the frame as (x, y, z) points
    pub fn landmarks(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.values
            .chunks_exact(COORDS_PER_LANDMARK)
            .map(|c| Landmark::new(c[0], c[1], c[2]))
    }

    /// The wrist landmark, or the origin for an empty frame
    pub fn wrist(&self) -> Landmark {
        self.landmarks().nth(WRIST).unwrap_or_default()
    }

    /// Copy of this frame with the wrist subtracted from every landmark
    pub fn to_wrist_relative(&self) -> Frame {
        let wrist = self.wrist();
        let values = self
            .values
            .chunks_exact(COORDS_PER_LANDMARK)
            .flat_map(|c| [c[0] - wrist.x, c[1] - wrist.y, c[2] - wrist.z])
            .collect();
        Frame { values }
    }
}

/// Variable-length sequence of frames, at least one frame long
#[derive(Debug, Clone, PartialEq)]
pub struct RawSequence {
    frames: Vec<Frame>,
}

impl RawSequence {
    /// Split a flat landmark list into frames
    pub fn from_flat(values: &[f32], features_per_frame: usize) -> PipelineResult<Self> {
        if values.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        if features_per_frame == 0 || values.len() % features_per_frame != 0 {
            return Err(PipelineError::Shape {
                expected: features_per_frame,
                actual: values.len(),
            });
        }

        let frames = values
            .chunks_exact(features_per_frame)
            .map(|chunk| Frame {
                values: chunk.to_vec(),
            })
            .collect();

        Ok(Self { frames })
    }

    pub fn from_frames(frames: Vec<Frame>) -> PipelineResult<Self> {
        if frames.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Sequence with exactly the model's configured frame count
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSequence {
    frames: Vec<Frame>,
}

impl NormalizedSequence {
    /// Wrap frames that already have the target length (e.g. a full sliding window)
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Row-major `[frames, features]` values
    pub fn to_flat(&self) -> Vec<f32> {
        self.frames
            .iter()
            .flat_map(|f| f.values().iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_frame(offset: f32) -> Vec<f32> {
        (0..FEATURES_PER_FRAME).map(|i| offset + i as f32).collect()
    }

    #[test]
    fn test_frame_rejects_wrong_width() {
        let err = Frame::new(vec![0.0; 62], FEATURES_PER_FRAME).unwrap_err();
        assert_eq!(
            err,
            PipelineError::FrameShape {
                expected: 63,
                actual: 62
            }
        );
    }

    #[test]
    fn test_frame_landmarks() {
        let frame = Frame::new(ramp_frame(0.0), FEATURES_PER_FRAME).unwrap();
        let points: Vec<Landmark> = frame.landmarks().collect();
        assert_eq!(points.len(), LANDMARKS_PER_HAND);
        assert_eq!(points[1], Landmark::new(3.0, 4.0, 5.0));
        assert_eq!(frame.wrist(), Landmark::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn test_wrist_relative_frame() {
        let frame = Frame::new(ramp_frame(10.0), FEATURES_PER_FRAME).unwrap();
        let rel = frame.to_wrist_relative();
        assert_eq!(rel.wrist(), Landmark::default());
        // every point moves by the same offset
        assert_eq!(rel.landmarks().nth(2), Some(Landmark::new(6.0, 6.0, 6.0)));
    }

    #[test]
    fn test_from_landmarks() {
        let points = vec![Landmark::new(1.0, 2.0, 3.0); LANDMARKS_PER_HAND];
        let frame = Frame::from_landmarks(&points).unwrap();
        assert_eq!(frame.len(), FEATURES_PER_FRAME);
        assert_eq!(&frame.values()[..3], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_landmarks_needs_whole_hand() {
        let points = vec![Landmark::new(1.0, 2.0, 3.0); LANDMARKS_PER_HAND - 1];
        assert_eq!(
            Frame::from_landmarks(&points),
            Err(PipelineError::FrameShape {
                expected: FEATURES_PER_FRAME,
                actual: 60
            })
        );
    }

    #[test]
    fn test_raw_sequence_from_flat() {
        let mut flat = ramp_frame(0.0);
        flat.extend(ramp_frame(100.0));

        let seq = RawSequence::from_flat(&flat, FEATURES_PER_FRAME).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.frames()[1].values()[0], 100.0);
    }

    #[test]
    fn test_raw_sequence_errors() {
        assert_eq!(
            RawSequence::from_flat(&[], FEATURES_PER_FRAME).unwrap_err(),
            PipelineError::EmptyInput
        );
        assert_eq!(
            RawSequence::from_flat(&[0.0; 64], FEATURES_PER_FRAME).unwrap_err(),
            PipelineError::Shape {
                expected: 63,
                actual: 64
            }
        );
        assert_eq!(
            RawSequence::from_frames(Vec::new()).unwrap_err(),
            PipelineError::EmptyInput
        );
    }

    #[test]
    fn test_normalized_sequence_flat_order() {
        let frames = vec![
            Frame::new(ramp_frame(0.0), FEATURES_PER_FRAME).unwrap(),
            Frame::new(ramp_frame(1000.0), FEATURES_PER_FRAME).unwrap(),
        ];
        let seq = NormalizedSequence::from_frames(frames);
        let flat = seq.to_flat();
        assert_eq!(flat.len(), 2 * FEATURES_PER_FRAME);
        assert_eq!(flat[FEATURES_PER_FRAME], 1000.0);
    }
}
