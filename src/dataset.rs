//! Labeled landmark samples.
//!
//! Recorded samples come in a few shapes. Each shape is its own variant with
//! its own validation, so nothing is guessed from the data at runtime.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::normalizer::resample_or_pad;
use crate::types::{Frame, RawSequence};

/// One recorded sample, tagged by shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Sample {
    /// Flat features with the label stored as the final value
    FlatWithLabel { values: Vec<f32> },
    /// Flat features with a separate label
    Flat { features: Vec<f32>, label: f32 },
    /// Frame rows with a separate label
    Frames { frames: Vec<Vec<f32>>, label: f32 },
}

/// Validated sample ready for normalization
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSequence {
    pub sequence: RawSequence,
    pub label: usize,
}

impl Sample {
    pub fn flat_with_label(values: Vec<f32>) -> Self {
        Self::FlatWithLabel { values }
    }

    pub fn flat(features: Vec<f32>, label: usize) -> Self {
        Self::Flat {
            features,
            label: label as f32,
        }
    }

    pub fn frames(frames: Vec<Vec<f32>>, label: usize) -> Self {
        Self::Frames {
            frames,
            label: label as f32,
        }
    }

    /// Validate the sample and split it into frames plus label
    pub fn into_labeled(self, features_per_frame: usize) -> PipelineResult<LabeledSequence> {
        let (sequence, label) = match self {
            Sample::FlatWithLabel { mut values } => {
                let label = values
                    .pop()
                    .ok_or_else(|| PipelineError::invalid_sample("sample has no values"))?;
                (RawSequence::from_flat(&values, features_per_frame)?, label)
            }
            Sample::Flat { features, label } => {
                (RawSequence::from_flat(&features, features_per_frame)?, label)
            }
            Sample::Frames { frames, label } => {
                let frames = frames
                    .into_iter()
                    .map(|row| Frame::new(row, features_per_frame))
                    .collect::<PipelineResult<Vec<_>>>()?;
                (RawSequence::from_frames(frames)?, label)
            }
        };

        Ok(LabeledSequence {
            sequence,
            label: parse_label(label)?,
        })
    }
}

fn parse_label(label: f32) -> PipelineResult<usize> {
    if !label.is_finite() || label < 0.0 || label.fract() != 0.0 {
        return Err(PipelineError::invalid_sample(format!(
            "label must be a non-negative integer, got {label}"
        )));
    }
    Ok(label as usize)
}

/// Resample each sample to `seq_len` frames and flatten it into one row:
/// `seq_len * features_per_frame` values followed by the label.
pub fn normalize_samples(
    samples: impl IntoIterator<Item = Sample>,
    seq_len: usize,
    features_per_frame: usize,
) -> PipelineResult<Vec<Vec<f32>>> {
    samples
        .into_iter()
        .map(|sample| -> PipelineResult<Vec<f32>> {
            let labeled = sample.into_labeled(features_per_frame)?;
            let frames = resample_or_pad(labeled.sequence.frames(), seq_len);

            let mut row = Vec::with_capacity(seq_len * features_per_frame + 1);
            for frame in &frames {
                row.extend_from_slice(frame.values());
            }
            row.push(labeled.label as f32);
            Ok(row)
        })
        .collect()
}

/// Read samples from a JSON Lines file, skipping blank lines
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open samples file {}", path.display()))?;

    let mut samples = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample: Sample = serde_json::from_str(&line).with_context(|| {
            format!("Invalid sample on line {} of {}", line_no + 1, path.display())
        })?;
        samples.push(sample);
    }
    Ok(samples)
}
