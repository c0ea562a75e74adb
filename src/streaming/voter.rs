//! Majority-vote stabilization of per-frame predictions

use std::collections::BTreeMap;

use super::ring_buffer::RingBuffer;

/// Default number of recent predictions considered
pub const DEFAULT_VOTE_WINDOW: usize = 8;

/// Most frequent class in `history`; ties go to the lowest class index.
pub fn majority_vote<I>(history: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for index in history {
        *counts.entry(index).or_insert(0) += 1;
    }

    // ascending key order + strict comparison keeps the lowest index on ties
    let mut best: Option<(usize, usize)> = None;
    for (index, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((index, count));
        }
    }
    best.map(|(index, _)| index)
}

/// Short history of per-frame class indices for one session
#[derive(Debug, Clone)]
pub struct TemporalVoter {
    history: RingBuffer<usize>,
}

impl TemporalVoter {
    pub fn new(window: usize) -> Self {
        Self {
            history: RingBuffer::with_capacity(window),
        }
    }

    /// Record one per-frame prediction
    pub fn record(&mut self, index: usize) {
        self.history.push(index);
    }

    /// Stabilized class, or `None` before any prediction
    pub fn vote(&self) -> Option<usize> {
        majority_vote(self.history.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn history(&self) -> Vec<usize> {
        self.history.to_vec()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for TemporalVoter {
    fn default() -> Self {
        Self::new(DEFAULT_VOTE_WINDOW)
    }
}
