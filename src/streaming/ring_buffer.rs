//! Fixed-capacity FIFO used for live sliding windows
//!
//! Capacity is set once at construction. Pushing into a full buffer
//! overwrites the oldest slot and hands the evicted value back.

/// Bounded ring buffer with an explicit write index
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Slot storage; grows up to `capacity` then is overwritten in place
    slots: Vec<T>,

    /// Next slot to write (also the oldest slot once full)
    write_index: usize,

    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer.
    ///
    /// # Panics
    /// Panics if capacity is zero
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Ring buffer capacity must be non-zero");
        Self {
            slots: Vec::with_capacity(capacity),
            write_index: 0,
            capacity,
        }
    }

    /// Append a value, returning the evicted oldest value when full
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.slots.len() < self.capacity {
            self.slots.push(value);
            None
        } else {
            Some(std::mem::replace(&mut self.slots[self.write_index], value))
        };

        self.write_index = (self.write_index + 1) % self.capacity;
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        // until full, write_index == len so the first half is empty
        let (newer, oldest) = self.slots.split_at(self.write_index);
        oldest.iter().chain(newer.iter())
    }

    /// Most recently pushed value
    pub fn newest(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        let idx = (self.write_index + self.capacity - 1) % self.capacity;
        self.slots.get(idx)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.write_index = 0;
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Contents in chronological order
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
