//! Majority vote over consecutive plate readings

/// Readings per decision unless configured otherwise
pub const DEFAULT_STABILIZER_THRESHOLD: usize = 3;

/// Turns a stream of per-frame plate readings into one decision per batch.
///
/// The buffer is a working set, not a history: it is drained on every
/// decision and minority readings are dropped.
#[derive(Debug, Clone)]
pub struct FrameReadingStabilizer {
    threshold: usize,
    buffer: Vec<String>,
}

impl Default for FrameReadingStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_STABILIZER_THRESHOLD)
    }
}

impl FrameReadingStabilizer {
    /// A threshold of 0 behaves like 1
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            buffer: Vec::with_capacity(threshold),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Readings collected towards the next decision
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Add a validated reading. Returns the stabilized plate once the batch
    /// is full, `None` while still accumulating.
    pub fn observe(&mut self, plate: impl Into<String>) -> Option<String> {
        self.buffer.push(plate.into());
        if self.buffer.len() < self.threshold {
            return None;
        }

        let decision = most_frequent(&self.buffer);
        self.buffer.clear();
        decision
    }

    /// Drop partial readings
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Most frequent reading; ties go to the value seen first.
fn most_frequent(readings: &[String]) -> Option<String> {
    // (value, count) in first-occurrence order
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for reading in readings {
        match tally.iter_mut().find(|(value, _)| *value == reading.as_str()) {
            Some((_, count)) => *count += 1,
            None => tally.push((reading.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}
