//! Placeholder accounting.

use serde_json::Value;

/// Running placeholder counter plus the values bound so far.
///
/// The counter is incremented immediately before a placeholder is emitted,
/// so `$<n>` always reflects the post-increment count and no index is ever
/// skipped or reused. Composed clause builders share one accumulator:
/// branches of an OR continue from the running count rather than restarting,
/// and a WHERE list composed after a SET list picks up where it left off.
#[derive(Debug, Default)]
pub struct SqlParams {
    count: usize,
    values: Vec<Value>,
}

impl SqlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `offset` placeholders emitted by a prior
    /// clause list.
    pub fn starting_at(offset: usize) -> Self {
        Self {
            count: offset,
            values: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder text (`$n`).
    pub fn bind(&mut self, value: Value) -> String {
        self.count += 1;
        self.values.push(value);
        format!("${}", self.count)
    }

    /// Placeholders emitted so far (including any starting offset).
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
