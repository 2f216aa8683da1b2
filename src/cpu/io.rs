//! Character ports mirrored into memory.

use serde::{Deserialize, Serialize};

/// A port backed by a string of at most `capacity` characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoChannel {
    data: String,
    capacity: usize,
}

impl IoChannel {
    /// Create an empty channel holding up to `capacity` characters.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: String::new(),
            capacity,
        }
    }

    /// Current contents, unchanged until the next write.
    pub fn read(&self) -> &str {
        &self.data
    }

    /// Replace the contents. Characters past `capacity` are dropped.
    pub fn write(&mut self, data: &str) {
        self.data = data.chars().take(self.capacity).collect();
    }

    /// Empty the channel.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
