//! Persisted count of completed conversions.
//!
//! A single JSON file in the state directory records how many transforms
//! have finished successfully, across runs. Only two operations touch it:
//! [`ConversionCounter::load`] at startup and
//! [`ConversionCounter::increment_and_save`] after each success.
//!
//! Writes are not locked. Callers serialize transforms (one in flight at a
//! time), so there is never more than one writer per process.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Name of the counter file within the state directory.
const COUNTER_FILENAME: &str = "instacrops-counter.json";

/// Version of the counter file format. A file with another version is
/// treated as absent.
const COUNTER_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionCounter {
    pub version: u32,
    pub total_converted: u64,
}

impl Default for ConversionCounter {
    fn default() -> Self {
        Self {
            version: COUNTER_VERSION,
            total_converted: 0,
        }
    }
}

impl ConversionCounter {
    /// Load from the state directory. Returns a zero counter if the file
    /// doesn't exist or can't be parsed.
    pub fn load(state_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(state_dir.join(COUNTER_FILENAME)) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(counter) if counter.version == COUNTER_VERSION => counter,
            _ => Self::default(),
        }
    }

    /// Save to the state directory, creating it if needed.
    pub fn save(&self, state_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(state_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(state_dir.join(COUNTER_FILENAME), json)
    }

    /// Add one completed conversion and persist. Returns the new total.
    ///
    /// The in-memory count is updated even if the write fails.
    pub fn increment_and_save(&mut self, state_dir: &Path) -> io::Result<u64> {
        self.total_converted += 1;
        self.save(state_dir)?;
        Ok(self.total_converted)
    }
}
