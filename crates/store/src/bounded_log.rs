use crate::{LogConfig, StoreError, StoreResult};
use std::collections::VecDeque;

/// Append-only log that keeps a bounded tail
///
/// When an append leaves more than `capacity` entries, the log drops its
/// oldest entries until only `retain` remain. A batch append truncates once,
/// after the whole batch is in.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    config: LogConfig,
}

impl<T> BoundedLog<T> {
    /// Create a log with a validated configuration
    pub fn with_config(config: LogConfig) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            entries: VecDeque::new(),
            config,
        })
    }

    /// Get configuration
    pub const fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Append one entry. Returns `true` when truncation fired.
    pub fn push(&mut self, entry: T) -> bool {
        self.entries.push_back(entry);
        self.truncate()
    }

    /// Append a batch. Returns `true` when truncation fired.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = T>) -> bool {
        self.entries.extend(entries);
        self.truncate()
    }

    fn truncate(&mut self) -> bool {
        if self.entries.len() <= self.config.capacity {
            return false;
        }
        let excess = self.entries.len() - self.config.retain;
        self.entries.drain(..excess);
        true
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// The last `n` entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

impl<T> Default for BoundedLog<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            config: LogConfig::default(),
        }
    }
}
