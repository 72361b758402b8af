/// Configuration for a bounded log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Maximum number of entries before truncation fires
    pub capacity: usize,
    /// Number of most recent entries kept after truncation
    pub retain: usize,
}

impl LogConfig {
    /// Create a new log configuration
    #[must_use]
    pub const fn new(capacity: usize, retain: usize) -> Self {
        Self { capacity, retain }
    }

    /// Validate configuration parameters
    pub const fn validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 {
            Err("capacity must be greater than 0")
        } else if self.retain == 0 {
            Err("retain must be greater than 0")
        } else if self.retain > self.capacity {
            Err("retain cannot exceed capacity")
        } else {
            Ok(())
        }
    }
}

impl From<(usize, usize)> for LogConfig {
    fn from((capacity, retain): (usize, usize)) -> Self {
        Self::new(capacity, retain)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(1_000, 500)
    }
}
