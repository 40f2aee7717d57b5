use log::{info, warn};

pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    /// Emit a warning only on every `every`-th occurrence, so a persistent
    /// per-pulse condition cannot flood the log.
    pub fn warn_throttled(&self, occurrence: u64, every: u64, message: &str) {
        if every == 0 || occurrence % every == 0 {
            warn!("{} (occurrence {})", message, occurrence + 1);
        }
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_warning_does_not_panic() {
        let logger = LogManager::new();
        for occurrence in 0..5 {
            logger.warn_throttled(occurrence, 2, "recurring condition");
        }
    }
}
