use std::sync::Mutex;

use serde::Serialize;

/// Counters surfaced through the engine's observability channel rather than
/// through the control-flow error path.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Default)]
struct Metrics {
    pulses_read: u64,
    beams_emitted: u64,
    dwells_discarded: u64,
    pulses_dropped_no_manager: u64,
    missing_pulse_gaps: u64,
    missing_pulses_total: u64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub pulses_read: u64,
    pub beams_emitted: u64,
    pub dwells_discarded: u64,
    pub pulses_dropped_no_manager: u64,
    pub missing_pulse_gaps: u64,
    pub missing_pulses_total: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_pulse_read(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.pulses_read += 1;
        }
    }

    pub fn record_beam_emitted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.beams_emitted += 1;
        }
    }

    pub fn record_dwell_discarded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dwells_discarded += 1;
        }
    }

    pub fn record_pulse_dropped_no_manager(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.pulses_dropped_no_manager += 1;
        }
    }

    pub fn record_missing_pulses(&self, count: u64) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.missing_pulse_gaps += 1;
            metrics.missing_pulses_total += count;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        match self.inner.lock() {
            Ok(metrics) => MetricsSnapshot {
                pulses_read: metrics.pulses_read,
                beams_emitted: metrics.beams_emitted,
                dwells_discarded: metrics.dwells_discarded,
                pulses_dropped_no_manager: metrics.pulses_dropped_no_manager,
                missing_pulse_gaps: metrics.missing_pulse_gaps,
                missing_pulses_total: metrics.missing_pulses_total,
            },
            Err(_) => MetricsSnapshot::default(),
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_pulse_read();
        metrics.record_pulse_read();
        metrics.record_beam_emitted();
        metrics.record_missing_pulses(3);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pulses_read, 2);
        assert_eq!(snapshot.beams_emitted, 1);
        assert_eq!(snapshot.missing_pulse_gaps, 1);
        assert_eq!(snapshot.missing_pulses_total, 3);
    }
}
