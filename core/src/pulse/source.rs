use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::prelude::{ReaderError, ReaderResult};
use crate::pulse::{Pulse, PulsePool};

/// Session metadata exposed by a pulse source, queryable at any time.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub scan_segment_name: String,
    pub wavelength_cm: f64,
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            scan_segment_name: String::new(),
            wavelength_cm: 10.0,
        }
    }
}

/// Adapter yielding validated pulses one at a time.
///
/// `fill_next` writes the next pulse into the supplied pool buffer and
/// returns false on end of data. The call may block; the engine treats it as
/// a potentially-suspending operation with no timeout.
pub trait PulseSource: Send {
    fn fill_next(&mut self, pulse: &mut Pulse) -> bool;
    fn info(&self) -> &SourceInfo;
}

/// Archive-style source backed by a prebuilt pulse stream.
pub struct VecPulseSource {
    pulses: VecDeque<Pulse>,
    info: SourceInfo,
}

impl VecPulseSource {
    pub fn new(pulses: Vec<Pulse>, info: SourceInfo) -> Self {
        Self {
            pulses: pulses.into(),
            info,
        }
    }
}

impl PulseSource for VecPulseSource {
    fn fill_next(&mut self, pulse: &mut Pulse) -> bool {
        match self.pulses.pop_front() {
            Some(next) => {
                *pulse = next;
                true
            }
            None => false,
        }
    }

    fn info(&self) -> &SourceInfo {
        &self.info
    }
}

/// Sending half of a background-fed pulse channel.
pub struct PulseSender {
    tx: mpsc::Sender<Pulse>,
}

impl PulseSender {
    /// Blocking send from a producer thread.
    pub fn send(&self, pulse: Pulse) -> ReaderResult<()> {
        self.tx
            .blocking_send(pulse)
            .map_err(|e| ReaderError::ChannelClosed(e.to_string()))
    }
}

/// Realtime-style source fed by a producer thread through a bounded channel.
/// End of data is signaled by dropping the sender.
pub struct ChannelPulseSource {
    rx: mpsc::Receiver<Pulse>,
    info: SourceInfo,
}

impl ChannelPulseSource {
    pub fn channel(capacity: usize, info: SourceInfo) -> (PulseSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (PulseSender { tx }, Self { rx, info })
    }
}

impl PulseSource for ChannelPulseSource {
    fn fill_next(&mut self, pulse: &mut Pulse) -> bool {
        match self.rx.blocking_recv() {
            Some(next) => {
                *pulse = next;
                true
            }
            None => false,
        }
    }

    fn info(&self) -> &SourceInfo {
        &self.info
    }
}

/// Raw-read layer between the source and the interpolation/window stages.
///
/// Applies the PRT-convention swap when the stream records time-to-next
/// rather than time-since-previous, and optionally recomputes PRT from the
/// measured inter-pulse period, which requires buffering one pulse.
pub(crate) struct RawReader {
    source: Box<dyn PulseSource>,
    pool: Arc<PulsePool>,
    prev: Option<Pulse>,
    prt_is_for_previous_interval: bool,
    compute_interpulse_periods: bool,
}

impl RawReader {
    pub fn new(
        source: Box<dyn PulseSource>,
        pool: Arc<PulsePool>,
        prt_is_for_previous_interval: bool,
        compute_interpulse_periods: bool,
    ) -> Self {
        Self {
            source,
            pool,
            prev: None,
            prt_is_for_previous_interval,
            compute_interpulse_periods,
        }
    }

    pub fn info(&self) -> &SourceInfo {
        self.source.info()
    }

    /// Read the next pulse, or None at end of data.
    pub fn read(&mut self) -> Option<Pulse> {
        if !self.compute_interpulse_periods {
            return self.read_one();
        }

        // one-pulse delay so the measured period can be stamped on both
        // neighbors
        if self.prev.is_none() {
            self.prev = Some(self.read_one()?);
        }
        let mut latest = match self.read_one() {
            Some(pulse) => pulse,
            None => return self.prev.take(),
        };
        if let Some(prev) = self.prev.as_mut() {
            let period = latest.ftime() - prev.ftime();
            if self.prt_is_for_previous_interval {
                prev.prt_next = period;
                latest.prt = period;
            } else {
                latest.prt_next = period;
                prev.prt = period;
            }
        }
        self.prev.replace(latest)
    }

    fn read_one(&mut self) -> Option<Pulse> {
        let mut buf = self.pool.acquire();
        if !self.source.fill_next(&mut buf) {
            self.pool.restore(buf);
            return None;
        }
        if !self.prt_is_for_previous_interval {
            buf.swap_prt_values();
        }
        Some(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(n: u64) -> Vec<Pulse> {
        (0..n)
            .map(|i| Pulse {
                seq_num: i,
                time_secs: i as i64,
                prt: 0.001,
                prt_next: 0.002,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn vec_source_drains_in_order_then_ends() {
        let mut source = VecPulseSource::new(stream(3), SourceInfo::default());
        let mut pulse = Pulse::default();
        for expected in 0..3 {
            assert!(source.fill_next(&mut pulse));
            assert_eq!(pulse.seq_num, expected);
        }
        assert!(!source.fill_next(&mut pulse));
    }

    #[test]
    fn raw_reader_swaps_prt_when_convention_differs() {
        let pool = Arc::new(PulsePool::new());
        let source = VecPulseSource::new(stream(1), SourceInfo::default());
        let mut reader = RawReader::new(Box::new(source), pool, false, false);
        let pulse = reader.read().unwrap();
        assert_eq!(pulse.prt, 0.002);
        assert_eq!(pulse.prt_next, 0.001);
    }

    #[test]
    fn raw_reader_computes_interpulse_periods() {
        let pool = Arc::new(PulsePool::new());
        let source = VecPulseSource::new(stream(3), SourceInfo::default());
        let mut reader = RawReader::new(Box::new(source), pool, true, true);
        let first = reader.read().unwrap();
        // one second between synthetic pulses
        assert!((first.prt_next - 1.0).abs() < 1.0e-9);
        let second = reader.read().unwrap();
        assert!((second.prt - 1.0).abs() < 1.0e-9);
        assert!(reader.read().is_some());
        assert!(reader.read().is_none());
    }

    #[test]
    fn channel_source_ends_when_sender_drops() {
        let (tx, mut source) = ChannelPulseSource::channel(4, SourceInfo::default());
        let feeder = std::thread::spawn(move || {
            for pulse in stream(2) {
                tx.send(pulse).unwrap();
            }
        });
        let mut pulse = Pulse::default();
        assert!(source.fill_next(&mut pulse));
        assert!(source.fill_next(&mut pulse));
        assert_eq!(pulse.seq_num, 1);
        feeder.join().unwrap();
        assert!(!source.fill_next(&mut pulse));
    }
}
