use num_complex::Complex32;

use crate::prelude::ScanMode;

/// One transmit/receive cycle: timing and pointing metadata plus the raw IQ
/// payload. A pulse is filled once by the source adapter and treated as
/// immutable from the moment it is admitted to the sliding window.
#[derive(Debug, Clone, Default)]
pub struct Pulse {
    /// Monotonically increasing within one input stream; gaps indicate
    /// dropped data.
    pub seq_num: u64,
    pub time_secs: i64,
    pub nano_secs: i64,
    pub az_deg: f64,
    pub el_deg: f64,
    /// Interval since the previous pulse, in seconds.
    pub prt: f64,
    /// Interval to the next pulse, in seconds.
    pub prt_next: f64,
    /// Horizontal transmit polarization.
    pub is_horiz: bool,
    pub n_gates: usize,
    pub pulse_width_us: f64,
    pub scan_mode: ScanMode,
    pub end_of_sweep: bool,
    pub end_of_volume: bool,
    /// Raw IQ samples, one per gate per channel.
    pub iq: Vec<Complex32>,
}

impl Pulse {
    /// Arrival time as a floating-point number of seconds.
    pub fn ftime(&self) -> f64 {
        self.time_secs as f64 + self.nano_secs as f64 / 1.0e9
    }

    /// Swap the recorded PRT pair, for streams where the PRT field refers to
    /// the interval to the NEXT pulse rather than since the previous one.
    pub fn swap_prt_values(&mut self) {
        std::mem::swap(&mut self.prt, &mut self.prt_next);
    }

    /// Zero the metadata while keeping the IQ allocation for reuse.
    pub fn reset(&mut self) {
        let iq = std::mem::take(&mut self.iq);
        *self = Pulse::default();
        self.iq = iq;
        self.iq.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ftime_includes_subseconds() {
        let pulse = Pulse {
            time_secs: 100,
            nano_secs: 500_000_000,
            ..Default::default()
        };
        assert!((pulse.ftime() - 100.5).abs() < 1.0e-9);
    }

    #[test]
    fn reset_keeps_iq_capacity() {
        let mut pulse = Pulse {
            seq_num: 42,
            iq: Vec::with_capacity(1024),
            ..Default::default()
        };
        pulse.iq.push(Complex32::new(1.0, -1.0));
        pulse.reset();
        assert_eq!(pulse.seq_num, 0);
        assert!(pulse.iq.is_empty());
        assert!(pulse.iq.capacity() >= 1024);
    }

    #[test]
    fn swap_prt_values_exchanges_pair() {
        let mut pulse = Pulse {
            prt: 0.001,
            prt_next: 0.0015,
            ..Default::default()
        };
        pulse.swap_prt_values();
        assert_eq!(pulse.prt, 0.0015);
        assert_eq!(pulse.prt_next, 0.001);
    }
}
