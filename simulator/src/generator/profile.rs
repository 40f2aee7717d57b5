use beamcore::prelude::ScanMode;
use beamcore::pulse::Pulse;
use beamcore::Complex32;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating a synthetic pulse stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub scan_mode: ScanMode,
    pub n_pulses: u64,
    pub prf: f64,
    pub antenna_rate_deg_per_sec: f64,
    pub start_angle_deg: f64,
    pub n_gates: usize,
    pub pulse_width_us: f64,
    /// Alternate H/V transmit polarization pulse to pulse.
    pub alternating: bool,
    /// Alternate between two PRTs; the long PRT is `stagger_ratio` times
    /// the short one.
    pub staggered: bool,
    pub stagger_ratio: f64,
    /// Mark end-of-sweep every this many pulses; 0 disables the markers.
    pub sweep_len_pulses: u64,
    /// Drop the pulses with sequence numbers in [start, end), leaving a gap.
    pub drop_seq_range: Option<(u64, u64)>,
    pub noise: f32,
    pub seed: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::AzSur360,
            n_pulses: 10_000,
            prf: 1000.0,
            antenna_rate_deg_per_sec: 18.0,
            start_angle_deg: 0.0,
            n_gates: 500,
            pulse_width_us: 1.0,
            alternating: false,
            staggered: false,
            stagger_ratio: 1.5,
            sweep_len_pulses: 0,
            drop_seq_range: None,
            noise: 0.05,
            seed: 0,
        }
    }
}

/// Build a deterministic synthetic stream with correct recorded-PRT
/// semantics: each pulse's PRT field carries the interval since the
/// previous pulse, so in staggered mode the short-interval pulse records
/// the longer value and carries the smaller gate count.
pub fn build_pulse_stream(config: &StreamConfig) -> Vec<Pulse> {
    let prt_short = 1.0 / config.prf.max(1.0);
    let prt_long = prt_short * config.stagger_ratio;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut pulses = Vec::with_capacity(config.n_pulses as usize);
    let mut time = 0.0f64;
    let mut angle = config.start_angle_deg;

    for seq in 0..config.n_pulses {
        // interval since the previous pulse, recorded on this pulse
        let interval = if config.staggered {
            if seq % 2 == 0 {
                prt_long
            } else {
                prt_short
            }
        } else {
            prt_short
        };
        // gates are sampled during the interval that FOLLOWS the pulse
        let next_interval = if config.staggered {
            if seq % 2 == 0 {
                prt_short
            } else {
                prt_long
            }
        } else {
            prt_short
        };
        let n_gates = if config.staggered && next_interval > interval {
            config.n_gates + config.n_gates / 2
        } else {
            config.n_gates
        };

        time += interval;
        angle += config.antenna_rate_deg_per_sec * interval;

        if let Some((start, end)) = config.drop_seq_range {
            if seq >= start && seq < end {
                continue;
            }
        }

        let (az_deg, el_deg) = match config.scan_mode {
            ScanMode::Rhi | ScanMode::ManRhi => (45.0, wrap_el(angle)),
            _ => (wrap_az(angle), 0.5),
        };

        let noise = config.noise.max(f32::EPSILON);
        let iq: Vec<Complex32> = (0..n_gates)
            .map(|_| Complex32::new(rng.gen_range(-noise..noise), rng.gen_range(-noise..noise)))
            .collect();

        pulses.push(Pulse {
            seq_num: seq,
            time_secs: time as i64,
            nano_secs: ((time - time.floor()) * 1.0e9) as i64,
            az_deg,
            el_deg,
            prt: interval,
            prt_next: next_interval,
            is_horiz: !config.alternating || seq % 2 == 0,
            n_gates,
            pulse_width_us: config.pulse_width_us,
            scan_mode: config.scan_mode,
            end_of_sweep: config.sweep_len_pulses > 0
                && seq > 0
                && seq % config.sweep_len_pulses == 0,
            end_of_volume: config.n_pulses > 1 && seq == config.n_pulses - 1,
            iq,
        });
    }

    pulses
}

fn wrap_az(az: f64) -> f64 {
    az.rem_euclid(360.0)
}

fn wrap_el(el: f64) -> f64 {
    (el + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_has_monotonic_sequence_and_times() {
        let config = StreamConfig {
            n_pulses: 100,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config);
        assert_eq!(pulses.len(), 100);
        for pair in pulses.windows(2) {
            assert!(pair[1].seq_num > pair[0].seq_num);
            assert!(pair[1].ftime() > pair[0].ftime());
        }
        assert_eq!(pulses[0].iq.len(), 500);
    }

    #[test]
    fn staggered_stream_records_prior_interval() {
        let config = StreamConfig {
            n_pulses: 10,
            staggered: true,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config);
        // recorded PRT alternates, and the pulse recording the longer value
        // carries fewer gates (its own interval is the short one)
        assert!(pulses[0].prt > pulses[1].prt);
        assert!(pulses[0].n_gates < pulses[1].n_gates);
    }

    #[test]
    fn dropped_range_leaves_sequence_gap() {
        let config = StreamConfig {
            n_pulses: 50,
            drop_seq_range: Some((10, 15)),
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config);
        assert_eq!(pulses.len(), 45);
        assert!(pulses.iter().all(|p| p.seq_num < 10 || p.seq_num >= 15));
    }

    #[test]
    fn sweep_markers_appear_at_requested_cadence() {
        let config = StreamConfig {
            n_pulses: 100,
            sweep_len_pulses: 30,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config);
        let marks: Vec<u64> = pulses
            .iter()
            .filter(|p| p.end_of_sweep)
            .map(|p| p.seq_num)
            .collect();
        assert_eq!(marks, vec![30, 60, 90]);
        assert!(pulses.last().unwrap().end_of_volume);
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let config = StreamConfig {
            n_pulses: 5,
            seed: 7,
            ..Default::default()
        };
        let first = build_pulse_stream(&config);
        let second = build_pulse_stream(&config);
        assert_eq!(first[3].iq, second[3].iq);
    }
}
