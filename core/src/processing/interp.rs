//! Optional pre-filter that smooths stair-stepped antenna-angle reporting.
//!
//! Some pedestals report the same quantized angle for a run of pulses and
//! then step. The interpolator buffers a run, and once a step is seen,
//! spreads the change linearly across the buffered pulses before they enter
//! the sliding window.

use std::collections::VecDeque;

use crate::math::angles::diff_deg;
use crate::prelude::{ReaderConfig, ScanMode};
use crate::pulse::source::RawReader;
use crate::pulse::Pulse;

const ANGLE_STEP_EPSILON: f64 = 1.0e-4;

pub(crate) struct AngleInterpolator {
    queue: VecDeque<Pulse>,
    ready: bool,
    overflow: bool,
    max_queue_size: usize,
    max_change_deg: f64,
    adjust_for_latency: bool,
    latency_secs: f64,
}

impl AngleInterpolator {
    pub fn new(config: &ReaderConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            ready: false,
            overflow: false,
            max_queue_size: config.angle_interp_max_queue_size,
            max_change_deg: config.angle_interp_max_change_deg,
            adjust_for_latency: config.angle_interp_adjust_for_latency,
            latency_secs: config.angle_interp_latency_secs,
        }
    }

    pub fn depth(&self) -> usize {
        self.queue.len()
    }

    /// Next pulse with interpolated angles, or None at end of data.
    pub fn next_pulse(
        &mut self,
        raw: &mut RawReader,
        az_rate: f64,
        el_rate: f64,
    ) -> Option<Pulse> {
        // after an overflow, drain without interpolating until the queue
        // recovers
        if self.queue.len() > self.max_queue_size {
            self.overflow = true;
        } else if self.overflow {
            if self.queue.len() < 2 {
                self.overflow = false;
            }
            return self.pop_oldest();
        }

        if self.ready && self.queue.len() > 1 {
            return self.pop_oldest();
        }

        // the last pulse must be retained as the anchor of the next run
        if self.queue.len() == 1 {
            self.ready = false;
        }

        loop {
            if self.queue.len() > self.max_queue_size {
                self.overflow = true;
                return self.pop_oldest();
            }

            while self.queue.len() < 2 {
                if !self.push_from(raw) {
                    return None;
                }
            }

            // interpolate only within a run of one consistent scan type
            let all_ppi = self
                .queue
                .iter()
                .all(|p| matches!(p.scan_mode, ScanMode::Sector | ScanMode::AzSur360));
            let all_rhi = self
                .queue
                .iter()
                .all(|p| matches!(p.scan_mode, ScanMode::Rhi | ScanMode::ManRhi));
            if !all_ppi && !all_rhi {
                return self.pop_oldest();
            }

            let mut n_angle_changes = 0;
            for index in 1..self.queue.len() {
                let prev = &self.queue[index - 1];
                let this = &self.queue[index];
                let (prev_ang, this_ang) = if all_ppi {
                    (prev.az_deg, this.az_deg)
                } else {
                    (prev.el_deg, this.el_deg)
                };
                if (prev_ang - this_ang).abs() > ANGLE_STEP_EPSILON {
                    n_angle_changes += 1;
                }
            }

            if n_angle_changes > 0 {
                self.interp_az(az_rate);
                self.interp_el(el_rate);
                self.ready = true;
                return self.pop_oldest();
            }

            // constant angles so far, keep reading
            if !self.push_from(raw) {
                return None;
            }
        }
    }

    fn push_from(&mut self, raw: &mut RawReader) -> bool {
        match raw.read() {
            Some(pulse) => {
                self.queue.push_front(pulse);
                true
            }
            None => false,
        }
    }

    fn pop_oldest(&mut self) -> Option<Pulse> {
        self.queue.pop_back()
    }

    fn interp_az(&mut self, az_rate: f64) {
        let n_pulses = self.queue.len();
        if n_pulses < 2 {
            return;
        }
        let az_latest = self.queue[0].az_deg;
        let az_first = self.queue[n_pulses - 1].az_deg;
        let az_change = diff_deg(az_latest, az_first);
        if az_change.abs() > self.max_change_deg {
            return;
        }
        let d_az = az_change / (n_pulses - 1) as f64;
        let latency_corr = if self.adjust_for_latency {
            self.latency_secs * az_rate.abs()
        } else {
            0.0
        };
        for step in 0..n_pulses {
            let index = n_pulses - step - 1;
            let mut az = az_first + step as f64 * d_az + latency_corr;
            if az >= 360.0 {
                az -= 360.0;
            } else if az < 0.0 {
                az += 360.0;
            }
            self.queue[index].az_deg = az;
        }
    }

    fn interp_el(&mut self, el_rate: f64) {
        let n_pulses = self.queue.len();
        if n_pulses < 2 {
            return;
        }
        let el_latest = self.queue[0].el_deg;
        let el_first = self.queue[n_pulses - 1].el_deg;
        let el_change = diff_deg(el_latest, el_first);
        if el_change.abs() > self.max_change_deg {
            return;
        }
        let d_el = el_change / (n_pulses - 1) as f64;
        let latency_corr = if self.adjust_for_latency {
            self.latency_secs * el_rate.abs()
        } else {
            0.0
        };
        for step in 0..n_pulses {
            let index = n_pulses - step - 1;
            let mut el = el_first + step as f64 * d_el + latency_corr;
            if el >= 180.0 {
                el -= 360.0;
            } else if el < -180.0 {
                el += 360.0;
            }
            self.queue[index].el_deg = el;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::source::{SourceInfo, VecPulseSource};
    use crate::pulse::PulsePool;
    use std::sync::Arc;

    fn stepped_ppi_stream() -> Vec<Pulse> {
        // four pulses at az 10.0, then a step to 11.0
        let mut pulses = Vec::new();
        for index in 0..5u64 {
            pulses.push(Pulse {
                seq_num: index,
                time_secs: index as i64,
                az_deg: if index < 4 { 10.0 } else { 11.0 },
                scan_mode: ScanMode::AzSur360,
                prt: 0.001,
                ..Default::default()
            });
        }
        pulses
    }

    fn raw_reader(pulses: Vec<Pulse>) -> RawReader {
        RawReader::new(
            Box::new(VecPulseSource::new(pulses, SourceInfo::default())),
            Arc::new(PulsePool::new()),
            true,
            false,
        )
    }

    #[test]
    fn run_is_interpolated_after_step() {
        let config = ReaderConfig {
            interpolate_antenna_angles: true,
            ..Default::default()
        };
        let mut interp = AngleInterpolator::new(&config);
        let mut raw = raw_reader(stepped_ppi_stream());

        let first = interp.next_pulse(&mut raw, 0.0, 0.0).unwrap();
        let second = interp.next_pulse(&mut raw, 0.0, 0.0).unwrap();
        assert_eq!(first.seq_num, 0);
        assert_eq!(second.seq_num, 1);
        // angles now climb smoothly across the run
        assert!((first.az_deg - 10.0).abs() < 1.0e-9);
        assert!(second.az_deg > first.az_deg);
        assert!(second.az_deg < 11.0);
    }

    #[test]
    fn mixed_scan_modes_bypass_interpolation() {
        let mut pulses = stepped_ppi_stream();
        pulses[2].scan_mode = ScanMode::Rhi;
        let config = ReaderConfig::default();
        let mut interp = AngleInterpolator::new(&config);
        let mut raw = raw_reader(pulses);

        let first = interp.next_pulse(&mut raw, 0.0, 0.0).unwrap();
        assert_eq!(first.seq_num, 0);
        assert!((first.az_deg - 10.0).abs() < 1.0e-9);
    }

    #[test]
    fn overflow_drains_without_interpolating() {
        // constant angles never trigger a step, so the queue grows past its
        // bound and must drain in overflow mode
        let mut pulses = Vec::new();
        for index in 0..12u64 {
            pulses.push(Pulse {
                seq_num: index,
                time_secs: index as i64,
                az_deg: 42.0,
                scan_mode: ScanMode::AzSur360,
                ..Default::default()
            });
        }
        let config = ReaderConfig {
            angle_interp_max_queue_size: 4,
            ..Default::default()
        };
        let mut interp = AngleInterpolator::new(&config);
        let mut raw = raw_reader(pulses);

        let first = interp.next_pulse(&mut raw, 0.0, 0.0).unwrap();
        assert_eq!(first.seq_num, 0);
        assert!((first.az_deg - 42.0).abs() < 1.0e-9);
        // subsequent calls keep draining the backed-up queue
        let second = interp.next_pulse(&mut raw, 0.0, 0.0).unwrap();
        assert_eq!(second.seq_num, 1);
        assert!(interp.depth() > 0);
    }
}
