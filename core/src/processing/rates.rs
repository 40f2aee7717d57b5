use crate::math::angles::diff_deg;
use crate::processing::queue::PulseQueue;
use crate::pulse::Pulse;

/// Antenna-rate estimators: a progressive rate updated as each pulse
/// arrives, and a per-beam rate computed over a completed dwell.
///
/// The progressive estimate only advances after a minimum elapsed time, so
/// pulse-to-pulse angle jitter does not divide by a near-zero interval.
pub struct RateEstimators {
    min_secs: f64,

    az_initialized: bool,
    prev_time_for_az: f64,
    prev_az: f64,
    progressive_az: f64,
    beam_az: f64,

    el_initialized: bool,
    prev_time_for_el: f64,
    prev_el: f64,
    progressive_el: f64,
    beam_el: f64,
}

const INITIAL_RATE: f64 = 10.0;

impl RateEstimators {
    pub fn new(min_secs: f64) -> Self {
        Self {
            min_secs,
            az_initialized: false,
            prev_time_for_az: 0.0,
            prev_az: -999.0,
            progressive_az: 0.0,
            beam_az: 0.0,
            el_initialized: false,
            prev_time_for_el: 0.0,
            prev_el: -999.0,
            progressive_el: 0.0,
            beam_el: 0.0,
        }
    }

    /// Restart the elapsed-time baselines, e.g. on a scan-type change.
    pub fn reset_timers(&mut self) {
        self.prev_time_for_az = 0.0;
        self.prev_time_for_el = 0.0;
    }

    pub fn progressive_az(&self) -> f64 {
        self.progressive_az
    }

    pub fn progressive_el(&self) -> f64 {
        self.progressive_el
    }

    pub fn beam_az(&self) -> f64 {
        self.beam_az
    }

    pub fn beam_el(&self) -> f64 {
        self.beam_el
    }

    pub fn update_progressive_az(&mut self, pulse: &Pulse) {
        let az = pulse.az_deg;
        let time = pulse.ftime();
        if !self.az_initialized {
            self.progressive_az = INITIAL_RATE;
            self.prev_time_for_az = time;
            self.prev_az = az;
            self.az_initialized = true;
            return;
        }
        let delta_time = time - self.prev_time_for_az;
        if delta_time < self.min_secs {
            return;
        }
        self.progressive_az = diff_deg(az, self.prev_az) / delta_time;
        self.prev_time_for_az = time;
        self.prev_az = az;
    }

    pub fn update_progressive_el(&mut self, pulse: &Pulse) {
        let el = pulse.el_deg;
        let time = pulse.ftime();
        if !self.el_initialized {
            self.progressive_el = INITIAL_RATE;
            self.prev_time_for_el = time;
            self.prev_el = el;
            self.el_initialized = true;
            return;
        }
        let delta_time = time - self.prev_time_for_el;
        if delta_time < self.min_secs {
            return;
        }
        self.progressive_el = diff_deg(el, self.prev_el) / delta_time;
        self.prev_time_for_el = time;
        self.prev_el = el;
    }

    /// Azimuth rate over `n_samples` pulses ending at `end_index` (counted
    /// from the newest). With no count given, the span is derived from the
    /// mean PRF and the rate interval.
    pub fn compute_beam_az(
        &mut self,
        queue: &PulseQueue,
        end_index: usize,
        n_samples: Option<usize>,
        mean_prf: f64,
        min_n_samples: usize,
    ) {
        self.beam_az = Self::span_rate(queue, end_index, n_samples, mean_prf, self.min_secs,
            min_n_samples, |p| p.az_deg);
    }

    /// Elevation rate over the same span convention as `compute_beam_az`.
    pub fn compute_beam_el(
        &mut self,
        queue: &PulseQueue,
        end_index: usize,
        n_samples: Option<usize>,
        mean_prf: f64,
        min_n_samples: usize,
    ) {
        self.beam_el = Self::span_rate(queue, end_index, n_samples, mean_prf, self.min_secs,
            min_n_samples, |p| p.el_deg);
    }

    fn span_rate(
        queue: &PulseQueue,
        end_index: usize,
        n_samples: Option<usize>,
        mean_prf: f64,
        min_secs: f64,
        min_n_samples: usize,
        angle_of: impl Fn(&Pulse) -> f64,
    ) -> f64 {
        if queue.is_empty() {
            return 0.0;
        }
        let n_samples = match n_samples {
            Some(n) if n > 0 => n,
            _ => ((mean_prf * min_secs) as usize).max(min_n_samples),
        };
        let end_index = end_index.min(queue.len().saturating_sub(n_samples));
        let start_index = (end_index + n_samples - 1).min(queue.len() - 1);

        let pulse_start = queue.get(start_index);
        let pulse_end = queue.get(end_index);

        let delta_angle = diff_deg(angle_of(pulse_end), angle_of(pulse_start));
        let delta_time = pulse_end.ftime() - pulse_start.ftime();
        if delta_time <= 0.0 {
            0.0
        } else {
            delta_angle / delta_time
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pulse_at(time_ms: i64, az: f64) -> Pulse {
        Pulse {
            time_secs: time_ms / 1000,
            nano_secs: (time_ms % 1000) * 1_000_000,
            az_deg: az,
            ..Default::default()
        }
    }

    #[test]
    fn progressive_rate_waits_for_elapsed_time() {
        let mut rates = RateEstimators::new(0.5);
        rates.update_progressive_az(&pulse_at(0, 0.0));
        assert_eq!(rates.progressive_az(), INITIAL_RATE);
        // too soon, rate retained
        rates.update_progressive_az(&pulse_at(100, 2.0));
        assert_eq!(rates.progressive_az(), INITIAL_RATE);
        // one second later, 20 deg travelled
        rates.update_progressive_az(&pulse_at(1000, 20.0));
        assert!((rates.progressive_az() - 20.0).abs() < 1.0e-9);
    }

    #[test]
    fn progressive_rate_wraps_through_north() {
        let mut rates = RateEstimators::new(0.1);
        rates.update_progressive_az(&pulse_at(0, 359.0));
        rates.update_progressive_az(&pulse_at(1000, 1.0));
        assert!((rates.progressive_az() - 2.0).abs() < 1.0e-9);
    }

    #[test]
    fn beam_rate_zero_for_non_positive_elapsed() {
        let mut rates = RateEstimators::new(0.1);
        let mut queue = PulseQueue::new();
        queue.push_latest(Arc::new(pulse_at(0, 10.0)));
        queue.push_latest(Arc::new(pulse_at(0, 12.0)));
        rates.compute_beam_az(&queue, 0, Some(2), 1000.0, 2);
        assert_eq!(rates.beam_az(), 0.0);
    }

    #[test]
    fn beam_rate_spans_first_to_last_pulse() {
        let mut rates = RateEstimators::new(0.1);
        let mut queue = PulseQueue::new();
        for step in 0..10 {
            queue.push_latest(Arc::new(pulse_at(step * 100, step as f64)));
        }
        rates.compute_beam_az(&queue, 0, Some(10), 1000.0, 2);
        // 9 degrees over 0.9 seconds
        assert!((rates.beam_az() - 10.0).abs() < 1.0e-9);
    }
}
