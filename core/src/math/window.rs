//! Weighting-window coefficients and dwell-widening factors.
//!
//! A tapered window concentrates its power in the center of the dwell, so an
//! indexed dwell must be widened relative to a rectangular one to carry the
//! same information. The widening factor is derived from the centered
//! fraction of the window width that contains 90% of the window's power,
//! normalized so the rectangular factor is exactly 1.0.

use std::f64::consts::PI;

use crate::prelude::WindowType;

const FACTOR_POINTS: usize = 1000;

pub fn rect_window(n: usize) -> Vec<f64> {
    vec![1.0; n]
}

/// von Hann window: 0.5 * (1 - cos(2*pi*i/(n-1)))
pub fn vonhann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos()))
        .collect()
}

/// Blackman window: 0.42 - 0.5*cos(2*pi*i/(n-1)) + 0.08*cos(4*pi*i/(n-1))
pub fn blackman_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / (n - 1) as f64;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

/// Blackman-Nuttall window (4-term, very low sidelobes).
pub fn blackman_nuttall_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / (n - 1) as f64;
            0.363_581_9 - 0.489_177_5 * x.cos() + 0.136_599_5 * (2.0 * x).cos()
                - 0.010_641_1 * (3.0 * x).cos()
        })
        .collect()
}

/// Centered fraction of the window width containing 90% of its power.
fn central_power_fraction(window: &[f64]) -> f64 {
    let n = window.len();
    let total: f64 = window.iter().map(|w| w * w).sum();
    let mut sum = 0.0;
    for (i, w) in window.iter().enumerate() {
        sum += w * w;
        if sum > 0.05 * total {
            return (n - 2 * i) as f64 / n as f64;
        }
    }
    1.0
}

/// Dwell-widening factors per window type, computed once at construction.
#[derive(Debug, Clone, Copy)]
pub struct WindowFactors {
    rect: f64,
    vonhann: f64,
    blackman: f64,
    blackman_nuttall: f64,
}

impl WindowFactors {
    pub fn compute() -> Self {
        let rect_frac = central_power_fraction(&rect_window(FACTOR_POINTS));
        Self {
            rect: 1.0,
            vonhann: rect_frac / central_power_fraction(&vonhann_window(FACTOR_POINTS)),
            blackman: rect_frac / central_power_fraction(&blackman_window(FACTOR_POINTS)),
            blackman_nuttall: rect_frac
                / central_power_fraction(&blackman_nuttall_window(FACTOR_POINTS)),
        }
    }

    pub fn factor(&self, window: WindowType) -> f64 {
        match window {
            WindowType::Rect => self.rect,
            WindowType::Vonhann => self.vonhann,
            WindowType::Blackman => self.blackman,
            WindowType::BlackmanNuttall => self.blackman_nuttall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_are_monotonic_with_taper() {
        let factors = WindowFactors::compute();
        assert_eq!(factors.factor(WindowType::Rect), 1.0);
        assert!(factors.factor(WindowType::Vonhann) > 1.0);
        assert!(factors.factor(WindowType::Blackman) >= factors.factor(WindowType::Vonhann));
        assert!(
            factors.factor(WindowType::BlackmanNuttall) >= factors.factor(WindowType::Blackman)
        );
    }

    #[test]
    fn vonhann_window_is_symmetric_and_zero_ended() {
        let window = vonhann_window(64);
        assert!(window[0].abs() < 1.0e-12);
        assert!(window[63].abs() < 1.0e-9);
        assert!((window[10] - window[53]).abs() < 1.0e-9);
    }
}
