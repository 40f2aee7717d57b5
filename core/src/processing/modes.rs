//! Acquisition-regime detection over the sliding window.
//!
//! The six beam-forming regimes form a closed set; exactly which one is
//! active for a dwell follows from the manager's configured method, the
//! indexing flag, and the PRT structure detected in the window.

use crate::processing::manager::BeamMethodConfig;
use crate::processing::queue::PulseQueue;

const PRT_EPSILON: f64 = 1.0e-5;

/// The closed set of beam-boundary regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamMethod {
    NonIndexed,
    Indexed,
    DualPrt,
    StaggeredPrt,
    ConstantSteeringAngle,
    PulseWidthChange,
}

impl BeamMethod {
    /// Pick the active regime for the next dwell. The configured method wins
    /// outright for the phased-array and pulse-width regimes; otherwise
    /// indexing, then dual-PRT (staggered when the stream alternates), then
    /// the non-indexed fallback.
    pub fn select(
        configured: BeamMethodConfig,
        index_the_beams: bool,
        is_dual_prt: bool,
        is_staggered_prt: bool,
    ) -> Self {
        match configured {
            BeamMethodConfig::ConstantSteeringAngle => BeamMethod::ConstantSteeringAngle,
            BeamMethodConfig::PulseWidthChange => BeamMethod::PulseWidthChange,
            _ => {
                if index_the_beams {
                    BeamMethod::Indexed
                } else if is_dual_prt {
                    if is_staggered_prt {
                        BeamMethod::StaggeredPrt
                    } else {
                        BeamMethod::DualPrt
                    }
                } else {
                    BeamMethod::NonIndexed
                }
            }
        }
    }
}

/// Result of the staggered-PRT test over a dwell-sized look-back.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaggeredInfo {
    pub prt_short: f64,
    pub prt_long: f64,
    pub n_gates_prt_short: usize,
    pub n_gates_prt_long: usize,
    pub starts_on_prt_short: bool,
}

/// True iff consecutive pulses strictly alternate transmit polarization
/// across the whole window.
pub fn check_is_alternating(queue: &PulseQueue) -> bool {
    if queue.len() < 2 {
        return false;
    }
    let mut prev_horiz = queue.get(0).is_horiz;
    for index in 1..queue.len() {
        let this_horiz = queue.get(index).is_horiz;
        if this_horiz == prev_horiz {
            return false;
        }
        prev_horiz = this_horiz;
    }
    true
}

/// Whether an alternating dwell of `n_samples` pulses opens on horizontal
/// transmit. The oldest pulse sits at the back of the queue.
pub fn alternating_starts_on_h(queue: &PulseQueue, n_samples: usize) -> bool {
    if n_samples == 0 || queue.len() < n_samples {
        return false;
    }
    queue.get(n_samples - 1).is_horiz
}

/// Staggered-PRT test: pulses must alternate between exactly two PRT values
/// across the dwell, each parity carrying a fixed gate count.
///
/// The recorded PRT refers to the interval since the PREVIOUS pulse, so the
/// pulse carrying the LONGER value is the short-interval pulse: it opens the
/// short interval that follows. Short/long assignment below preserves that
/// inversion; `prt_short < prt_long` always holds by construction.
pub fn check_is_staggered_prt(queue: &PulseQueue, n_samples: usize) -> Option<StaggeredInfo> {
    if n_samples < 4 || queue.len() < n_samples {
        return None;
    }

    // first and second pulse of the series (stored newest-first)
    let pulse0 = queue.get(n_samples - 1);
    let pulse1 = queue.get(n_samples - 2);

    let prt0 = pulse0.prt;
    let prt1 = pulse1.prt;
    let n_gates0 = pulse0.n_gates;
    let n_gates1 = pulse1.n_gates;

    if (prt0 - prt1).abs() < PRT_EPSILON {
        return None;
    }

    for index in (1..n_samples - 1).step_by(2) {
        let pulse = queue.get(index);
        if (pulse.prt - prt0).abs() > PRT_EPSILON || pulse.n_gates != n_gates0 {
            return None;
        }
    }
    for index in (0..n_samples.saturating_sub(2)).step_by(2) {
        let pulse = queue.get(index);
        if (pulse.prt - prt1).abs() > PRT_EPSILON || pulse.n_gates != n_gates1 {
            return None;
        }
    }

    let (prt_short, prt_long) = if prt0 < prt1 { (prt0, prt1) } else { (prt1, prt0) };
    let starts_on_prt_short = prt0 > prt1;
    let (n_gates_prt_short, n_gates_prt_long) = if starts_on_prt_short {
        (n_gates0, n_gates1)
    } else {
        (n_gates1, n_gates0)
    };

    Some(StaggeredInfo {
        prt_short,
        prt_long,
        n_gates_prt_short,
        n_gates_prt_long,
        starts_on_prt_short,
    })
}

/// Whether a staggered dwell of `n_samples` pulses opens on a short-interval
/// pulse, applying the same recorded-PRT inversion as the detector.
pub fn staggered_starts_on_short(queue: &PulseQueue, n_samples: usize) -> bool {
    if n_samples < 2 || queue.len() < n_samples {
        return false;
    }
    let prt0 = queue.get(n_samples - 1).prt;
    let prt1 = queue.get(n_samples - 2).prt;
    prt0 > prt1
}
