use std::sync::Arc;

use crate::prelude::ScanType;
use crate::pulse::Pulse;

/// Metadata attached to a completed dwell.
#[derive(Debug, Clone, Default)]
pub struct BeamMeta {
    /// Azimuth for PPI and vertical-pointing scans, elevation for RHI.
    pub pointing_angle_deg: f64,
    pub scan_type: ScanType,
    pub n_samples: usize,
    /// Sample count a rectangular window of equivalent width would carry.
    pub n_samples_rect: usize,
    pub n_gates: usize,
    pub n_gates_prt_long: usize,
    pub is_indexed: bool,
    pub indexed_resolution_deg: f64,
    pub antenna_rate_deg_per_sec: f64,
    pub is_alternating: bool,
    pub is_staggered_prt: bool,
    pub prt: f64,
    pub prt_long: f64,
    pub pulse_width_us: f64,
    pub end_of_sweep: bool,
    pub end_of_volume: bool,
}

/// An immutable dwell: metadata plus the constituent pulses, oldest first.
///
/// Built only by the beam reader; consumed by the moment-computation stage
/// and then handed back through the [`crate::beam::BeamPool`].
#[derive(Debug, Default)]
pub struct Beam {
    meta: BeamMeta,
    pulses: Vec<Arc<Pulse>>,
}

impl Beam {
    pub(crate) fn configure(&mut self, meta: BeamMeta, pulses: Vec<Arc<Pulse>>) {
        self.meta = meta;
        self.pulses = pulses;
    }

    pub(crate) fn take_pulses(&mut self) -> Vec<Arc<Pulse>> {
        self.meta = BeamMeta::default();
        std::mem::take(&mut self.pulses)
    }

    pub fn pointing_angle_deg(&self) -> f64 {
        self.meta.pointing_angle_deg
    }

    pub fn scan_type(&self) -> ScanType {
        self.meta.scan_type
    }

    pub fn n_samples(&self) -> usize {
        self.meta.n_samples
    }

    pub fn n_samples_rect(&self) -> usize {
        self.meta.n_samples_rect
    }

    pub fn n_gates(&self) -> usize {
        self.meta.n_gates
    }

    pub fn n_gates_prt_long(&self) -> usize {
        self.meta.n_gates_prt_long
    }

    pub fn is_indexed(&self) -> bool {
        self.meta.is_indexed
    }

    pub fn indexed_resolution_deg(&self) -> f64 {
        self.meta.indexed_resolution_deg
    }

    pub fn antenna_rate_deg_per_sec(&self) -> f64 {
        self.meta.antenna_rate_deg_per_sec
    }

    pub fn is_alternating(&self) -> bool {
        self.meta.is_alternating
    }

    pub fn is_staggered_prt(&self) -> bool {
        self.meta.is_staggered_prt
    }

    pub fn prt(&self) -> f64 {
        self.meta.prt
    }

    pub fn prt_long(&self) -> f64 {
        self.meta.prt_long
    }

    pub fn pulse_width_us(&self) -> f64 {
        self.meta.pulse_width_us
    }

    pub fn end_of_sweep(&self) -> bool {
        self.meta.end_of_sweep
    }

    pub fn end_of_volume(&self) -> bool {
        self.meta.end_of_volume
    }

    /// Constituent pulses, oldest first.
    pub fn pulses(&self) -> &[Arc<Pulse>] {
        &self.pulses
    }
}
