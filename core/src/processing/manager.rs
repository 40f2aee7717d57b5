use serde::{Deserialize, Serialize};

use crate::prelude::{ScanMode, WindowType};

/// How a manager's dwells are delimited.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BeamMethodConfig {
    /// Fixed sample count per dwell.
    #[default]
    SpecifyNSamples,
    /// Sample count derived from antenna rate, PRF and angular dwell width.
    SpecifyDwellWidth,
    /// Dwell ends when the steering angle changes (phased array).
    ConstantSteeringAngle,
    /// Dwell ends when the transmit pulse width changes.
    PulseWidthChange,
}

/// Descriptor for one moments manager: the processing profile applied to
/// pulses matching its scan/PRF/antenna-rate envelope. Managers are held in
/// an ordered registry; the first suitable entry wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeManager {
    pub name: String,
    /// Restrict to a named scan segment; None matches any.
    pub scan_name: Option<String>,
    /// Applicable scan modes; empty matches any.
    pub scan_modes: Vec<ScanMode>,
    pub min_prf: f64,
    pub max_prf: f64,
    /// Envelope on the absolute antenna rate, deg/s.
    pub min_antenna_rate: f64,
    pub max_antenna_rate: f64,
    pub beam_method: BeamMethodConfig,
    pub n_samples: usize,
    pub window_type: WindowType,
    pub index_the_beams: bool,
    pub indexed_resolution_deg: f64,
    /// Angular dwell width used when sizing indexed beams.
    pub beam_angle_deg: f64,
    pub is_dual_prt: bool,
    pub apply_phase_decoding: bool,
}

impl Default for ModeManager {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            scan_name: None,
            scan_modes: Vec::new(),
            min_prf: 0.0,
            max_prf: 1.0e6,
            min_antenna_rate: 0.0,
            max_antenna_rate: 1.0e3,
            beam_method: BeamMethodConfig::SpecifyNSamples,
            n_samples: 64,
            window_type: WindowType::Rect,
            index_the_beams: false,
            indexed_resolution_deg: 1.0,
            beam_angle_deg: 1.0,
            is_dual_prt: false,
            apply_phase_decoding: false,
        }
    }
}

impl ModeManager {
    /// True if this manager applies to the given pulse context.
    pub fn is_suitable(
        &self,
        scan_mode: ScanMode,
        scan_name: &str,
        prf: f64,
        antenna_rate: f64,
    ) -> bool {
        if !self.scan_modes.is_empty() && !self.scan_modes.contains(&scan_mode) {
            return false;
        }
        if let Some(required) = &self.scan_name {
            if required != scan_name {
                return false;
            }
        }
        if prf < self.min_prf || prf > self.max_prf {
            return false;
        }
        let rate = antenna_rate.abs();
        if rate < self.min_antenna_rate || rate > self.max_antenna_rate {
            return false;
        }
        true
    }
}
