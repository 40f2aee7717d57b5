use serde::{Deserialize, Serialize};

/// Scan mode as reported by the transmitter on each pulse.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanMode {
    Sector,
    AzSur360,
    Rhi,
    ManRhi,
    VerticalPointing,
    Pointing,
    Idle,
    #[default]
    Unknown,
}

/// Scan type derived from the scan mode, used to pick the pointing axis.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanType {
    Ppi,
    Rhi,
    Vert,
    #[default]
    Unknown,
}

impl ScanType {
    /// Classify the wire-level scan mode into a scan type.
    pub fn from_scan_mode(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Rhi | ScanMode::ManRhi => ScanType::Rhi,
            ScanMode::VerticalPointing => ScanType::Vert,
            ScanMode::Unknown => ScanType::Unknown,
            _ => ScanType::Ppi,
        }
    }
}

/// Weighting window applied across the samples of a dwell.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WindowType {
    #[default]
    Rect,
    Vonhann,
    Blackman,
    BlackmanNuttall,
}

/// Engine-wide configuration for the beam reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Lower bound on the number of samples in any dwell.
    pub min_n_samples: usize,
    /// Upper bound on the number of samples in any dwell; also bounds the
    /// look-ahead during indexed beam searches.
    pub max_n_samples: usize,
    /// When set, a dwell with non-contiguous pulse sequence numbers is
    /// discarded and the miss is counted.
    pub check_for_missing_pulses: bool,
    /// When set, an indexed search never falls back to the non-indexed
    /// method; slow-antenna dwells are discarded instead.
    pub discard_non_indexed_beams: bool,
    /// Require a fixed transmit pulse width across dwells.
    pub specify_fixed_pulse_width: bool,
    /// The required pulse width when `specify_fixed_pulse_width` is set.
    pub fixed_pulse_width_us: f64,
    /// Smooth stair-stepped antenna angle reporting before dwell formation.
    pub interpolate_antenna_angles: bool,
    /// Bound on the interpolation queue; on overflow the queue drains
    /// without interpolating until its depth recovers.
    pub angle_interp_max_queue_size: usize,
    /// Angle runs changing by more than this are passed through unmodified.
    pub angle_interp_max_change_deg: f64,
    /// Add a latency correction proportional to the antenna rate when
    /// interpolating.
    pub angle_interp_adjust_for_latency: bool,
    /// Reporting latency used for the correction, in seconds.
    pub angle_interp_latency_secs: f64,
    /// Minimum elapsed time between progressive antenna-rate samples.
    pub min_secs_for_antenna_rate: f64,
    /// The PRT recorded on a pulse refers to the interval since the previous
    /// pulse. When false, the recorded pair is swapped on read.
    pub prt_is_for_previous_interval: bool,
    /// Recompute each pulse's PRT from the measured inter-pulse period,
    /// buffering one pulse to do so.
    pub compute_prt_from_interpulse_periods: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            min_n_samples: 32,
            max_n_samples: 256,
            check_for_missing_pulses: false,
            discard_non_indexed_beams: false,
            specify_fixed_pulse_width: false,
            fixed_pulse_width_us: 1.0,
            interpolate_antenna_angles: false,
            angle_interp_max_queue_size: 100,
            angle_interp_max_change_deg: 5.0,
            angle_interp_adjust_for_latency: false,
            angle_interp_latency_secs: 0.05,
            min_secs_for_antenna_rate: 0.2,
            prt_is_for_previous_interval: true,
            compute_prt_from_interpulse_periods: false,
        }
    }
}

/// Common error type for reader construction and channel faults.
#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    #[error("no mode managers registered")]
    NoManagers,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("pulse channel closed: {0}")]
    ChannelClosed(String),
}

pub type ReaderResult<T> = Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_type_classification_covers_rhi_and_vert() {
        assert_eq!(ScanType::from_scan_mode(ScanMode::ManRhi), ScanType::Rhi);
        assert_eq!(
            ScanType::from_scan_mode(ScanMode::VerticalPointing),
            ScanType::Vert
        );
        assert_eq!(ScanType::from_scan_mode(ScanMode::AzSur360), ScanType::Ppi);
        assert_eq!(ScanType::from_scan_mode(ScanMode::Sector), ScanType::Ppi);
    }

    #[test]
    fn default_config_is_sane() {
        let config = ReaderConfig::default();
        assert!(config.min_n_samples <= config.max_n_samples);
        assert!(config.prt_is_for_previous_interval);
    }
}
