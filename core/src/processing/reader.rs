//! The beam reader: pulls pulses from the source, maintains the sliding
//! window, and assembles completed dwells into immutable beams.
//!
//! One engine instance is driven by a single consumer thread; the pulse and
//! beam pools are the only state shared with other threads. All failures
//! here are recoverable: a malformed dwell discards the in-progress window
//! and acquisition restarts from the next pulse, while end of data surfaces
//! as `None` from [`BeamReader::get_next_beam`].

use std::collections::VecDeque;
use std::sync::Arc;

use crate::beam::{Beam, BeamMeta, BeamPool};
use crate::math::angles::{condition_az, condition_el, diff_deg};
use crate::math::window::WindowFactors;
use crate::prelude::{ReaderConfig, ReaderError, ReaderResult, ScanType, WindowType};
use crate::processing::interp::AngleInterpolator;
use crate::processing::manager::{BeamMethodConfig, ModeManager};
use crate::processing::modes::{
    alternating_starts_on_h, check_is_alternating, check_is_staggered_prt,
    staggered_starts_on_short, BeamMethod,
};
use crate::processing::queue::PulseQueue;
use crate::processing::rates::RateEstimators;
use crate::pulse::source::RawReader;
use crate::pulse::{Pulse, PulsePool, PulseSource};
use crate::telemetry::{LogManager, MetricsRecorder};

/// Phase-decoded dwells always use this many samples.
const N_SAMPLES_SZ: usize = 64;
/// Pulses between pool-trim / status checks.
const STATUS_CHECK_INTERVAL: usize = 10_000;
/// Rate-limit for the no-suitable-manager warning.
const MISS_MGR_WARN_EVERY: u64 = 1000;

const PRT_CHANGE_EPSILON: f64 = 1.0e-5;
const ANGLE_CHANGE_EPSILON: f64 = 1.0e-3;
const PULSE_WIDTH_EPSILON: f64 = 2.0e-3;
const WIDTH_MATCH_EPSILON: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DwellStatus {
    Complete,
    EndOfData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finalize {
    Ok,
    Invalid,
    EndOfData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexedSearch {
    Found,
    Fallback,
    EndOfData,
}

/// Scalar snapshot of the manager currently governing dwell formation.
#[derive(Debug, Clone, Copy)]
struct ActiveManager {
    index: usize,
    beam_method: BeamMethodConfig,
    n_samples: usize,
    window_type: WindowType,
    apply_phase_decoding: bool,
}

/// Converts the pulse stream into discrete beams; see the module docs.
pub struct BeamReader {
    config: ReaderConfig,
    managers: Vec<ModeManager>,
    raw: RawReader,
    interp: AngleInterpolator,
    pulse_pool: Arc<PulsePool>,
    beam_pool: Arc<BeamPool>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    queue: PulseQueue,
    rates: RateEstimators,
    window_factors: WindowFactors,

    active_mgr: Option<ActiveManager>,
    miss_mgr_count: u64,
    active_method: BeamMethod,
    indexed_fallback: bool,

    end_of_sweep_pending: bool,
    end_of_volume_pending: bool,
    end_of_sweep_seq: u64,
    end_of_volume_seq: u64,
    end_of_sweep_flag: bool,
    end_of_volume_flag: bool,

    scan_type: ScanType,
    n_samples: usize,
    n_gates: usize,
    az: f64,
    el: f64,
    prt: f64,
    mean_prf: f64,
    pulse_width_us: f64,

    is_alternating: bool,
    starts_on_horiz: bool,
    is_staggered_prt: bool,
    starts_on_prt_short: bool,
    prt_short: f64,
    prt_long: f64,
    n_gates_prt_short: usize,
    n_gates_prt_long: usize,
    is_dual_prt: bool,

    index_the_beams: bool,
    indexed_resolution: f64,
    beam_angle_deg: f64,
    az_index: i64,
    prev_az_index: i64,
    el_index: i64,
    prev_el_index: i64,
    rotation_clockwise: bool,
    rotation_upwards: bool,

    start_index: usize,
    mid_index: usize,
    end_index: usize,
    prev_beam_seq: u64,
    beam_error: bool,
    beam_count: u64,
    pulses_since_status: usize,
    fixed_width_history: VecDeque<bool>,
}

impl BeamReader {
    pub fn new(
        source: Box<dyn PulseSource>,
        config: ReaderConfig,
        managers: Vec<ModeManager>,
    ) -> ReaderResult<Self> {
        if managers.is_empty() {
            return Err(ReaderError::NoManagers);
        }
        if config.min_n_samples < 4 || config.min_n_samples > config.max_n_samples {
            return Err(ReaderError::InvalidConfig(
                "min_n_samples must be >= 4 and <= max_n_samples".to_string(),
            ));
        }
        for manager in &managers {
            if manager.beam_method == BeamMethodConfig::SpecifyNSamples && manager.n_samples < 2 {
                return Err(ReaderError::InvalidConfig(format!(
                    "manager '{}' has n_samples < 2",
                    manager.name
                )));
            }
            if manager.index_the_beams && manager.indexed_resolution_deg <= 0.0 {
                return Err(ReaderError::InvalidConfig(format!(
                    "manager '{}' has non-positive indexed resolution",
                    manager.name
                )));
            }
        }

        let pulse_pool = Arc::new(PulsePool::new());
        let interp = AngleInterpolator::new(&config);
        let raw = RawReader::new(
            source,
            pulse_pool.clone(),
            config.prt_is_for_previous_interval,
            config.compute_prt_from_interpulse_periods,
        );
        let rates = RateEstimators::new(config.min_secs_for_antenna_rate);
        let n_samples = config.min_n_samples;

        Ok(Self {
            config,
            managers,
            raw,
            interp,
            pulse_pool,
            beam_pool: Arc::new(BeamPool::new()),
            metrics: Arc::new(MetricsRecorder::new()),
            logger: LogManager::new(),
            queue: PulseQueue::new(),
            rates,
            window_factors: WindowFactors::compute(),
            active_mgr: None,
            miss_mgr_count: 0,
            active_method: BeamMethod::NonIndexed,
            indexed_fallback: false,
            end_of_sweep_pending: false,
            end_of_volume_pending: false,
            end_of_sweep_seq: 0,
            end_of_volume_seq: 0,
            end_of_sweep_flag: false,
            end_of_volume_flag: false,
            scan_type: ScanType::Ppi,
            n_samples,
            n_gates: 0,
            az: 0.0,
            el: 0.0,
            prt: 0.001,
            mean_prf: 1000.0,
            pulse_width_us: 1.0,
            is_alternating: false,
            starts_on_horiz: true,
            is_staggered_prt: false,
            starts_on_prt_short: true,
            prt_short: 0.001,
            prt_long: 0.001,
            n_gates_prt_short: 0,
            n_gates_prt_long: 0,
            is_dual_prt: false,
            index_the_beams: false,
            indexed_resolution: 1.0,
            beam_angle_deg: 1.0,
            az_index: 0,
            prev_az_index: -999,
            el_index: 0,
            prev_el_index: -999,
            rotation_clockwise: true,
            rotation_upwards: true,
            start_index: 0,
            mid_index: 0,
            end_index: 0,
            prev_beam_seq: 0,
            beam_error: false,
            beam_count: 0,
            pulses_since_status: 0,
            fixed_width_history: VecDeque::new(),
        })
    }

    /// The next completed beam, or None at end of data.
    pub fn get_next_beam(&mut self) -> Option<Beam> {
        if self.queue.is_empty() {
            self.initialize_queue()?;
        }

        // loop until a dwell validates
        loop {
            // read one pulse to learn the current mode, then give it back so
            // the chosen strategy sees it again
            self.get_next_pulse()?;
            self.queue.cache_latest();

            let active = match self.active_mgr {
                Some(active) => active,
                None => return None,
            };
            let method = BeamMethod::select(
                active.beam_method,
                self.index_the_beams,
                self.is_dual_prt,
                self.is_staggered_prt,
            );
            self.active_method = method;
            self.indexed_fallback = false;

            let status = match method {
                BeamMethod::ConstantSteeringAngle => self.read_constant_steering_angle(),
                BeamMethod::PulseWidthChange => self.read_pulse_width_change(),
                BeamMethod::Indexed => self.read_indexed(),
                BeamMethod::DualPrt | BeamMethod::StaggeredPrt => self.read_dual_prt(),
                BeamMethod::NonIndexed => self.read_non_indexed(),
            };
            if status == DwellStatus::EndOfData {
                return None;
            }
            if self.beam_ok() {
                break;
            }
        }

        // in staggered mode, the beam gate count is the short-PRT gate count
        self.n_gates = if self.is_staggered_prt {
            self.n_gates_prt_short
        } else {
            self.compute_min_n_gates()
        };
        self.pulse_width_us = self.queue.get(self.mid_index).pulse_width_us;
        self.beam_count += 1;

        // oldest pulse first, reversing the window's newest-first storage
        let mut beam_pulses = Vec::with_capacity(self.n_samples);
        for index in (self.end_index..=self.start_index).rev() {
            beam_pulses.push(self.queue.get(index).clone());
        }

        let pointing_angle = match self.scan_type {
            ScanType::Rhi => self.el,
            _ => self.az,
        };

        let active = self.active_mgr?;
        let n_samples_rect = self.compute_n_samples_rect(active, self.n_samples);
        self.check_end_flags(beam_pulses[0].seq_num);

        let mut beam = self.beam_pool.acquire();
        beam.configure(
            BeamMeta {
                pointing_angle_deg: pointing_angle,
                scan_type: self.scan_type,
                n_samples: self.n_samples,
                n_samples_rect,
                n_gates: self.n_gates,
                n_gates_prt_long: self.n_gates_prt_long,
                is_indexed: self.active_method == BeamMethod::Indexed && !self.indexed_fallback,
                indexed_resolution_deg: self.indexed_resolution,
                antenna_rate_deg_per_sec: self.antenna_rate(),
                is_alternating: self.is_alternating,
                is_staggered_prt: self.is_staggered_prt,
                prt: self.prt,
                prt_long: self.prt_long,
                pulse_width_us: self.pulse_width_us,
                end_of_sweep: self.end_of_sweep_flag,
                end_of_volume: self.end_of_volume_flag,
            },
            beam_pulses,
        );

        self.end_of_sweep_flag = false;
        self.end_of_volume_flag = false;

        self.recycle_pulses();
        self.metrics.record_beam_emitted();
        Some(beam)
    }

    /// Antenna rate along the scanned axis for the latest beam.
    pub fn antenna_rate(&self) -> f64 {
        if self.scan_type == ScanType::Rhi {
            self.rates.beam_el()
        } else {
            self.rates.beam_az()
        }
    }

    pub fn pulse_pool(&self) -> Arc<PulsePool> {
        self.pulse_pool.clone()
    }

    pub fn beam_pool(&self) -> Arc<BeamPool> {
        self.beam_pool.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn beam_count(&self) -> u64 {
        self.beam_count
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    pub fn rotation_clockwise(&self) -> bool {
        self.rotation_clockwise
    }

    pub fn rotation_upwards(&self) -> bool {
        self.rotation_upwards
    }

    // ---------------------------------------------------------------------
    // pulse intake

    fn initialize_queue(&mut self) -> Option<()> {
        let n_start = self.config.min_n_samples.max(64);
        while self.queue.len() < n_start {
            self.get_next_pulse()?;
        }
        self.prev_beam_seq = self.queue.get(0).seq_num;
        Some(())
    }

    /// Find the next valid pulse (one with a suitable manager), admit it to
    /// the window, and return it. None means end of data.
    fn get_next_pulse(&mut self) -> Option<Arc<Pulse>> {
        loop {
            let pulse = self.read_next_pulse()?;
            self.metrics.record_pulse_read();

            // arm pending end flags; they become visible on a beam only once
            // the window has advanced past the marker pulse
            if pulse.end_of_sweep && !self.end_of_sweep_pending {
                self.end_of_sweep_pending = true;
                self.end_of_sweep_seq = pulse.seq_num;
            }
            if pulse.end_of_volume && !self.end_of_volume_pending {
                self.end_of_volume_pending = true;
                self.end_of_volume_seq = pulse.seq_num;
            }

            let scan_type = ScanType::from_scan_mode(pulse.scan_mode);
            if scan_type != self.scan_type {
                self.init_scan_type(scan_type);
                self.rates.reset_timers();
            }

            let antenna_rate = if self.scan_type == ScanType::Ppi {
                self.rates.update_progressive_az(&pulse);
                self.rates.progressive_az()
            } else {
                self.rates.update_progressive_el(&pulse);
                self.rates.progressive_el()
            };

            if pulse.prt <= 0.0 {
                self.pulse_pool.release(pulse);
                continue;
            }
            let prf = 1.0 / pulse.prt;
            let scan_name = self.raw.info().scan_segment_name.clone();

            let mgr_index = self
                .managers
                .iter()
                .position(|m| m.is_suitable(pulse.scan_mode, &scan_name, prf, antenna_rate));
            let index = match mgr_index {
                Some(index) => index,
                None => {
                    self.logger.warn_throttled(
                        self.miss_mgr_count,
                        MISS_MGR_WARN_EVERY,
                        &format!(
                            "no suitable mode manager, dropping pulse: \
                             scan_mode {:?}, prf {:.1}, rate {:.1}",
                            pulse.scan_mode, prf, antenna_rate
                        ),
                    );
                    self.miss_mgr_count += 1;
                    self.metrics.record_pulse_dropped_no_manager();
                    self.pulse_pool.release(pulse);
                    continue;
                }
            };

            let manager = &self.managers[index];
            if self.active_mgr.map(|a| a.index) != Some(index) {
                self.logger
                    .record(&format!("selected mode manager '{}'", manager.name));
            }
            self.active_mgr = Some(ActiveManager {
                index,
                beam_method: manager.beam_method,
                n_samples: manager.n_samples,
                window_type: manager.window_type,
                apply_phase_decoding: manager.apply_phase_decoding,
            });
            self.index_the_beams = manager.index_the_beams && !manager.is_dual_prt;
            self.is_dual_prt = manager.is_dual_prt;
            self.indexed_resolution = manager.indexed_resolution_deg;
            self.beam_angle_deg = manager.beam_angle_deg;

            self.queue.push_latest(pulse.clone());

            self.pulses_since_status += 1;
            if self.pulses_since_status >= STATUS_CHECK_INTERVAL {
                self.pulses_since_status = 0;
                self.pulse_pool.trim();
            }

            return Some(pulse);
        }
    }

    /// Cache, then interpolation stage, then the raw reader.
    fn read_next_pulse(&mut self) -> Option<Arc<Pulse>> {
        if let Some(pulse) = self.queue.pop_cached() {
            return Some(pulse);
        }
        let pulse = if self.config.interpolate_antenna_angles {
            let az_rate = self.rates.progressive_az();
            let el_rate = self.rates.progressive_el();
            self.interp.next_pulse(&mut self.raw, az_rate, el_rate)?
        } else {
            self.raw.read()?
        };
        Some(Arc::new(pulse))
    }

    fn init_scan_type(&mut self, scan_type: ScanType) {
        match scan_type {
            ScanType::Ppi => {
                self.az_index = 0;
                self.prev_az_index = -999;
            }
            _ => {
                self.el_index = 0;
                self.prev_el_index = -999;
            }
        }
        self.scan_type = scan_type;
    }

    // ---------------------------------------------------------------------
    // boundary strategies

    fn read_non_indexed(&mut self) -> DwellStatus {
        let configured = match self.active_mgr {
            Some(active) => active.n_samples,
            None => self.config.min_n_samples,
        };
        self.n_samples = (configured / 2) * 2;

        for _ in 0..self.n_samples {
            if self.get_next_pulse().is_none() {
                self.beam_error = true;
                return DwellStatus::EndOfData;
            }
        }

        match self.finalize_non_indexed() {
            Finalize::Ok => {
                self.beam_error = false;
                DwellStatus::Complete
            }
            Finalize::Invalid => {
                self.beam_error = true;
                DwellStatus::Complete
            }
            Finalize::EndOfData => {
                self.beam_error = true;
                DwellStatus::EndOfData
            }
        }
    }

    /// Dual-PRT dwell: ends when the PRT departs from the value recorded at
    /// dwell start. Also handles the staggered variant, whose trigger is the
    /// same.
    fn read_dual_prt(&mut self) -> DwellStatus {
        self.is_alternating = false;
        self.is_staggered_prt = false;

        let mut count: usize = 0;
        let mut prt = -9999.0;
        while count <= self.config.max_n_samples {
            let pulse = match self.get_next_pulse() {
                Some(pulse) => pulse,
                None => {
                    self.beam_error = true;
                    return DwellStatus::EndOfData;
                }
            };
            if count == 0 {
                prt = pulse.prt;
            }
            if (prt - pulse.prt).abs() > PRT_CHANGE_EPSILON {
                // save for the start of the next beam
                self.queue.cache_latest();
                break;
            }
            count += 1;
        }
        if count < 2 {
            self.beam_error = true;
            return DwellStatus::Complete;
        }

        self.prt = prt;
        self.mean_prf = 1.0 / self.prt;
        self.finish_counted_dwell(count);
        self.beam_error = false;
        DwellStatus::Complete
    }

    /// Phased-array dwell: ends when the steering angle moves by more than a
    /// small epsilon, after at least two matching pulses.
    fn read_constant_steering_angle(&mut self) -> DwellStatus {
        let mut count: usize = 0;
        let mut az = -9999.0;
        let mut el = -9999.0;
        while count <= self.config.max_n_samples {
            let pulse = match self.get_next_pulse() {
                Some(pulse) => pulse,
                None => {
                    self.beam_error = true;
                    return DwellStatus::EndOfData;
                }
            };
            if count == 0 {
                az = pulse.az_deg;
                el = pulse.el_deg;
            }
            if ((az - pulse.az_deg).abs() > ANGLE_CHANGE_EPSILON
                || (el - pulse.el_deg).abs() > ANGLE_CHANGE_EPSILON)
                && count > 1
            {
                self.queue.cache_latest();
                break;
            }
            count += 1;
        }
        if count < 2 {
            self.beam_error = true;
            return DwellStatus::Complete;
        }

        self.set_prt();
        self.finish_counted_dwell(count);
        self.beam_error = false;
        DwellStatus::Complete
    }

    /// Pulse-width-triggered dwell: ends when the transmit pulse width
    /// changes, optionally pre-filtering pulses that miss a required fixed
    /// width.
    fn read_pulse_width_change(&mut self) -> DwellStatus {
        let mut n_in_dwell: usize = 0;
        let mut warning_count: u64 = 0;
        let mut pulse_width_us = -9999.0;
        let mut width_changed = false;

        while n_in_dwell <= self.config.max_n_samples {
            let pulse = match self.get_next_pulse() {
                Some(pulse) => pulse,
                None => {
                    self.beam_error = true;
                    return DwellStatus::EndOfData;
                }
            };
            warning_count += 1;

            if n_in_dwell == 0 {
                if self.config.specify_fixed_pulse_width
                    && (self.config.fixed_pulse_width_us - pulse.pulse_width_us).abs()
                        > PULSE_WIDTH_EPSILON
                {
                    // the pulse was already admitted to the window; take it
                    // back out and keep searching
                    if let Some(dropped) = self.queue.pop_latest() {
                        self.pulse_pool.release(dropped);
                    }
                    if warning_count >= self.config.max_n_samples as u64 * 10 {
                        self.logger.warn(&format!(
                            "{} consecutive pulses with width != {} us",
                            warning_count, self.config.fixed_pulse_width_us
                        ));
                        warning_count = 0;
                    }
                    continue;
                }
                pulse_width_us = pulse.pulse_width_us;
            }

            if (pulse_width_us - pulse.pulse_width_us).abs() > PULSE_WIDTH_EPSILON && n_in_dwell > 1
            {
                width_changed = true;
                self.queue.cache_latest();
                break;
            }
            n_in_dwell += 1;
        }

        if !width_changed || n_in_dwell < 2 {
            self.logger
                .warn("pulse-width-change search found no usable dwell");
            self.beam_error = true;
            return DwellStatus::Complete;
        }

        self.set_prt();
        self.finish_counted_dwell(n_in_dwell);
        self.beam_error = false;
        DwellStatus::Complete
    }

    fn read_indexed(&mut self) -> DwellStatus {
        match self.find_next_indexed_beam() {
            IndexedSearch::EndOfData => {
                self.beam_error = true;
                return DwellStatus::EndOfData;
            }
            IndexedSearch::Fallback => {
                // antenna too slow for an indexed dwell; form a non-indexed
                // beam from what is buffered. The fallback is local to this
                // dwell: indexing is re-evaluated from the manager on the
                // next pulse.
                self.indexed_fallback = true;
                match self.finalize_non_indexed() {
                    Finalize::Ok => self.beam_error = false,
                    Finalize::Invalid => self.beam_error = true,
                    Finalize::EndOfData => {
                        self.beam_error = true;
                        return DwellStatus::EndOfData;
                    }
                }
                return DwellStatus::Complete;
            }
            IndexedSearch::Found => {}
        }

        // anchor for the next search
        self.prev_beam_seq = self.queue.get(0).seq_num;

        self.rates
            .compute_beam_az(&self.queue, 0, None, self.mean_prf, self.config.min_n_samples);
        self.rates
            .compute_beam_el(&self.queue, 0, None, self.mean_prf, self.config.min_n_samples);

        let active = match self.active_mgr {
            Some(active) => active,
            None => {
                self.beam_error = true;
                return DwellStatus::Complete;
            }
        };
        self.n_samples = self.compute_n_samples_indexed(active);

        // the beam center straddles the two most recent pulses; read in the
        // second half of the dwell
        let n_half = self.n_samples / 2;
        for _ in 0..n_half.saturating_sub(1) {
            if self.get_next_pulse().is_none() {
                self.beam_error = true;
                return DwellStatus::EndOfData;
            }
        }

        if !self.check_start_conditions() {
            self.beam_error = true;
            return DwellStatus::EndOfData;
        }

        self.end_index = 0;
        self.start_index = self.n_samples.saturating_sub(1);
        self.mid_index = self.n_samples / 2;

        self.constrain_to_dwell(active);
        self.set_prt();
        self.beam_error = false;
        DwellStatus::Complete
    }

    /// Common tail for the counted strategies: indices, pointing angles,
    /// rates and the re-anchor sequence number.
    fn finish_counted_dwell(&mut self, count: usize) {
        self.n_samples = (count / 2) * 2;
        self.mid_index = self.n_samples / 2;
        self.start_index = self.n_samples - 1;
        self.end_index = 0;

        self.az = condition_az(self.queue.get(self.mid_index).az_deg);
        self.el = condition_el(self.queue.get(self.mid_index).el_deg);

        self.rates.compute_beam_az(
            &self.queue,
            0,
            Some(self.n_samples),
            self.mean_prf,
            self.config.min_n_samples,
        );
        self.rates.compute_beam_el(
            &self.queue,
            0,
            Some(self.n_samples),
            self.mean_prf,
            self.config.min_n_samples,
        );

        self.prev_beam_seq = self.queue.get(self.mid_index).seq_num;
    }

    fn finalize_non_indexed(&mut self) -> Finalize {
        self.set_prt();

        if !self.check_start_conditions() {
            return Finalize::EndOfData;
        }
        if self.config.specify_fixed_pulse_width && !self.check_fixed_pulse_width() {
            return Finalize::Invalid;
        }
        if self.n_samples < 2 || self.queue.len() < self.n_samples {
            return Finalize::Invalid;
        }

        self.finish_counted_dwell(self.n_samples);
        Finalize::Ok
    }

    /// Alternating dwells must open on horizontal transmit, staggered dwells
    /// on a short-PRT pulse. One extra pulse is read and the window shifted
    /// when the parity is off. Returns false on end of data.
    fn check_start_conditions(&mut self) -> bool {
        if self.is_alternating {
            self.starts_on_horiz = alternating_starts_on_h(&self.queue, self.n_samples);
            if !self.starts_on_horiz {
                if self.get_next_pulse().is_none() {
                    return false;
                }
                self.starts_on_horiz = true;
            }
        } else if self.is_staggered_prt {
            self.starts_on_prt_short = staggered_starts_on_short(&self.queue, self.n_samples);
            if !self.starts_on_prt_short {
                if self.get_next_pulse().is_none() {
                    return false;
                }
                self.starts_on_prt_short = true;
            }
        }
        true
    }

    /// Rolling check that the pulse width stays at the required fixed value
    /// over several consecutive dwells, not just the current one.
    fn check_fixed_pulse_width(&mut self) -> bool {
        let history_len = self.n_samples * 4;
        if self.fixed_width_history.len() != history_len {
            self.fixed_width_history.clear();
            self.fixed_width_history.resize(history_len, false);
        }
        for index in 0..self.n_samples.min(self.queue.len()) {
            let pulse = self.queue.get(index);
            self.fixed_width_history.pop_back();
            let matches = (pulse.pulse_width_us - self.config.fixed_pulse_width_us).abs()
                <= PULSE_WIDTH_EPSILON;
            self.fixed_width_history.push_front(matches);
        }
        self.fixed_width_history.iter().all(|ok| *ok)
    }

    // ---------------------------------------------------------------------
    // indexed search

    /// Re-anchor the search at the pulse following the previous beam center,
    /// giving newer pulses back through the cache. Returns false on end of
    /// data.
    fn find_prev_indexed_beam(&mut self) -> bool {
        while self.queue.len() < 3 {
            if self.get_next_pulse().is_none() {
                return false;
            }
        }
        let mut prev_loc = 0;
        for index in 0..self.queue.len() - 1 {
            if self.queue.get(index).seq_num == self.prev_beam_seq {
                prev_loc = index;
                break;
            }
        }
        for _ in 0..prev_loc {
            self.queue.cache_latest();
        }
        true
    }

    fn find_next_indexed_beam(&mut self) -> IndexedSearch {
        if !self.find_prev_indexed_beam() {
            self.n_samples = (self.queue.len() / 2) * 2;
            return IndexedSearch::EndOfData;
        }

        let mut pulse_count: usize = 0;
        loop {
            if self.get_next_pulse().is_none() {
                self.n_samples = (self.queue.len() / 2) * 2;
                return IndexedSearch::EndOfData;
            }

            let found = if self.scan_type == ScanType::Ppi {
                self.find_beam_center_ppi()
            } else {
                self.find_beam_center_rhi()
            };
            if found {
                break;
            }

            if !self.config.discard_non_indexed_beams && pulse_count > self.config.max_n_samples {
                // antenna moving too slowly to cross an index within the
                // look-ahead budget
                self.n_samples = if self.config.max_n_samples <= self.queue.len() {
                    (self.config.max_n_samples / 2) * 2
                } else {
                    (self.queue.len() / 2) * 2
                };
                return IndexedSearch::Fallback;
            }
            pulse_count += 1;
        }

        self.n_samples = (self.queue.len() / 2) * 2;
        IndexedSearch::Found
    }

    /// PPI: success when the two most recent pulses straddle a quantized
    /// target azimuth different from the previous one. Sets the target
    /// azimuth, the index, and the rotation sense.
    fn find_beam_center_ppi(&mut self) -> bool {
        if self.queue.len() < 2 {
            return false;
        }
        self.el = condition_el(self.queue.get(0).el_deg);
        self.az = 0.0;

        let mid_az1 = self.queue.get(1).az_deg;
        let mid_az2 = self.queue.get(0).az_deg;

        let mut delta_az = (mid_az2 - mid_az1).abs();
        if delta_az > 180.0 {
            delta_az = (delta_az - 360.0).abs();
        }
        if delta_az > self.indexed_resolution {
            return false;
        }

        // round the resolution so it divides 45 degrees evenly
        let naz_per_45 = (45.0 / self.indexed_resolution + 0.5) as i64;
        let angular_res = 45.0 / naz_per_45 as f64;

        self.az_index = (mid_az1 / angular_res + 0.5) as i64;
        let n_az = (360.0 / angular_res + 0.5) as i64;
        if self.az_index == n_az {
            self.az_index = 0;
        }

        if self.az_index == self.prev_az_index {
            return false;
        }

        self.az = self.az_index as f64 * angular_res;
        if self.az >= 360.0 {
            self.az -= 360.0;
        } else if self.az < 0.0 {
            self.az += 360.0;
        }

        if mid_az1 <= self.az && mid_az2 >= self.az {
            self.rotation_clockwise = true;
            self.prev_az_index = self.az_index;
            return true;
        } else if mid_az1 >= self.az && mid_az2 <= self.az {
            self.rotation_clockwise = false;
            self.prev_az_index = self.az_index;
            return true;
        } else if self.az == 0.0 {
            // straddling north
            if mid_az1 > 360.0 - angular_res && mid_az2 < angular_res {
                self.rotation_clockwise = true;
                self.prev_az_index = self.az_index;
                return true;
            } else if mid_az2 > 360.0 - angular_res && mid_az1 < angular_res {
                self.rotation_clockwise = false;
                self.prev_az_index = self.az_index;
                return true;
            }
        }

        false
    }

    /// RHI: as for PPI but in elevation, with the index offset so negative
    /// elevations stay representable.
    fn find_beam_center_rhi(&mut self) -> bool {
        if self.queue.len() < 2 {
            return false;
        }
        self.az = condition_az(self.queue.get(0).az_deg);
        self.el = 0.0;

        let mid_el1 = condition_el(self.queue.get(1).el_deg);
        let mid_el2 = condition_el(self.queue.get(0).el_deg);

        let mut delta_el = (mid_el2 - mid_el1).abs();
        if delta_el > 180.0 {
            delta_el = (delta_el - 360.0).abs();
        }
        if delta_el > self.indexed_resolution {
            return false;
        }

        let angular_res = self.indexed_resolution;

        self.el_index = ((mid_el1 + 180.0) / angular_res + 0.5) as i64;
        let n_el = (360.0 / angular_res + 0.5) as i64;
        if self.el_index == n_el {
            self.el_index = 0;
        }

        if self.el_index == self.prev_el_index {
            return false;
        }

        self.el = -180.0 + self.el_index as f64 * angular_res;

        if mid_el1 <= self.el && mid_el2 >= self.el {
            self.rotation_upwards = true;
            self.prev_el_index = self.el_index;
            return true;
        } else if mid_el1 >= self.el && mid_el2 <= self.el {
            self.rotation_upwards = false;
            self.prev_el_index = self.el_index;
            return true;
        }

        false
    }

    fn compute_n_samples_indexed(&self, active: ActiveManager) -> usize {
        if active.beam_method == BeamMethodConfig::SpecifyNSamples {
            if active.apply_phase_decoding {
                return N_SAMPLES_SZ;
            }
            let n = active.n_samples.min(self.queue.len());
            return (n / 2) * 2;
        }

        // dwell width method: derive the count from rate, PRF and width
        let mut antenna_rate = if self.scan_type == ScanType::Rhi {
            self.rates.beam_el().abs()
        } else {
            self.rates.beam_az().abs()
        };
        if antenna_rate < 0.01 {
            antenna_rate = 0.01;
        }

        let n_rect = (self.mean_prf * self.beam_angle_deg / antenna_rate + 0.5) as usize;
        let n_rect = n_rect.clamp(self.config.min_n_samples, self.config.max_n_samples);

        let factor = self.window_factors.factor(active.window_type);
        let n = ((n_rect as f64 * factor + 0.5) as usize).min(self.queue.len());
        (n / 2) * 2
    }

    /// Sample count a rectangular window of equivalent width would carry,
    /// rounded up to even.
    fn compute_n_samples_rect(&self, active: ActiveManager, n_samples: usize) -> usize {
        if active.apply_phase_decoding {
            return N_SAMPLES_SZ;
        }
        if active.window_type == WindowType::Rect {
            return n_samples;
        }
        let factor = self.window_factors.factor(active.window_type);
        let n_rect = (n_samples as f64 / factor + 0.5) as usize;
        ((n_rect + 1) / 2) * 2
    }

    /// Shrink the indexed dwell so only pulses within the widened half-dwell
    /// around the target angle remain, nudging both ends to keep the count
    /// even and the start parity intact. Takes care of overshoot when the
    /// antenna rate varies.
    fn constrain_to_dwell(&mut self, active: ActiveManager) {
        if self.n_samples == 0 || self.queue.len() < self.n_samples {
            return;
        }
        let mut start_index = self.start_index;
        let mut end_index = self.end_index;

        let window_factor = self.window_factors.factor(active.window_type);
        let half_wide_dwell = (self.beam_angle_deg * window_factor * 1.01) / 2.0;
        let n_half_min = self.config.min_n_samples / 2;

        let is_ppi = self.scan_type == ScanType::Ppi;
        let target = if is_ppi { self.az } else { self.el };
        let angle_of = |pulse: &Pulse| if is_ppi { pulse.az_deg } else { pulse.el_deg };

        if self.mid_index > n_half_min {
            for index in 0..self.mid_index - n_half_min {
                if diff_deg(angle_of(self.queue.get(index)), target).abs() <= half_wide_dwell {
                    end_index = index;
                    break;
                }
            }
        }
        let lower = self.mid_index + n_half_min;
        if self.n_samples > lower {
            for index in (lower..self.n_samples).rev() {
                if diff_deg(angle_of(self.queue.get(index)), target).abs() <= half_wide_dwell {
                    start_index = index;
                    break;
                }
            }
        }

        // move each end by an even amount so alternating / staggered parity
        // at the dwell start is preserved
        let delta_start = start_index as isize - self.start_index as isize;
        if delta_start % 2 != 0 {
            if start_index < self.queue.len() - 1 {
                start_index += 1;
            } else {
                start_index -= 1;
            }
        }
        let delta_end = end_index as isize - self.end_index as isize;
        if delta_end % 2 != 0 {
            if end_index > 0 {
                end_index -= 1;
            } else {
                end_index += 1;
            }
        }

        if start_index <= end_index {
            return;
        }

        self.start_index = start_index;
        self.end_index = end_index;
        self.n_samples = start_index - end_index + 1;
        self.mid_index = (start_index + end_index) / 2;
    }

    // ---------------------------------------------------------------------
    // dwell state

    /// Set the PRT members from the window and re-run the staggered /
    /// alternating detectors. Staggered excludes alternating and takes
    /// priority.
    fn set_prt(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.prt = self.queue.get(0).prt;

        match check_is_staggered_prt(&self.queue, self.n_samples) {
            Some(info) => {
                self.is_staggered_prt = true;
                self.is_alternating = false;
                self.prt_short = info.prt_short;
                self.prt_long = info.prt_long;
                self.n_gates_prt_short = info.n_gates_prt_short;
                self.n_gates_prt_long = info.n_gates_prt_long;
                self.starts_on_prt_short = info.starts_on_prt_short;
                self.prt = self.prt_short;
            }
            None => {
                self.is_staggered_prt = false;
                self.is_alternating = check_is_alternating(&self.queue);
                if self.is_alternating {
                    self.starts_on_horiz = alternating_starts_on_h(&self.queue, self.n_samples);
                }
            }
        }

        self.mean_prf = if self.is_staggered_prt {
            1.0 / ((self.prt_short + self.prt_long) / 2.0)
        } else if self.prt > 0.0 {
            1.0 / self.prt
        } else {
            self.mean_prf
        };
    }

    // ---------------------------------------------------------------------
    // validation and emission

    /// Validate the assembled dwell. On failure the whole window is
    /// discarded and acquisition restarts from the next pulse.
    fn beam_ok(&mut self) -> bool {
        if self.beam_error {
            self.logger.warn("error forming beam, discarding window");
            self.discard_window();
            return false;
        }
        if self.queue.is_empty() || self.start_index >= self.queue.len() {
            self.discard_window();
            return false;
        }

        if self.active_method == BeamMethod::PulseWidthChange {
            // constant width within the dwell only
            let mut prev_width = self.queue.get(self.start_index).pulse_width_us;
            for index in (self.end_index..self.start_index).rev() {
                let width = self.queue.get(index).pulse_width_us;
                if (width - prev_width).abs() > WIDTH_MATCH_EPSILON {
                    self.logger.warn(&format!(
                        "pulse width changes within beam: {} vs {} us",
                        width, prev_width
                    ));
                    self.discard_window();
                    return false;
                }
                prev_width = width;
            }
        } else if self.config.specify_fixed_pulse_width {
            // constant width across the whole window, at the required value
            let mut prev_width = self.queue.get(0).pulse_width_us;
            for index in 1..self.queue.len() {
                let width = self.queue.get(index).pulse_width_us;
                if (width - prev_width).abs() > WIDTH_MATCH_EPSILON {
                    self.logger.warn(&format!(
                        "pulse width changes within window: {} vs {} us",
                        width, prev_width
                    ));
                    self.discard_window();
                    return false;
                }
                prev_width = width;
            }
            if (prev_width - self.config.fixed_pulse_width_us).abs() > PULSE_WIDTH_EPSILON {
                self.logger.warn(&format!(
                    "pulse width {} us does not match required {} us",
                    prev_width, self.config.fixed_pulse_width_us
                ));
                self.discard_window();
                return false;
            }
        }

        if !self.config.check_for_missing_pulses {
            return true;
        }

        let mut prev_seq = self.queue.get(self.start_index).seq_num;
        for index in (self.end_index..self.start_index).rev() {
            let seq = self.queue.get(index).seq_num;
            if seq != prev_seq + 1 {
                let n_missing = seq.saturating_sub(prev_seq).saturating_sub(1);
                self.logger.warn(&format!(
                    "missing pulses in sequence: {} missing between {} and {}, \
                     discarding {} queued pulses",
                    n_missing,
                    prev_seq,
                    seq,
                    self.queue.len()
                ));
                self.metrics.record_missing_pulses(n_missing);
                self.discard_window();
                return false;
            }
            prev_seq = seq;
        }

        true
    }

    fn discard_window(&mut self) {
        self.metrics.record_dwell_discarded();
        self.queue.clear(&self.pulse_pool);
        self.beam_error = false;
    }

    /// A pending end flag becomes visible only once the beam's earliest
    /// pulse lies beyond the pulse that carried the raw marker.
    fn check_end_flags(&mut self, first_pulse_seq: u64) {
        if self.end_of_sweep_pending && self.end_of_sweep_seq < first_pulse_seq {
            self.end_of_sweep_flag = true;
            self.end_of_sweep_pending = false;
        }
        if self.end_of_volume_pending && self.end_of_volume_seq < first_pulse_seq {
            self.end_of_volume_flag = true;
            self.end_of_volume_pending = false;
        }
    }

    /// Keep twice the current dwell on the queue, recycle the rest.
    fn recycle_pulses(&mut self) {
        self.queue
            .recycle_excess(self.n_samples * 2, &self.pulse_pool);
    }

    fn compute_min_n_gates(&self) -> usize {
        let limit = self.n_samples.min(self.queue.len());
        (0..limit)
            .map(|index| self.queue.get(index).n_gates)
            .min()
            .unwrap_or(0)
    }
}
