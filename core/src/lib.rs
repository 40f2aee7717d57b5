//! Pulse-to-beam aggregation core for the Rust time-series radar platform.
//!
//! The modules mirror the legacy time-series ingest pipeline while providing
//! safe abstractions, pooled pulse storage, and well-defined dwell-formation
//! stages. The central entry point is [`processing::BeamReader`], which pulls
//! pulses from a [`pulse::PulseSource`] and assembles them into immutable
//! [`beam::Beam`] values ready for moment computation downstream.

pub mod beam;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod pulse;
pub mod telemetry;

pub use beam::{Beam, BeamPool};
pub use num_complex::Complex32;
pub use prelude::{ReaderConfig, ReaderError, ScanMode, ScanType, WindowType};
pub use processing::{BeamMethod, BeamReader, ModeManager};
pub use pulse::{Pulse, PulsePool, PulseSource};
