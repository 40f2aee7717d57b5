use anyhow::Context;
use beamcore::processing::BeamReader;
use log::info;
use beamcore::pulse::{ChannelPulseSource, PulseSource, SourceInfo, VecPulseSource};
use beamcore::telemetry::MetricsSnapshot;
use serde::Serialize;
use std::thread;

use crate::generator::profile::build_pulse_stream;
use crate::workflow::config::WorkflowConfig;

/// One emitted beam, flattened for the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct BeamSummary {
    pub pointing_deg: f64,
    pub n_samples: usize,
    pub n_samples_rect: usize,
    pub n_gates: usize,
    pub prt: f64,
    pub is_indexed: bool,
    pub is_staggered_prt: bool,
    pub antenna_rate_deg_per_sec: f64,
}

pub struct WorkflowResult {
    pub beams: usize,
    pub total_samples: usize,
    pub sweep_ends: usize,
    pub volume_ends: usize,
    pub metrics: MetricsSnapshot,
    pub summaries: Vec<BeamSummary>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Drain a prebuilt synthetic stream through the engine.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let pulses = build_pulse_stream(&self.config.stream);
        let source = VecPulseSource::new(pulses, SourceInfo::default());
        self.drain(Box::new(source))
    }

    /// Feed the engine from a producer thread through the bounded pulse
    /// channel, the way a live ingest would.
    pub fn execute_streaming(&self) -> anyhow::Result<WorkflowResult> {
        let (sender, source) = ChannelPulseSource::channel(256, SourceInfo::default());
        let pulses = build_pulse_stream(&self.config.stream);
        let feeder = thread::spawn(move || {
            for pulse in pulses {
                if sender.send(pulse).is_err() {
                    break;
                }
            }
            // dropping the sender signals end of data
        });

        let result = self.drain(Box::new(source));
        feeder
            .join()
            .map_err(|_| anyhow::anyhow!("pulse feeder thread panicked"))?;
        result
    }

    fn drain(&self, source: Box<dyn PulseSource>) -> anyhow::Result<WorkflowResult> {
        let mut reader = BeamReader::new(
            source,
            self.config.reader.clone(),
            self.config.managers.clone(),
        )
        .context("constructing beam reader")?;

        let beam_pool = reader.beam_pool();
        let pulse_pool = reader.pulse_pool();

        let mut summaries = Vec::new();
        let mut total_samples = 0;
        let mut sweep_ends = 0;
        let mut volume_ends = 0;

        while let Some(beam) = reader.get_next_beam() {
            total_samples += beam.n_samples();
            if beam.end_of_sweep() {
                sweep_ends += 1;
            }
            if beam.end_of_volume() {
                volume_ends += 1;
            }
            summaries.push(BeamSummary {
                pointing_deg: beam.pointing_angle_deg(),
                n_samples: beam.n_samples(),
                n_samples_rect: beam.n_samples_rect(),
                n_gates: beam.n_gates(),
                prt: beam.prt(),
                is_indexed: beam.is_indexed(),
                is_staggered_prt: beam.is_staggered_prt(),
                antenna_rate_deg_per_sec: beam.antenna_rate_deg_per_sec(),
            });
            // hand the beam back so its pulse storage is recycled
            beam_pool.release(beam, &pulse_pool);
        }

        info!(
            "stream drained: {} beams, {} samples",
            summaries.len(),
            total_samples
        );

        Ok(WorkflowResult {
            beams: summaries.len(),
            total_samples,
            sweep_ends,
            volume_ends,
            metrics: reader.metrics().snapshot(),
            summaries,
        })
    }
}
