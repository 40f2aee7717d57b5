use anyhow::Context;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Beam-formation workflow driver")]
struct Args {
    /// Feed the engine from a producer thread through the pulse channel
    /// instead of draining a prebuilt stream
    #[arg(long, default_value_t = false)]
    stream: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Append a JSON summary line under tools/data/
    #[arg(long, default_value_t = false)]
    report: bool,
    #[arg(long, default_value_t = 10_000)]
    pulses: u64,
    #[arg(long, default_value_t = 1000.0)]
    prf: f64,
    #[arg(long, default_value_t = 64)]
    samples: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.pulses, args.prf, args.samples)
    };

    let runner = Runner::new(workflow_config);

    let result = if args.stream {
        runner.execute_streaming()?
    } else {
        runner.execute()?
    };

    println!(
        "Run -> beams {}, samples {}, sweep ends {}, volume ends {}, \
         dwells discarded {}, pulses dropped {}",
        result.beams,
        result.total_samples,
        result.sweep_ends,
        result.volume_ends,
        result.metrics.dwells_discarded,
        result.metrics.pulses_dropped_no_manager
    );

    if args.report {
        let report = serde_json::json!({
            "beams": result.beams,
            "total_samples": result.total_samples,
            "sweep_ends": result.sweep_ends,
            "volume_ends": result.volume_ends,
            "metrics": result.metrics,
        });
        let report_path = PathBuf::from("tools/data/beam_summary.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        writeln!(file, "{}", report)?;
    }

    Ok(())
}
