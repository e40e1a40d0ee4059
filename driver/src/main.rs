use anyhow::Context;
use clap::Parser;
use generator::profile::{prepare_synthetic_batch, GeneratorConfig};
use pirep::row::load_rows;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod pirep;
mod sources;
mod workflow;
mod writer;

#[derive(Parser)]
#[command(author, version, about = "Grids NEXRAD gates around each PIREP and writes model inputs")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// JSON array of PIREP rows with their matched radar files
    #[arg(long, required_unless_present = "synthetic")]
    rows: Option<PathBuf>,
    /// Directory the grid files are written to
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    workers: Option<usize>,
    /// JSON NEXRAD site table for scan matching and longitude repair
    #[arg(long)]
    sites: Option<PathBuf>,
    /// Level-II archive searched for rows without radar files
    #[arg(long)]
    archive: Option<PathBuf>,
    /// Generate a synthetic scan and reports under this directory instead of reading rows
    #[arg(long)]
    synthetic: Option<PathBuf>,
    #[arg(long, default_value_t = 16)]
    synthetic_reports: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(args.output.clone(), args.workers);
    if args.sites.is_some() {
        workflow_config.sites = args.sites.clone();
    }
    if args.archive.is_some() {
        workflow_config.archive = args.archive.clone();
    }

    let rows = match (&args.synthetic, &args.rows) {
        (Some(dir), _) => {
            let generator = GeneratorConfig {
                reports: args.synthetic_reports,
                seed: args.seed,
                ..GeneratorConfig::default()
            };
            prepare_synthetic_batch(&generator, dir)
                .with_context(|| format!("preparing synthetic batch in {}", dir.display()))?
        }
        (None, Some(path)) => load_rows(path)?,
        (None, None) => anyhow::bail!("either --rows or --synthetic is required"),
    };

    let runner = Runner::from_config(workflow_config)?;
    let summary = runner.run_batch(rows)?;

    println!(
        "Batch run -> rows {}, written {}, no data {}, failed {}, scan cache {} hits / {} misses, output {}",
        summary.metrics.processed(),
        summary.metrics.written,
        summary.metrics.no_data,
        summary.metrics.failed,
        summary.cache_hits,
        summary.cache_misses,
        runner.config().output_dir.display()
    );

    Ok(())
}
