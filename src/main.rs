mod console;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cogex_experiment::{
    run_configured, CsvStore, ExperimentConfig, ExperimentFiles, RunOutcome, TaskKind,
};
use cogex_timing::HighPrecisionTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser)]
#[command(name = "cogex")]
#[command(about = "Run an image sorting or word recognition experiment in the terminal")]
struct Cli {
    /// TOML experiment configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in experiment to run when no configuration is given
    #[arg(long, value_enum)]
    task: Option<TaskArg>,

    /// Experiment directory holding `input/` and `data/`
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Seed for stimulus order, for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Give up waiting for a response after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TaskArg {
    ImageSorting,
    WordRecognition,
}

impl From<TaskArg> for TaskKind {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::ImageSorting => TaskKind::ImageSorting,
            TaskArg::WordRecognition => TaskKind::WordRecognition,
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ExperimentConfig::for_task(cli.task.map_or(TaskKind::ImageSorting, Into::into)),
    };
    if let Some(dir) = cli.dir {
        config.experiment_dir = dir;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.timeout_ms.is_some() {
        config.response_timeout_ms = cli.timeout_ms;
    }
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let files = ExperimentFiles::new(&config.experiment_dir);
    let mut sink = CsvStore::new(files.data_dir(), config.summary_file.as_str());
    let (mut surface, mut form) = console::open();

    info!(
        task = ?config.task,
        dir = %config.experiment_dir.display(),
        seed = ?config.seed,
        "starting experiment"
    );
    let outcome = run_configured(
        &config,
        &mut surface,
        &mut form,
        &mut sink,
        HighPrecisionTimer::new(),
        &mut rng,
    )
    .with_context(|| format!("running {}", config.experiment_name))?;

    match outcome {
        RunOutcome::Completed(report) => {
            let overall = &report.summary.overall;
            println!("Experiment Results:");
            println!("Trials: {}, Correct: {}", overall.trials, overall.correct);
            if let (Some(mean), Some(min), Some(max)) = (overall.mean_rt, overall.min_rt, overall.max_rt)
            {
                println!("Reaction times: mean {mean:.3} s, min {min:.3} s, max {max:.3} s");
            }
            println!("Results saved to {}", report.responses.display());
        }
        RunOutcome::Cancelled => println!("Experiment cancelled."),
    }
    Ok(())
}
