use std::path::PathBuf;
use std::time::Duration;

use cogex_timing::{Stopwatch, Timer};
use rand::Rng;
use tracing::{info, warn};

use crate::config::{ExperimentConfig, TaskKind};
use crate::error::Result;
use crate::intake::{IntakeForm, IntakeOutcome, RunMetadata, collect_participant_info};
use crate::list::StimulusListBuilder;
use crate::recorder::{ResponseRecorder, Summary};
use crate::runner::TrialRunner;
use crate::storage::{ExperimentFiles, ResponseSink};
use crate::surface::Surface;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub participant_id: String,
    pub trials: usize,
    pub responses: PathBuf,
    pub summary_file: PathBuf,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The participant cancelled intake; nothing was played or written.
    Cancelled,
}

/// Runs a whole session of `task`: builds every condition, collects the
/// participant info, plays the conditions in configured order, then saves
/// the responses and shows the outro.
///
/// All input files are read before the participant sees anything, so a
/// missing resource aborts the run before any output exists. Once the output
/// is saved the run counts as completed, even if the outro is cut short.
pub fn run_experiment<Tk, S, F, W, T, R>(
    task: &Tk,
    config: &ExperimentConfig,
    surface: &mut S,
    form: &mut F,
    sink: &mut W,
    timer: T,
    rng: &mut R,
) -> Result<RunOutcome>
where
    Tk: Task,
    S: Surface + ?Sized,
    F: IntakeForm + ?Sized,
    W: ResponseSink + ?Sized,
    T: Timer,
    R: Rng + ?Sized,
{
    let files = ExperimentFiles::new(&config.experiment_dir);
    files.ensure_data_dir()?;

    let catalog = files.load_catalog(task, &config.catalog)?;
    let builder = StimulusListBuilder::new(task, &catalog);
    let mut conditions = Vec::with_capacity(config.conditions.len());
    for (id, flags, instructions) in config.conditions_for::<Tk::Condition>()? {
        let instructions = files.load_text(instructions)?;
        conditions.push((builder.build(id, flags, rng), instructions));
    }
    let outro = files.load_text(&config.outro)?;
    let questions = files.load_questions(&config.questions)?;

    let metadata = RunMetadata::now(&config.experiment_name, &config.version);
    let mut participant =
        match collect_participant_info(form, &config.intake_title, &questions, &metadata)? {
            IntakeOutcome::Completed(participant) => participant,
            IntakeOutcome::Cancelled => return Ok(RunOutcome::Cancelled),
        };

    info!(
        task = task.name(),
        conditions = conditions.len(),
        catalog = catalog.len(),
        "session started"
    );

    let mut recorder = ResponseRecorder::new();
    let mut runner = TrialRunner::new(surface, timer.clone(), config.runner_timing());
    let mut played = Duration::ZERO;
    for (condition, instructions) in &conditions {
        runner.instruct(instructions)?;
        let clock = Stopwatch::start(timer.clone());
        let records = runner.play(task, condition)?;
        played += clock.elapsed();
        recorder.commit(records);
    }
    if task.tracks_duration() {
        participant.insert("duration", played.as_secs_f64().to_string());
    }

    let participant_id = file_safe(
        participant
            .get(&config.participant_id_field)
            .unwrap_or("anonymous"),
    );
    let rows: Vec<Vec<String>> = recorder
        .records()
        .iter()
        .map(|record| task.output_row(record))
        .collect();
    let responses =
        sink.save_responses(&participant_id, &metadata.date, task.output_header(), &rows)?;
    let summary = recorder.summary();
    let summary_file = sink.save_summary(&participant_id, &metadata.date, &summary)?;
    sink.append_participant(&participant)?;

    info!(
        participant = %participant_id,
        trials = recorder.len(),
        accuracy = ?summary.overall.accuracy,
        mean_rt = ?summary.overall.mean_rt,
        "session finished"
    );

    if let Err(err) = runner.instruct(&outro) {
        warn!(error = %err, "outro interrupted; output was already saved");
    }

    Ok(RunOutcome::Completed(RunReport {
        participant_id,
        trials: recorder.len(),
        responses,
        summary_file,
        summary,
    }))
}

/// Picks the task named by `config.task` and runs it.
pub fn run_configured<S, F, W, T, R>(
    config: &ExperimentConfig,
    surface: &mut S,
    form: &mut F,
    sink: &mut W,
    timer: T,
    rng: &mut R,
) -> Result<RunOutcome>
where
    S: Surface + ?Sized,
    F: IntakeForm + ?Sized,
    W: ResponseSink + ?Sized,
    T: Timer,
    R: Rng + ?Sized,
{
    match config.task {
        TaskKind::ImageSorting => {
            run_experiment(&config.image_task(), config, surface, form, sink, timer, rng)
        }
        TaskKind::WordRecognition => {
            run_experiment(&config.word_task(), config, surface, form, sink, timer, rng)
        }
    }
}

/// Participant ids end up in file names.
fn file_safe(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
