//! Whole sessions run headless against scripted input.

use std::fs;
use std::path::Path;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use cogex_experiment::intake::ScriptedForm;
use cogex_experiment::surface::{ScriptedSurface, Shown};
use cogex_experiment::{
    CsvStore, ExperimentConfig, ExperimentError, RunOutcome, RunReport, SurfaceError,
    run_configured,
};
use cogex_timing::ManualTimer;

const QUESTIONS: &str = "question,required,kind,value\n\
Participant ID:,True,text_field,\n\
Handedness:,False,single_choice,right;left\n";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn write_inputs(root: &Path, files: &[(&str, &str)]) {
    let input = root.join("input");
    fs::create_dir_all(&input).unwrap();
    for (name, contents) in files {
        fs::write(input.join(name), contents).unwrap();
    }
}

fn image_experiment() -> (TempDir, ExperimentConfig) {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        &[
            ("stimuli-info.csv", "filename,content\ncat.png,animal\nchair.png,object\n"),
            ("participant-info-questions.csv", QUESTIONS),
            ("instructions-condition-1.txt", "Animals left."),
            ("instructions-condition-2.txt", "Objects left."),
            ("instructions-condition-3.txt", "Watch the orientation."),
            ("outro.txt", "Thank you!"),
        ],
    );
    let config = ExperimentConfig {
        experiment_dir: dir.path().to_path_buf(),
        seed: Some(9),
        ..ExperimentConfig::image_sorting()
    };
    (dir, config)
}

fn word_experiment() -> (TempDir, ExperimentConfig) {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(
        dir.path(),
        &[
            ("stimuli.csv", "word,category\nhouse,real\nblork,non-word\n"),
            ("participant-info-questions.csv", QUESTIONS),
            ("instructions.txt", "Press r for words, n otherwise."),
            ("outro.txt", "Thank you!"),
        ],
    );
    let config = ExperimentConfig {
        experiment_dir: dir.path().to_path_buf(),
        seed: Some(4),
        ..ExperimentConfig::word_recognition()
    };
    (dir, config)
}

fn run(
    config: &ExperimentConfig,
    surface: &mut ScriptedSurface,
    form: &mut ScriptedForm,
) -> Result<RunOutcome, ExperimentError> {
    let mut sink = CsvStore::new(
        config.experiment_dir.join("data"),
        config.summary_file.as_str(),
    );
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
    let timer = surface.clock.clone();
    run_configured(config, surface, form, &mut sink, timer, &mut rng)
}

fn completed(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Completed(report) => report,
        RunOutcome::Cancelled => panic!("session was cancelled"),
    }
}

#[test]
fn image_sorting_session_writes_all_outputs() {
    let (dir, config) = image_experiment();
    let clock = ManualTimer::new();
    let mut surface = ScriptedSurface::new(clock.clone())
        .press("space", ms(3_000))
        .press_many(&["left"; 4], ms(400))
        .press("space", ms(3_000))
        .press_many(&["right"; 4], ms(400))
        .press("space", ms(3_000))
        .press_many(&["left"; 2], ms(400))
        .press("space", ms(1_000));
    let mut form = ScriptedForm::default().answer(&["p01", "left"]);

    let report = completed(run(&config, &mut surface, &mut form).unwrap());

    assert_eq!(report.participant_id, "p01");
    assert_eq!(report.trials, 10);
    assert_eq!(report.summary.overall.trials, 10);
    assert_eq!(report.summary.conditions.len(), 3);
    assert!(report.responses.starts_with(dir.path().join("data")));

    let responses = fs::read_to_string(&report.responses).unwrap();
    let lines: Vec<&str> = responses.lines().collect();
    assert_eq!(
        lines[0],
        "stimulus_name,result,reaction_time,condition,content,upside_down,pres_time"
    );
    assert_eq!(lines.len(), 11);
    let conditions: Vec<&str> = lines[1..]
        .iter()
        .map(|line| line.split(',').nth(3).unwrap())
        .collect();
    assert_eq!(conditions, ["1", "1", "1", "1", "2", "2", "2", "2", "3", "3"]);
    // feedback only in the first two conditions
    let feedback = surface
        .texts()
        .iter()
        .filter(|text| text.contains("Reaction Time: 0.400"))
        .count();
    assert_eq!(feedback, 8);
    let inverted = surface
        .shown
        .iter()
        .filter(|shown| matches!(shown, Shown::Image { inverted: true, .. }))
        .count();
    assert_eq!(inverted, 1);
    assert_eq!(surface.texts().last(), Some(&"Thank you!"));

    let participants =
        fs::read_to_string(dir.path().join("data").join("participants-summary.csv")).unwrap();
    let mut rows = participants.lines();
    assert_eq!(
        rows.next(),
        Some("Participant ID:,Handedness:,date,experiment_name,psychopyVersion")
    );
    assert!(rows.next().unwrap().starts_with("p01,left,"));
    assert!(report.summary_file.is_file());
}

#[test]
fn word_recognition_session_records_duration() {
    let (dir, mut config) = word_experiment();
    config.conditions[0].shuffle = false;
    let clock = ManualTimer::new();
    let mut surface = ScriptedSurface::new(clock.clone())
        .press("space", ms(2_000))
        .press_many(&["r", "n"], ms(500))
        .press("space", ms(1_000));
    let mut form = ScriptedForm::default().answer(&["p02", "right"]);

    let report = completed(run(&config, &mut surface, &mut form).unwrap());
    assert_eq!(report.trials, 2);

    let responses = fs::read_to_string(&report.responses).unwrap();
    let lines: Vec<&str> = responses.lines().collect();
    assert_eq!(
        lines,
        [
            "word,condition,result,reaction_time",
            "house,real,correct,0.5",
            "blork,non-word,correct,0.5",
        ]
    );
    assert_eq!(report.summary.overall.correct, 2);

    let participants =
        fs::read_to_string(dir.path().join("data").join("participants-summary.csv")).unwrap();
    let mut rows = participants.lines();
    let header: Vec<&str> = rows.next().unwrap().split(',').collect();
    assert_eq!(header.last(), Some(&"duration"));
    let duration: f64 = rows
        .next()
        .unwrap()
        .rsplit(',')
        .next()
        .unwrap()
        .parse()
        .unwrap();
    // two trials of 200 ms exposure plus 500 ms response
    assert!((duration - 1.4).abs() < 1e-9);
}

#[test]
fn interrupted_outro_still_completes() {
    let (dir, config) = word_experiment();
    let mut surface = ScriptedSurface::new(ManualTimer::new())
        .press("space", ms(2_000))
        .press_many(&["r", "n"], ms(500));
    let mut form = ScriptedForm::default().answer(&["p04", "left"]);

    let report = completed(run(&config, &mut surface, &mut form).unwrap());

    assert_eq!(report.trials, 2);
    assert!(report.responses.is_file());
    assert!(report.summary_file.is_file());
    assert!(dir.path().join("data").join("participants-summary.csv").is_file());
    assert_eq!(surface.texts().last(), Some(&"Thank you!"));
}

#[test]
fn cancelled_intake_writes_nothing() {
    let (dir, config) = word_experiment();
    let mut surface = ScriptedSurface::new(ManualTimer::new());
    let mut form = ScriptedForm::default().cancel();

    let outcome = run(&config, &mut surface, &mut form).unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(surface.shown.is_empty());
    let data = dir.path().join("data");
    assert_eq!(fs::read_dir(data).unwrap().count(), 0);
}

#[test]
fn missing_catalog_fails_before_intake() {
    let (dir, config) = image_experiment();
    fs::remove_file(dir.path().join("input").join("stimuli-info.csv")).unwrap();
    let mut surface = ScriptedSurface::new(ManualTimer::new());
    let mut form = ScriptedForm::default().answer(&["p01", "left"]);

    let err = run(&config, &mut surface, &mut form).unwrap_err();

    match err {
        ExperimentError::MissingResource { path } => {
            assert!(path.ends_with("input/stimuli-info.csv"));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(form.prompts.is_empty());
}

#[test]
fn closed_surface_aborts_without_saving() {
    let (dir, config) = word_experiment();
    let mut surface = ScriptedSurface::new(ManualTimer::new())
        .press("space", ms(100))
        .press("r", ms(300));
    let mut form = ScriptedForm::default().answer(&["p03", "left"]);

    let err = run(&config, &mut surface, &mut form).unwrap_err();

    assert!(matches!(
        err,
        ExperimentError::Surface(SurfaceError::Closed)
    ));
    let data = dir.path().join("data");
    assert_eq!(fs::read_dir(data).unwrap().count(), 0);
}

#[test]
fn config_file_round_trips_through_toml() {
    let (dir, config) = word_experiment();
    let path = dir.path().join("experiment.toml");
    fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

    let loaded = ExperimentConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let missing = ExperimentConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, ExperimentError::MissingResource { .. }));
}
