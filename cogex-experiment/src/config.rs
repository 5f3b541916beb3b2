use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cogex_core::{ConditionFlags, ConditionId, ImageCondition, Key, WordCondition};
use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::runner::RunnerTiming;
use crate::task::{ImageSorting, WordRecognition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ImageSorting,
    WordRecognition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub task: TaskKind,
    pub experiment_name: String,
    /// Tool version tag stored with the participant info.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_experiment_dir")]
    pub experiment_dir: PathBuf,
    pub catalog: String,
    #[serde(default = "default_questions")]
    pub questions: String,
    #[serde(default = "default_intake_title")]
    pub intake_title: String,
    #[serde(default = "default_outro")]
    pub outro: String,
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
    #[serde(default = "default_participant_id_field")]
    pub participant_id_field: String,
    /// Fixes the random source; unset draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub keys: KeyConfig,
    pub conditions: Vec<ConditionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub word_exposure_ms: u64,
    pub feedback_settle_ms: u64,
    pub image_size_px: i32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            word_exposure_ms: 200,
            feedback_settle_ms: 300,
            image_size_px: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub non_word: String,
    pub word: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            non_word: "n".into(),
            word: "r".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub id: u32,
    pub instructions: String,
    #[serde(default)]
    pub repeats: bool,
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub feedback: bool,
    #[serde(default = "default_true")]
    pub shuffle: bool,
}

impl ConditionConfig {
    pub fn flags(&self) -> ConditionFlags {
        ConditionFlags {
            repeats: self.repeats,
            flip: self.flip,
            feedback: self.feedback,
            shuffle: self.shuffle,
        }
    }
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn default_experiment_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_questions() -> String {
    "participant-info-questions.csv".into()
}
fn default_intake_title() -> String {
    "Participant Information".into()
}
fn default_outro() -> String {
    "outro.txt".into()
}
fn default_summary_file() -> String {
    "participants-summary.csv".into()
}
fn default_participant_id_field() -> String {
    "Participant ID:".into()
}
fn default_true() -> bool {
    true
}

impl ExperimentConfig {
    /// Three image conditions: animals left, objects left (both with repeats
    /// and feedback), then the inversion swap on a half-flipped list.
    pub fn image_sorting() -> Self {
        let condition = |id: u32, repeats: bool, flip: bool, feedback: bool| ConditionConfig {
            id,
            instructions: format!("instructions-condition-{id}.txt"),
            repeats,
            flip,
            feedback,
            shuffle: true,
        };
        Self {
            task: TaskKind::ImageSorting,
            experiment_name: "Image Sorting".into(),
            catalog: "stimuli-info.csv".into(),
            conditions: vec![
                condition(1, true, false, true),
                condition(2, true, false, true),
                condition(3, false, true, false),
            ],
            ..Self::base()
        }
    }

    /// One shuffled lexical-decision block.
    pub fn word_recognition() -> Self {
        Self {
            task: TaskKind::WordRecognition,
            experiment_name: "Word recognition".into(),
            catalog: "stimuli.csv".into(),
            conditions: vec![ConditionConfig {
                id: 1,
                instructions: "instructions.txt".into(),
                repeats: false,
                flip: false,
                feedback: false,
                shuffle: true,
            }],
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            task: TaskKind::ImageSorting,
            experiment_name: String::new(),
            version: default_version(),
            experiment_dir: default_experiment_dir(),
            catalog: String::new(),
            questions: default_questions(),
            intake_title: default_intake_title(),
            outro: default_outro(),
            summary_file: default_summary_file(),
            participant_id_field: default_participant_id_field(),
            seed: None,
            response_timeout_ms: None,
            timing: TimingConfig::default(),
            keys: KeyConfig::default(),
            conditions: Vec::new(),
        }
    }

    pub fn for_task(task: TaskKind) -> Self {
        match task {
            TaskKind::ImageSorting => Self::image_sorting(),
            TaskKind::WordRecognition => Self::word_recognition(),
        }
    }

    /// Reads and validates a TOML configuration file. A relative
    /// `experiment_dir` is taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ExperimentError::MissingResource {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let mut config = Self::parse_str(&contents).map_err(|err| match err {
            ExperimentError::Config(message) => {
                ExperimentError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        if config.experiment_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.experiment_dir = parent.join(&config.experiment_dir);
            }
        }
        Ok(config)
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|err| ExperimentError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(ExperimentError::Config(
                "at least one condition is required".into(),
            ));
        }
        if self.catalog.trim().is_empty() {
            return Err(ExperimentError::Config("catalog must be non-empty".into()));
        }
        let mut seen = HashSet::new();
        for condition in &self.conditions {
            if !seen.insert(condition.id) {
                return Err(ExperimentError::Config(format!(
                    "duplicate condition id {}",
                    condition.id
                )));
            }
        }
        match self.task {
            TaskKind::ImageSorting => {
                self.conditions_for::<ImageCondition>()?;
            }
            TaskKind::WordRecognition => {
                self.conditions_for::<WordCondition>()?;
            }
        }
        if self.keys.non_word.trim().is_empty() || self.keys.word.trim().is_empty() {
            return Err(ExperimentError::Config("response keys must be non-empty".into()));
        }
        if Key::new(&self.keys.non_word) == Key::new(&self.keys.word) {
            return Err(ExperimentError::Config(
                "non-word and word keys must differ".into(),
            ));
        }
        Ok(())
    }

    /// Conditions in play order, with ids checked against the task's domain.
    pub fn conditions_for<K: ConditionId>(&self) -> Result<Vec<(K, ConditionFlags, &str)>> {
        self.conditions
            .iter()
            .map(|c| {
                let id =
                    K::try_from(c.id).map_err(|err| ExperimentError::Config(err.to_string()))?;
                Ok((id, c.flags(), c.instructions.as_str()))
            })
            .collect()
    }

    pub fn runner_timing(&self) -> RunnerTiming {
        RunnerTiming {
            feedback_settle: Duration::from_millis(self.timing.feedback_settle_ms),
            response_timeout: self.response_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn image_task(&self) -> ImageSorting {
        ImageSorting::new(self.timing.image_size_px)
    }

    pub fn word_task(&self) -> WordRecognition {
        WordRecognition::new(
            Key::new(&self.keys.non_word),
            Key::new(&self.keys.word),
            Duration::from_millis(self.timing.word_exposure_ms),
        )
    }
}
