pub mod config;
pub mod error;
pub mod experiment;
pub mod intake;
pub mod list;
pub mod recorder;
pub mod runner;
pub mod storage;
pub mod surface;
pub mod task;

pub use config::{ConditionConfig, ExperimentConfig, KeyConfig, TaskKind, TimingConfig};
pub use error::{ExperimentError, Result};
pub use experiment::{RunOutcome, RunReport, run_configured, run_experiment};
pub use intake::{
    FieldKind, IntakeForm, IntakeOutcome, IntakePrompt, ParticipantInfo, PromptField, Question,
    RunMetadata, collect_participant_info,
};
pub use list::{StimulusListBuilder, flip_count};
pub use recorder::{ConditionSummary, ResponseRecorder, Summary};
pub use runner::{RunnerTiming, TrialRunner, feedback_message};
pub use storage::{CsvStore, ExperimentFiles, ResponseSink};
pub use surface::{Frame, Surface, SurfaceError};
pub use task::{ImageSorting, Task, WordRecognition};
