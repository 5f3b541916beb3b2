//! Participant intake: the questions asked before any condition starts.

use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::surface::SurfaceError;

const WELCOME: &str = "Thank you for participating in our experiment.\n\n\
Please fill the form below!\n\
Make sure you answered every required question (they are marked with \"[*]\")!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    TextField { default: String },
    SingleChoice { choices: Vec<String> },
}

impl FieldKind {
    /// Parses the `field-kind` and `default-or-choices` columns.
    pub fn parse(kind: &str, value: &str) -> std::result::Result<Self, String> {
        match kind.trim() {
            "text_field" => Ok(FieldKind::TextField {
                default: value.to_string(),
            }),
            "single_choice" => Ok(FieldKind::SingleChoice {
                choices: value.split(';').map(|c| c.trim().to_string()).collect(),
            }),
            other => Err(format!("unknown field kind {other:?}")),
        }
    }

    fn initial(&self) -> &str {
        match self {
            FieldKind::TextField { default } => default,
            FieldKind::SingleChoice { choices } => choices.first().map_or("", String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
}

/// Answers keyed by question label, plus run metadata, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantInfo {
    entries: Vec<(String, String)>,
}

impl ParticipantInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key`, keeping its original position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Run metadata stored next to the answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub date: String,
    pub experiment_name: String,
    pub version: String,
}

impl RunMetadata {
    pub const DATE_FORMAT: &'static str = "%Y_%b_%d_%H%M";

    pub fn now(experiment_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            date: Local::now().format(Self::DATE_FORMAT).to_string(),
            experiment_name: experiment_name.into(),
            version: version.into(),
        }
    }

    fn apply(&self, info: &mut ParticipantInfo) {
        info.insert("date", self.date.as_str());
        info.insert("experiment_name", self.experiment_name.as_str());
        info.insert("psychopyVersion", self.version.as_str());
    }
}

/// One field of the intake form, as handed to the form implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptField<'a> {
    /// Question label, suffixed with `[*]` when required.
    pub label: String,
    pub kind: &'a FieldKind,
    /// Previous answer, or the field's default on the first showing.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePrompt<'a> {
    pub title: &'a str,
    pub message: String,
    pub fields: Vec<PromptField<'a>>,
}

/// Modal form collecting participant answers.
pub trait IntakeForm {
    /// Shows the form and returns one answer per field, in field order.
    /// `None` means the participant cancelled.
    fn ask(
        &mut self,
        prompt: &IntakePrompt<'_>,
    ) -> std::result::Result<Option<Vec<String>>, SurfaceError>;
}

impl<F: IntakeForm + ?Sized> IntakeForm for &mut F {
    fn ask(
        &mut self,
        prompt: &IntakePrompt<'_>,
    ) -> std::result::Result<Option<Vec<String>>, SurfaceError> {
        (**self).ask(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Completed(ParticipantInfo),
    Cancelled,
}

/// Intake progress across re-prompts.
#[derive(Debug, Default)]
struct IntakeState {
    info: ParticipantInfo,
    missing: Option<String>,
}

impl IntakeState {
    fn prompt<'a>(&self, title: &'a str, questions: &'a [Question]) -> IntakePrompt<'a> {
        let message = match &self.missing {
            Some(label) => format!("Please make sure you answered this question: \"{label}\""),
            None => WELCOME.to_string(),
        };
        let fields = questions
            .iter()
            .map(|question| PromptField {
                label: if question.required {
                    format!("{}[*]", question.label)
                } else {
                    question.label.clone()
                },
                kind: &question.kind,
                value: self
                    .info
                    .get(&question.label)
                    .unwrap_or_else(|| question.kind.initial())
                    .to_string(),
            })
            .collect();
        IntakePrompt {
            title,
            message,
            fields,
        }
    }

    /// Stores the answers and remembers the first required one left blank.
    fn accept(&mut self, questions: &[Question], answers: Vec<String>) {
        self.missing = None;
        let mut answers = answers.into_iter();
        for question in questions {
            let answer = answers.next().unwrap_or_default();
            if question.required && answer.trim().is_empty() {
                if self.missing.is_none() {
                    self.missing = Some(question.label.clone());
                }
                continue;
            }
            self.info.insert(question.label.as_str(), answer);
        }
    }
}

/// Asks the intake questions until every required one is answered.
pub fn collect_participant_info<F: IntakeForm + ?Sized>(
    form: &mut F,
    title: &str,
    questions: &[Question],
    metadata: &RunMetadata,
) -> Result<IntakeOutcome> {
    let mut state = IntakeState::default();
    loop {
        let prompt = state.prompt(title, questions);
        let Some(answers) = form.ask(&prompt)? else {
            info!("participant cancelled the intake form");
            return Ok(IntakeOutcome::Cancelled);
        };
        state.accept(questions, answers);
        match &state.missing {
            Some(label) => warn!(question = %label, "required question left blank, asking again"),
            None => break,
        }
    }

    // Answers given across re-prompts arrive out of order.
    let mut info = ParticipantInfo::default();
    for question in questions {
        info.insert(
            question.label.as_str(),
            state.info.get(&question.label).unwrap_or_default(),
        );
    }
    metadata.apply(&mut info);
    Ok(IntakeOutcome::Completed(info))
}

#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedForm;

#[cfg(any(test, feature = "test-support"))]
mod scripted {
    use std::collections::VecDeque;

    use super::{IntakeForm, IntakePrompt};
    use crate::surface::SurfaceError;

    /// Replays canned answers; `None` entries cancel. Keeps every prompt shown.
    #[derive(Debug, Default)]
    pub struct ScriptedForm {
        pub replies: VecDeque<Option<Vec<String>>>,
        pub prompts: Vec<(String, Vec<(String, String)>)>,
    }

    impl ScriptedForm {
        pub fn answer(mut self, answers: &[&str]) -> Self {
            self.replies
                .push_back(Some(answers.iter().map(|a| a.to_string()).collect()));
            self
        }

        pub fn cancel(mut self) -> Self {
            self.replies.push_back(None);
            self
        }
    }

    impl IntakeForm for ScriptedForm {
        fn ask(
            &mut self,
            prompt: &IntakePrompt<'_>,
        ) -> Result<Option<Vec<String>>, SurfaceError> {
            self.prompts.push((
                prompt.message.clone(),
                prompt
                    .fields
                    .iter()
                    .map(|f| (f.label.clone(), f.value.clone()))
                    .collect(),
            ));
            self.replies.pop_front().ok_or(SurfaceError::Closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<Question> {
        vec![
            Question {
                label: "Participant ID:".into(),
                required: true,
                kind: FieldKind::TextField {
                    default: String::new(),
                },
            },
            Question {
                label: "Age:".into(),
                required: false,
                kind: FieldKind::TextField {
                    default: "18".into(),
                },
            },
            Question {
                label: "Handedness:".into(),
                required: true,
                kind: FieldKind::parse("single_choice", "right;left").unwrap(),
            },
        ]
    }

    const TITLE: &str = "Participant Information";

    fn metadata() -> RunMetadata {
        RunMetadata {
            date: "2026_Oct_18_1200".into(),
            experiment_name: "Image Sorting".into(),
            version: "2020.2.10".into(),
        }
    }

    #[test]
    fn completes_with_answers_and_metadata() {
        let mut form = ScriptedForm::default().answer(&["p01", "23", "left"]);
        let outcome = collect_participant_info(&mut form, TITLE, &questions(), &metadata()).unwrap();

        let IntakeOutcome::Completed(info) = outcome else {
            panic!("intake was cancelled");
        };
        let keys: Vec<_> = info.keys().collect();
        assert_eq!(
            keys,
            [
                "Participant ID:",
                "Age:",
                "Handedness:",
                "date",
                "experiment_name",
                "psychopyVersion"
            ]
        );
        assert_eq!(info.get("Participant ID:"), Some("p01"));
        assert_eq!(info.get("psychopyVersion"), Some("2020.2.10"));

        let (_, fields) = &form.prompts[0];
        assert_eq!(fields[0], ("Participant ID:[*]".to_string(), String::new()));
        assert_eq!(fields[1], ("Age:".to_string(), "18".to_string()));
        assert_eq!(fields[2], ("Handedness:[*]".to_string(), "right".to_string()));
    }

    #[test]
    fn blank_required_answer_asks_again_keeping_answers() {
        let mut form = ScriptedForm::default()
            .answer(&["", "30", "left"])
            .answer(&["p02", "30", "left"]);
        let outcome = collect_participant_info(&mut form, TITLE, &questions(), &metadata()).unwrap();

        assert_eq!(form.prompts.len(), 2);
        let (message, fields) = &form.prompts[1];
        assert!(message.contains("\"Participant ID:\""));
        assert_eq!(fields[1].1, "30");
        assert_eq!(fields[2].1, "left");
        assert!(matches!(
            outcome,
            IntakeOutcome::Completed(info) if info.get("Participant ID:") == Some("p02")
        ));
    }

    #[test]
    fn re_prompted_answers_keep_question_order() {
        let mut form = ScriptedForm::default()
            .answer(&["", "40", "left"])
            .answer(&["p02", "40", "left"]);
        let outcome = collect_participant_info(&mut form, TITLE, &questions(), &metadata()).unwrap();

        let IntakeOutcome::Completed(info) = outcome else {
            panic!("intake was cancelled");
        };
        assert_eq!(
            info.keys().take(3).collect::<Vec<_>>(),
            ["Participant ID:", "Age:", "Handedness:"]
        );
        assert_eq!(
            info.values().take(3).collect::<Vec<_>>(),
            ["p02", "40", "left"]
        );
    }

    #[test]
    fn cancelling_ends_intake() {
        let mut form = ScriptedForm::default().answer(&["", "", ""]).cancel();
        let outcome = collect_participant_info(&mut form, TITLE, &questions(), &metadata()).unwrap();
        assert_eq!(outcome, IntakeOutcome::Cancelled);
    }

    #[test]
    fn unknown_field_kind_is_rejected() {
        assert!(FieldKind::parse("slider", "1;10").is_err());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut info = ParticipantInfo::default();
        info.insert("a", "1");
        info.insert("b", "2");
        info.insert("a", "3");
        assert_eq!(info.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(info.values().collect::<Vec<_>>(), ["3", "2"]);
    }
}
