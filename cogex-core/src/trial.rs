use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::stimulus::{Orientation, PresentationTime, StimulusDescriptor};

/// Per-stimulus state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Presenting,
    AwaitingResponse,
    Scored,
    Feedback,
    Done,
}

impl TrialState {
    /// Next state; `Feedback` is only visited when the condition shows feedback.
    pub fn next(self, feedback: bool) -> Option<Self> {
        use TrialState::*;
        Some(match self {
            Presenting => AwaitingResponse,
            AwaitingResponse => Scored,
            Scored if feedback => Feedback,
            Scored | Feedback => Done,
            Done => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    /// Scores a response. A missing response (timeout) is incorrect.
    pub fn score(pressed: Option<&Key>, expected: &Key) -> Self {
        match pressed {
            Some(key) if key == expected => Outcome::Correct,
            _ => Outcome::Incorrect,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Incorrect => "incorrect",
        }
    }

    /// Capitalized form used in feedback messages.
    pub fn title(self) -> &'static str {
        match self {
            Outcome::Correct => "Correct",
            Outcome::Incorrect => "Incorrect",
        }
    }

    pub fn is_correct(self) -> bool {
        matches!(self, Outcome::Correct)
    }
}

/// Recorded result per presented stimulus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord<C, K> {
    pub stimulus_name: String,
    pub outcome: Outcome,
    /// Seconds from stimulus onset to the key press.
    pub reaction_time: f64,
    pub condition: K,
    pub category: C,
    /// Catalog label of the category, unnormalized.
    pub label: String,
    pub orientation: Orientation,
    pub presentation: PresentationTime,
    /// `None` when the response window timed out.
    pub pressed: Option<Key>,
}

impl<C: Copy, K: Copy> ResponseRecord<C, K> {
    pub fn new(
        stimulus: &StimulusDescriptor<C, K>,
        pressed: Option<Key>,
        reaction_time: f64,
    ) -> Self {
        Self {
            stimulus_name: stimulus.name.clone(),
            outcome: Outcome::score(pressed.as_ref(), &stimulus.correct_response),
            reaction_time: reaction_time.max(0.0),
            condition: stimulus.condition,
            category: stimulus.category,
            label: stimulus.label.clone(),
            orientation: stimulus.orientation,
            presentation: stimulus.presentation,
            pressed,
        }
    }
}
