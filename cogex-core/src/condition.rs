use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stimulus::StimulusDescriptor;

/// Identifies a condition of a task.
///
/// Each task declares its ids as a closed enum; `TryFrom<u32>` is the only way
/// in from configuration, so the response mapping never sees an unknown id.
pub trait ConditionId:
    Copy + Eq + Send + Sync + fmt::Debug + fmt::Display + TryFrom<u32, Error = UnknownCondition>
{
    /// Ordinal written to output files (1..K).
    fn ordinal(&self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown condition id {0}")]
pub struct UnknownCondition(pub u32);

/// Conditions of the image sorting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ImageCondition {
    /// Animals go left.
    AnimalLeft,
    /// Objects go left.
    ObjectLeft,
    /// Inverted animals and upright objects go left.
    InversionSwap,
}

impl ConditionId for ImageCondition {
    fn ordinal(&self) -> u32 {
        match self {
            ImageCondition::AnimalLeft => 1,
            ImageCondition::ObjectLeft => 2,
            ImageCondition::InversionSwap => 3,
        }
    }
}

impl TryFrom<u32> for ImageCondition {
    type Error = UnknownCondition;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(ImageCondition::AnimalLeft),
            2 => Ok(ImageCondition::ObjectLeft),
            3 => Ok(ImageCondition::InversionSwap),
            other => Err(UnknownCondition(other)),
        }
    }
}

impl From<ImageCondition> for u32 {
    fn from(id: ImageCondition) -> Self {
        id.ordinal()
    }
}

impl fmt::Display for ImageCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// The word recognition task has a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WordCondition {
    Lexical,
}

impl ConditionId for WordCondition {
    fn ordinal(&self) -> u32 {
        1
    }
}

impl TryFrom<u32> for WordCondition {
    type Error = UnknownCondition;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(WordCondition::Lexical),
            other => Err(UnknownCondition(other)),
        }
    }
}

impl From<WordCondition> for u32 {
    fn from(id: WordCondition) -> Self {
        id.ordinal()
    }
}

impl fmt::Display for WordCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// Behavioral switches of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionFlags {
    /// Every item is shown twice.
    pub repeats: bool,
    /// Half of the list is shown inverted.
    pub flip: bool,
    /// Result and reaction time are shown after each response.
    pub feedback: bool,
    /// Catalog order is randomized before the list is built.
    pub shuffle: bool,
}

impl Default for ConditionFlags {
    fn default() -> Self {
        Self {
            repeats: false,
            flip: false,
            feedback: false,
            shuffle: true,
        }
    }
}

/// A condition ready to be played. Built once, immutable while playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition<C, K> {
    pub id: K,
    pub flags: ConditionFlags,
    pub stimuli: Vec<StimulusDescriptor<C, K>>,
}

impl<C, K> Condition<C, K> {
    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StimulusDescriptor<C, K>> {
        self.stimuli.iter()
    }
}
