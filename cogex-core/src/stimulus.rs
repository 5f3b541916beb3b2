use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::Key;

/// Content category of a catalog row.
///
/// Implementors are closed enums, which keeps every correct-response mapping
/// total over its domain. Parsing happens once, when the catalog is loaded.
pub trait Category:
    Copy + Eq + Send + Sync + fmt::Debug + fmt::Display + FromStr<Err = UnknownLabel>
{
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

/// Category of an image in the sorting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageContent {
    Animal,
    Object,
}

impl fmt::Display for ImageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageContent::Animal => "animal",
            ImageContent::Object => "object",
        })
    }
}

impl FromStr for ImageContent {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "animal" => Ok(ImageContent::Animal),
            "object" => Ok(ImageContent::Object),
            other => Err(UnknownLabel {
                kind: "image content",
                label: other.to_string(),
            }),
        }
    }
}

impl Category for ImageContent {}

/// Category of a letter string in the recognition task.
///
/// Only `non-word` is singled out; any other label counts as a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lexicality {
    Word,
    NonWord,
}

impl fmt::Display for Lexicality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lexicality::Word => "word",
            Lexicality::NonWord => "non-word",
        })
    }
}

impl FromStr for Lexicality {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "non-word" {
            Ok(Lexicality::NonWord)
        } else {
            Ok(Lexicality::Word)
        }
    }
}

impl Category for Lexicality {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Upright,
    Inverted,
}

impl Orientation {
    pub fn is_inverted(self) -> bool {
        matches!(self, Orientation::Inverted)
    }
}

/// Distinguishes an item's first exposure from its repeat within a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum PresentationTime {
    #[default]
    First,
    Repeat,
}

impl PresentationTime {
    /// Numeric class written to output files: 1 for first exposure, 2 for repeat.
    pub fn class(self) -> u8 {
        match self {
            PresentationTime::First => 1,
            PresentationTime::Repeat => 2,
        }
    }
}

impl From<PresentationTime> for u8 {
    fn from(time: PresentationTime) -> Self {
        time.class()
    }
}

/// What the presentation surface draws for a stimulus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StimulusSource {
    Image(PathBuf),
    Text(String),
}

/// One row of the stimulus catalog, after its category label was parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow<C: Category> {
    pub name: String,
    pub category: C,
    /// Category label as written in the catalog.
    pub label: String,
    pub source: StimulusSource,
}

/// Fully specified stimulus, as played by the trial runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusDescriptor<C, K> {
    pub name: String,
    pub condition: K,
    pub orientation: Orientation,
    pub presentation: PresentationTime,
    pub category: C,
    pub label: String,
    pub source: StimulusSource,
    pub correct_response: Key,
}
