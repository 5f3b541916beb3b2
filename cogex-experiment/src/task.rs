//! Task strategies.
//!
//! A [`Task`] bundles everything that differs between the image sorting and
//! the word recognition experiment: the category and condition domains, the
//! correct-response mapping, how a stimulus is drawn and how a record is
//! written out. The list builder, runner and orchestrator are generic over it.

use std::path::Path;
use std::time::Duration;

use cogex_core::{
    CatalogRow, Category, ConditionId, ImageCondition, ImageContent, Key, Lexicality, Orientation,
    ResponseRecord, Side, StimulusDescriptor, StimulusSource, UnknownLabel, WordCondition,
};

use crate::surface::Frame;

pub type Descriptor<T> = StimulusDescriptor<<T as Task>::Category, <T as Task>::Condition>;
pub type Record<T> = ResponseRecord<<T as Task>::Category, <T as Task>::Condition>;
pub type Row<T> = CatalogRow<<T as Task>::Category>;

pub trait Task {
    type Category: Category;
    type Condition: ConditionId;

    fn name(&self) -> &'static str;

    /// Keys the participant may answer with.
    fn allowed_keys(&self) -> &[Key];

    /// Expected key for a stimulus. Pure and total over the task's domain.
    fn correct_response(
        &self,
        category: Self::Category,
        orientation: Orientation,
        condition: Self::Condition,
    ) -> Key;

    /// How long a stimulus stays visible before the screen is blanked.
    /// `None` keeps it up until the response.
    fn exposure(&self) -> Option<Duration>;

    fn frame<'a>(
        &self,
        stimulus: &'a StimulusDescriptor<Self::Category, Self::Condition>,
    ) -> Frame<'a>;

    /// Builds a catalog row from its first two columns.
    fn catalog_row(
        &self,
        identifier: &str,
        label: &str,
        images_dir: &Path,
    ) -> Result<CatalogRow<Self::Category>, UnknownLabel>;

    fn output_header(&self) -> &'static [&'static str];

    fn output_row(&self, record: &ResponseRecord<Self::Category, Self::Condition>) -> Vec<String>;

    /// Whether total playing time is stored with the participant info.
    fn tracks_duration(&self) -> bool {
        false
    }
}

fn capitalized_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Sorting images of animals and objects with the left/right arrow keys.
#[derive(Debug, Clone)]
pub struct ImageSorting {
    size_px: i32,
    keys: [Key; 2],
}

impl ImageSorting {
    pub const DEFAULT_SIZE_PX: i32 = 600;

    pub fn new(size_px: i32) -> Self {
        Self {
            size_px,
            keys: [Side::Left.key(), Side::Right.key()],
        }
    }

    pub fn side(content: ImageContent, orientation: Orientation, condition: ImageCondition) -> Side {
        use ImageContent::*;
        match (condition, content, orientation) {
            (ImageCondition::AnimalLeft, Animal, _) => Side::Left,
            (ImageCondition::AnimalLeft, Object, _) => Side::Right,
            (ImageCondition::ObjectLeft, Object, _) => Side::Left,
            (ImageCondition::ObjectLeft, Animal, _) => Side::Right,
            (ImageCondition::InversionSwap, Animal, Orientation::Inverted) => Side::Left,
            (ImageCondition::InversionSwap, Object, Orientation::Inverted) => Side::Right,
            (ImageCondition::InversionSwap, Animal, Orientation::Upright) => Side::Right,
            (ImageCondition::InversionSwap, Object, Orientation::Upright) => Side::Left,
        }
    }
}

impl Default for ImageSorting {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE_PX)
    }
}

impl Task for ImageSorting {
    type Category = ImageContent;
    type Condition = ImageCondition;

    fn name(&self) -> &'static str {
        "image sorting"
    }

    fn allowed_keys(&self) -> &[Key] {
        &self.keys
    }

    fn correct_response(
        &self,
        category: ImageContent,
        orientation: Orientation,
        condition: ImageCondition,
    ) -> Key {
        Self::side(category, orientation, condition).key()
    }

    fn exposure(&self) -> Option<Duration> {
        None
    }

    fn frame<'a>(&self, stimulus: &'a Descriptor<Self>) -> Frame<'a> {
        match &stimulus.source {
            StimulusSource::Image(path) => Frame::Image {
                path,
                width: self.size_px,
                height: if stimulus.orientation.is_inverted() {
                    -self.size_px
                } else {
                    self.size_px
                },
            },
            StimulusSource::Text(text) => Frame::Text(text),
        }
    }

    fn catalog_row(
        &self,
        identifier: &str,
        label: &str,
        images_dir: &Path,
    ) -> Result<Row<Self>, UnknownLabel> {
        let name = Path::new(identifier)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| identifier.to_string());
        Ok(CatalogRow {
            name,
            category: label.parse()?,
            label: label.trim().to_string(),
            source: StimulusSource::Image(images_dir.join(identifier)),
        })
    }

    fn output_header(&self) -> &'static [&'static str] {
        &[
            "stimulus_name",
            "result",
            "reaction_time",
            "condition",
            "content",
            "upside_down",
            "pres_time",
        ]
    }

    fn output_row(&self, record: &Record<Self>) -> Vec<String> {
        vec![
            record.stimulus_name.clone(),
            record.outcome.as_str().to_string(),
            record.reaction_time.to_string(),
            record.condition.ordinal().to_string(),
            record.category.to_string(),
            capitalized_bool(record.orientation.is_inverted()).to_string(),
            record.presentation.class().to_string(),
        ]
    }
}

/// Deciding whether a briefly flashed letter string is a word.
#[derive(Debug, Clone)]
pub struct WordRecognition {
    non_word_key: Key,
    word_key: Key,
    exposure: Duration,
    keys: [Key; 2],
}

impl WordRecognition {
    pub const DEFAULT_EXPOSURE: Duration = Duration::from_millis(200);

    pub fn new(non_word_key: Key, word_key: Key, exposure: Duration) -> Self {
        Self {
            keys: [non_word_key.clone(), word_key.clone()],
            non_word_key,
            word_key,
            exposure,
        }
    }
}

impl Default for WordRecognition {
    fn default() -> Self {
        Self::new(Key::new("n"), Key::new("r"), Self::DEFAULT_EXPOSURE)
    }
}

impl Task for WordRecognition {
    type Category = Lexicality;
    type Condition = WordCondition;

    fn name(&self) -> &'static str {
        "word recognition"
    }

    fn allowed_keys(&self) -> &[Key] {
        &self.keys
    }

    fn correct_response(&self, category: Lexicality, _: Orientation, _: WordCondition) -> Key {
        match category {
            Lexicality::NonWord => self.non_word_key.clone(),
            Lexicality::Word => self.word_key.clone(),
        }
    }

    fn exposure(&self) -> Option<Duration> {
        Some(self.exposure)
    }

    fn frame<'a>(&self, stimulus: &'a Descriptor<Self>) -> Frame<'a> {
        match &stimulus.source {
            StimulusSource::Text(text) => Frame::Text(text),
            StimulusSource::Image(path) => Frame::Image {
                path,
                width: ImageSorting::DEFAULT_SIZE_PX,
                height: ImageSorting::DEFAULT_SIZE_PX,
            },
        }
    }

    fn catalog_row(&self, identifier: &str, label: &str, _: &Path) -> Result<Row<Self>, UnknownLabel> {
        Ok(CatalogRow {
            name: identifier.to_string(),
            category: label.parse()?,
            label: label.trim().to_string(),
            source: StimulusSource::Text(identifier.to_string()),
        })
    }

    fn output_header(&self) -> &'static [&'static str] {
        &["word", "condition", "result", "reaction_time"]
    }

    fn output_row(&self, record: &Record<Self>) -> Vec<String> {
        vec![
            record.stimulus_name.clone(),
            record.label.clone(),
            record.outcome.as_str().to_string(),
            record.reaction_time.to_string(),
        ]
    }

    fn tracks_duration(&self) -> bool {
        true
    }
}
