pub mod condition;
pub mod key;
pub mod stimulus;
pub mod trial;

pub use condition::{
    Condition, ConditionFlags, ConditionId, ImageCondition, UnknownCondition, WordCondition,
};
pub use key::{Key, Side};
pub use stimulus::{
    CatalogRow, Category, ImageContent, Lexicality, Orientation, PresentationTime,
    StimulusDescriptor, StimulusSource, UnknownLabel,
};
pub use trial::{Outcome, ResponseRecord, TrialState};
