//! Property-based tests for stimulus list construction.

use std::collections::HashMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use cogex_core::{
    CatalogRow, ConditionFlags, ImageCondition, ImageContent, Key, Orientation, PresentationTime,
    StimulusSource,
};
use cogex_experiment::task::{ImageSorting, Task};
use cogex_experiment::{StimulusListBuilder, flip_count};

/// Strategy: a catalog of 0-40 distinct images with random content.
fn catalog_strategy() -> impl Strategy<Value = Vec<CatalogRow<ImageContent>>> {
    prop::collection::vec(any::<bool>(), 0..40).prop_map(|animals| {
        animals
            .into_iter()
            .enumerate()
            .map(|(i, animal)| CatalogRow {
                name: format!("img{i}"),
                category: if animal {
                    ImageContent::Animal
                } else {
                    ImageContent::Object
                },
                label: if animal { "animal" } else { "object" }.into(),
                source: StimulusSource::Image(format!("img{i}.png").into()),
            })
            .collect()
    })
}

fn flags(repeats: bool, flip: bool) -> ConditionFlags {
    ConditionFlags {
        repeats,
        flip,
        ..ConditionFlags::default()
    }
}

proptest! {
    // Every catalog item appears twice: once first, once repeated.
    #[test]
    fn repeats_show_each_item_twice(catalog in catalog_strategy(), seed in any::<u64>()) {
        let task = ImageSorting::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let condition = StimulusListBuilder::new(&task, &catalog)
            .build(ImageCondition::AnimalLeft, flags(true, false), &mut rng);

        prop_assert_eq!(condition.len(), 2 * catalog.len());
        let mut classes: HashMap<&str, Vec<u8>> = HashMap::new();
        for stimulus in condition.iter() {
            classes.entry(stimulus.name.as_str()).or_default().push(stimulus.presentation.class());
        }
        prop_assert_eq!(classes.len(), catalog.len());
        for seen in classes.values() {
            prop_assert_eq!(seen, &vec![1u8, 2]);
        }
    }

    // A flipped list inverts exactly half of it, rounded to even.
    #[test]
    fn flip_inverts_half(catalog in catalog_strategy(), seed in any::<u64>(), repeats in any::<bool>()) {
        let task = ImageSorting::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let condition = StimulusListBuilder::new(&task, &catalog)
            .build(ImageCondition::InversionSwap, flags(repeats, true), &mut rng);

        let inverted = condition.iter().filter(|s| s.orientation.is_inverted()).count();
        prop_assert_eq!(inverted, flip_count(condition.len()));
    }

    // The expected key always follows the mapping table.
    #[test]
    fn correct_response_matches_mapping(catalog in catalog_strategy(), seed in any::<u64>()) {
        let task = ImageSorting::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let condition = StimulusListBuilder::new(&task, &catalog)
            .build(ImageCondition::InversionSwap, flags(false, true), &mut rng);

        for stimulus in condition.iter() {
            let expected = match (stimulus.category, stimulus.orientation) {
                (ImageContent::Animal, Orientation::Inverted)
                | (ImageContent::Object, Orientation::Upright) => "left",
                _ => "right",
            };
            prop_assert_eq!(&stimulus.correct_response, &Key::new(expected));
            prop_assert_eq!(
                &stimulus.correct_response,
                &task.correct_response(stimulus.category, stimulus.orientation, stimulus.condition)
            );
        }
    }

    // Same seed, same list.
    #[test]
    fn seeded_builds_are_reproducible(catalog in catalog_strategy(), seed in any::<u64>()) {
        let task = ImageSorting::default();
        let builder = StimulusListBuilder::new(&task, &catalog);
        let first = builder.build(ImageCondition::ObjectLeft, flags(true, true), &mut StdRng::seed_from_u64(seed));
        let second = builder.build(ImageCondition::ObjectLeft, flags(true, true), &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(first.stimuli, second.stimuli);
    }
}

#[test]
fn unflagged_list_keeps_catalog_content() {
    let catalog: Vec<_> = ["cat", "chair", "dog"]
        .iter()
        .map(|name| CatalogRow {
            name: name.to_string(),
            category: ImageContent::Animal,
            label: "animal".into(),
            source: StimulusSource::Image(format!("{name}.png").into()),
        })
        .collect();
    let task = ImageSorting::default();
    let condition = StimulusListBuilder::new(&task, &catalog).build(
        ImageCondition::AnimalLeft,
        ConditionFlags::default(),
        &mut StdRng::seed_from_u64(11),
    );

    let mut names: Vec<_> = condition.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["cat", "chair", "dog"]);
    assert!(
        condition
            .iter()
            .all(|s| s.presentation == PresentationTime::First && !s.orientation.is_inverted())
    );
}
