use std::collections::HashSet;

use cogex_core::{Condition, ConditionFlags, Orientation, PresentationTime, StimulusDescriptor};
use rand::Rng;
use rand::seq::{SliceRandom, index};
use tracing::debug;

use crate::task::{Row, Task};

/// Builds the ordered stimulus list of one condition from the catalog.
pub struct StimulusListBuilder<'a, T: Task> {
    task: &'a T,
    catalog: &'a [Row<T>],
}

/// A catalog row placed in the list, before its correct response is known.
struct Placement<'a, T: Task> {
    row: &'a Row<T>,
    orientation: Orientation,
    presentation: PresentationTime,
}

impl<T: Task> Clone for Placement<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Task> Copy for Placement<'_, T> {}

/// Number of inverted entries in a flipped list of `len` items: half,
/// with ties rounded to even.
pub fn flip_count(len: usize) -> usize {
    (len as f64 / 2.0).round_ties_even() as usize
}

impl<'a, T: Task> StimulusListBuilder<'a, T> {
    pub fn new(task: &'a T, catalog: &'a [Row<T>]) -> Self {
        Self { task, catalog }
    }

    pub fn build<R: Rng + ?Sized>(
        &self,
        id: T::Condition,
        flags: ConditionFlags,
        rng: &mut R,
    ) -> Condition<T::Category, T::Condition> {
        let mut placements: Vec<Placement<'a, T>> = self
            .catalog
            .iter()
            .map(|row| Placement {
                row,
                orientation: Orientation::Upright,
                presentation: PresentationTime::First,
            })
            .collect();

        if flags.shuffle {
            placements.shuffle(rng);
        }
        if flags.repeats {
            placements = with_repeats(placements, rng);
        }
        if flags.flip {
            flip_half(&mut placements, rng);
        }

        let stimuli: Vec<StimulusDescriptor<T::Category, T::Condition>> = placements
            .into_iter()
            .map(|placement| StimulusDescriptor {
                name: placement.row.name.clone(),
                condition: id,
                orientation: placement.orientation,
                presentation: placement.presentation,
                category: placement.row.category,
                label: placement.row.label.clone(),
                source: placement.row.source.clone(),
                correct_response: self.task.correct_response(
                    placement.row.category,
                    placement.orientation,
                    id,
                ),
            })
            .collect();

        debug!(
            condition = %id,
            catalog = self.catalog.len(),
            stimuli = stimuli.len(),
            repeats = flags.repeats,
            flip = flags.flip,
            "stimulus list built"
        );

        Condition { id, flags, stimuli }
    }
}

/// Doubles the list, shuffles it, and marks the second sighting of each
/// item as a repeat. No minimum lag between the two exposures is enforced.
fn with_repeats<'a, T: Task, R: Rng + ?Sized>(
    placements: Vec<Placement<'a, T>>,
    rng: &mut R,
) -> Vec<Placement<'a, T>> {
    let mut doubled = placements.clone();
    doubled.extend(placements);
    doubled.shuffle(rng);

    let mut seen = HashSet::with_capacity(doubled.len() / 2);
    for placement in &mut doubled {
        let row: &'a Row<T> = placement.row;
        if !seen.insert(&row.source) {
            placement.presentation = PresentationTime::Repeat;
        }
    }
    doubled
}

fn flip_half<T: Task, R: Rng + ?Sized>(placements: &mut [Placement<'_, T>], rng: &mut R) {
    let count = flip_count(placements.len());
    for position in index::sample(rng, placements.len(), count) {
        placements[position].orientation = Orientation::Inverted;
    }
}
