use serde::Serialize;

use cogex_core::{ConditionId, ResponseRecord};

/// Append-only log of scored responses, in presentation order.
#[derive(Debug, Clone)]
pub struct ResponseRecorder<C, K> {
    records: Vec<ResponseRecord<C, K>>,
}

impl<C, K> Default for ResponseRecorder<C, K> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<C, K: ConditionId> ResponseRecorder<C, K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResponseRecord<C, K>) {
        self.records.push(record);
    }

    /// Appends the records of a finished condition.
    pub fn commit(&mut self, records: Vec<ResponseRecord<C, K>>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ResponseRecord<C, K>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_condition(&self, id: K) -> impl Iterator<Item = &ResponseRecord<C, K>> {
        self.records.iter().filter(move |r| r.condition == id)
    }

    /// Accuracy and reaction-time statistics, overall and per condition
    /// (conditions listed in the order they were first recorded).
    pub fn summary(&self) -> Summary {
        let mut order: Vec<K> = Vec::new();
        for record in &self.records {
            if !order.contains(&record.condition) {
                order.push(record.condition);
            }
        }

        Summary {
            overall: ConditionSummary::from_records(None, self.records.iter()),
            conditions: order
                .into_iter()
                .map(|id| {
                    ConditionSummary::from_records(Some(id.ordinal()), self.for_condition(id))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub overall: ConditionSummary,
    pub conditions: Vec<ConditionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionSummary {
    /// `None` for the whole run.
    pub condition: Option<u32>,
    pub trials: usize,
    pub correct: usize,
    pub accuracy: Option<f64>,
    pub mean_rt: Option<f64>,
    pub min_rt: Option<f64>,
    pub max_rt: Option<f64>,
}

impl ConditionSummary {
    fn from_records<'a, C: 'a, K: 'a>(
        condition: Option<u32>,
        records: impl Iterator<Item = &'a ResponseRecord<C, K>>,
    ) -> Self {
        let mut trials = 0;
        let mut correct = 0;
        let mut times = Vec::new();
        for record in records {
            trials += 1;
            if record.outcome.is_correct() {
                correct += 1;
            }
            times.push(record.reaction_time);
        }

        let (mean_rt, min_rt, max_rt) = if times.is_empty() {
            (None, None, None)
        } else {
            let mean = times.iter().sum::<f64>() / times.len() as f64;
            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (Some(mean), Some(min), Some(max))
        };

        Self {
            condition,
            trials,
            correct,
            accuracy: (trials > 0).then(|| correct as f64 / trials as f64),
            mean_rt,
            min_rt,
            max_rt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogex_core::{ImageCondition, ImageContent, Orientation, Outcome, PresentationTime};

    fn record(
        name: &str,
        condition: ImageCondition,
        outcome: Outcome,
        rt: f64,
    ) -> ResponseRecord<ImageContent, ImageCondition> {
        ResponseRecord {
            stimulus_name: name.into(),
            outcome,
            reaction_time: rt,
            condition,
            category: ImageContent::Animal,
            label: "animal".into(),
            orientation: Orientation::Upright,
            presentation: PresentationTime::First,
            pressed: None,
        }
    }

    #[test]
    fn keeps_append_order() {
        let mut recorder = ResponseRecorder::new();
        recorder.push(record("a", ImageCondition::AnimalLeft, Outcome::Correct, 0.5));
        recorder.commit(vec![
            record("b", ImageCondition::ObjectLeft, Outcome::Incorrect, 0.7),
            record("c", ImageCondition::ObjectLeft, Outcome::Correct, 0.3),
        ]);
        let names: Vec<_> = recorder
            .records()
            .iter()
            .map(|r| r.stimulus_name.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(recorder.for_condition(ImageCondition::ObjectLeft).count(), 2);
    }

    #[test]
    fn summarizes_per_condition() {
        let mut recorder = ResponseRecorder::new();
        recorder.commit(vec![
            record("a", ImageCondition::ObjectLeft, Outcome::Correct, 0.4),
            record("b", ImageCondition::ObjectLeft, Outcome::Incorrect, 0.8),
            record("c", ImageCondition::AnimalLeft, Outcome::Correct, 0.6),
        ]);
        let summary = recorder.summary();

        assert_eq!(summary.overall.trials, 3);
        assert_eq!(summary.overall.correct, 2);
        assert_eq!(summary.overall.min_rt, Some(0.4));
        assert_eq!(summary.overall.max_rt, Some(0.8));

        assert_eq!(summary.conditions.len(), 2);
        let first = &summary.conditions[0];
        assert_eq!(first.condition, Some(2));
        assert_eq!(first.accuracy, Some(0.5));
        assert!((first.mean_rt.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_summary_has_no_statistics() {
        let recorder = ResponseRecorder::<ImageContent, ImageCondition>::new();
        let summary = recorder.summary();
        assert_eq!(summary.overall.trials, 0);
        assert_eq!(summary.overall.accuracy, None);
        assert_eq!(summary.overall.mean_rt, None);
        assert!(summary.conditions.is_empty());
    }
}
