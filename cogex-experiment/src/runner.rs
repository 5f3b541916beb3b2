use std::time::Duration;

use cogex_core::{Condition, ResponseRecord, TrialState};
use cogex_timing::{Stopwatch, Timer};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::surface::{Frame, Surface};
use crate::task::{Descriptor, Record, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerTiming {
    /// Pause after a feedback message before the next stimulus.
    pub feedback_settle: Duration,
    /// Give up waiting for a response after this long. `None` waits forever.
    pub response_timeout: Option<Duration>,
}

impl Default for RunnerTiming {
    fn default() -> Self {
        Self {
            feedback_settle: Duration::from_millis(300),
            response_timeout: None,
        }
    }
}

/// Plays conditions on a presentation surface, one stimulus at a time.
pub struct TrialRunner<'s, S: Surface + ?Sized, T: Timer> {
    surface: &'s mut S,
    timer: T,
    timing: RunnerTiming,
}

impl<'s, S: Surface + ?Sized, T: Timer> TrialRunner<'s, S, T> {
    pub fn new(surface: &'s mut S, timer: T, timing: RunnerTiming) -> Self {
        Self {
            surface,
            timer,
            timing,
        }
    }

    /// Shows a text screen and waits for any key.
    pub fn instruct(&mut self, text: &str) -> Result<()> {
        self.surface.show(Frame::Text(text))?;
        self.surface.await_key(&[], None)?;
        Ok(())
    }

    /// Plays every stimulus of `condition` in list order.
    ///
    /// Records are returned only when the whole condition completed; a surface
    /// failure discards the ones gathered so far.
    pub fn play<Tk: Task>(
        &mut self,
        task: &Tk,
        condition: &Condition<Tk::Category, Tk::Condition>,
    ) -> Result<Vec<Record<Tk>>> {
        info!(
            task = task.name(),
            condition = %condition.id,
            stimuli = condition.len(),
            feedback = condition.flags.feedback,
            "condition started"
        );

        let mut records = Vec::with_capacity(condition.len());
        for (index, stimulus) in condition.iter().enumerate() {
            let record = self.run_stimulus(task, stimulus, condition.flags.feedback)?;
            debug!(
                index,
                stimulus = %record.stimulus_name,
                result = record.outcome.as_str(),
                rt = record.reaction_time,
                "response scored"
            );
            records.push(record);
        }

        let correct = records.iter().filter(|r| r.outcome.is_correct()).count();
        info!(
            condition = %condition.id,
            trials = records.len(),
            correct,
            "condition finished"
        );
        Ok(records)
    }

    fn run_stimulus<Tk: Task>(
        &mut self,
        task: &Tk,
        stimulus: &Descriptor<Tk>,
        feedback: bool,
    ) -> Result<Record<Tk>> {
        let mut state = TrialState::Presenting;
        let mut clock = Stopwatch::start(self.timer.clone());

        self.surface.show(task.frame(stimulus))?;
        if let Some(exposure) = task.exposure() {
            self.timer.sleep(exposure);
            self.surface.show(Frame::Blank)?;
        }
        clock.reset();
        advance(&mut state, feedback);

        let pressed = self
            .surface
            .await_key(task.allowed_keys(), self.timing.response_timeout)?;
        let reaction_time = clock.seconds();
        if pressed.is_none() {
            warn!(stimulus = %stimulus.name, rt = reaction_time, "no response before timeout");
        }
        let record = ResponseRecord::new(stimulus, pressed, reaction_time);
        advance(&mut state, feedback);

        advance(&mut state, feedback);
        if state == TrialState::Feedback {
            let message = feedback_message(&record);
            self.surface.show(Frame::Text(&message))?;
            self.timer.sleep(self.timing.feedback_settle);
            advance(&mut state, feedback);
        } else {
            self.surface.show(Frame::Blank)?;
        }

        debug_assert_eq!(state, TrialState::Done);
        Ok(record)
    }
}

fn advance(state: &mut TrialState, feedback: bool) {
    if let Some(next) = state.next(feedback) {
        trace!(from = ?state, to = ?next, "trial state");
        *state = next;
    }
}

/// Text shown after a response when the condition gives feedback.
pub fn feedback_message<C, K>(record: &ResponseRecord<C, K>) -> String {
    format!(
        "{}.\nReaction Time: {:.3}",
        record.outcome.title(),
        record.reaction_time
    )
}
