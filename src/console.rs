//! Line-based terminal front end.
//!
//! The participant types a key name (`left`, `right`, `n`, `r`, ...) and
//! presses Enter; an empty line counts as `space`. Images are announced by
//! path since a terminal cannot draw them.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use cogex_core::Key;
use cogex_experiment::{FieldKind, Frame, IntakeForm, IntakePrompt, Surface, SurfaceError};
use tracing::debug;

const CLEAR: &str = "\x1B[2J\x1B[H";

/// Lines read from stdin on a background thread.
#[derive(Clone)]
struct Lines {
    rx: Rc<Receiver<String>>,
}

impl Lines {
    fn new(rx: Receiver<String>) -> Self {
        Self { rx: Rc::new(rx) }
    }

    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });
        Self::new(rx)
    }

    /// Next line, `None` once `deadline` passes. A closed stdin is `Closed`.
    fn next(&self, deadline: Option<Instant>) -> Result<Option<String>, SurfaceError> {
        match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match self.rx.recv_timeout(remaining) {
                    Ok(line) => Ok(Some(line)),
                    Err(RecvTimeoutError::Timeout) => Ok(None),
                    Err(RecvTimeoutError::Disconnected) => Err(SurfaceError::Closed),
                }
            }
            None => self.rx.recv().map(Some).map_err(|_| SurfaceError::Closed),
        }
    }
}

/// Opens the terminal and returns its presentation and intake halves.
pub fn open() -> (ConsoleSurface, ConsoleForm) {
    let lines = Lines::spawn();
    (
        ConsoleSurface {
            lines: lines.clone(),
        },
        ConsoleForm { lines },
    )
}

pub struct ConsoleSurface {
    lines: Lines,
}

impl Surface for ConsoleSurface {
    fn show(&mut self, frame: Frame<'_>) -> Result<(), SurfaceError> {
        let mut out = io::stdout().lock();
        match frame {
            Frame::Image {
                path,
                width,
                height,
            } => {
                write!(out, "{CLEAR}")?;
                let mirrored = if height < 0 { " (upside down)" } else { "" };
                writeln!(
                    out,
                    "[image {}x{}] {}{mirrored}",
                    width,
                    height.abs(),
                    path.display()
                )?;
            }
            Frame::Text(text) => {
                write!(out, "{CLEAR}")?;
                writeln!(out, "{text}")?;
            }
            Frame::Blank => write!(out, "{CLEAR}")?,
        }
        out.flush()?;
        Ok(())
    }

    fn await_key(
        &mut self,
        allowed: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, SurfaceError> {
        let deadline = timeout.map(|limit| Instant::now() + limit);
        loop {
            let Some(line) = self.lines.next(deadline)? else {
                return Ok(None);
            };
            let key = if line.trim().is_empty() {
                Key::new("space")
            } else {
                Key::new(&line)
            };
            if allowed.is_empty() || allowed.contains(&key) {
                return Ok(Some(key));
            }
            debug!(key = %key, "ignored key");
        }
    }
}

pub struct ConsoleForm {
    lines: Lines,
}

impl IntakeForm for ConsoleForm {
    fn ask(&mut self, prompt: &IntakePrompt<'_>) -> Result<Option<Vec<String>>, SurfaceError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{CLEAR}== {} ==", prompt.title)?;
        writeln!(out, "{}\n", prompt.message)?;
        writeln!(out, "(press Enter to keep the value in brackets, Ctrl-D to cancel)")?;

        let mut answers = Vec::with_capacity(prompt.fields.len());
        for field in &prompt.fields {
            loop {
                match field.kind {
                    FieldKind::SingleChoice { choices } => {
                        write!(out, "{} ({}) [{}]: ", field.label, choices.join("/"), field.value)?
                    }
                    FieldKind::TextField { .. } => {
                        write!(out, "{} [{}]: ", field.label, field.value)?
                    }
                }
                out.flush()?;

                let line = match self.lines.next(None) {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(SurfaceError::Closed) => return Ok(None),
                    Err(err) => return Err(err),
                };
                let answer = line.trim();
                if answer.is_empty() {
                    answers.push(field.value.clone());
                    break;
                }
                if let FieldKind::SingleChoice { choices } = field.kind {
                    if !choices.iter().any(|choice| choice == answer) {
                        writeln!(out, "Please choose one of: {}", choices.join(", "))?;
                        continue;
                    }
                }
                answers.push(answer.to_string());
                break;
            }
        }
        Ok(Some(answers))
    }
}
