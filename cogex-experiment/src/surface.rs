//! Presentation surface seam.
//!
//! The engine never renders anything itself. It hands [`Frame`]s to a
//! [`Surface`] and blocks on [`Surface::await_key`]; a window, a terminal or a
//! scripted fake can sit behind the trait.

use std::path::Path;
use std::time::Duration;

use cogex_core::Key;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface was torn down while the engine was waiting on it.
    #[error("surface closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// One screenful handed to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame<'a> {
    /// Image drawn at `width` x `height` pixels. A negative height mirrors it
    /// vertically.
    Image {
        path: &'a Path,
        width: i32,
        height: i32,
    },
    Text(&'a str),
    Blank,
}

pub trait Surface {
    /// Replaces whatever is on screen with `frame` and returns once it is visible.
    fn show(&mut self, frame: Frame<'_>) -> Result<(), SurfaceError>;

    /// Blocks until one of `allowed` is pressed (any key when `allowed` is
    /// empty). Returns `None` if `timeout` elapses first.
    fn await_key(
        &mut self,
        allowed: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, SurfaceError>;
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn show(&mut self, frame: Frame<'_>) -> Result<(), SurfaceError> {
        (**self).show(frame)
    }

    fn await_key(
        &mut self,
        allowed: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, SurfaceError> {
        (**self).await_key(allowed, timeout)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use scripted::{Input, ScriptedSurface, Shown};

#[cfg(any(test, feature = "test-support"))]
mod scripted {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::time::Duration;

    use cogex_core::Key;
    use cogex_timing::{ManualTimer, Timer};

    use super::{Frame, Surface, SurfaceError};

    /// A scripted participant input.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Input {
        /// Press `key` after `after` has passed on the shared clock.
        Press { key: Key, after: Duration },
        /// Let the response window run out.
        Wait,
    }

    /// Owned record of a frame the engine showed.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Shown {
        Image { path: PathBuf, inverted: bool },
        Text(String),
        Blank,
    }

    /// Headless surface replaying scripted input against a [`ManualTimer`].
    ///
    /// Keys outside the allowed set are skipped, like a real keyboard wait.
    /// Running out of script behaves like the window being closed.
    #[derive(Debug, Default)]
    pub struct ScriptedSurface {
        pub inputs: VecDeque<Input>,
        pub shown: Vec<Shown>,
        pub clock: ManualTimer,
    }

    impl ScriptedSurface {
        pub fn new(clock: ManualTimer) -> Self {
            Self {
                clock,
                ..Self::default()
            }
        }

        pub fn press(mut self, key: &str, after: Duration) -> Self {
            self.inputs.push_back(Input::Press {
                key: Key::new(key),
                after,
            });
            self
        }

        pub fn press_many(mut self, keys: &[&str], after: Duration) -> Self {
            for key in keys {
                self = self.press(key, after);
            }
            self
        }

        pub fn wait(mut self) -> Self {
            self.inputs.push_back(Input::Wait);
            self
        }

        pub fn texts(&self) -> Vec<&str> {
            self.shown
                .iter()
                .filter_map(|shown| match shown {
                    Shown::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for ScriptedSurface {
        fn show(&mut self, frame: Frame<'_>) -> Result<(), SurfaceError> {
            self.shown.push(match frame {
                Frame::Image { path, height, .. } => Shown::Image {
                    path: path.to_path_buf(),
                    inverted: height < 0,
                },
                Frame::Text(text) => Shown::Text(text.to_string()),
                Frame::Blank => Shown::Blank,
            });
            Ok(())
        }

        fn await_key(
            &mut self,
            allowed: &[Key],
            timeout: Option<Duration>,
        ) -> Result<Option<Key>, SurfaceError> {
            while let Some(input) = self.inputs.pop_front() {
                match input {
                    Input::Press { key, after } => {
                        if let Some(limit) = timeout {
                            if after > limit {
                                self.clock.sleep(limit);
                                return Ok(None);
                            }
                        }
                        self.clock.sleep(after);
                        if allowed.is_empty() || allowed.contains(&key) {
                            return Ok(Some(key));
                        }
                    }
                    Input::Wait => match timeout {
                        Some(limit) => {
                            self.clock.sleep(limit);
                            return Ok(None);
                        }
                        None => return Err(SurfaceError::Closed),
                    },
                }
            }
            Err(SurfaceError::Closed)
        }
    }
}
