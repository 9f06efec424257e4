//! # `tty_progress`
//!
//! A thread-safe progress bar and spinner that knows where it is drawing.
//!
//! On a terminal, frames are redrawn in place: the cursor is hidden, each redraw
//! moves back up over the previous frame, and the bar resizes with the terminal.
//! Anywhere else (a log file, a pipe, a CI log) the same bar degrades to plain,
//! append-only lines with no control sequences at all.
//!
//! * **Concurrent**: [`ProgressBar`] handles are cheap to clone ([`Arc`](std::sync::Arc)-based);
//!   counting is a single atomic operation and never waits on drawing.
//! * **Serialized output**: every frame is assembled in memory and written under one
//!   lock, so scheduled redraws and status updates never interleave.
//! * **Deterministic shutdown**: [`ProgressBar::complete`] stops the redraw thread,
//!   draws one final frame and returns only when nothing else will be written.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use tty_progress::ProgressBar;
//!
//! # fn main() -> tty_progress::Result<()> {
//! let bar = ProgressBar::new(100, Duration::from_millis(100));
//! bar.set_status("Downloading file")?;
//! bar.start()?;
//! for i in 0..100 {
//!     bar.inc();
//!     if i == 50 {
//!         bar.set_status("Half way there!")?;
//!     }
//! }
//! bar.complete()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! * [`builder`]: Fluent interface for choosing the destination and terminal driver.
//! * [`error`]: The [`Error`] type returned by lifecycle and I/O failures.
//! * [`iter`]: Extension traits for tracking progress on Iterators.
//! * [`progress`]: The [`ProgressBar`] engine and its [`ProgressSnapshot`].
//! * [`render`]: Pure text layout (bar, spinner, speed, status truncation).
//! * [`terminal`]: The [`TerminalDriver`] capability and its `console`-backed default.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod iter;
pub mod progress;
pub mod render;
pub mod terminal;

mod ticker;

#[cfg(test)]
mod test_support;

pub use builder::ProgressBarBuilder;
pub use error::{Error, Result};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use progress::{ProgressBar, ProgressSnapshot, ProgressType};
pub use terminal::{ConsoleDriver, Destination, TerminalDriver};
