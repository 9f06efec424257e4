//! Fluent interface for constructing [`ProgressBar`] instances.
//!
//! [`ProgressBar::new`] covers the common case of a bar on standard error. The
//! [`ProgressBarBuilder`] is for everything else:
//!
//! * **Destination:** draw to stdout, or to any [`Write`] implementation such as a
//!   log file. Writers that are not terminals get line-mode output.
//! * **Driver:** swap the [`TerminalDriver`], e.g. to select a platform backend at
//!   startup or to script terminal behavior in tests.
//!
//! The destination is classified as interactive or not exactly once, in
//! [`build`](ProgressBarBuilder::build), and that answer holds for the bar's lifetime.

use std::{
    io::Write,
    sync::{Arc, atomic::AtomicU64},
    time::Duration,
};

use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    progress::{Frame, ProgressBar, ProgressType, Shared},
    terminal::{ConsoleDriver, Destination, TerminalDriver},
};

/// Shortest redraw interval accepted; anything below is raised to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A builder for [`ProgressBar`] with a custom destination or terminal driver.
#[must_use]
pub struct ProgressBarBuilder {
    maximum: u64,
    interval: Duration,
    destination: Destination,
    driver: Option<Arc<dyn TerminalDriver>>,
}

impl ProgressBarBuilder {
    /// Starts building a bar. A `maximum` of zero builds a spinner.
    pub fn new(maximum: u64, interval: Duration) -> Self {
        Self {
            maximum,
            interval,
            destination: Destination::default(),
            driver: None,
        }
    }

    /// Starts building a spinner (no known maximum).
    pub fn new_spinner(interval: Duration) -> Self {
        Self::new(0, interval)
    }

    /// Replaces the maximum. Zero switches to a spinner.
    pub const fn maximum(mut self, maximum: u64) -> Self {
        self.maximum = maximum;
        self
    }

    /// Sets where frames are written. Defaults to [`Destination::Stderr`].
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Shorthand for `destination(Destination::writer(w))`.
    pub fn writer(self, w: impl Write + Send + 'static) -> Self {
        self.destination(Destination::writer(w))
    }

    /// Overrides the terminal driver.
    ///
    /// Without this a [`ConsoleDriver`] bound to the destination is used.
    pub fn driver(mut self, driver: Arc<dyn TerminalDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Classifies the destination and returns the constructed, not yet started bar.
    pub fn build(self) -> ProgressBar {
        let driver = self.driver.unwrap_or_else(|| {
            Arc::new(ConsoleDriver::for_destination(&self.destination)) as Arc<dyn TerminalDriver>
        });

        let interactive = driver.is_interactive(&self.destination);
        let unicode = interactive && driver.supports_unicode();
        let kind = if self.maximum > 0 {
            ProgressType::Bar
        } else {
            ProgressType::Spinner
        };

        if self.interval < MIN_INTERVAL {
            tracing::debug!(requested = ?self.interval, "redraw interval raised to minimum");
        }
        let interval = self.interval.max(MIN_INTERVAL);

        tracing::debug!(
            ?kind,
            maximum = self.maximum,
            destination = ?self.destination,
            interactive,
            "progress bar created"
        );

        ProgressBar::from_shared(Shared {
            kind,
            maximum: self.maximum,
            interval,
            started_at: Instant::now(),
            interactive,
            unicode,
            driver,
            position: AtomicU64::new(0),
            frame: Mutex::new(Frame::new(self.destination.into_writer())),
            ticker: Mutex::new(None),
        })
    }
}
