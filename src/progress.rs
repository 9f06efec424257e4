//! The redraw engine.
//!
//! [`ProgressBar`] is the handle callers update and the owner of everything that
//! ends up on screen. Its state is split the same way the work is:
//!
//! * **Hot data:** the position counter is a single atomic. Worker threads bump it
//!   in tight loops without ever touching a lock.
//! * **Frame data:** status text, the spinner phase, how many lines the previous
//!   frame occupied, the lifecycle and the output stream itself live behind one
//!   [`Mutex`](parking_lot::Mutex). Whoever holds it owns the terminal cursor, so a
//!   scheduled redraw and a status-triggered redraw can never interleave.
//!
//! # Rendering strategies
//!
//! Whether the destination is a terminal is decided once, at construction. On a
//! terminal each frame moves the cursor back up over the previous frame and draws
//! over it. Anywhere else (log files, pipes, CI logs) frames are appended as plain
//! lines and no control sequences are ever written.
//!
//! # Lifecycle
//!
//! `new` → [`start`](ProgressBar::start) → [`complete`](ProgressBar::complete). A bar
//! is single-use: once completed it cannot be started again.

use std::{
    fmt,
    io::{self, Write as _},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use compact_str::CompactString;
use parking_lot::Mutex;
use web_time::Instant;

use crate::{
    builder::ProgressBarBuilder,
    error::{Error, Result},
    render,
    terminal::TerminalDriver,
    ticker::Ticker,
};

/// Elapsed times at or below this many seconds report a throughput of zero.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// A thread-safe, cloneable handle to a progress bar or spinner.
///
/// Cloning is cheap (Arc bump); every clone drives the same bar. Hand clones to
/// worker threads and call [`inc`](Self::inc) from wherever work gets done.
#[derive(Clone)]
pub struct ProgressBar {
    inner: Arc<Shared>,
}

/// Whether a bar has a known end. Fixed at construction.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProgressType {
    /// No maximum is known; an animated spinner is shown.
    #[default]
    Spinner,
    /// A maximum is known; a filling bar with a percentage is shown.
    Bar,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Lifecycle {
    Idle,
    Running,
    Completed,
}

pub(crate) struct Shared {
    pub(crate) kind: ProgressType,
    pub(crate) maximum: u64,
    pub(crate) interval: Duration,
    pub(crate) started_at: Instant,
    pub(crate) interactive: bool,
    pub(crate) unicode: bool,
    pub(crate) driver: Arc<dyn TerminalDriver>,
    pub(crate) position: AtomicU64,
    pub(crate) frame: Mutex<Frame>,
    pub(crate) ticker: Mutex<Option<Ticker>>,
}

/// Everything a redraw reads and writes besides the position counter.
pub(crate) struct Frame {
    out: Box<dyn io::Write + Send>,
    status: CompactString,
    status_changed: bool,
    spinner_phase: usize,
    lines_reserved: usize,
    lifecycle: Lifecycle,
    stopped: Option<Instant>,
}

impl Frame {
    pub(crate) fn new(out: Box<dyn io::Write + Send>) -> Self {
        Self {
            out,
            status: CompactString::default(),
            status_changed: false,
            spinner_phase: 0,
            lines_reserved: 0,
            lifecycle: Lifecycle::Idle,
            stopped: None,
        }
    }

    /// Terminal rows the next frame will occupy.
    fn required_lines(&self) -> usize {
        if self.status.is_empty() { 1 } else { 2 }
    }

    /// Writes one fully assembled frame in a single call.
    fn emit(&mut self, buf: &[u8]) -> io::Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        self.out.write_all(buf)?;
        self.out.flush()
    }
}

impl fmt::Debug for ProgressBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only lock-free fields, so formatting never waits on a redraw.
        f.debug_struct("ProgressBar")
            .field("kind", &self.inner.kind)
            .field("position", &self.position())
            .field("maximum", &self.inner.maximum)
            .field("interactive", &self.inner.interactive)
            .finish_non_exhaustive()
    }
}

impl ProgressBar {
    /// Creates a bar writing to standard error.
    ///
    /// A `maximum` of zero makes a spinner. `interval` is the time between
    /// scheduled redraws once the bar is started. Use [`ProgressBarBuilder`] to pick
    /// another destination.
    #[must_use]
    pub fn new(maximum: u64, interval: Duration) -> Self {
        ProgressBarBuilder::new(maximum, interval).build()
    }

    pub(crate) fn from_shared(shared: Shared) -> Self {
        Self {
            inner: Arc::new(shared),
        }
    }

    // ========================================================================
    // Hot Path
    // ========================================================================

    /// Advances the position by one.
    ///
    /// Nothing is drawn; the change shows up in the next redraw.
    pub fn inc(&self) {
        self.inner.position.fetch_add(1, Ordering::Relaxed);
    }

    /// Advances the position by `delta`.
    pub fn inc_by(&self, delta: u64) {
        self.inner.position.fetch_add(delta, Ordering::Relaxed);
    }

    /// Overwrites the position. Lower values than before are allowed.
    pub fn set_value(&self, value: u64) {
        self.inner.position.store(value, Ordering::Relaxed);
    }

    /// Gets the current position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The value that represents 100%, or zero for a spinner.
    #[must_use]
    pub fn maximum(&self) -> u64 {
        self.inner.maximum
    }

    /// Bar or spinner.
    #[must_use]
    pub fn kind(&self) -> ProgressType {
        self.inner.kind
    }

    /// Whether frames are drawn in place on a terminal rather than appended as lines.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.inner.interactive
    }

    /// Whether [`start`](Self::start) has run and [`complete`](Self::complete) has not.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.frame.lock().lifecycle == Lifecycle::Running
    }

    /// Gets the current status text.
    #[must_use]
    pub fn status(&self) -> CompactString {
        self.inner.frame.lock().status.clone()
    }

    /// Creates a consistent snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let frame = self.inner.frame.lock();
        self.inner.sample(&frame)
    }

    // ========================================================================
    // Status & Lifecycle
    // ========================================================================

    /// Replaces the status line.
    ///
    /// The text is trimmed and line breaks are folded into spaces so it always
    /// renders as a single line. While the bar is running the new status is drawn
    /// immediately instead of waiting for the next tick.
    ///
    /// # Errors
    ///
    /// [`Error::Completed`] once the bar has completed, or [`Error::Io`] if the
    /// immediate redraw could not be written.
    pub fn set_status(&self, status: impl AsRef<str>) -> Result<()> {
        let status = normalize_status(status.as_ref());
        let mut frame = self.inner.frame.lock();

        if frame.lifecycle == Lifecycle::Completed {
            return Err(Error::Completed);
        }

        frame.status = status;
        frame.status_changed = true;

        if frame.lifecycle == Lifecycle::Running {
            self.inner.redraw(&mut frame)?;
        }
        Ok(())
    }

    /// Starts drawing.
    ///
    /// On a terminal the cursor is hidden and blank lines are printed for the frame
    /// to draw over, so earlier terminal output is left alone. Then the background
    /// redraw loop is started.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStarted`] or [`Error::Completed`] if the bar is not fresh, and
    /// [`Error::Io`] if the terminal could not be prepared or the redraw thread could
    /// not be spawned. On error the bar stays unstarted.
    pub fn start(&self) -> Result<()> {
        let shared = &self.inner;
        let mut frame = shared.frame.lock();

        match frame.lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running => return Err(Error::AlreadyStarted),
            Lifecycle::Completed => return Err(Error::Completed),
        }

        if shared.interactive {
            let lines = frame.required_lines();
            let mut buf = Vec::new();
            shared.driver.hide_cursor(&mut buf)?;
            buf.resize(buf.len() + lines, b'\n');
            frame.emit(&buf)?;
            frame.lines_reserved = lines;
        }

        let weak = Arc::downgrade(shared);
        let ticker = Ticker::spawn(shared.interval, move || {
            weak.upgrade().is_some_and(|shared| {
                shared.tick();
                true
            })
        });

        let ticker = match ticker {
            Ok(ticker) => ticker,
            Err(err) => {
                let _ = shared.restore_cursor(&mut frame);
                frame.lines_reserved = 0;
                return Err(err.into());
            }
        };

        *shared.ticker.lock() = Some(ticker);
        frame.lifecycle = Lifecycle::Running;

        tracing::debug!(
            kind = ?shared.kind,
            maximum = shared.maximum,
            interval = ?shared.interval,
            interactive = shared.interactive,
            "progress started"
        );
        Ok(())
    }

    /// Finishes the bar.
    ///
    /// A bounded bar is set to its maximum first, so the last frame always reads
    /// 100%. The redraw loop is stopped and joined, exactly one final frame is
    /// drawn, and on a terminal the cursor is shown again followed by a newline.
    /// Nothing is written to the destination after this returns.
    ///
    /// # Errors
    ///
    /// [`Error::NotStarted`] or [`Error::Completed`] if the bar is not running, and
    /// [`Error::Io`] if the final frame could not be written. The bar is completed
    /// either way.
    pub fn complete(&self) -> Result<()> {
        let shared = &self.inner;

        {
            let mut frame = shared.frame.lock();
            match frame.lifecycle {
                Lifecycle::Running => {}
                Lifecycle::Idle => return Err(Error::NotStarted),
                Lifecycle::Completed => return Err(Error::Completed),
            }
            frame.lifecycle = Lifecycle::Completed;
        }

        if shared.kind == ProgressType::Bar {
            shared.position.store(shared.maximum, Ordering::Relaxed);
        }

        // The frame lock must be free here: an in-flight tick needs it to finish.
        let ticker = shared.ticker.lock().take();
        if let Some(ticker) = ticker {
            ticker.stop();
        }

        let mut frame = shared.frame.lock();
        frame.stopped = Some(Instant::now());
        let drawn = shared.redraw(&mut frame);
        let restored = shared.restore_cursor(&mut frame);

        tracing::debug!(
            position = shared.position.load(Ordering::Relaxed),
            elapsed = ?shared.elapsed(&frame),
            "progress completed"
        );

        drawn?;
        restored?;
        Ok(())
    }
}

impl Shared {
    fn elapsed(&self, frame: &Frame) -> Duration {
        frame.stopped.map_or_else(
            || self.started_at.elapsed(),
            |stopped| stopped.duration_since(self.started_at),
        )
    }

    fn sample(&self, frame: &Frame) -> ProgressSnapshot {
        ProgressSnapshot {
            kind: self.kind,
            position: self.position.load(Ordering::Relaxed),
            maximum: self.maximum,
            elapsed: self.elapsed(frame),
            status: frame.status.clone(),
            running: frame.lifecycle == Lifecycle::Running,
        }
    }

    /// One scheduled redraw. There is no caller to report to, so failures are logged.
    fn tick(&self) {
        let mut frame = self.frame.lock();
        if let Err(err) = self.redraw(&mut frame) {
            tracing::warn!(error = %err, "progress redraw failed");
        }
    }

    /// Draws one frame. The caller holds the frame lock for the whole call.
    ///
    /// The frame bookkeeping only moves forward once the write went through, so a
    /// failed write leaves the cursor accounting matching what is on screen.
    fn redraw(&self, frame: &mut Frame) -> io::Result<()> {
        let snapshot = self.sample(frame);
        let percentage = snapshot.percentage();
        let speed = snapshot.throughput();

        let mut buf = Vec::with_capacity(256);
        let lines = if self.interactive {
            self.compose_terminal(frame, percentage, speed, &mut buf)?
        } else {
            Self::compose_lines(frame, percentage, speed, &mut buf)?;
            0
        };

        tracing::trace!(
            position = snapshot.position,
            ?percentage,
            speed,
            bytes = buf.len(),
            "redraw"
        );
        frame.emit(&buf)?;

        frame.status_changed = false;
        frame.lines_reserved = lines;
        if self.kind == ProgressType::Spinner {
            frame.spinner_phase =
                (frame.spinner_phase + 1) % render::spinner_frames(self.unicode).len();
        }
        Ok(())
    }

    /// Assembles an in-place frame and returns the rows it occupies.
    fn compose_terminal(
        &self,
        frame: &Frame,
        percentage: Option<u8>,
        speed: f64,
        buf: &mut Vec<u8>,
    ) -> io::Result<usize> {
        // Re-queried every frame so the bar follows terminal resizes.
        let width = self.driver.terminal_width().max(1);

        self.driver.move_cursor_up(buf, frame.lines_reserved)?;

        if frame.status_changed {
            write!(buf, "\r{}\r", render::blank_line(width))?;
        }

        if !frame.status.is_empty() {
            writeln!(buf, "{}", render::truncate_status(&frame.status, width))?;
        }

        let line = match percentage {
            Some(percentage) => render::bar_line(percentage, speed, width),
            None => render::spinner_line(frame.spinner_phase, self.unicode, speed, width),
        };
        writeln!(buf, "{line}")?;

        let lines = frame.required_lines();
        if lines < frame.lines_reserved {
            // The status line went away: blank the orphaned last row and stay on it,
            // so moving up by the new line count lands on the bar again.
            write!(buf, "\r{}\r", render::blank_line(width))?;
        }
        Ok(lines)
    }

    fn compose_lines(
        frame: &Frame,
        percentage: Option<u8>,
        speed: f64,
        buf: &mut Vec<u8>,
    ) -> io::Result<()> {
        if frame.status_changed && !frame.status.is_empty() {
            writeln!(buf, "{}", frame.status)?;
        }
        writeln!(buf, "{}", render::log_line(percentage, speed))
    }

    fn restore_cursor(&self, frame: &mut Frame) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let mut buf = Vec::new();
        self.driver.show_cursor(&mut buf)?;
        buf.push(b'\n');
        frame.emit(&buf)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Dropped without `complete`: at least give the cursor back.
        let frame = self.frame.get_mut();
        if frame.lifecycle == Lifecycle::Running && self.interactive {
            let mut buf = Vec::new();
            if self.driver.show_cursor(&mut buf).is_ok() {
                buf.push(b'\n');
                let _ = frame.emit(&buf);
            }
        }
    }
}

/// Trims `text` and folds its line breaks into single spaces.
fn normalize_status(text: &str) -> CompactString {
    let mut out = CompactString::with_capacity(text.len());
    for (i, line) in text.trim().lines().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

/// Rounds `position / maximum` to a whole percentage within `[0, 100]`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage_of(position: u64, maximum: u64) -> u8 {
    if maximum == 0 {
        return 0;
    }
    let percent = (position as f64 * 100.0 / maximum as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

/// A plain-data view of a [`ProgressBar`] at one instant.
///
/// The redraw loop renders from exactly this view, so what a snapshot reports is
/// what the next frame would show.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    kind: ProgressType,
    position: u64,
    maximum: u64,
    elapsed: Duration,
    status: CompactString,
    running: bool,
}

impl ProgressSnapshot {
    /// Returns the type of progress indicator.
    #[must_use]
    pub const fn kind(&self) -> ProgressType {
        self.kind
    }

    /// Returns the position.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns the maximum, zero for spinners.
    #[must_use]
    pub const fn maximum(&self) -> u64 {
        self.maximum
    }

    /// Time since the bar was constructed, frozen once it completed.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the status text.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns whether the bar was running.
    #[must_use]
    pub const fn running(&self) -> bool {
        self.running
    }

    /// Completion percentage clamped to `0..=100`. `None` for spinners.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        match self.kind {
            ProgressType::Bar => Some(percentage_of(self.position, self.maximum)),
            ProgressType::Spinner => None,
        }
    }

    /// Average items per second since construction.
    ///
    /// Returns `0.0` while the elapsed time is still effectively zero.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= MIN_ELAPSED_SECS {
            return 0.0;
        }
        self.position as f64 / secs
    }
}
