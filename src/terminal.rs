//! Terminal capabilities consumed by the redraw engine.
//!
//! The engine never talks to the operating system directly. Everything platform
//! specific (is this a terminal, how wide is it, how do I move the cursor) sits
//! behind [`TerminalDriver`]. [`ConsoleDriver`] is the default implementation and
//! leans on the `console` crate for the queries, which already knows how to answer
//! them on Unix and Windows.
//!
//! Cursor operations append their control sequences to a caller-supplied buffer
//! instead of writing to a stream themselves. The engine assembles a whole frame in
//! memory and hands it to the destination with a single write, so a frame is never
//! torn apart by another writer.

use std::{
    fmt,
    io::{self, Write},
};

use console::Term;

/// Width reported when the terminal cannot be queried.
pub const FALLBACK_WIDTH: usize = 80;

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";

/// Where the progress output goes.
#[derive(Default)]
pub enum Destination {
    /// The process's standard error stream.
    #[default]
    Stderr,
    /// The process's standard output stream.
    Stdout,
    /// Any other append-only sink: a file, a pipe, an in-memory buffer.
    ///
    /// The box hides what is behind it, so [`ConsoleDriver`] always treats a writer
    /// as non-interactive, even a `File` opened on a tty such as `/dev/tty`. To draw
    /// in place on such a handle, pass a driver that answers `true` through
    /// [`ProgressBarBuilder::driver`](crate::ProgressBarBuilder::driver).
    Writer(Box<dyn Write + Send>),
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("Stderr"),
            Self::Stdout => f.write_str("Stdout"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl Destination {
    /// Wraps an arbitrary writer.
    pub fn writer(w: impl Write + Send + 'static) -> Self {
        Self::Writer(Box::new(w))
    }

    pub(crate) fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Self::Stderr => Box::new(io::stderr()),
            Self::Stdout => Box::new(io::stdout()),
            Self::Writer(w) => w,
        }
    }
}

/// Platform terminal control as seen by the redraw engine.
///
/// Implementations must not fail on queries: a terminal that cannot answer is
/// treated as a narrower feature set, never as an error.
pub trait TerminalDriver: Send + Sync {
    /// Whether `destination` is a real terminal that supports cursor movement.
    fn is_interactive(&self, destination: &Destination) -> bool;

    /// Whether the terminal can display the braille spinner glyphs.
    fn supports_unicode(&self) -> bool {
        true
    }

    /// Appends the sequence that hides the cursor.
    fn hide_cursor(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Appends the sequence that shows the cursor.
    fn show_cursor(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Appends the sequence that moves the cursor `n` lines up. `n == 0` writes nothing.
    fn move_cursor_up(&self, out: &mut dyn Write, n: usize) -> io::Result<()>;

    /// Appends the sequence that moves the cursor `n` lines down. `n == 0` writes nothing.
    fn move_cursor_down(&self, out: &mut dyn Write, n: usize) -> io::Result<()>;

    /// Current terminal width in columns, or [`FALLBACK_WIDTH`] when unknown.
    fn terminal_width(&self) -> usize;
}

/// [`TerminalDriver`] backed by the `console` crate and ANSI control sequences.
#[derive(Clone, Debug)]
pub struct ConsoleDriver {
    term: Term,
}

impl Default for ConsoleDriver {
    fn default() -> Self {
        Self::stderr()
    }
}

impl ConsoleDriver {
    /// Driver that queries the standard error terminal.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// Driver that queries the standard output terminal.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Picks the terminal matching `destination`.
    ///
    /// Plain writers are never interactive, so the choice only matters for width
    /// queries and stderr is as good as any.
    #[must_use]
    pub fn for_destination(destination: &Destination) -> Self {
        match destination {
            Destination::Stdout => Self::stdout(),
            Destination::Stderr | Destination::Writer(_) => Self::stderr(),
        }
    }
}

impl TerminalDriver for ConsoleDriver {
    fn is_interactive(&self, destination: &Destination) -> bool {
        match destination {
            Destination::Stderr => Term::stderr().is_term(),
            Destination::Stdout => Term::stdout().is_term(),
            Destination::Writer(_) => false,
        }
    }

    fn supports_unicode(&self) -> bool {
        self.term.features().wants_emoji()
    }

    fn hide_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(CURSOR_HIDE.as_bytes())
    }

    fn show_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(CURSOR_SHOW.as_bytes())
    }

    fn move_cursor_up(&self, out: &mut dyn Write, n: usize) -> io::Result<()> {
        if n > 0 {
            write!(out, "\x1b[{n}A")?;
        }
        Ok(())
    }

    fn move_cursor_down(&self, out: &mut dyn Write, n: usize) -> io::Result<()> {
        if n > 0 {
            write!(out, "\x1b[{n}B")?;
        }
        Ok(())
    }

    fn terminal_width(&self) -> usize {
        self.term
            .size_checked()
            .map(|(_rows, cols)| usize::from(cols))
            .filter(|&cols| cols > 0)
            .unwrap_or(FALLBACK_WIDTH)
    }
}
