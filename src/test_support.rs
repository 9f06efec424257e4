//! Test doubles shared by the unit tests.

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::terminal::{Destination, TerminalDriver};

/// A writer that keeps every `write` call as its own chunk.
///
/// The engine emits one write per frame, so each chunk is one frame.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl Recorder {
    pub(crate) fn chunks(&self) -> Vec<String> {
        self.chunks
            .lock()
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }

    pub(crate) fn text(&self) -> String {
        self.chunks().concat()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "recorder closed"));
        }
        self.chunks.lock().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A terminal driver with a fixed answer to every question.
///
/// Cursor operations write readable markers (`<up:2>`) instead of escape codes.
pub(crate) struct ScriptedDriver {
    interactive: bool,
    unicode: bool,
    width: AtomicUsize,
}

impl ScriptedDriver {
    pub(crate) fn terminal(width: usize) -> Self {
        Self {
            interactive: true,
            unicode: true,
            width: AtomicUsize::new(width),
        }
    }

    pub(crate) fn line_mode() -> Self {
        Self {
            interactive: false,
            ..Self::terminal(80)
        }
    }

    pub(crate) fn ascii(self) -> Self {
        Self {
            unicode: false,
            ..self
        }
    }

    pub(crate) fn set_width(&self, width: usize) {
        self.width.store(width, Ordering::SeqCst);
    }
}

impl TerminalDriver for ScriptedDriver {
    fn is_interactive(&self, _destination: &Destination) -> bool {
        self.interactive
    }

    fn supports_unicode(&self) -> bool {
        self.unicode
    }

    fn hide_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"<hide>")
    }

    fn show_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"<show>")
    }

    fn move_cursor_up(&self, out: &mut dyn Write, n: usize) -> io::Result<()> {
        if n > 0 {
            write!(out, "<up:{n}>")?;
        }
        Ok(())
    }

    fn move_cursor_down(&self, out: &mut dyn Write, n: usize) -> io::Result<()> {
        if n > 0 {
            write!(out, "<down:{n}>")?;
        }
        Ok(())
    }

    fn terminal_width(&self) -> usize {
        self.width.load(Ordering::SeqCst)
    }
}
