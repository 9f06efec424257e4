#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tty_progress::{Destination, ProgressBar, ProgressBarBuilder, TerminalDriver};

/// Interval long enough that no scheduled redraw fires during a test.
pub const NEVER: Duration = Duration::from_secs(3600);

/// Installs a test-writer tracing subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A writer that keeps every `write` call as a separate chunk.
#[derive(Clone, Default)]
pub struct RecordedWrites {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordedWrites {
    pub fn chunks(&self) -> Vec<String> {
        self.chunks
            .lock()
            .expect("recorder lock poisoned")
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().expect("recorder lock poisoned").len()
    }

    pub fn text(&self) -> String {
        self.chunks().concat()
    }
}

impl Write for RecordedWrites {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.chunks
            .lock()
            .expect("recorder lock poisoned")
            .push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A driver that claims to be a terminal of a fixed width and emits ANSI sequences.
pub struct FakeTerminal {
    width: AtomicUsize,
}

impl FakeTerminal {
    pub fn new(width: usize) -> Self {
        Self {
            width: AtomicUsize::new(width),
        }
    }
}

impl TerminalDriver for FakeTerminal {
    fn is_interactive(&self, _destination: &Destination) -> bool {
        true
    }

    fn supports_unicode(&self) -> bool {
        false
    }

    fn hide_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"\x1b[?25l")
    }

    fn show_cursor(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"\x1b[?25h")
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
        self.width.load(Ordering::SeqCst)
    }
}

/// A bar drawing line-mode output into a recorder.
pub fn line_mode_bar(maximum: u64, interval: Duration) -> (ProgressBar, RecordedWrites) {
    let out = RecordedWrites::default();
    let bar = ProgressBarBuilder::new(maximum, interval)
        .writer(out.clone())
        .build();
    (bar, out)
}

/// A bar drawing in-place frames into a recorder through [`FakeTerminal`].
pub fn terminal_bar(
    maximum: u64,
    interval: Duration,
    width: usize,
) -> (ProgressBar, RecordedWrites) {
    let out = RecordedWrites::default();
    let bar = ProgressBarBuilder::new(maximum, interval)
        .writer(out.clone())
        .driver(Arc::new(FakeTerminal::new(width)))
        .build();
    (bar, out)
}
