//! Error handling for `tty_progress`.
//!
//! Only two kinds of failure ever reach a caller:
//!
//! * **Lifecycle misuse**: calling [`start`](crate::ProgressBar::start) twice,
//!   [`complete`](crate::ProgressBar::complete) before starting, or touching a bar
//!   after it completed. These are bugs in the calling code.
//! * **I/O**: the output destination rejected a write.
//!
//! Anything the environment can take away from us (terminal width, cursor control,
//! a sensible elapsed time) degrades the output instead of producing an error.

use std::io;

use thiserror::Error;

/// Errors that can happen while driving a [`ProgressBar`](crate::ProgressBar).
#[derive(Error, Debug)]
pub enum Error {
    /// `start` was called on a bar that is already running.
    #[error("progress bar is already running")]
    AlreadyStarted,

    /// `complete` was called on a bar that was never started.
    #[error("progress bar has not been started")]
    NotStarted,

    /// The bar has already completed; it cannot be reused.
    #[error("progress bar has already completed")]
    Completed,

    /// Writing a frame to the output destination failed.
    ///
    /// Also returned when the redraw thread cannot be spawned.
    #[error("I/O error")]
    Io {
        /// The error reported by the destination or the OS.
        #[from]
        source: io::Error,
    },
}

/// Result type alias for progress bar operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;

    #[test]
    fn test_io_conversion_keeps_source() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed").into();

        match err {
            Error::Io { ref source } => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.to_string(), "I/O error");
    }

    #[test]
    fn test_lifecycle_messages() {
        assert_eq!(
            Error::AlreadyStarted.to_string(),
            "progress bar is already running"
        );
        assert_eq!(Error::NotStarted.to_string(), "progress bar has not been started");
        assert_eq!(Error::Completed.to_string(), "progress bar has already completed");
    }
}
