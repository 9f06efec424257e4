//! Iterator adapters for automatic progress tracking.
//!
//! [`ProgressIteratorExt`] adds three methods to every [`Iterator`]:
//!
//! * [`progress_with`](ProgressIteratorExt::progress_with) counts items on a bar you
//!   already own and manage.
//! * [`progress`](ProgressIteratorExt::progress) creates a bar on standard error
//!   ([`progress_from`](ProgressIteratorExt::progress_from) takes a builder instead),
//!   starts it when the first item is requested and completes it once the iterator
//!   runs dry.
//!
//! # Heuristics
//!
//! [`progress`](ProgressIteratorExt::progress) checks [`Iterator::size_hint`]: an
//! exact size becomes the bar's maximum, anything else gets a spinner.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use tty_progress::ProgressIteratorExt;
//!
//! for file in ["a.txt", "b.txt"].iter().progress(Duration::from_millis(100)) {
//!     // ...
//! #   let _ = file;
//! }
//! ```

use std::time::Duration;

use crate::{ProgressBar, ProgressBarBuilder};

/// An iterator adapter that advances a [`ProgressBar`] once per yielded item.
pub struct ProgressIter<I> {
    iter: I,
    bar: ProgressBar,
    managed: bool,
    started: bool,
    finished: bool,
}

impl<I> ProgressIter<I> {
    /// Wraps `iter`, counting items on `bar` without touching its lifecycle.
    ///
    /// Note: This is usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, bar: ProgressBar) -> Self {
        Self {
            iter,
            bar,
            managed: false,
            started: false,
            finished: false,
        }
    }

    /// The bar this iterator advances.
    #[must_use]
    pub const fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    fn managed(iter: I, bar: ProgressBar) -> Self {
        let mut this = Self::new(iter, bar);
        this.managed = true;
        this
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.managed && !self.started {
            self.started = true;
            if let Err(err) = self.bar.start() {
                tracing::warn!(error = %err, "could not start iterator progress");
            }
        }

        let item = self.iter.next();

        if item.is_some() {
            self.bar.inc();
        } else if self.managed && !self.finished {
            self.finished = true;
            if let Err(err) = self.bar.complete() {
                tracing::warn!(error = %err, "could not complete iterator progress");
            }
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach progress tracking to any Iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Wraps the iterator in a self-managing bar drawn to standard error.
    ///
    /// The bar starts on the first call to `next` and completes when the iterator
    /// is exhausted.
    fn progress(self, interval: Duration) -> ProgressIter<Self> {
        let maximum = exact_len(&self).unwrap_or(0);
        ProgressIter::managed(self, ProgressBar::new(maximum, interval))
    }

    /// Like [`progress`](Self::progress), with the bar configured by `builder`.
    ///
    /// The builder's maximum is replaced by the iterator's exact length if it has one.
    fn progress_from(self, builder: ProgressBarBuilder) -> ProgressIter<Self> {
        let builder = match exact_len(&self) {
            Some(len) => builder.maximum(len),
            None => builder,
        };
        ProgressIter::managed(self, builder.build())
    }

    /// Counts items on an existing bar. Starting and completing it stays with the caller.
    fn progress_with(self, bar: ProgressBar) -> ProgressIter<Self> {
        ProgressIter::new(self, bar)
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}

fn exact_len<I: Iterator>(iter: &I) -> Option<u64> {
    match iter.size_hint() {
        (lower, Some(upper)) if lower == upper => Some(upper as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::ProgressIteratorExt as _;
    use crate::{
        ProgressBar, ProgressBarBuilder, ProgressType, TerminalDriver,
        test_support::{Recorder, ScriptedDriver},
    };

    const NEVER: Duration = Duration::from_secs(3600);

    #[test]
    fn test_progress_with_counts_items() {
        let bar = ProgressBar::new(5, NEVER);
        let count = [1, 2, 3, 4, 5].iter().progress_with(bar.clone()).count();

        assert_eq!(count, 5);
        assert_eq!(bar.position(), 5);
        assert!(!bar.is_running(), "lifecycle stays with the caller");
    }

    #[test]
    fn test_managed_bar_runs_full_lifecycle() {
        let out = Recorder::default();
        let builder = ProgressBarBuilder::new(0, NEVER)
            .writer(out.clone())
            .driver(Arc::new(ScriptedDriver::line_mode()) as Arc<dyn TerminalDriver>);

        let iter = (0..4).progress_from(builder);
        let bar = iter.bar().clone();
        assert_eq!(bar.kind(), ProgressType::Bar, "exact size hint gives a bar");
        assert_eq!(bar.maximum(), 4);

        let sum: i32 = iter.sum();

        assert_eq!(sum, 6);
        assert!(!bar.is_running());
        assert!(out.text().starts_with("100% ("));
    }

    #[test]
    fn test_unknown_length_gives_spinner() {
        let iter = (0..10).filter(|n| n % 2 == 0).progress(NEVER);
        assert_eq!(iter.bar().kind(), ProgressType::Spinner);
    }
}
