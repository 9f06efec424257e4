//! Background redraw scheduler.
//!
//! A [`Ticker`] owns one named thread that calls a closure on a fixed interval until
//! told to stop. The stop signal is a flag behind a [`Condvar`], so a sleeping thread
//! wakes up immediately instead of finishing its interval. A tick that is already
//! running always finishes first; the flag is only looked at between ticks.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use web_time::Instant;

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        *self.stopped.lock() = true;
        self.cvar.notify_all();
    }

    /// Sleeps until `deadline` or until the signal is raised. Returns `true` if raised.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.cvar.wait_for(&mut stopped, deadline - now);
        }
        *stopped
    }
}

/// Handle to a periodic background task.
pub(crate) struct Ticker {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the task thread. `tick` returns `false` to end the loop on its own.
    pub(crate) fn spawn<F>(interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("progress-redraw".into())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                while !thread_signal.wait_until(deadline) {
                    if !tick() {
                        break;
                    }
                    // Skip missed ticks rather than firing a burst to catch up.
                    deadline = (deadline + interval).max(Instant::now());
                }
            })?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Raises the stop signal and waits for the thread to exit.
    ///
    /// When this returns, no tick is running and none will run again.
    pub(crate) fn stop(mut self) {
        self.signal.raise();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("redraw thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // Never join here: the last owner may be the ticker thread itself.
        self.signal.raise();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use web_time::Instant;

    use super::Ticker;

    #[test]
    fn test_ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let ticker = Ticker::spawn(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        ticker.stop();

        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop > 0, "ticker should have fired at least once");

        thread::sleep(Duration::from_millis(20));
        assert_eq!(
            count.load(Ordering::SeqCst),
            after_stop,
            "no tick may run after stop returns"
        );
    }

    #[test]
    fn test_stop_interrupts_long_interval() {
        let ticker = Ticker::spawn(Duration::from_secs(3600), || true).unwrap();

        let begin = Instant::now();
        ticker.stop();

        assert!(begin.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_tick_can_end_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let ticker = Ticker::spawn(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst) < 2
        })
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        ticker.stop();

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
