//! Fixed-period tick driver for the dashboard simulator.
//!
//! A single tokio task owns the interval and awaits each callback before
//! polling for the next tick, so invocations never overlap.  Shutdown is
//! checked ahead of every tick; once [`Ticker::cancel`] returns, the callback
//! will not run again.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a running tick loop.  Dropping it aborts the loop.
pub struct Ticker {
    period: Duration,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<u64>>,
}

impl Ticker {
    /// Call `on_tick` every `period`, starting one period from now.
    ///
    /// Must be called from within a tokio runtime.  Panics if `period` is
    /// zero.
    pub fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            // A slow tick pushes the schedule back instead of bursting.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut fired: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    // Resolves on an explicit cancel and when the sender is dropped.
                    _ = &mut rx => break,
                    _ = interval.tick() => {
                        on_tick().await;
                        fired += 1;
                    }
                }
            }

            debug!(ticks = fired, "ticker stopped");
            fired
        });

        Self {
            period,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stop the loop and wait for it to exit.  Returns how many ticks ran.
    ///
    /// A tick already in progress is allowed to finish; none starts after.
    pub async fn cancel(mut self) -> u64 {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => match task.await {
                Ok(fired) => fired,
                Err(e) => {
                    warn!("ticker task ended abnormally: {e}");
                    0
                }
            },
            None => 0,
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;

    fn counting(period: Duration) -> (Ticker, Arc<AtomicU64>) {
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        let ticker = Ticker::spawn(period, move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (ticker, count)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let (ticker, count) = counting(Duration::from_millis(2000));

        tokio::time::sleep(Duration::from_millis(1_999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "first tick is one period out");

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        assert_eq!(ticker.cancel().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_cancel() {
        let (ticker, count) = counting(Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        let ran = ticker.cancel().await;
        let at_cancel = count.load(Ordering::SeqCst);
        assert_eq!(ran, at_cancel);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_loop() {
        let (ticker, count) = counting(Duration::from_secs(2));

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        drop(ticker);
        let at_drop = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_never_overlap() {
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));
        let count = Arc::new(AtomicU64::new(0));

        let (b, o, c) = (Arc::clone(&busy), Arc::clone(&overlapped), Arc::clone(&count));
        let ticker = Ticker::spawn(Duration::from_millis(100), move || {
            let (b, o, c) = (Arc::clone(&b), Arc::clone(&o), Arc::clone(&c));
            async move {
                if b.swap(true, Ordering::SeqCst) {
                    o.store(true, Ordering::SeqCst);
                }
                // Each tick outlasts the period.
                tokio::time::sleep(Duration::from_millis(350)).await;
                b.store(false, Ordering::SeqCst);
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        ticker.cancel().await;

        assert!(!overlapped.load(Ordering::SeqCst), "ticks ran concurrently");
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_waits_for_in_flight_tick() {
        let finished = Arc::new(AtomicU64::new(0));
        let f = Arc::clone(&finished);
        let ticker = Ticker::spawn(Duration::from_millis(100), move || {
            let f = Arc::clone(&f);
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                f.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Land in the middle of the first tick.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let ran = ticker.cancel().await;

        assert_eq!(ran, 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_panicking_tick_returns_zero() {
        let ticker = Ticker::spawn(Duration::from_millis(100), || async {
            panic!("tick failed");
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(ticker.cancel().await, 0);
    }

    #[tokio::test]
    async fn reports_period() {
        let (ticker, _) = counting(Duration::from_millis(2000));
        assert_eq!(ticker.period(), Duration::from_millis(2000));
        ticker.cancel().await;
    }
}
