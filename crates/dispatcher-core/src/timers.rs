//! Wall-clock and duration timers driving automatic FSM transitions
//! (spec.md §4.D, §9).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Sleep granularity used by [`run_next_hour_timer`] once within two
/// seconds of the boundary, and the threshold for switching to it: avoids
/// drifting off a long single `sleep` by resyncing wall-clock time near
/// the boundary without busy-waiting (spec.md §4.E).
const COARSE_GRANULARITY: Duration = Duration::from_secs(2);
const FINE_THRESHOLD: Duration = Duration::from_millis(300);

/// Seconds elapsed since the current wall-clock hour began.
pub fn wall_clock_seconds_past_hour() -> f64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    since_epoch.as_secs_f64() % 3600.0
}

/// Seconds until the next full wall-clock hour, given seconds already
/// elapsed since the last one.
pub fn seconds_until_next_hour(now_wall_secs_past_hour: f64) -> Duration {
    Duration::from_secs_f64((3600.0 - now_wall_secs_past_hour).max(0.0))
}

/// Sleeps until the next `HH:00:00`, re-reading the wall clock on every
/// coarse step so a backward clock jump simply produces a larger
/// recomputed remainder on the next iteration (spec.md §4.E), rather than
/// firing early or late against a remainder computed once up front.
pub async fn run_next_hour_timer() {
    loop {
        let remaining = seconds_until_next_hour(wall_clock_seconds_past_hour());
        if remaining <= FINE_THRESHOLD {
            tokio::time::sleep(remaining).await;
            return;
        }
        let step = remaining.saturating_sub(FINE_THRESHOLD).min(COARSE_GRANULARITY);
        tokio::time::sleep(step.max(Duration::from_millis(1))).await;
    }
}

/// A cancellable, independently-queryable background timer.
///
/// Wraps a `JoinHandle` so callers can ask "is this timer still running"
/// before deciding whether to replace it — the exact question the original
/// immediate-release timer got wrong (spec.md §9).
pub struct CancelableTimer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CancelableTimer {
    pub fn new() -> CancelableTimer {
        CancelableTimer { handle: Mutex::new(None) }
    }

    /// True if a timer is currently running (not yet fired, not cancelled).
    pub async fn is_running(&self) -> bool {
        match &*self.handle.lock().await {
            Some(h) => !h.is_finished(),
            None => false,
        }
    }

    /// Starts `fut` as the new timer, aborting any timer already running.
    pub async fn restart<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.handle.lock().await;
        if let Some(old) = guard.take() {
            old.abort();
        }
        *guard = Some(tokio::spawn(fut));
    }

    /// Starts `fut` as the new timer only if no timer is running right now.
    /// This is the bug-fixed guard from spec.md §9: the original skipped
    /// restart only when a timer object existed *and* had already
    /// completed, which meant the very first call (no timer object at all)
    /// fell through to the same "don't start" branch by accident in one
    /// code path. Here "no timer or a finished timer" is the single
    /// explicit condition for starting a new one.
    pub async fn start_if_idle<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.handle.lock().await;
        let idle = match &*guard {
            None => true,
            Some(h) => h.is_finished(),
        };
        if idle {
            *guard = Some(tokio::spawn(fut));
        }
    }

    pub async fn cancel(&self) {
        if let Some(h) = self.handle.lock().await.take() {
            h.abort();
        }
    }
}

impl Default for CancelableTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelableTimer {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.handle.try_lock()
            && let Some(h) = guard.take()
        {
            h.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn seconds_until_next_hour_at_boundary_is_zero() {
        assert_eq!(seconds_until_next_hour(3600.0), Duration::ZERO);
    }

    #[test]
    fn seconds_until_next_hour_midway() {
        assert_eq!(seconds_until_next_hour(1800.0), Duration::from_secs(1800));
    }

    #[test]
    fn wall_clock_seconds_past_hour_is_in_range() {
        let s = wall_clock_seconds_past_hour();
        assert!((0.0..3600.0).contains(&s));
    }

    #[tokio::test]
    async fn start_if_idle_replaces_only_when_finished_or_absent() {
        let timer = CancelableTimer::new();
        let runs = Arc::new(AtomicU32::new(0));

        // No timer yet: starts.
        let r = runs.clone();
        timer.start_if_idle(async move { r.fetch_add(1, Ordering::SeqCst); }).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Finished timer: starts again.
        let r = runs.clone();
        timer.start_if_idle(async move { r.fetch_add(1, Ordering::SeqCst); }).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        // Still-running timer: does not replace it.
        let r = runs.clone();
        timer
            .start_if_idle(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                r.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        assert!(timer.is_running().await);
        let r = runs.clone();
        timer.start_if_idle(async move { r.fetch_add(1, Ordering::SeqCst); }).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2, "long-running timer should not be replaced");
    }

    #[tokio::test]
    async fn restart_always_replaces_and_cancels_the_old_one() {
        let timer = CancelableTimer::new();
        let runs = Arc::new(AtomicU32::new(0));

        let r = runs.clone();
        timer
            .restart(async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                r.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        let r = runs.clone();
        timer.restart(async move { r.fetch_add(1, Ordering::SeqCst); }).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1, "only the replacement timer should have run");
    }

    #[tokio::test]
    async fn cancel_stops_a_running_timer() {
        let timer = CancelableTimer::new();
        let ran = Arc::new(AtomicU32::new(0));
        let r = ran.clone();
        timer
            .restart(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                r.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        timer.cancel().await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(!timer.is_running().await);
    }
}
