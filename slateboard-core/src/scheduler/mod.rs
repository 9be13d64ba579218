/*
    scheduler - Focus-aware poll scheduler

    Two-state machine that drives periodic fetches while the window has
    focus and goes quiet otherwise:

      Active  --blur-->  Paused   (pending tick cancelled)
      Paused  --focus--> Active   (immediate fetch, timer restarted)
      Active  --tick-->  Active   (fetch, then rearm after the interval)

    Exactly one timer deadline is live at any time. All arming goes
    through ensure_running/rearm, which are idempotent check-and-set
    operations, so independent code paths cannot stack duplicate timers.
*/

use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Window focused, periodic fetches running
    Active,
    /// Window blurred, no fetches until refocus
    Paused,
}

/// Timer-driven poll scheduler for one document
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    state: PollState,
    next_tick: Option<Instant>,
}

impl PollScheduler {
    /// Create an Active scheduler whose first tick fires immediately,
    /// giving the initial fetch on startup.
    pub fn new(interval: Duration) -> Self {
        PollScheduler { interval, state: PollState::Active, next_tick: Some(Instant::now()) }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a tick is scheduled
    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Window lost focus: cancel the pending tick. An already in-flight
    /// fetch is not affected; its result is reconciled when it lands.
    pub fn pause(&mut self) {
        self.state = PollState::Paused;
        self.next_tick = None;
    }

    /// Window gained focus: fetch immediately once and resume the
    /// periodic timer. Idempotent when already Active.
    pub fn resume(&mut self) {
        if self.state == PollState::Paused {
            self.state = PollState::Active;
            self.next_tick = Some(Instant::now());
        } else {
            self.ensure_running();
        }
    }

    /// Arm the timer if Active and nothing is scheduled yet. This is the
    /// single entry point callers use after a fetch or push completes;
    /// calling it any number of times leaves exactly one live deadline.
    pub fn ensure_running(&mut self) {
        if self.state == PollState::Active && self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.interval);
        }
    }

    /// Schedule the next tick one interval out, replacing any pending
    /// deadline. No-op while Paused.
    pub fn rearm(&mut self) {
        if self.state == PollState::Active {
            self.next_tick = Some(Instant::now() + self.interval);
        }
    }

    /// Wait for the next tick. Pends forever while Paused or disarmed,
    /// which makes this safe to race in a select loop. The deadline is
    /// consumed on firing; the caller rearms once its fetch completes.
    pub async fn tick(&mut self) {
        match self.next_tick {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.next_tick = None;
            }
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    const INTERVAL: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_initial_tick_is_immediate() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        assert_eq!(scheduler.state(), PollState::Active);
        // No time advance needed: the startup tick is due at once
        timeout(Duration::from_millis(1), scheduler.tick())
            .await
            .expect("startup tick should fire immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_consumes_deadline_until_rearmed() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        scheduler.tick().await;
        assert!(!scheduler.is_armed());

        scheduler.rearm();
        assert!(scheduler.is_armed());
        advance(INTERVAL).await;
        timeout(Duration::from_millis(1), scheduler.tick())
            .await
            .expect("rearmed tick should fire after one interval");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_scheduler_never_ticks() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        scheduler.tick().await;
        scheduler.rearm();
        scheduler.pause();
        assert_eq!(scheduler.state(), PollState::Paused);
        assert!(!scheduler.is_armed());

        advance(INTERVAL * 10).await;
        assert!(
            timeout(Duration::from_millis(1), scheduler.tick()).await.is_err(),
            "no tick may fire while paused"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_fires_exactly_one_immediate_tick() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        scheduler.tick().await;
        scheduler.pause();
        scheduler.resume();
        assert_eq!(scheduler.state(), PollState::Active);

        timeout(Duration::from_millis(1), scheduler.tick())
            .await
            .expect("refocus tick should fire immediately");
        // Deadline consumed: a second tick needs a rearm plus an interval
        assert!(timeout(Duration::from_millis(1), scheduler.tick()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_running_is_idempotent() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        scheduler.tick().await;

        scheduler.ensure_running();
        let first_deadline_fires_after = INTERVAL;
        // Re-arming from other code paths must not move or duplicate the deadline
        advance(first_deadline_fires_after / 2).await;
        scheduler.ensure_running();
        scheduler.ensure_running();

        advance(first_deadline_fires_after / 2).await;
        timeout(Duration::from_millis(1), scheduler.tick())
            .await
            .expect("single deadline should fire on the original schedule");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_running_is_noop_while_paused() {
        let mut scheduler = PollScheduler::new(INTERVAL);
        scheduler.tick().await;
        scheduler.pause();
        scheduler.ensure_running();
        assert!(!scheduler.is_armed());
    }
}
