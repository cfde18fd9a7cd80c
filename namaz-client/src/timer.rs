use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Snapshot of a countdown.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub remaining_secs: u64,
    pub running: bool,
    pub complete: bool,
}

/// Result of advancing the countdown by one tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Timer is stopped or already finished; nothing changed.
    Idle,
    Counting(u64),
    /// Remaining time just reached zero. Reported once.
    Completed,
}

/// Countdown from a configurable duration. Pure state; something else
/// has to call [`CountdownTimer::tick`] once per second.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    initial_secs: u64,
    remaining_secs: u64,
    running: bool,
    complete: bool,
}

impl CountdownTimer {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            initial_secs,
            remaining_secs: initial_secs,
            running: false,
            complete: false,
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(minutes.saturating_mul(60))
    }

    pub fn initial_secs(&self) -> u64 {
        self.initial_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            remaining_secs: self.remaining_secs,
            running: self.running,
            complete: self.complete,
        }
    }

    pub fn start(&mut self) {
        if self.running || self.complete {
            return;
        }
        if self.remaining_secs == 0 {
            self.complete = true;
            return;
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.remaining_secs = self.initial_secs;
        self.running = false;
        self.complete = false;
    }

    /// Reset with a new initial duration.
    pub fn reset_to(&mut self, initial_secs: u64) {
        self.initial_secs = initial_secs;
        self.reset();
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running || self.remaining_secs == 0 {
            return Tick::Idle;
        }
        self.remaining_secs -= 1;
        if self.remaining_secs == 0 {
            self.running = false;
            self.complete = true;
            return Tick::Completed;
        }
        Tick::Counting(self.remaining_secs)
    }

    /// Elapsed share of the initial duration, in percent.
    pub fn progress(&self) -> f64 {
        if self.initial_secs == 0 {
            return 100.0;
        }
        let elapsed = self.initial_secs.saturating_sub(self.remaining_secs);
        (elapsed as f64 / self.initial_secs as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn formatted(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }
}

/// `MM:SS` with zero padding. No hour rollover: 100 minutes prints as `100:00`.
pub fn format_mm_ss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// A [`CountdownTimer`] driven by a tokio interval. The interval exists only
/// while the timer runs, so pausing, resetting or dropping the clock stops
/// all further ticks.
#[derive(Debug)]
pub struct CountdownClock {
    timer: CountdownTimer,
    ticker: Option<Interval>,
}

impl CountdownClock {
    pub fn new(timer: CountdownTimer) -> Self {
        Self {
            timer,
            ticker: None,
        }
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn start(&mut self) {
        self.timer.start();
        if self.timer.is_running() && self.ticker.is_none() {
            let mut iv = tokio::time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.ticker = Some(iv);
            debug!(remaining = self.timer.remaining_secs(), "countdown: ticking");
        }
    }

    pub fn pause(&mut self) {
        self.timer.pause();
        self.ticker = None;
    }

    pub fn reset(&mut self) {
        self.timer.reset();
        self.ticker = None;
    }

    /// Wait for the next tick and apply it. Never resolves while stopped.
    pub async fn next_tick(&mut self) -> Tick {
        let Some(ticker) = self.ticker.as_mut() else {
            return std::future::pending().await;
        };
        ticker.tick().await;
        let outcome = self.timer.tick();
        if !self.timer.is_running() {
            self.ticker = None;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(timer: &mut CountdownTimer) -> u64 {
        let mut ticks = 0;
        loop {
            match timer.tick() {
                Tick::Counting(_) => ticks += 1,
                Tick::Completed => return ticks + 1,
                Tick::Idle => return ticks,
            }
        }
    }

    #[test]
    fn runs_to_zero_in_exactly_initial_ticks() {
        for d in [1u64, 2, 5, 60, 600] {
            let mut t = CountdownTimer::new(d);
            t.start();
            assert_eq!(run_to_end(&mut t), d);
            assert_eq!(t.remaining_secs(), 0);
            assert!(t.is_complete());
            assert!(!t.is_running());
            assert_eq!(t.tick(), Tick::Idle);
            assert_eq!(t.remaining_secs(), 0);
        }
    }

    #[test]
    fn completion_is_reported_once() {
        let mut t = CountdownTimer::new(1);
        t.start();
        assert_eq!(t.tick(), Tick::Completed);
        assert_eq!(t.tick(), Tick::Idle);
        t.start();
        assert!(!t.is_running());
        assert_eq!(t.tick(), Tick::Idle);
    }

    #[test]
    fn reset_restores_initial_from_any_state() {
        let mut fresh = CountdownTimer::new(30);
        fresh.reset();
        assert_eq!(fresh.state(), TimerState { remaining_secs: 30, running: false, complete: false });

        let mut running = CountdownTimer::new(30);
        running.start();
        running.tick();
        running.reset();
        assert_eq!(running.state(), TimerState { remaining_secs: 30, running: false, complete: false });

        let mut paused = CountdownTimer::new(30);
        paused.start();
        paused.tick();
        paused.pause();
        paused.reset();
        assert_eq!(paused.remaining_secs(), 30);

        let mut done = CountdownTimer::new(2);
        done.start();
        run_to_end(&mut done);
        done.reset();
        assert_eq!(done.state(), TimerState { remaining_secs: 2, running: false, complete: false });
    }

    #[test]
    fn reset_to_changes_duration() {
        let mut t = CountdownTimer::from_minutes(10);
        t.reset_to(90);
        assert_eq!(t.initial_secs(), 90);
        assert_eq!(t.formatted(), "01:30");
    }

    #[test]
    fn pause_keeps_remaining_and_stops_ticks() {
        let mut t = CountdownTimer::new(10);
        t.start();
        t.tick();
        t.tick();
        t.pause();
        assert_eq!(t.tick(), Tick::Idle);
        assert_eq!(t.remaining_secs(), 8);
        t.start();
        assert_eq!(t.tick(), Tick::Counting(7));
    }

    #[test]
    fn start_is_noop_when_running() {
        let mut t = CountdownTimer::new(5);
        t.start();
        t.tick();
        t.start();
        assert_eq!(t.remaining_secs(), 4);
        assert!(t.is_running());
    }

    #[test]
    fn zero_duration_completes_on_start() {
        let mut t = CountdownTimer::new(0);
        assert!(!t.is_complete());
        t.start();
        assert!(t.is_complete());
        assert!(!t.is_running());
        assert_eq!(t.progress(), 100.0);
    }

    #[test]
    fn progress_goes_from_zero_to_hundred_monotonically() {
        let mut t = CountdownTimer::new(7);
        assert_eq!(t.progress(), 0.0);
        t.start();
        let mut last = t.progress();
        while t.is_running() {
            t.tick();
            let p = t.progress();
            assert!(p >= last);
            last = p;
        }
        assert_eq!(t.progress(), 100.0);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(65), "01:05");
        assert_eq!(format_mm_ss(600), "10:00");
        assert_eq!(format_mm_ss(5999), "99:59");
    }

    #[tokio::test(start_paused = true)]
    async fn clock_ticks_once_per_second_until_complete() {
        let mut clock = CountdownClock::new(CountdownTimer::new(3));
        clock.start();
        let begin = Instant::now();
        assert_eq!(clock.next_tick().await, Tick::Counting(2));
        assert_eq!(clock.next_tick().await, Tick::Counting(1));
        assert_eq!(clock.next_tick().await, Tick::Completed);
        assert_eq!(begin.elapsed(), Duration::from_secs(3));
        assert!(clock.timer().is_complete());

        let stalled = tokio::time::timeout(Duration::from_secs(10), clock.next_tick()).await;
        assert!(stalled.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_clock_does_not_tick() {
        let mut clock = CountdownClock::new(CountdownTimer::new(60));
        clock.start();
        clock.next_tick().await;
        clock.pause();
        let stalled = tokio::time::timeout(Duration::from_secs(5), clock.next_tick()).await;
        assert!(stalled.is_err());
        assert_eq!(clock.timer().remaining_secs(), 59);
    }
}
