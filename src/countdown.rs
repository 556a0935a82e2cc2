use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::store::{Timer, TimerKind};

/// remaining/configured duration of a timer
/// copied on every tick, never mutated in place by callers
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Time {
    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    #[must_use]
    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    #[must_use]
    pub const fn total_seconds(self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
}

/// what a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// one second was removed, countdown continues
    Ticked,
    /// the countdown reached 00:00:00 on this tick
    Completed(Completion),
}

/// how a finished countdown resolves, by timer kind
///
/// the engine handles its own part (remaining time, schedule, running flag);
/// store deletion, registry clearing and navigation are ordered side effects
/// owned by the caller, see `global_timer::resolve_completion`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// plain timer: stay idle at zero
    Stop,
    /// interval timer: remaining was reset, still running
    Repeat,
    /// one-time timer: delete from the store and leave the detail view
    DeleteAndExit,
}

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// one-timer countdown state machine: Idle or Running, one decrement per
/// second while running
///
/// at most one engine exists process-wide (it lives in the global timer
/// slot), so at most one tick schedule is ever live
pub struct CountdownEngine {
    timer: Timer,
    remaining: Time,
    state: EngineState,
    /// next tick deadline; `Some` exactly while running
    schedule: Option<Instant>,
    observer: Option<Box<dyn FnMut(bool)>>,
}

impl CountdownEngine {
    #[must_use]
    pub fn new(timer: Timer) -> Self {
        Self {
            remaining: timer.time,
            timer,
            state: EngineState::Idle,
            schedule: None,
            observer: None,
        }
    }

    /// subscribe the running-state-changed notification
    /// called once at engine creation, by whoever keeps the registry in sync
    pub fn set_observer(&mut self, observer: impl FnMut(bool) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    #[must_use]
    pub const fn bound_timer(&self) -> &Timer {
        &self.timer
    }

    #[must_use]
    pub const fn remaining(&self) -> Time {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    /// start ticking; a second start while already running is a caller bug
    /// (the UI shows pause instead of start), so it is logged and ignored
    /// rather than allowed to leak a duplicate schedule
    pub fn start(&mut self, now: Instant) {
        if self.state == EngineState::Running {
            log::error!("start() on a running countdown for {:?}", self.timer.name);
            return;
        }
        if self.remaining.is_zero() {
            self.remaining = self.timer.time;
        }
        self.state = EngineState::Running;
        self.schedule = Some(now + TICK_PERIOD);
        self.notify(true);
    }

    /// stop ticking, keep the partial remaining time; idempotent
    pub fn pause(&mut self) {
        self.schedule = None;
        if self.state == EngineState::Running {
            self.state = EngineState::Idle;
            self.notify(false);
        }
    }

    /// back to the configured duration, not running; idempotent
    pub fn reset(&mut self) {
        self.remaining = self.timer.time;
        self.pause();
    }

    /// run every tick that has come due since the last poll, keeping the
    /// 1-second cadence by advancing the deadline instead of re-reading the
    /// clock; returns the first completion reached, if any
    pub fn poll(&mut self, now: Instant) -> Option<Completion> {
        while self.state == EngineState::Running {
            let due = self.schedule?;
            if due > now {
                return None;
            }
            self.schedule = Some(due + TICK_PERIOD);
            if let TickOutcome::Completed(completion) = self.tick() {
                return Some(completion);
            }
        }
        None
    }

    /// deadline of the next scheduled tick, for repaint scheduling
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.schedule
    }

    /// one decrement step in priority order: seconds, then a minute borrow,
    /// then an hour borrow; the terminal branch fires on the tick that
    /// reaches zero (and guards the already-zero case without decrementing)
    pub(crate) fn tick(&mut self) -> TickOutcome {
        let time = &mut self.remaining;
        if time.seconds > 0 {
            time.seconds -= 1;
        } else if time.minutes > 0 {
            time.minutes -= 1;
            time.seconds = 59;
        } else if time.hours > 0 {
            time.hours -= 1;
            time.minutes = 59;
            time.seconds = 59;
        }
        if !self.remaining.is_zero() {
            return TickOutcome::Ticked;
        }
        TickOutcome::Completed(match self.timer.kind {
            TimerKind::OneTime => {
                self.schedule = None;
                self.state = EngineState::Idle;
                self.notify(false);
                Completion::DeleteAndExit
            }
            // no pause in between: a new running period starts on the same cadence
            TimerKind::Interval => {
                self.remaining = self.timer.time;
                Completion::Repeat
            }
            TimerKind::Standard => {
                self.pause();
                Completion::Stop
            }
        })
    }

    fn notify(&mut self, running: bool) {
        if let Some(observer) = &mut self.observer {
            observer(running);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Completion, CountdownEngine, TickOutcome, Time};
    use crate::store::{SoundFile, Timer, TimerKind};

    fn timer(time: Time, kind: TimerKind) -> Timer {
        Timer {
            id: "t-1".to_string(),
            name: "tea".to_string(),
            time,
            color: "#FF5733".to_string(),
            volume: 0.8,
            sound_file: SoundFile::default_sound(),
            kind,
        }
    }

    fn engine(time: Time, kind: TimerKind) -> CountdownEngine {
        CountdownEngine::new(timer(time, kind))
    }

    #[test]
    fn tick_decreases_by_exactly_one_second() {
        let mut engine = engine(Time::new(0, 0, 5), TimerKind::Standard);
        for expected in [4, 3, 2, 1] {
            assert_eq!(engine.tick(), TickOutcome::Ticked);
            assert_eq!(engine.remaining(), Time::new(0, 0, expected));
        }
        // the fifth tick reaches zero and triggers the terminal policy
        assert_eq!(engine.tick(), TickOutcome::Completed(Completion::Stop));
        assert_eq!(engine.remaining(), Time::ZERO);
    }

    #[test]
    fn minute_borrow() {
        let mut engine = engine(Time::new(0, 1, 0), TimerKind::Standard);
        assert_eq!(engine.tick(), TickOutcome::Ticked);
        assert_eq!(engine.remaining(), Time::new(0, 0, 59));
    }

    #[test]
    fn hour_borrow() {
        let mut engine = engine(Time::new(1, 0, 0), TimerKind::Standard);
        assert_eq!(engine.tick(), TickOutcome::Ticked);
        assert_eq!(engine.remaining(), Time::new(0, 59, 59));
    }

    #[test]
    fn reset_is_idempotent() {
        let configured = Time::new(0, 2, 0);
        let mut engine = engine(configured, TimerKind::Standard);
        engine.start(std::time::Instant::now());
        engine.tick();
        engine.reset();
        assert_eq!(engine.remaining(), configured);
        assert!(!engine.is_running());
        engine.reset();
        assert_eq!(engine.remaining(), configured);
        assert!(!engine.is_running());
    }

    #[test]
    fn standard_timer_pauses_at_zero() {
        let mut engine = engine(Time::new(0, 0, 1), TimerKind::Standard);
        engine.start(std::time::Instant::now());
        assert_eq!(engine.tick(), TickOutcome::Completed(Completion::Stop));
        assert!(!engine.is_running());
        assert_eq!(engine.remaining(), Time::ZERO);
    }

    #[test]
    fn interval_timer_restarts_without_pausing() {
        let configured = Time::new(0, 0, 2);
        let mut engine = engine(configured, TimerKind::Interval);
        let now = std::time::Instant::now();
        engine.start(now);
        assert_eq!(engine.tick(), TickOutcome::Ticked);
        assert_eq!(engine.tick(), TickOutcome::Completed(Completion::Repeat));
        assert_eq!(engine.remaining(), configured);
        assert!(engine.is_running());
        assert!(engine.next_deadline().is_some());
    }

    #[test]
    fn one_time_timer_stops_and_requests_exit() {
        let mut engine = engine(Time::new(0, 0, 1), TimerKind::OneTime);
        engine.start(std::time::Instant::now());
        assert_eq!(
            engine.tick(),
            TickOutcome::Completed(Completion::DeleteAndExit)
        );
        assert!(!engine.is_running());
        assert!(engine.next_deadline().is_none());
    }

    #[test]
    fn start_at_zero_resets_to_configured_time() {
        let configured = Time::new(0, 0, 3);
        let mut engine = engine(configured, TimerKind::Standard);
        engine.start(std::time::Instant::now());
        engine.tick();
        engine.tick();
        engine.tick();
        assert_eq!(engine.remaining(), Time::ZERO);
        engine.start(std::time::Instant::now());
        assert_eq!(engine.remaining(), configured);
        assert!(engine.is_running());
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut engine = engine(Time::new(0, 0, 10), TimerKind::Standard);
        let now = std::time::Instant::now();
        engine.start(now);
        engine.tick();
        let partial = engine.remaining();
        let deadline = engine.next_deadline();
        engine.start(now + std::time::Duration::from_secs(5));
        assert_eq!(engine.remaining(), partial);
        assert_eq!(engine.next_deadline(), deadline);
    }

    #[test]
    fn observer_follows_start_and_pause() {
        let seen: Rc<RefCell<Vec<bool>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut engine = engine(Time::new(0, 0, 5), TimerKind::Standard);
        engine.set_observer(move |running| sink.borrow_mut().push(running));
        engine.start(std::time::Instant::now());
        engine.pause();
        engine.pause();
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn poll_drains_due_ticks_on_the_second() {
        let mut engine = engine(Time::new(0, 0, 10), TimerKind::Standard);
        let start = std::time::Instant::now();
        engine.start(start);
        assert_eq!(engine.poll(start + std::time::Duration::from_millis(900)), None);
        assert_eq!(engine.remaining(), Time::new(0, 0, 10));
        assert_eq!(engine.poll(start + std::time::Duration::from_secs(3)), None);
        assert_eq!(engine.remaining(), Time::new(0, 0, 7));
    }

    #[test]
    fn poll_surfaces_completion() {
        let mut engine = engine(Time::new(0, 0, 2), TimerKind::Standard);
        let start = std::time::Instant::now();
        engine.start(start);
        assert_eq!(
            engine.poll(start + std::time::Duration::from_secs(2)),
            Some(Completion::Stop)
        );
    }
}
