//! # Debounce State Machine
//!
//! ```text
//!            arm()                         arm()  (cancel + re-arm from now)
//!   Idle ───────────▶ PendingFlush(deadline) ◀──┐
//!    ▲                     │        └───────────┘
//!    │   poll() past deadline / cancel()
//!    └─────────────────────┘
//! ```
//!
//! Every mutation calls [`Debouncer::arm`]. Arming while a flush is pending throws the
//! old timer away and starts a new one, so the flush fires once after a quiet period
//! following the *last* mutation. This is coalescing, not throttling: a steady stream
//! of edits closer together than the interval postpones the flush indefinitely.
//!
//! There is no background thread. The host's event loop calls [`Debouncer::poll`]
//! (sleeping for [`Debouncer::time_until_due`] in between) and runs the flush when it
//! returns true. Time comes from a [`Clock`] so tests can drive it by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// The single armed timer. Re-arming replaces it with a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub generation: u64,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    PendingFlush { deadline: Instant },
}

pub struct Debouncer<C: Clock> {
    clock: C,
    interval: Duration,
    timer: Option<TimerHandle>,
    generation: u64,
}

impl<C: Clock> Debouncer<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            timer: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> DebounceState {
        match self.timer {
            None => DebounceState::Idle,
            Some(handle) => DebounceState::PendingFlush {
                deadline: handle.deadline,
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Cancel any armed timer and arm a fresh one, due `interval` from now.
    pub fn arm(&mut self) -> TimerHandle {
        self.generation += 1;
        let handle = TimerHandle {
            generation: self.generation,
            deadline: self.clock.now() + self.interval,
        };
        self.timer = Some(handle);
        handle
    }

    /// Drop the armed timer, if any. Returns the handle that was cancelled.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.timer.take()
    }

    /// True exactly once per arm, the first time it is called at or after the deadline.
    pub fn poll(&mut self) -> bool {
        match self.timer {
            Some(handle) if self.clock.now() >= handle.deadline => {
                self.timer = None;
                true
            }
            _ => false,
        }
    }

    /// How long until the armed timer is due. None when idle.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.timer
            .map(|handle| handle.deadline.saturating_duration_since(self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make() -> (ManualClock, Debouncer<ManualClock>) {
        let clock = ManualClock::new();
        let debouncer = Debouncer::new(clock.clone(), Duration::from_millis(500));
        (clock, debouncer)
    }

    #[test]
    fn test_starts_idle() {
        let (_, mut debouncer) = make();
        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert!(!debouncer.poll());
        assert!(debouncer.time_until_due().is_none());
    }

    #[test]
    fn test_fires_after_interval() {
        let (clock, mut debouncer) = make();
        debouncer.arm();
        clock.advance(Duration::from_millis(499));
        assert!(!debouncer.poll());
        clock.advance(Duration::from_millis(1));
        assert!(debouncer.poll());
        assert_eq!(debouncer.state(), DebounceState::Idle);
    }

    #[test]
    fn test_fires_only_once_per_arm() {
        let (clock, mut debouncer) = make();
        debouncer.arm();
        clock.advance(Duration::from_secs(2));
        assert!(debouncer.poll());
        assert!(!debouncer.poll());
    }

    #[test]
    fn test_rearm_pushes_deadline_from_now() {
        let (clock, mut debouncer) = make();
        let first = debouncer.arm();
        clock.advance(Duration::from_millis(300));
        let second = debouncer.arm();

        assert!(second.generation > first.generation);
        assert_eq!(second.deadline, first.deadline + Duration::from_millis(300));

        // The original deadline passes without firing
        clock.advance(Duration::from_millis(300));
        assert!(!debouncer.poll());
        clock.advance(Duration::from_millis(200));
        assert!(debouncer.poll());
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let (clock, mut debouncer) = make();
        let handle = debouncer.arm();
        assert_eq!(debouncer.cancel(), Some(handle));
        clock.advance(Duration::from_secs(1));
        assert!(!debouncer.poll());
    }

    #[test]
    fn test_time_until_due() {
        let (clock, mut debouncer) = make();
        debouncer.arm();
        clock.advance(Duration::from_millis(200));
        assert_eq!(
            debouncer.time_until_due(),
            Some(Duration::from_millis(300))
        );
        clock.advance(Duration::from_secs(5));
        assert_eq!(debouncer.time_until_due(), Some(Duration::ZERO));
    }
}
