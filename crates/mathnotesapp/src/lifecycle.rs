//! Lifecycle hook: flush before the host loses the foreground.
//!
//! After an app is backgrounded or suspended nothing is guaranteed to run again, so a
//! debounce that has not fired yet would be lost. The hook turns the phase transition
//! into a synchronous [`ForceFlush::force_flush_now`] before control returns to the host.

use crate::coordinator::FlushReport;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Active,
    Inactive,
    Background,
}

impl AppPhase {
    /// Phases after which further code is not guaranteed to run.
    pub fn is_suspending(self) -> bool {
        matches!(self, AppPhase::Inactive | AppPhase::Background)
    }
}

pub trait ForceFlush {
    fn force_flush_now(&mut self) -> FlushReport;
}

/// React to a phase change. Flushes synchronously when moving to a suspending phase.
pub fn on_phase_change<F: ForceFlush>(
    target: &mut F,
    old: AppPhase,
    new: AppPhase,
) -> Option<FlushReport> {
    if !new.is_suspending() {
        return None;
    }
    info!(?old, ?new, "app suspending, forcing flush");
    Some(target.force_flush_now())
}

/// Fires the suspend hook once when dropped.
///
/// For hosts whose "going to background" is simply the end of a scope, such as a
/// CLI process about to exit.
pub struct SuspendGuard<'a, F: ForceFlush> {
    target: &'a mut F,
}

impl<'a, F: ForceFlush> SuspendGuard<'a, F> {
    pub fn new(target: &'a mut F) -> Self {
        Self { target }
    }

    pub fn target(&mut self) -> &mut F {
        &mut *self.target
    }
}

impl<F: ForceFlush> Drop for SuspendGuard<'_, F> {
    fn drop(&mut self) {
        on_phase_change(&mut *self.target, AppPhase::Active, AppPhase::Background);
    }
}
