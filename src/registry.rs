use std::{cell::RefCell, rc::Rc};

use crate::store::Timer;

/// the single process-wide "currently active timer" record
#[derive(Debug, Clone, Default)]
pub struct ActiveTimerState {
    pub active_timer: Option<Timer>,
    pub is_running: bool,
}

/// shared holder of [`ActiveTimerState`]: every view reads the same instance
///
/// created once by the application shell and handed down by handle; no
/// business rules live here, callers (the switch policy, the delete flow)
/// decide when to call [`set_active`](Self::set_active)
#[derive(Clone, Default)]
pub struct ActiveTimerRegistry {
    inner: Rc<RefCell<ActiveTimerState>>,
}

impl ActiveTimerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> ActiveTimerState {
        self.inner.borrow().clone()
    }

    #[must_use]
    pub fn active(&self) -> Option<Timer> {
        self.inner.borrow().active_timer.clone()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<String> {
        self.inner
            .borrow()
            .active_timer
            .as_ref()
            .map(|timer| timer.id.clone())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.borrow().is_running
    }

    /// replace (or clear) the active reference
    /// the running flag always starts false; the countdown engine's observer
    /// drives it afterwards
    pub fn set_active(&self, timer: Option<Timer>) {
        let mut state = self.inner.borrow_mut();
        state.active_timer = timer;
        state.is_running = false;
    }

    pub fn set_running(&self, running: bool) {
        self.inner.borrow_mut().is_running = running;
    }
}
