use crate::registry::ActiveTimerState;
use crate::store::Timer;

/// what to do when a timer's detail page loads while another timer may be
/// active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchDecision {
    /// adopt the incoming timer as the active one
    Adopt,
    /// the incoming timer already is the active one
    AlreadyActive,
    /// the active timer is running: don't auto-switch, ask the user first
    Confirm,
}

/// the navigation-gated switch rule set
///
/// a paused timer's partial countdown is discarded silently when another
/// timer is opened; only a *running* timer is worth interrupting the user for
#[must_use]
pub fn decide_switch(state: &ActiveTimerState, incoming: &Timer) -> SwitchDecision {
    match &state.active_timer {
        None => SwitchDecision::Adopt,
        Some(active) if active.id == incoming.id => SwitchDecision::AlreadyActive,
        Some(_) if state.is_running => SwitchDecision::Confirm,
        Some(_) => SwitchDecision::Adopt,
    }
}

#[cfg(test)]
mod tests {
    use super::{decide_switch, SwitchDecision};
    use crate::countdown::Time;
    use crate::registry::ActiveTimerState;
    use crate::store::{SoundFile, Timer, TimerKind};

    fn timer(id: &str) -> Timer {
        Timer {
            id: id.to_string(),
            name: id.to_string(),
            time: Time::new(0, 1, 0),
            color: "#FF5733".to_string(),
            volume: 1.0,
            sound_file: SoundFile::default_sound(),
            kind: TimerKind::Standard,
        }
    }

    #[test]
    fn adopts_when_nothing_is_active() {
        let state = ActiveTimerState::default();
        assert_eq!(decide_switch(&state, &timer("b")), SwitchDecision::Adopt);
    }

    #[test]
    fn same_timer_is_a_no_op() {
        let state = ActiveTimerState {
            active_timer: Some(timer("a")),
            is_running: true,
        };
        assert_eq!(
            decide_switch(&state, &timer("a")),
            SwitchDecision::AlreadyActive
        );
    }

    #[test]
    fn paused_active_timer_is_replaced_silently() {
        let state = ActiveTimerState {
            active_timer: Some(timer("a")),
            is_running: false,
        };
        assert_eq!(decide_switch(&state, &timer("b")), SwitchDecision::Adopt);
    }

    #[test]
    fn running_active_timer_requires_confirmation() {
        let state = ActiveTimerState {
            active_timer: Some(timer("a")),
            is_running: true,
        };
        assert_eq!(decide_switch(&state, &timer("b")), SwitchDecision::Confirm);
    }
}
