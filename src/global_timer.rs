use std::time::Instant;

use eframe::egui::{self, Align2, Context, Ui};

use crate::audio::AudioController;
use crate::countdown::{Completion, CountdownEngine, Time};
use crate::registry::ActiveTimerRegistry;
use crate::store::{StoreError, Timer, TimerStore};
use crate::widgets::{color_dot, parse_color, TimeDisplay};
use crate::Route;

/// where the single mounted countdown renders this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// inside the active timer's detail page
    Full,
    /// as the floating overlay on every other page
    Minimized,
}

impl Placement {
    /// pure function of the current navigation location: the active timer's
    /// own detail route gets the full view, everything else the overlay
    ///
    /// evaluated every frame, so navigating away and back keeps working
    #[must_use]
    pub fn select(route: &Route, active_id: &str) -> Self {
        match route {
            Route::Detail(id) if id.as_str() == active_id => Self::Full,
            _ => Self::Minimized,
        }
    }
}

/// one countdown engine bound to the currently adopted timer, plus its
/// controls UI; lives inside the slot and survives navigation untouched
pub struct CountdownSession {
    engine: CountdownEngine,
}

impl CountdownSession {
    fn new(timer: Timer, registry: &ActiveTimerRegistry) -> Self {
        let mut engine = CountdownEngine::new(timer);
        let handle = registry.clone();
        // subscribed once for the engine's lifetime; keeps the registry's
        // running flag in lockstep with start/pause transitions
        engine.set_observer(move |running| handle.set_running(running));
        Self { engine }
    }

    #[must_use]
    pub const fn bound_timer(&self) -> &Timer {
        self.engine.bound_timer()
    }

    #[must_use]
    pub const fn remaining(&self) -> Time {
        self.engine.remaining()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn start(&mut self, now: Instant) {
        self.engine.start(now);
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    fn toggle_audio(&self, audio: &mut AudioController) {
        if audio.is_playing() {
            audio.stop();
        } else {
            let timer = self.engine.bound_timer();
            // re-arm the source on every play request
            audio.set_source(&timer.sound_file.file);
            audio.play(timer.volume);
        }
    }

    fn render_controls(&mut self, ui: &mut Ui, audio: &mut AudioController) -> Option<Route> {
        let mut navigate = None;
        // the start button is never shown while running, which is what keeps
        // a second schedule from being started
        if self.is_running() {
            if ui.button("⏸").on_hover_text("Pause timer").clicked() {
                self.pause();
            }
        } else if ui.button("▶").on_hover_text("Start timer").clicked() {
            self.start(Instant::now());
        }
        if ui.button("↺").on_hover_text("Reset the timer").clicked() {
            self.reset();
        }
        if ui.button("✏").on_hover_text("Edit the timer").clicked() {
            navigate = Some(Route::Edit(self.engine.bound_timer().id.clone()));
        }
        let audio_hover = if audio.is_playing() {
            "Pause sound"
        } else {
            "Play sound"
        };
        if ui.button("🔊").on_hover_text(audio_hover).clicked() {
            self.toggle_audio(audio);
        }
        navigate
    }
}

/// the single persistent rendering slot for the active timer
///
/// the combined countdown + audio + controls unit is created lazily when a
/// timer first becomes active and is *relocated* between the full and
/// minimized placements instead of being torn down, so the running schedule
/// and playback survive navigation
#[derive(Default)]
pub struct GlobalTimerSlot {
    session: Option<CountdownSession>,
}

impl GlobalTimerSlot {
    /// bind (or rebind) the slot to a newly adopted timer; also the path an
    /// edit takes, since changing the configured time recreates the session
    pub fn bind(&mut self, timer: Timer, registry: &ActiveTimerRegistry) {
        self.session = Some(CountdownSession::new(timer, registry));
    }

    /// unmount entirely; rendered output disappears from both placements
    pub fn clear(&mut self) {
        self.session = None;
    }

    #[must_use]
    pub const fn session(&self) -> Option<&CountdownSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut CountdownSession> {
        self.session.as_mut()
    }

    /// drive due ticks; at most one session exists so at most one schedule
    /// is ever polled
    pub fn poll(&mut self, now: Instant) -> Option<Completion> {
        self.session.as_mut()?.engine.poll(now)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|session| session.engine.next_deadline())
    }

    /// full placement: rendered inside the detail page
    pub fn show_full(&mut self, ui: &mut Ui, audio: &mut AudioController) -> Option<Route> {
        let Some(session) = self.session.as_mut() else {
            return None;
        };
        let mut navigate = None;
        if ui.button("⬅ Go back").clicked() {
            navigate = Some(Route::Home);
        }
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            let timer = session.bound_timer().clone();
            ui.horizontal(|ui| {
                color_dot(ui, &timer.color);
                ui.colored_label(parse_color(&timer.color), &timer.name);
            });
            ui.add(TimeDisplay::new(session.remaining()));
            ui.add_space(16.0);
            ui.horizontal(|ui| {
                if let Some(route) = session.render_controls(ui, audio) {
                    navigate = Some(route);
                }
            });
        });
        navigate
    }

    /// minimized placement: the floating overlay shown over every other page
    pub fn show_minimized(&mut self, ctx: &Context, audio: &mut AudioController) -> Option<Route> {
        let Some(session) = self.session.as_mut() else {
            return None;
        };
        let mut navigate = None;
        egui::Window::new("active timer")
            .title_bar(false)
            .resizable(false)
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    color_dot(ui, &session.bound_timer().color);
                    ui.add(TimeDisplay::new(session.remaining()).minimized());
                });
                ui.horizontal(|ui| {
                    if let Some(route) = session.render_controls(ui, audio) {
                        navigate = Some(route);
                    }
                    if ui.button("⛶").on_hover_text("Open the timer").clicked() {
                        navigate = Some(Route::Detail(session.bound_timer().id.clone()));
                    }
                });
            });
        navigate
    }
}

/// ordered side effects of a countdown reaching zero: sound first, then (for
/// one-time timers) store deletion, registry clear and navigation home —
/// strictly in that order, and only after the deletion succeeded
///
/// returns the deleted timer's name so the shell can report it
pub fn resolve_completion(
    completion: Completion,
    slot: &mut GlobalTimerSlot,
    store: &mut TimerStore,
    registry: &ActiveTimerRegistry,
    audio: &mut AudioController,
    route: &mut Route,
) -> Result<Option<String>, StoreError> {
    let Some(timer) = slot.session().map(|session| session.bound_timer().clone()) else {
        return Ok(None);
    };
    audio.set_source(&timer.sound_file.file);
    audio.play(timer.volume);
    match completion {
        Completion::Stop | Completion::Repeat => Ok(None),
        Completion::DeleteAndExit => {
            store.delete_by_id(&timer.id)?;
            registry.set_active(None);
            slot.clear();
            *route = Route::Home;
            Ok(Some(timer.name))
        }
    }
}

/// the shared delete flow; clearing the registry whenever the deleted id was
/// active is what keeps the active reference from pointing at a timer the
/// store no longer has
pub fn remove_timer(
    id: &str,
    slot: &mut GlobalTimerSlot,
    store: &mut TimerStore,
    registry: &ActiveTimerRegistry,
    audio: &mut AudioController,
    route: &mut Route,
) -> Result<(), StoreError> {
    store.delete_by_id(id)?;
    if registry.active_id().as_deref() == Some(id) {
        audio.stop();
        registry.set_active(None);
        slot.clear();
    }
    if matches!(&*route, Route::Detail(current) | Route::Edit(current) if current.as_str() == id) {
        *route = Route::Home;
    }
    Ok(())
}
