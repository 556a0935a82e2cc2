#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::time::{Duration, Instant};

use eframe::egui::{
    self, Align2, Button, CentralPanel, Color32, Context, Layout, ScrollArea, TopBottomPanel,
};

pub mod audio;
pub mod communication;
pub mod countdown;
pub mod global_timer;
pub mod policy;
pub mod registry;
pub mod store;
pub mod timer_edit;
pub mod widgets;

use audio::AudioController;
use global_timer::{remove_timer, resolve_completion, GlobalTimerSlot, Placement};
use policy::{decide_switch, SwitchDecision};
use registry::ActiveTimerRegistry;
use store::{Theme, Timer, TimerStore};
use timer_edit::{EditingState, TimerBuilder};
use widgets::{color_dot, format_time, parse_color, TimeDisplay};

/// every page the app can show; detail and edit carry the timer id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Create,
    Edit(String),
    Detail(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeLevel {
    Success,
    Error,
}

struct Notice {
    text: String,
    level: NoticeLevel,
    until: Instant,
}

/// transient toast-style messages; every recoverable failure lands here
#[derive(Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    const TTL: Duration = Duration::from_secs(4);

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(text.into(), NoticeLevel::Success);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::warn!("{text}");
        self.push(text, NoticeLevel::Error);
    }

    fn push(&mut self, text: String, level: NoticeLevel) {
        self.items.push(Notice {
            text,
            level,
            until: Instant::now() + Self::TTL,
        });
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn show(&mut self, ctx: &Context) {
        self.items.retain(|notice| notice.until > Instant::now());
        if self.items.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("notices"))
            .anchor(Align2::RIGHT_TOP, [-16.0, 16.0])
            .show(ctx, |ui| {
                for notice in &self.items {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        let color = match notice.level {
                            NoticeLevel::Success => Color32::LIGHT_GREEN,
                            NoticeLevel::Error => Color32::LIGHT_RED,
                        };
                        ui.colored_label(color, &notice.text);
                    });
                }
            });
    }
}

struct EditorState {
    builder: TimerBuilder,
    /// `None` while creating, the timer id while editing
    editing_id: Option<String>,
}

pub struct App {
    store: TimerStore,
    registry: ActiveTimerRegistry,
    slot: GlobalTimerSlot,
    audio: AudioController,
    route: Route,
    editor: Option<EditorState>,
    /// the timer waiting for the user to confirm discarding the running one
    pending_switch: Option<Timer>,
    notices: Notices,
}

impl App {
    #[must_use]
    pub fn new(audio: AudioController) -> Self {
        Self {
            store: TimerStore::load_or_default(TimerStore::default_path()),
            registry: ActiveTimerRegistry::new(),
            slot: GlobalTimerSlot::default(),
            audio,
            route: Route::Home,
            editor: None,
            pending_switch: None,
            notices: Notices::default(),
        }
    }

    /// switch the page; opening a timer's detail page runs the
    /// navigation-gated switch policy
    fn navigate_to(&mut self, route: Route) {
        match &route {
            Route::Detail(id) => {
                // an unknown id falls through to the not-found view
                if let Some(incoming) = self.store.get_by_id(id) {
                    match decide_switch(&self.registry.snapshot(), &incoming) {
                        SwitchDecision::Adopt => self.adopt(incoming),
                        SwitchDecision::AlreadyActive => {}
                        SwitchDecision::Confirm => self.pending_switch = Some(incoming),
                    }
                }
            }
            Route::Create => {
                self.editor = Some(EditorState {
                    builder: TimerBuilder::default(),
                    editing_id: None,
                });
            }
            Route::Edit(id) => {
                self.editor = self.store.get_by_id(id).map(|timer| EditorState {
                    builder: TimerBuilder::from(&timer),
                    editing_id: Some(timer.id),
                });
            }
            Route::Home => {}
        }
        self.route = route;
    }

    /// make the timer the active one; whatever was active before is
    /// discarded (the switch policy decides when this is allowed)
    fn adopt(&mut self, timer: Timer) {
        self.audio.stop();
        self.registry.set_active(Some(timer.clone()));
        self.slot.bind(timer, &self.registry);
    }

    /// run the due countdown ticks and apply the terminal-state policy
    fn pump_countdown(&mut self) {
        let Some(completion) = self.slot.poll(Instant::now()) else {
            return;
        };
        match resolve_completion(
            completion,
            &mut self.slot,
            &mut self.store,
            &self.registry,
            &mut self.audio,
            &mut self.route,
        ) {
            Ok(Some(name)) => self.notices.success(format!("Successfully deleted {name}.")),
            Ok(None) => {}
            Err(err) => self.notices.error(err.to_string()),
        }
    }

    fn delete_timer(&mut self, id: &str) {
        let name = self.store.get_by_id(id).map(|timer| timer.name);
        match remove_timer(
            id,
            &mut self.slot,
            &mut self.store,
            &self.registry,
            &mut self.audio,
            &mut self.route,
        ) {
            Ok(()) => {
                if let Some(name) = name {
                    self.notices.success(format!("Successfully deleted {name}."));
                }
            }
            Err(err) => self.notices.error(err.to_string()),
        }
    }

    fn render_header(&mut self, ctx: &Context) {
        TopBottomPanel::top("clock_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new({
                    if self.store.theme == Theme::Dark {
                        "🌞"
                    } else {
                        "🌙"
                    }
                }));
                if theme_btn.clicked() {
                    self.store.theme = !self.store.theme;
                    if let Err(err) = self.store.persist() {
                        self.notices.error(err.to_string());
                    }
                }
                ui.centered_and_justified(|ui| {
                    ui.label(format!(
                        "Time: {}",
                        chrono::Local::now().naive_local().format("%H:%M:%S")
                    ));
                });
            });
        });
    }

    fn render_home(&mut self, ui: &mut egui::Ui) -> Option<Route> {
        let mut navigate = None;
        let mut deleted: Option<String> = None;
        ui.horizontal(|ui| {
            ui.heading("Your timers");
            ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("+ Add timer").clicked() {
                    navigate = Some(Route::Create);
                }
            });
        });
        ui.add_space(8.0);
        if self.store.get_all().is_empty() {
            ui.horizontal(|ui| {
                ui.label("You have no timers.");
                if ui.link("Create one").clicked() {
                    navigate = Some(Route::Create);
                }
            });
            return navigate;
        }
        ScrollArea::vertical().show(ui, |ui| {
            for timer in self.store.get_all() {
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        color_dot(ui, &timer.color);
                        ui.strong(&timer.name);
                        ui.label(format_time(timer.time));
                        ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("x").on_hover_text("delete timer").clicked() {
                                deleted = Some(timer.id.clone());
                            }
                            if ui.button("✏").on_hover_text("edit timer").clicked() {
                                navigate = Some(Route::Edit(timer.id.clone()));
                            }
                            if ui.button("Open").clicked() {
                                navigate = Some(Route::Detail(timer.id.clone()));
                            }
                        });
                    });
                });
            }
        });
        if let Some(id) = deleted {
            self.delete_timer(&id);
        }
        navigate
    }

    fn render_detail(&mut self, ui: &mut egui::Ui, id: &str) -> Option<Route> {
        if self.registry.active_id().as_deref() == Some(id) && self.pending_switch.is_none() {
            // the relocated countdown renders right here, full size
            return self.slot.show_full(ui, &mut self.audio);
        }
        match self.store.get_by_id(id) {
            // not adopted (yet): a static preview under the switch prompt
            Some(timer) => {
                let mut navigate = None;
                if ui.button("⬅ Go back").clicked() {
                    navigate = Some(Route::Home);
                }
                ui.vertical_centered(|ui| {
                    ui.add_space(24.0);
                    ui.horizontal(|ui| {
                        color_dot(ui, &timer.color);
                        ui.colored_label(parse_color(&timer.color), &timer.name);
                    });
                    ui.add(TimeDisplay::new(timer.time));
                });
                navigate
            }
            None => Self::render_not_found(ui),
        }
    }

    fn render_not_found(ui: &mut egui::Ui) -> Option<Route> {
        let mut navigate = None;
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Timer not found");
            ui.add_space(8.0);
            if ui.button("Go back").clicked() {
                navigate = Some(Route::Home);
            }
        });
        navigate
    }

    fn render_editor(&mut self, ui: &mut egui::Ui) -> Option<Route> {
        let Some(mut editor) = self.editor.take() else {
            return Self::render_not_found(ui);
        };
        let editing_id = editor.editing_id.clone();
        let title = if editing_id.is_some() {
            "Edit timer"
        } else {
            "Create timer"
        };
        let state = editor.builder.render_editor_page(
            ui,
            title,
            editing_id.as_deref(),
            &mut self.store,
            &mut self.notices,
        );
        match state {
            EditingState::Editing => {
                self.editor = Some(editor);
                None
            }
            EditingState::Cancelled => Some(Route::Home),
            EditingState::Done(timer) => {
                let result = if editing_id.is_some() {
                    self.store.update(timer.clone())
                } else {
                    self.store.create(timer.clone())
                };
                match result {
                    Ok(()) => {
                        self.notices.success(if editing_id.is_some() {
                            "Edited timer successfully!"
                        } else {
                            "Created timer successfully!"
                        });
                        // editing the displayed timer recreates its session:
                        // countdown back to the new configured time, paused
                        if self.registry.active_id().as_deref() == Some(timer.id.as_str()) {
                            self.registry.set_active(Some(timer.clone()));
                            self.slot.bind(timer.clone(), &self.registry);
                        }
                        Some(Route::Detail(timer.id))
                    }
                    Err(err) => {
                        // a failed save must not transition the view
                        self.notices.error(err.to_string());
                        self.editor = Some(editor);
                        None
                    }
                }
            }
        }
    }

    fn render_switch_prompt(&mut self, ctx: &Context) {
        let Some(incoming) = self.pending_switch.clone() else {
            return;
        };
        let Some(active) = self.registry.active() else {
            // the running timer disappeared meanwhile, nothing to confirm
            self.pending_switch = None;
            self.adopt(incoming);
            return;
        };
        egui::Window::new("Timer still running")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "\"{}\" is still running. Switching to \"{}\" discards its countdown.",
                    active.name, incoming.name
                ));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(format!("Keep {}", active.name)).clicked() {
                        self.pending_switch = None;
                        self.navigate_to(Route::Detail(active.id.clone()));
                    }
                    if ui.button(format!("Switch to {}", incoming.name)).clicked() {
                        self.pending_switch = None;
                        self.adopt(incoming.clone());
                        self.route = Route::Detail(incoming.id.clone());
                    }
                });
            });
    }

    fn schedule_repaint(&self, ctx: &Context) {
        // wake up for the next countdown tick, faster while audio or notices
        // move, 1 Hz otherwise for the header clock
        let delay = if self.audio.is_playing() || !self.notices.is_empty() {
            Duration::from_millis(100)
        } else if let Some(deadline) = self.slot.next_deadline() {
            deadline
                .saturating_duration_since(Instant::now())
                .min(Duration::from_secs(1))
        } else {
            Duration::from_secs(1)
        };
        ctx.request_repaint_after(delay);
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.store.theme.into());
        self.pump_countdown();
        // a cleared active reference must never leave a stale session
        // rendering in either placement
        if self.registry.active().is_none() && self.slot.session().is_some() {
            self.slot.clear();
        }
        self.render_header(ctx);
        let mut navigate: Option<Route> = None;
        CentralPanel::default().show(ctx, |ui| {
            navigate = match self.route.clone() {
                Route::Home => self.render_home(ui),
                Route::Create | Route::Edit(_) => self.render_editor(ui),
                Route::Detail(id) => self.render_detail(ui, &id),
            };
        });
        if let Some(active_id) = self.registry.active_id() {
            if Placement::select(&self.route, &active_id) == Placement::Minimized {
                if let Some(route) = self.slot.show_minimized(ctx, &mut self.audio) {
                    navigate = Some(route);
                }
            }
        }
        self.render_switch_prompt(ctx);
        self.notices.show(ctx);
        if let Some(route) = navigate {
            self.navigate_to(route);
        }
        self.schedule_repaint(ctx);
    }
}
