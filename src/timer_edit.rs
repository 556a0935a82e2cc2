use std::{ffi::OsStr, fmt, path::Path};

use eframe::egui::{self, Button, Checkbox, ComboBox, RichText, Slider, TextEdit, Vec2};

use crate::countdown::Time;
use crate::store::{SoundFile, Timer, TimerKind, TimerStore, DEFAULT_SOUND_ID};
use crate::widgets::parse_color;
use crate::Notices;

/// the preset label colors offered by the color picker
pub const LABEL_COLORS: [&str; 6] = [
    "#FF5733", "#33FF57", "#5733FF", "#FF33F6", "#33FFF6", "#FF8833",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyName,
    EmptyTime,
    UnknownSound,
    /// interval and one-time are mutually exclusive; the switches disable
    /// each other in the UI but the record is checked here regardless
    ConflictingKind,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name is required"),
            Self::EmptyTime => write!(f, "Time must not be empty."),
            Self::UnknownSound => write!(f, "Upload a sound file"),
            Self::ConflictingKind => {
                write!(f, "A timer can't be both interval and one-time")
            }
        }
    }
}

pub enum EditingState {
    Cancelled,
    Editing,
    Done(Timer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerBuilder {
    name: String,
    hours: u32,
    minutes: u32,
    seconds: u32,
    hours_string: String,
    minutes_string: String,
    seconds_string: String,
    color: String,
    sound_id: String,
    volume: f32,
    is_interval: bool,
    is_one_time: bool,
}

impl Default for TimerBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            hours: 0,
            minutes: 0,
            seconds: 0,
            hours_string: "0".to_string(),
            minutes_string: "0".to_string(),
            seconds_string: "0".to_string(),
            color: LABEL_COLORS[0].to_string(),
            sound_id: DEFAULT_SOUND_ID.to_string(),
            volume: 1.0,
            is_interval: false,
            is_one_time: false,
        }
    }
}

impl From<&Timer> for TimerBuilder {
    fn from(timer: &Timer) -> Self {
        Self {
            name: timer.name.clone(),
            hours: timer.time.hours,
            minutes: timer.time.minutes,
            seconds: timer.time.seconds,
            hours_string: timer.time.hours.to_string(),
            minutes_string: timer.time.minutes.to_string(),
            seconds_string: timer.time.seconds.to_string(),
            color: timer.color.clone(),
            sound_id: timer.sound_file.id.clone(),
            volume: timer.volume,
            is_interval: timer.kind.is_interval(),
            is_one_time: timer.kind.is_one_time(),
        }
    }
}

impl TimerBuilder {
    /// validate and assemble the timer record; `id` is `None` on create
    /// (a fresh unique id is assigned) and `Some` on edit (every other
    /// field is replaced)
    pub fn build(
        &self,
        id: Option<&str>,
        sounds: &[SoundFile],
    ) -> Result<Timer, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let time = Time::new(self.hours, self.minutes, self.seconds);
        if time.is_zero() {
            return Err(ValidationError::EmptyTime);
        }
        let sound_file = sounds
            .iter()
            .find(|sound| sound.id == self.sound_id)
            .cloned()
            .ok_or(ValidationError::UnknownSound)?;
        let kind = match (self.is_interval, self.is_one_time) {
            (true, true) => return Err(ValidationError::ConflictingKind),
            (true, false) => TimerKind::Interval,
            (false, true) => TimerKind::OneTime,
            (false, false) => TimerKind::Standard,
        };
        Ok(Timer {
            id: id.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string),
            name: self.name.trim().to_string(),
            time,
            color: self.color.clone(),
            volume: self.volume.clamp(0.0, 1.0),
            sound_file,
            kind,
        })
    }

    /// the create/edit form page
    pub fn render_editor_page(
        &mut self,
        ui: &mut egui::Ui,
        title: &str,
        editing_id: Option<&str>,
        store: &mut TimerStore,
        notices: &mut Notices,
    ) -> EditingState {
        let mut state = EditingState::Editing;
        if ui.button("⬅ Go back").clicked() {
            state = EditingState::Cancelled;
        }
        ui.add_space(8.0);
        ui.heading(title);
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Name");
            ui.text_edit_singleline(&mut self.name);
        });
        ui.add_space(8.0);

        self.render_time_editor(ui);
        ui.add_space(8.0);

        self.render_color_picker(ui);
        ui.add_space(8.0);

        self.render_sound_selector(ui, store, notices);
        ui.add(
            Slider::new(&mut self.volume, 0.0..=1.0)
                .text("volume")
                .custom_formatter(|v, _| format!("{:.0}%", v * 100.0)),
        );
        ui.add_space(8.0);

        self.render_kind_switches(ui);
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            let save_label = if editing_id.is_some() { "Save" } else { "Create" };
            if ui.button(save_label).clicked() {
                match self.build(editing_id, &store.sound_catalog()) {
                    Ok(timer) => state = EditingState::Done(timer),
                    Err(err) => notices.error(err.to_string()),
                }
            }
            if ui.button("cancel").clicked() {
                state = EditingState::Cancelled;
            }
        });
        state
    }

    fn render_time_editor(&mut self, ui: &mut egui::Ui) {
        ui.label("Time");
        ui.horizontal(|ui| {
            unit_selector(ui, "Hours", &mut self.hours, &mut self.hours_string, None);
            unit_selector(
                ui,
                "Minutes",
                &mut self.minutes,
                &mut self.minutes_string,
                Some(59),
            );
            unit_selector(
                ui,
                "Seconds",
                &mut self.seconds,
                &mut self.seconds_string,
                Some(59),
            );
        });
    }

    fn render_color_picker(&mut self, ui: &mut egui::Ui) {
        ui.label("Label color");
        ui.horizontal(|ui| {
            for color in LABEL_COLORS {
                let marker = if self.color == color { "✔" } else { "" };
                let swatch = Button::new(RichText::new(marker).color(egui::Color32::BLACK))
                    .fill(parse_color(color))
                    .min_size(Vec2::new(28.0, 28.0));
                if ui.add(swatch).clicked() {
                    self.color = color.to_string();
                }
            }
        });
    }

    fn render_sound_selector(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut TimerStore,
        notices: &mut Notices,
    ) {
        let catalog = store.sound_catalog();
        let selected_name = catalog
            .iter()
            .find(|sound| sound.id == self.sound_id)
            .map_or_else(|| "Notification sound".to_string(), ToString::to_string);
        ui.horizontal(|ui| {
            ComboBox::from_label("Notification sound")
                .selected_text(selected_name)
                .show_ui(ui, |ui| {
                    for sound in &catalog {
                        ui.selectable_value(&mut self.sound_id, sound.id.clone(), &sound.name);
                    }
                });
            if ui
                .button("+")
                .on_hover_text("add a sound file")
                .clicked()
            {
                self.pick_sound_file(store, notices);
            }
            if self.sound_id != DEFAULT_SOUND_ID
                && ui
                    .button("x")
                    .on_hover_text("remove this sound")
                    .clicked()
            {
                match store.delete_sound_file(&self.sound_id.clone()) {
                    Ok(()) => self.sound_id = DEFAULT_SOUND_ID.to_string(),
                    Err(err) => notices.error(err.to_string()),
                }
            }
        });
    }

    fn pick_sound_file(&mut self, store: &mut TimerStore, notices: &mut Notices) {
        let dialog = rfd::FileDialog::new().set_title("Pick notification sound");
        let dialog = match directories::UserDirs::new()
            .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf))
        {
            Some(audio_path) => dialog.set_directory(audio_path),
            None => dialog,
        };
        if let Some(path) = dialog.pick_file() {
            let Some(name) = path.file_stem().and_then(OsStr::to_str) else {
                notices.error("Couldn't read the sound file name".to_string());
                return;
            };
            match store.add_sound_file(name.to_string(), path.clone()) {
                Ok(sound) => self.sound_id = sound.id,
                Err(err) => notices.error(err.to_string()),
            }
        }
    }

    fn render_kind_switches(&mut self, ui: &mut egui::Ui) {
        // each switch disables the other, the two are mutually exclusive
        ui.add_enabled(
            !self.is_one_time,
            Checkbox::new(&mut self.is_interval, "Interval"),
        );
        ui.small("Repeat the timer after it ends");
        ui.add_space(4.0);
        ui.add_enabled(
            !self.is_interval,
            Checkbox::new(&mut self.is_one_time, "One time"),
        );
        ui.small("Delete the timer after it ends");
    }
}

/// up/down stepper with a free-form text field kept in sync; out-of-range
/// input snaps back on focus loss
fn unit_selector(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut u32,
    text: &mut String,
    max: Option<u32>,
) {
    ui.vertical(|ui| {
        ui.label(label);
        if ui.button("Up").clicked() && max.map_or(true, |max| *value < max) {
            *value += 1;
            *text = value.to_string();
        }
        let response = ui.add(TextEdit::singleline(text).desired_width(28.0).char_limit(3));
        if response.lost_focus() {
            if let Ok(parsed) = text.parse::<u32>() {
                *value = max.map_or(parsed, |max| parsed.min(max));
            }
            // sync the input value and the value regardless
            *text = value.to_string();
        }
        if ui.button("Down").clicked() && *value > 0 {
            *value -= 1;
            *text = value.to_string();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{TimerBuilder, ValidationError};
    use crate::countdown::Time;
    use crate::store::{SoundFile, Timer, TimerKind};

    fn catalog() -> Vec<SoundFile> {
        vec![SoundFile::default_sound()]
    }

    fn valid_builder() -> TimerBuilder {
        let mut builder = TimerBuilder::default();
        builder.name = "tea".to_string();
        builder.minutes = 3;
        builder
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut builder = valid_builder();
        builder.name = "   ".to_string();
        assert_eq!(
            builder.build(None, &catalog()),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn zero_time_is_rejected() {
        let mut builder = valid_builder();
        builder.minutes = 0;
        assert_eq!(
            builder.build(None, &catalog()),
            Err(ValidationError::EmptyTime)
        );
    }

    #[test]
    fn unknown_sound_is_rejected() {
        let mut builder = valid_builder();
        builder.sound_id = "missing".to_string();
        assert_eq!(
            builder.build(None, &catalog()),
            Err(ValidationError::UnknownSound)
        );
    }

    #[test]
    fn both_kind_flags_are_rejected() {
        let mut builder = valid_builder();
        builder.is_interval = true;
        builder.is_one_time = true;
        assert_eq!(
            builder.build(None, &catalog()),
            Err(ValidationError::ConflictingKind)
        );
    }

    #[test]
    fn create_assigns_a_fresh_id() {
        let builder = valid_builder();
        let first = builder.build(None, &catalog()).unwrap();
        let second = builder.build(None, &catalog()).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "tea");
        assert_eq!(first.time, Time::new(0, 3, 0));
        assert_eq!(first.kind, TimerKind::Standard);
    }

    #[test]
    fn edit_keeps_the_id_and_replaces_fields() {
        let mut builder = valid_builder();
        builder.is_interval = true;
        let timer = builder.build(Some("keep-me"), &catalog()).unwrap();
        assert_eq!(timer.id, "keep-me");
        assert_eq!(timer.kind, TimerKind::Interval);
    }

    #[test]
    fn builder_prefills_from_an_existing_timer() {
        let timer = Timer {
            id: "a".to_string(),
            name: "stretch".to_string(),
            time: Time::new(1, 2, 3),
            color: "#33FFF6".to_string(),
            volume: 0.4,
            sound_file: SoundFile::default_sound(),
            kind: TimerKind::OneTime,
        };
        let builder = TimerBuilder::from(&timer);
        let rebuilt = builder.build(Some(&timer.id), &catalog()).unwrap();
        assert_eq!(rebuilt, timer);
    }
}
