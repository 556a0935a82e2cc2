use std::{fmt, io, ops::Not, path::PathBuf};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::countdown::Time;

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

/// repeat behavior once the countdown reaches zero
///
/// the persisted format carries the `isInterval`/`isOneTime` boolean pair;
/// in memory the pair is collapsed into one enum so the
/// mutually-exclusive invariant cannot be violated past the store boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerKind {
    #[default]
    Standard,
    Interval,
    OneTime,
}

impl TimerKind {
    #[must_use]
    pub const fn is_interval(self) -> bool {
        matches!(self, Self::Interval)
    }

    #[must_use]
    pub const fn is_one_time(self) -> bool {
        matches!(self, Self::OneTime)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub id: String,
    pub name: String,
    /// the configured duration the countdown resets to
    pub time: Time,
    /// display tag, hex string like "#FF5733"
    pub color: String,
    /// 0..=1
    pub volume: f32,
    pub sound_file: SoundFile,
    pub kind: TimerKind,
}

pub const DEFAULT_SOUND_ID: &str = "default";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SoundFile {
    pub id: String,
    pub name: String,
    pub file: PathBuf,
}

impl SoundFile {
    /// the reserved, non-deletable notification sound seeded by `init`
    #[must_use]
    pub fn default_sound() -> Self {
        Self {
            id: DEFAULT_SOUND_ID.to_string(),
            name: "Chime".to_string(),
            file: TimerStore::sounds_path().join("chime.wav"),
        }
    }
}

impl fmt::Display for SoundFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// at-rest shape of a timer record, kept field-compatible with the
/// original storage layout; everything is defaulted so one malformed
/// record cannot fail the whole document parse
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawTimer {
    id: String,
    name: String,
    time: Option<Time>,
    color: String,
    volume: Option<f32>,
    sound_file: Option<SoundFile>,
    is_interval: bool,
    is_one_time: bool,
}

impl From<&Timer> for RawTimer {
    fn from(timer: &Timer) -> Self {
        Self {
            id: timer.id.clone(),
            name: timer.name.clone(),
            time: Some(timer.time),
            color: timer.color.clone(),
            volume: Some(timer.volume),
            sound_file: Some(timer.sound_file.clone()),
            is_interval: timer.kind.is_interval(),
            is_one_time: timer.kind.is_one_time(),
        }
    }
}

impl RawTimer {
    /// store-boundary normalization: a record without a time is rejected, a
    /// record with both repeat flags set is treated as interval, volume is
    /// clamped into range
    fn normalize(self) -> Option<Timer> {
        if self.id.is_empty() {
            log::warn!("dropping stored timer {:?} without an id", self.name);
            return None;
        }
        let Some(time) = self.time else {
            log::warn!("dropping stored timer {:?} without a time", self.name);
            return None;
        };
        let kind = match (self.is_interval, self.is_one_time) {
            (true, true) => {
                log::warn!(
                    "stored timer {:?} is marked both interval and one-time, keeping interval",
                    self.name
                );
                TimerKind::Interval
            }
            (true, false) => TimerKind::Interval,
            (false, true) => TimerKind::OneTime,
            (false, false) => TimerKind::Standard,
        };
        Some(Timer {
            id: self.id,
            name: self.name,
            time,
            color: self.color,
            volume: self.volume.unwrap_or(1.0).clamp(0.0, 1.0),
            sound_file: self.sound_file.unwrap_or_else(SoundFile::default_sound),
            kind,
        })
    }
}

/// whole persisted document; every key tolerates being absent
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct StoreFile {
    theme: Theme,
    timers: Vec<RawTimer>,
    #[serde(rename = "soundFiles")]
    sound_files: Vec<SoundFile>,
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serialize(toml::ser::Error),
    /// the "default" sound cannot be removed
    ReservedSound,
    MissingTimer(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "couldn't write the timer store: {err}"),
            Self::Serialize(err) => write!(f, "couldn't serialize the timer store: {err}"),
            Self::ReservedSound => write!(f, "the default notification sound can't be removed"),
            Self::MissingTimer(id) => write!(f, "no stored timer with id {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialize(err)
    }
}

/// durable timer/sound-file storage: loaded once at startup, cached in
/// memory, written back on every mutation
pub struct TimerStore {
    path: PathBuf,
    timers: Vec<Timer>,
    /// custom sounds only; the reserved default is never persisted
    sound_files: Vec<SoundFile>,
    pub theme: Theme,
}

impl TimerStore {
    #[must_use]
    pub fn default_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "tickdown")
            .expect("couldn't get config path")
            .config_dir()
            .to_path_buf();
        path.push("timers.toml");
        path
    }

    #[must_use]
    pub fn sounds_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "tickdown")
            .expect("couldn't get sounds directory path")
            .data_dir()
            .to_path_buf();
        path.push("sounds");
        path
    }

    /// a missing file is an empty store; an unreadable one is logged and
    /// treated the same rather than taking the app down
    #[must_use]
    pub fn load_or_default(path: PathBuf) -> Self {
        let file = match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<StoreFile>(&contents) {
                Ok(file) => file,
                Err(err) => {
                    log::error!("couldn't parse {}: {err}", path.display());
                    StoreFile::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => StoreFile::default(),
            Err(err) => {
                log::error!("couldn't read {}: {err}", path.display());
                StoreFile::default()
            }
        };
        Self {
            path,
            timers: file
                .timers
                .into_iter()
                .filter_map(RawTimer::normalize)
                .collect(),
            sound_files: file
                .sound_files
                .into_iter()
                .filter(|sound| sound.id != DEFAULT_SOUND_ID)
                .collect(),
            theme: file.theme,
        }
    }

    #[must_use]
    pub fn get_all(&self) -> &[Timer] {
        &self.timers
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Timer> {
        self.timers.iter().find(|timer| timer.id == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    // the mutating operations all roll their in-memory change back when the
    // write fails, so a failed save never masquerades as a finished one

    pub fn create(&mut self, timer: Timer) -> Result<(), StoreError> {
        self.timers.push(timer);
        if let Err(err) = self.persist() {
            self.timers.pop();
            return Err(err);
        }
        Ok(())
    }

    /// replaces every field except the id
    pub fn update(&mut self, timer: Timer) -> Result<(), StoreError> {
        let previous = {
            let Some(existing) = self.timers.iter_mut().find(|t| t.id == timer.id) else {
                return Err(StoreError::MissingTimer(timer.id));
            };
            std::mem::replace(existing, timer)
        };
        if let Err(err) = self.persist() {
            if let Some(existing) = self.timers.iter_mut().find(|t| t.id == previous.id) {
                *existing = previous;
            }
            return Err(err);
        }
        Ok(())
    }

    /// removes the timer and returns the remaining list
    pub fn delete_by_id(&mut self, id: &str) -> Result<Vec<Timer>, StoreError> {
        let previous = self.timers.clone();
        self.timers.retain(|timer| timer.id != id);
        if let Err(err) = self.persist() {
            self.timers = previous;
            return Err(err);
        }
        Ok(self.timers.clone())
    }

    /// replace the whole timer list
    pub fn save_all(&mut self, timers: Vec<Timer>) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.timers, timers);
        if let Err(err) = self.persist() {
            self.timers = previous;
            return Err(err);
        }
        Ok(())
    }

    /// default sound first, then the custom uploads
    #[must_use]
    pub fn sound_catalog(&self) -> Vec<SoundFile> {
        let mut catalog = vec![SoundFile::default_sound()];
        catalog.extend(self.sound_files.iter().cloned());
        catalog
    }

    pub fn add_sound_file(&mut self, name: String, file: PathBuf) -> Result<SoundFile, StoreError> {
        let sound = SoundFile {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            file,
        };
        self.sound_files.push(sound.clone());
        if let Err(err) = self.persist() {
            self.sound_files.pop();
            return Err(err);
        }
        Ok(sound)
    }

    pub fn delete_sound_file(&mut self, id: &str) -> Result<(), StoreError> {
        if id == DEFAULT_SOUND_ID {
            return Err(StoreError::ReservedSound);
        }
        let previous = self.sound_files.clone();
        self.sound_files.retain(|sound| sound.id != id);
        if let Err(err) = self.persist() {
            self.sound_files = previous;
            return Err(err);
        }
        Ok(())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        let file = StoreFile {
            theme: self.theme,
            timers: self.timers.iter().map(RawTimer::from).collect(),
            sound_files: self.sound_files.clone(),
        };
        let contents = toml::to_string(&file)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SoundFile, StoreError, Timer, TimerKind, TimerStore, DEFAULT_SOUND_ID};
    use crate::countdown::Time;

    fn sample(id: &str) -> Timer {
        Timer {
            id: id.to_string(),
            name: format!("timer {id}"),
            time: Time::new(0, 5, 0),
            color: "#33FF57".to_string(),
            volume: 1.0,
            sound_file: SoundFile::default_sound(),
            kind: TimerKind::Standard,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimerStore::load_or_default(dir.path().join("timers.toml"));
        assert!(store.get_all().is_empty());
        assert_eq!(store.sound_catalog().len(), 1);
    }

    #[test]
    fn create_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        let mut store = TimerStore::load_or_default(path.clone());
        store.create(sample("a")).unwrap();
        store.create(sample("b")).unwrap();

        let reloaded = TimerStore::load_or_default(path);
        assert_eq!(reloaded.get_all().len(), 2);
        assert_eq!(reloaded.get_by_id("a"), Some(sample("a")));
    }

    #[test]
    fn update_replaces_fields_and_keeps_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TimerStore::load_or_default(dir.path().join("timers.toml"));
        store.create(sample("a")).unwrap();

        let mut edited = sample("a");
        edited.name = "renamed".to_string();
        edited.time = Time::new(1, 0, 0);
        edited.kind = TimerKind::Interval;
        store.update(edited.clone()).unwrap();

        assert_eq!(store.get_by_id("a"), Some(edited));
        assert!(matches!(
            store.update(sample("ghost")),
            Err(StoreError::MissingTimer(_))
        ));
    }

    #[test]
    fn delete_returns_remaining_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TimerStore::load_or_default(dir.path().join("timers.toml"));
        store.create(sample("a")).unwrap();
        store.create(sample("b")).unwrap();

        let remaining = store.delete_by_id("a").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
        assert!(!store.contains("a"));
    }

    #[test]
    fn record_without_time_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        std::fs::write(
            &path,
            r##"
[[timers]]
id = "broken"
name = "no time"
color = "#FF5733"

[[timers]]
id = "ok"
name = "fine"
color = "#FF5733"
time = { hours = 0, minutes = 1, seconds = 0 }
"##,
        )
        .unwrap();

        let store = TimerStore::load_or_default(path);
        assert!(!store.contains("broken"));
        assert!(store.contains("ok"));
    }

    #[test]
    fn both_repeat_flags_normalize_to_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        std::fs::write(
            &path,
            r##"
[[timers]]
id = "both"
name = "ambiguous"
color = "#FF5733"
time = { hours = 0, minutes = 0, seconds = 30 }
isInterval = true
isOneTime = true
"##,
        )
        .unwrap();

        let store = TimerStore::load_or_default(path);
        assert_eq!(store.get_by_id("both").unwrap().kind, TimerKind::Interval);
    }

    #[test]
    fn volume_is_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        std::fs::write(
            &path,
            r##"
[[timers]]
id = "loud"
name = "too loud"
color = "#FF5733"
volume = 3.5
time = { hours = 0, minutes = 0, seconds = 10 }
"##,
        )
        .unwrap();

        let store = TimerStore::load_or_default(path);
        assert!((store.get_by_id("loud").unwrap().volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_write_rolls_the_change_back() {
        let dir = tempfile::tempdir().unwrap();
        // the store path is a directory, so every write fails
        let mut store = TimerStore::load_or_default(dir.path().to_path_buf());
        assert!(store.create(sample("a")).is_err());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn default_sound_is_reserved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TimerStore::load_or_default(dir.path().join("timers.toml"));
        assert!(matches!(
            store.delete_sound_file(DEFAULT_SOUND_ID),
            Err(StoreError::ReservedSound)
        ));
    }

    #[test]
    fn custom_sounds_round_trip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        let mut store = TimerStore::load_or_default(path.clone());
        let sound = store
            .add_sound_file("gong".to_string(), dir.path().join("gong.wav"))
            .unwrap();

        let reloaded = TimerStore::load_or_default(path);
        assert_eq!(reloaded.sound_catalog().len(), 2);

        store.delete_sound_file(&sound.id).unwrap();
        assert_eq!(store.sound_catalog().len(), 1);
    }
}
