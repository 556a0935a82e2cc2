use std::path::PathBuf;

/// commands the UI thread sends to the audio thread
#[derive(Debug, Clone)]
pub enum AudioMessage {
    /// (re)arm the playback source; required before each play request
    SetSource(PathBuf),
    /// play the armed source from the start at the given volume (0..=1)
    Play { volume: f32 },
    /// halt playback and rewind to position zero
    Stop,
}
