use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::Duration,
};

use rodio::{Decoder, OutputStream, Sink};

use crate::communication::AudioMessage;

/// UI-side handle to the single playback slot on the audio thread
///
/// the playing flag is fed back by the thread (it also covers the sound
/// running out on its own) and is independent of the countdown's running
/// flag: previewing or silencing the sound never touches the countdown
pub struct AudioController {
    sender: Sender<AudioMessage>,
    playing: Arc<AtomicBool>,
    armed: Option<PathBuf>,
}

impl AudioController {
    pub(crate) fn new(sender: Sender<AudioMessage>, playing: Arc<AtomicBool>) -> Self {
        Self {
            sender,
            playing,
            armed: None,
        }
    }

    /// bind the playback source; must be called before each play request,
    /// not just once per timer
    pub fn set_source(&mut self, file: &Path) {
        self.armed = Some(file.to_path_buf());
        self.send(AudioMessage::SetSource(file.to_path_buf()));
    }

    /// play the armed source from position zero
    pub fn play(&mut self, volume: f32) {
        if self.armed.is_none() {
            log::error!("play() without an armed source");
            return;
        }
        self.send(AudioMessage::Play { volume });
        self.playing.store(true, Ordering::Relaxed);
    }

    /// halt and rewind; the next play starts from the beginning
    pub fn stop(&mut self) {
        self.send(AudioMessage::Stop);
        self.playing.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    fn send(&self, message: AudioMessage) {
        if self.sender.send(message).is_err() {
            log::warn!("audio thread is gone, dropping command");
        }
    }
}

/// start the audio thread and hand back its controller
#[must_use]
pub fn spawn() -> AudioController {
    let (sender, receiver) = std::sync::mpsc::channel();
    let playing = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&playing);
    thread::spawn(move || run(&receiver, &flag));
    AudioController::new(sender, playing)
}

fn run(receiver: &Receiver<AudioMessage>, playing: &Arc<AtomicBool>) {
    // without an output device (headless session) keep draining commands so
    // the UI side never blocks or errors
    let Ok((_stream, handle)) = OutputStream::try_default() else {
        log::error!("no audio output device, notification sounds are disabled");
        while receiver.recv().is_ok() {
            playing.store(false, Ordering::Relaxed);
        }
        return;
    };

    let mut source: Option<PathBuf> = None;
    let mut sink: Option<Sink> = None;
    loop {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(AudioMessage::SetSource(path)) => source = Some(path),
            Ok(AudioMessage::Play { volume }) => {
                let Some(path) = &source else {
                    log::error!("play request without a source");
                    continue;
                };
                // a fresh sink per play: always restarts from position zero
                if let Some(old) = sink.take() {
                    old.stop();
                }
                match open_source(path) {
                    Ok(decoded) => match Sink::try_new(&handle) {
                        Ok(new_sink) => {
                            new_sink.set_volume(volume.clamp(0.0, 1.0));
                            new_sink.append(decoded);
                            new_sink.play();
                            sink = Some(new_sink);
                            playing.store(true, Ordering::Relaxed);
                        }
                        Err(err) => log::error!("couldn't open playback sink: {err}"),
                    },
                    Err(err) => {
                        log::error!("couldn't play sound {}: {err}", path.display());
                        playing.store(false, Ordering::Relaxed);
                    }
                }
            }
            Ok(AudioMessage::Stop) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                playing.store(false, Ordering::Relaxed);
            }
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        // the "ended" edge: the sink drained on its own
        if sink.as_ref().is_some_and(Sink::empty) {
            sink = None;
            playing.store(false, Ordering::Relaxed);
        }
    }
}

fn open_source(path: &Path) -> Result<Decoder<BufReader<File>>, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    Ok(Decoder::new(BufReader::new(file))?)
}
