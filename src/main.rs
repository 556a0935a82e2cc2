use std::{error::Error, fs, io::Write};

use clap::{command, Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use tickdown::{audio, store::TimerStore, App};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the bundled default notification sound into the data directory
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the logger
    simple_file_logger::init_logger!("tickdown").expect("couldn't initialize logger");

    let args = Args::parse();
    let force = matches!(args.command, Some(Command::Init { force: true }));
    seed_default_sound(force)?;

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([900.0, 620.0]),
        ..Default::default()
    };

    let audio = audio::spawn();
    // run the gui
    run_native(
        "Tickdown",
        native_options,
        Box::new(|_| Ok(Box::new(App::new(audio)))),
    )
    .map_err(Into::into)
}

/// the reserved "default" sound must exist on disk before anything plays it
fn seed_default_sound(force: bool) -> Result<(), Box<dyn Error>> {
    let path = TimerStore::sounds_path().join("chime.wav");
    if path.exists() && !force {
        return Ok(());
    }
    fs::create_dir_all(TimerStore::sounds_path())?;
    let mut chime = fs::File::create(path)?;
    chime.write_all(include_bytes!("../assets/chime.wav"))?;
    Ok(())
}
