use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use crossterm::tty::IsTty;
use std::path::PathBuf;

use piano_finder::audio::AudioEngine;
use piano_finder::repl::{self, style, App};
use piano_finder::session::Session;
use piano_finder::storage::settings as settings_io;

fn cli() -> Command {
    Command::new("piano-finder")
        .about("Command-line piano that names the scales and chords under your fingers")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Load settings from a YAML file (default: ./piano-finder.yaml if present)"),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .value_name("DIR")
                .help("Directory holding the piano samples (A0.mp3, C1.mp3, Ds1.mp3, ...)"),
        )
        .arg(
            Arg::new("mute")
                .short('m')
                .long("mute")
                .action(ArgAction::SetTrue)
                .help("Start muted; no audio device is opened until unmuted"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Reduce startup banner output"),
        )
        .arg(
            Arg::new("exec")
                .short('e')
                .long("exec")
                .value_name("CMD")
                .action(ArgAction::Append)
                .help("Run a REPL command and exit; repeat for several"),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let (mut settings, source) = settings_io::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(dir) = matches.get_one::<String>("samples") {
        settings.samples_dir = dir.clone();
    }
    if matches.get_flag("mute") {
        settings.muted = true;
    }

    let audio = AudioEngine::new(&settings);
    let mut app = App::new(Session::new(settings), audio);

    let commands: Vec<String> = matches
        .get_many::<String>("exec")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    if !commands.is_empty() {
        return repl::run_commands(&mut app, &commands);
    }

    app.color = std::io::stdout().is_tty();
    if !matches.get_flag("quiet") {
        println!(
            "{} PIANO FINDER: press keys, see scales and chords (type :help)",
            style::EMOJI_KEYS
        );
        if let Some(path) = source {
            println!("settings: {}", path.display());
        }
        if app.audio.is_muted() {
            println!("{}", style::muted(true));
        }
    }

    repl::run_repl(&mut app)?;

    Ok(())
}
