use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use rustyline::{error::ReadlineError, history::DefaultHistory, Editor, ExternalPrinter};

use crate::audio::AudioEngine;
use crate::console;
use crate::session::Session;
use crate::theory::{Interval, Note, NoteList, PatternKind};

mod completer;
pub mod style;

use completer::PianoHelper;

/// Everything a command can touch.
pub struct App {
    pub session: Session,
    pub audio: AudioEngine,
    /// Style output with terminal colors.
    pub color: bool,
}

impl App {
    pub fn new(session: Session, audio: AudioEngine) -> Self {
        Self {
            session,
            audio,
            color: false,
        }
    }
}

pub fn run_repl(app: &mut App) -> Result<()> {
    let helper = PianoHelper::new();
    let mut rl = Editor::<PianoHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(helper));

    // Background log lines go through the external printer so they don't
    // break the line being edited.
    let logs = console::subscribe();
    let done = Arc::new(AtomicBool::new(false));
    let forwarder = {
        let done = Arc::clone(&done);
        let mut printer = rl.create_external_printer().ok();
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                let Some(msg) = logs.next_timeout(Duration::from_millis(100)) else {
                    continue;
                };
                match printer.as_mut() {
                    Some(p) => {
                        let _ = p.print(msg.to_string());
                    }
                    None => eprintln!("{}", msg),
                }
            }
        })
    };

    loop {
        let prompt = style::format_prompt(
            app.session.pressed().root().map(|r| r.to_string()),
            app.audio.is_muted(),
        );
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                match handle_line(app, &line) {
                    Ok(Output::None) => {}
                    Ok(Output::Text(t)) => println!("{}", t),
                    Ok(Output::Quit) => {
                        println!("{}", style::goodbye());
                        break;
                    }
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", style::goodbye());
                break;
            }
            Err(err) => {
                eprintln!("repl error: {}", err);
                break;
            }
        }
    }
    done.store(true, Ordering::SeqCst);
    let _ = forwarder.join();
    Ok(())
}

/// Runs commands non-interactively, printing each result. Stops at the first
/// failing command.
pub fn run_commands<S: AsRef<str>>(app: &mut App, commands: &[S]) -> Result<()> {
    for command in commands {
        let command = command.as_ref();
        match handle_line(app, command).with_context(|| format!("command '{}'", command))? {
            Output::None => {}
            Output::Text(t) => println!("{}", t),
            Output::Quit => break,
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
pub enum Output {
    None,
    Text(String),
    Quit,
}

pub fn handle_line(app: &mut App, line: &str) -> Result<Output> {
    let l = line.trim();
    if let Some(rest) = l.strip_prefix(':') {
        return handle_meta(rest);
    }

    let words: Vec<String> = shlex::Shlex::new(l).collect();
    let Some((cmd, args)) = words.split_first() else {
        return Ok(Output::None);
    };
    let color = app.color;
    match cmd.as_str() {
        "press" | "p" => {
            if args.is_empty() {
                bail!("usage: press <note>...");
            }
            let keys = args
                .iter()
                .map(|raw| parse_key(&app.session, raw))
                .collect::<Result<Vec<_>>>()?;
            for note in keys {
                if app.session.press(note) {
                    app.audio.play_note(&note, None);
                }
            }
            Ok(Output::Text(show(app)))
        }
        "hover" => {
            let raw = args.first().ok_or_else(|| anyhow!("usage: hover <note>"))?;
            let note = parse_key(&app.session, raw)?;
            app.session.hover(note);
            Ok(Output::Text(show(app)))
        }
        "unhover" => {
            app.session.clear_highlight();
            Ok(Output::Text(show(app)))
        }
        "root" => {
            let raw = args.first().ok_or_else(|| anyhow!("usage: root <note>"))?;
            let root: Note = raw.parse()?;
            app.session.choose_root(&root)?;
            Ok(Output::Text(show(app)))
        }
        "hover-root" => {
            let raw = args.first().ok_or_else(|| anyhow!("usage: hover-root <note>"))?;
            let root: Note = raw.parse()?;
            app.session.hover_root(&root)?;
            Ok(Output::Text(show(app)))
        }
        "scale" | "chord" => {
            let kind: PatternKind = cmd.parse()?;
            if args.is_empty() {
                bail!("usage: {} [root] <name>", kind);
            }
            let notes = choose_pattern(app, kind, args)?;
            match kind {
                PatternKind::Scale => app.audio.play_arpeggio(&notes, None),
                PatternKind::Chord => app.audio.play_harmony(&notes, None),
            }
            Ok(Output::Text(show(app)))
        }
        "preview" => {
            let (kind, name) = args
                .split_first()
                .filter(|(_, rest)| !rest.is_empty())
                .ok_or_else(|| anyhow!("usage: preview scale|chord <name>"))?;
            let kind: PatternKind = kind.parse()?;
            app.session.preview_pattern(kind, &name.join(" "))?;
            Ok(Output::Text(show(app)))
        }
        "up" | "down" => {
            app.session.shift(cmd == "up");
            Ok(Output::Text(show(app)))
        }
        "transpose" => {
            let raw = args
                .first()
                .ok_or_else(|| anyhow!("usage: transpose <interval>  (e.g. M3, -P5)"))?;
            let interval: Interval = raw.parse()?;
            app.session.transpose(&interval);
            Ok(Output::Text(show(app)))
        }
        "simplify" => {
            app.session.simplify();
            Ok(Output::Text(show(app)))
        }
        "clear" => {
            app.session.clear();
            Ok(Output::Text(style::success("cleared")))
        }
        "search" => {
            app.session.set_search(args.join(" "));
            Ok(Output::Text(format!(
                "{}\n{}",
                style::searching(app.session.search()),
                lists(app)
            )))
        }
        "show" => Ok(Output::Text(format!("{}\n{}", show(app), lists(app)))),
        "scales" | "chords" => {
            let kind: PatternKind = cmd.parse()?;
            let rows = app.session.listed(kind);
            Ok(Output::Text(style::pattern_rows(kind, &rows, color)))
        }
        "match" => {
            let matches = app.session.matches();
            if args.iter().any(|a| a == "--json") {
                return Ok(Output::Text(serde_json::to_string_pretty(&matches)?));
            }
            let exact = matches.exact();
            let mut out = Vec::new();
            for kind in PatternKind::ALL {
                let names = exact.of_kind(kind);
                if !names.is_empty() {
                    out.push(format!("  exact {}: {}", kind.plural(), names.join(", ")));
                }
                let partial: Vec<String> = matches
                    .of_kind(kind)
                    .iter()
                    .filter(|p| !p.is_exact())
                    .map(|p| format!("{} {:.0}%", p.name, p.score * 100.0))
                    .collect();
                if !partial.is_empty() {
                    out.push(format!("  partial {}: {}", kind.plural(), partial.join(", ")));
                }
            }
            if out.is_empty() {
                out.push("  nothing pressed".into());
            }
            Ok(Output::Text(out.join("\n")))
        }
        "catalog" => {
            let kinds = match args.first() {
                Some(k) => vec![k.parse::<PatternKind>()?],
                None => PatternKind::ALL.to_vec(),
            };
            let mut out = Vec::new();
            for kind in kinds {
                out.push(format!("  {}:", kind.plural()));
                for p in kind.catalog() {
                    let steps: Vec<String> = p.intervals.iter().map(|i| i.to_string()).collect();
                    out.push(format!("    {:<22} {}", p.name, steps.join(" ")));
                }
            }
            Ok(Output::Text(out.join("\n")))
        }
        "play" | "arp" | "harmony" => {
            let notes = if args.is_empty() {
                app.session.pressed().clone()
            } else {
                let keys = args
                    .iter()
                    .map(|a| parse_key(&app.session, a))
                    .collect::<Result<Vec<_>>>()?;
                NoteList::from_notes(keys)
            };
            if notes.is_empty() {
                bail!("nothing to play; press some keys first");
            }
            match cmd.as_str() {
                "arp" => app.audio.play_arpeggio(notes.notes(), None),
                "harmony" => app.audio.play_harmony(notes.notes(), None),
                _ => {
                    for note in &notes {
                        app.audio.play_note(note, None);
                    }
                }
            }
            if app.audio.is_muted() {
                return Ok(Output::Text(style::muted(true)));
            }
            Ok(Output::Text(style::playing(cmd, &notes)))
        }
        "mute" => {
            let on = match args.first().map(String::as_str) {
                None => !app.audio.is_muted(),
                Some("on") => true,
                Some("off") => false,
                Some(_) => bail!("usage: mute [on|off]"),
            };
            app.audio.set_muted(on);
            Ok(Output::Text(style::muted(on)))
        }
        "stop" => {
            app.audio.stop_all();
            Ok(Output::Text(style::stopped()))
        }
        other => bail!("unknown command '{}' (try :help)", other),
    }
}

fn handle_meta(meta: &str) -> Result<Output> {
    match meta.trim() {
        "help" | "h" => Ok(Output::Text(HELP.to_string())),
        "q" | "quit" | "exit" => Ok(Output::Quit),
        _ => Ok(Output::Text("unknown meta command".into())),
    }
}

const HELP: &str = r#"Commands:
  :help                  Show this help
  :q / :quit             Exit

Keys:
  press <note>...        Press or release keys (e.g. press C4 E4 G4)
  hover <note>           Highlight pressed keys plus one more
  unhover                Clear the highlight
  root <note>            Move the selection onto a new root
  hover-root <note>      Highlight the selection on a new root
  up | down              Shift everything a semitone
  transpose <interval>   Transpose by an interval (M3, -P5, m2 ...)
  simplify               Respell with at most one accidental
  clear                  Release every key and reset the search

Patterns:
  scale [root] <name>    Press a scale (e.g. scale B3 minor pentatonic)
  chord [root] <name>    Press a chord; choosing the pressed one clears
  preview scale|chord <name>
                         Highlight a pattern on the current root
  scales | chords        Patterns the pressed keys can still become
  search <text>          Narrow both lists by name
  match [--json]         Scores for every compatible pattern
  catalog [scales|chords]
  show                   Keyboard and both lists

Sound:
  play [notes]           Play notes (default: pressed keys)
  arp [notes]            Play one after another
  harmony [notes]        Play together
  mute [on|off]          Toggle sound
  stop                   Silence everything
"#;

/// Parses a key, taking the default octave when none is given.
fn parse_key(session: &Session, raw: &str) -> Result<Note> {
    let note: Note = raw.parse()?;
    Ok(match note.octave() {
        Some(_) => note,
        None => note.with_octave(session.settings().default_octave()),
    })
}

/// `scale minor pentatonic` uses the current root; `scale B3 minor pentatonic`
/// names one.
fn choose_pattern(app: &mut App, kind: PatternKind, args: &[String]) -> Result<Vec<Note>> {
    let explicit_root = match args.split_first() {
        Some((first, rest)) if !rest.is_empty() => first.parse::<Note>().ok().map(|n| (n, rest)),
        _ => None,
    };
    let pressed = match explicit_root {
        Some((root, rest)) => app.session.press_pattern(kind, &root, &rest.join(" "))?,
        None => app.session.choose_pattern(kind, &args.join(" "))?,
    };
    Ok(pressed.notes().to_vec())
}

fn show(app: &App) -> String {
    let session = &app.session;
    let mut out = vec![
        style::keyboard(
            session.pressed(),
            session.highlighted(),
            &session.settings().root_octaves,
            app.color,
        ),
        style::note_line("pressed", session.pressed()),
    ];
    if !session.highlighted().is_empty() {
        out.push(style::note_line("highlighted", session.highlighted()));
    }
    out.join("\n")
}

fn lists(app: &App) -> String {
    PatternKind::ALL
        .iter()
        .map(|kind| style::pattern_rows(*kind, &app.session.listed(*kind), app.color))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::Settings;

    fn app() -> App {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        App::new(Session::new(settings.clone()), AudioEngine::new(&settings))
    }

    fn text(out: Output) -> String {
        match out {
            Output::Text(t) => t,
            other => panic!("expected text, got {:?}", other),
        }
    }

    fn pressed(app: &App) -> String {
        app.session.pressed().to_string()
    }

    #[test]
    fn press_toggles_keys() {
        let mut app = app();
        handle_line(&mut app, "press C4 E4 G4").expect("press");
        assert_eq!(pressed(&app), "C4 E4 G4");
        handle_line(&mut app, "press E4").expect("release");
        assert_eq!(pressed(&app), "C4 G4");
        handle_line(&mut app, "press D").expect("default octave");
        assert_eq!(pressed(&app), "C4 D4 G4");
    }

    #[test]
    fn chords_list_follows_pressed_keys() {
        let mut app = app();
        handle_line(&mut app, "press C4 E4 G4").unwrap();
        let out = text(handle_line(&mut app, "chords").unwrap());
        assert!(out.contains("● major"));
        assert!(out.contains("major 7th"));
        assert!(!out.contains(" minor "));
    }

    #[test]
    fn scale_with_explicit_root() {
        let mut app = app();
        handle_line(&mut app, "scale B3 minor pentatonic").unwrap();
        assert_eq!(pressed(&app), "B3 D4 E4 F#4 A4");
        handle_line(&mut app, "chord major").unwrap();
        assert_eq!(pressed(&app), "B3 D#4 F#4");
        handle_line(&mut app, "chord major").unwrap();
        assert_eq!(pressed(&app), "");
    }

    #[test]
    fn root_and_shift() {
        let mut app = app();
        handle_line(&mut app, "chord minor").unwrap();
        handle_line(&mut app, "root E3").unwrap();
        assert_eq!(pressed(&app), "E3 G3 B3");
        handle_line(&mut app, "up").unwrap();
        assert_eq!(pressed(&app), "F3 Ab3 C4");
        handle_line(&mut app, "transpose -m2").unwrap();
        assert_eq!(pressed(&app), "E3 G3 B3");
    }

    #[test]
    fn match_json_is_valid() {
        let mut app = app();
        handle_line(&mut app, "press C4 E4 G4").unwrap();
        let out = text(handle_line(&mut app, "match --json").unwrap());
        let v: serde_json::Value = serde_json::from_str(&out).expect("json");
        let chords = v["chords"].as_array().expect("chords");
        assert!(chords
            .iter()
            .any(|c| c["name"] == "major" && c["score"].as_f64() == Some(1.0)));
    }

    #[test]
    fn bad_input_leaves_state_alone() {
        let mut app = app();
        handle_line(&mut app, "press C4").unwrap();
        assert!(handle_line(&mut app, "press H4").is_err());
        assert!(handle_line(&mut app, "press E4 H4").is_err());
        assert!(handle_line(&mut app, "p G4 E4 x").is_err());
        assert!(handle_line(&mut app, "chord nope").is_err());
        assert!(handle_line(&mut app, "root C9").is_err());
        assert!(handle_line(&mut app, "frobnicate").is_err());
        assert_eq!(pressed(&app), "C4");
    }

    #[test]
    fn mute_toggles() {
        let mut app = app();
        assert!(app.audio.is_muted());
        handle_line(&mut app, "mute").unwrap();
        assert!(!app.audio.is_muted());
        handle_line(&mut app, "mute on").unwrap();
        assert!(app.audio.is_muted());
        assert!(handle_line(&mut app, "mute maybe").is_err());
        handle_line(&mut app, "press C4").unwrap();
        assert!(!app.audio.is_initialized());
    }

    #[test]
    fn meta_commands() {
        let mut app = app();
        assert!(text(handle_line(&mut app, ":help").unwrap()).contains("press <note>"));
        assert_eq!(handle_line(&mut app, ":q").unwrap(), Output::Quit);
    }

    #[test]
    fn search_narrows_lists_and_clear_resets_it() {
        let mut app = app();
        let out = text(handle_line(&mut app, "search pentatonic").unwrap());
        assert!(out.contains("minor pentatonic"));
        assert!(!out.contains("dorian"));
        handle_line(&mut app, "clear").unwrap();
        assert_eq!(app.session.search(), "");
    }
}
