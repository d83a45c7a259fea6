use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use piano_finder::audio::{AudioEngine, Backend, BackendFactory, PlaybackDefaults};
use piano_finder::theory::{Note, NoteList};

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<(String, Instant)>>>);

impl Backend for Log {
    fn trigger(&mut self, note: &Note, _duration: Duration) -> Result<()> {
        self.0.lock().unwrap().push((note.to_string(), Instant::now()));
        Ok(())
    }

    fn release_all(&mut self) {}
}

fn engine(log: &Log, defaults: PlaybackDefaults) -> AudioEngine {
    let log = log.clone();
    let factory: BackendFactory =
        Arc::new(move || -> Result<Box<dyn Backend>> { Ok(Box::new(log.clone())) });
    AudioEngine::with_backend(defaults, factory)
}

#[test]
fn arpeggio_respects_interval() {
    let log = Log::default();
    let defaults = PlaybackDefaults {
        arpeggio_interval: Duration::from_millis(60),
        ..PlaybackDefaults::default()
    };
    let audio = engine(&log, defaults);
    let notes: NoteList = "C4 E4 G4".parse().unwrap();
    audio.play_arpeggio(notes.notes(), None);
    std::thread::sleep(Duration::from_millis(400));
    drop(audio);

    let played = log.0.lock().unwrap().clone();
    let names: Vec<&str> = played.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["C4", "E4", "G4"]);
    let gap = played[2].1 - played[0].1;
    assert!(gap >= Duration::from_millis(110), "gap was {:?}", gap);
}

#[test]
fn empty_requests_do_nothing() {
    let log = Log::default();
    let audio = engine(&log, PlaybackDefaults::default());
    audio.play_harmony(&[], None);
    audio.play_arpeggio(&[], None);
    assert!(!audio.is_initialized());
}

#[test]
fn defaults_match_piano_timings() {
    let d = PlaybackDefaults::default();
    assert_eq!(d.note, Duration::from_millis(1500));
    assert_eq!(d.harmony, Duration::from_secs(2));
    assert_eq!(d.arpeggio_interval, Duration::from_millis(400));
}
