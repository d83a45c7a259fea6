//! Multi-sampled piano on top of rodio.
//!
//! Recordings exist for every third semitone (A0, then C, D#, F# and A of
//! octaves 1 to 7, then C8). Other notes are re-pitched from the nearest
//! recording. A missing or undecodable file falls back to a sine tone.

use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::timing::{pitch_semitones_to_speed, pitch_to_frequency};
use super::Backend;
use crate::theory::Note;

/// Gain of the fallback tone; sine waves sound much louder than piano samples.
const TONE_GAIN: f32 = 0.2;

/// One recorded note: its MIDI pitch and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSlot {
    pub pitch: i32,
    pub file: String,
}

fn slot(name: &str, octave: i32, pitch_class: i32) -> SampleSlot {
    SampleSlot {
        pitch: (octave + 1) * 12 + pitch_class,
        file: format!("{}{}.mp3", name, octave),
    }
}

/// Every recording, ascending by pitch.
pub fn sample_map() -> Vec<SampleSlot> {
    let mut slots = vec![slot("A", 0, 9)];
    for octave in 1..=7 {
        slots.push(slot("C", octave, 0));
        slots.push(slot("Ds", octave, 3));
        slots.push(slot("Fs", octave, 6));
        slots.push(slot("A", octave, 9));
    }
    slots.push(slot("C", 8, 0));
    slots
}

/// Closest recording to `pitch`; ties go to the lower one.
pub fn nearest_sample(map: &[SampleSlot], pitch: i32) -> Option<&SampleSlot> {
    map.iter().min_by_key(|s| ((s.pitch - pitch).abs(), s.pitch))
}

struct VoiceHandle {
    sink: Sink,
    stop_at: Option<Instant>,
}

pub struct Sampler {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    dir: PathBuf,
    map: Vec<SampleSlot>,
    /// `None` marks a file that failed once; it is not retried.
    cache: HashMap<String, Option<Vec<u8>>>,
    voices: Vec<VoiceHandle>,
}

impl Sampler {
    /// Opens the default output device. Samples load lazily from `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default().context("opening audio output")?;
        Ok(Self {
            _stream: stream,
            handle,
            dir: dir.as_ref().to_path_buf(),
            map: sample_map(),
            cache: HashMap::new(),
            voices: Vec::new(),
        })
    }

    fn sample_bytes(&mut self, file: &str) -> Option<Vec<u8>> {
        let dir = &self.dir;
        self.cache
            .entry(file.to_string())
            .or_insert_with(|| {
                let path = dir.join(file);
                match std::fs::read(&path) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        crate::console::warn(format!(
                            "sample {} unavailable ({}), using a synthesized tone",
                            path.display(),
                            e
                        ));
                        None
                    }
                }
            })
            .clone()
    }

    fn source_for(&mut self, pitch: i32, duration: Duration) -> Box<dyn Source<Item = f32> + Send> {
        if let Some(slot) = nearest_sample(&self.map, pitch).cloned() {
            if let Some(bytes) = self.sample_bytes(&slot.file) {
                match Decoder::new(BufReader::new(Cursor::new(bytes))) {
                    Ok(decoded) => {
                        let speed = pitch_semitones_to_speed(pitch - slot.pitch);
                        return Box::new(decoded.speed(speed).convert_samples::<f32>());
                    }
                    Err(e) => {
                        crate::console::error(format!("audio decode error in {}: {}", slot.file, e));
                        self.cache.insert(slot.file, None);
                    }
                }
            }
        }
        Box::new(
            SineWave::new(pitch_to_frequency(pitch))
                .take_duration(duration)
                .amplify(TONE_GAIN),
        )
    }
}

impl Backend for Sampler {
    fn trigger(&mut self, note: &Note, duration: Duration) -> Result<()> {
        let pitch = note.with_octave(note.octave().unwrap_or(4)).pitch().unwrap_or(60);
        let source = self.source_for(pitch, duration);
        let sink = Sink::try_new(&self.handle).context("creating audio sink")?;
        sink.append(source);
        sink.play();
        self.voices.push(VoiceHandle {
            sink,
            stop_at: Some(Instant::now() + duration),
        });
        Ok(())
    }

    fn release_all(&mut self) {
        for voice in self.voices.drain(..) {
            voice.sink.stop();
        }
    }

    fn service(&mut self, now: Instant) {
        for voice in self.voices.iter_mut() {
            if let Some(deadline) = voice.stop_at {
                if now >= deadline {
                    voice.sink.stop();
                    voice.stop_at = None;
                }
            }
        }
        self.voices.retain(|voice| !voice.sink.empty());
    }
}
