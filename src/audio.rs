//! Piano playback on a background worker.
//!
//! [`AudioEngine`] never blocks the caller: every request becomes a message to
//! a worker thread that owns the output device. The worker is started by the
//! first request made while unmuted, so a muted session never opens a device.
//! Failures are reported through [`crate::console`] and never returned.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::model::settings::Settings;
use crate::theory::Note;

pub mod sampler;
pub mod timing;

use timing::{arpeggio_schedule, wait_until};

/// Something that can sound notes. Lives on the worker thread only.
pub trait Backend {
    fn trigger(&mut self, note: &Note, duration: Duration) -> Result<()>;
    fn release_all(&mut self);
    /// Called on every worker tick to end voices whose time is up.
    fn service(&mut self, _now: Instant) {}
}

/// Builds the backend on the worker thread.
pub type BackendFactory = Arc<dyn Fn() -> Result<Box<dyn Backend>> + Send + Sync>;

type MuteListener = Arc<dyn Fn(bool) + Send + Sync>;
type ListenerList = Mutex<Vec<(usize, MuteListener)>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackDefaults {
    pub note: Duration,
    pub harmony: Duration,
    pub arpeggio_interval: Duration,
    pub arpeggio_note: Duration,
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            note: Duration::from_millis(1500),
            harmony: Duration::from_millis(2000),
            arpeggio_interval: Duration::from_millis(400),
            arpeggio_note: Duration::from_millis(1500),
        }
    }
}

impl PlaybackDefaults {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            note: settings.note_duration(),
            harmony: settings.harmony_duration(),
            arpeggio_interval: settings.arpeggio_interval(),
            ..Self::default()
        }
    }
}

enum ControlMsg {
    Play { notes: Vec<Note>, duration: Duration },
    /// Cancels pending steps and sounding voices before playing.
    Replace { notes: Vec<Note>, duration: Duration },
    Arpeggio { notes: Vec<Note>, interval: Duration, duration: Duration },
    StopAll,
    Shutdown,
}

struct PendingStep {
    trigger_at: Instant,
    note: Note,
    duration: Duration,
}

struct Worker {
    tx: Sender<ControlMsg>,
    handle: Option<JoinHandle<()>>,
}

pub struct AudioEngine {
    factory: BackendFactory,
    defaults: PlaybackDefaults,
    muted: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
    listeners: Arc<ListenerList>,
    next_listener: AtomicUsize,
}

impl AudioEngine {
    /// Engine playing the piano samples under `settings.samples_dir`.
    pub fn new(settings: &Settings) -> Self {
        let dir = settings.samples_dir.clone();
        let factory: BackendFactory = Arc::new(move || -> Result<Box<dyn Backend>> {
            let sampler = sampler::Sampler::open(&dir)?;
            Ok(Box::new(sampler) as Box<dyn Backend>)
        });
        let engine = Self::with_backend(PlaybackDefaults::from_settings(settings), factory);
        engine.muted.store(settings.muted, Ordering::SeqCst);
        engine
    }

    pub fn with_backend(defaults: PlaybackDefaults, factory: BackendFactory) -> Self {
        Self {
            factory,
            defaults,
            muted: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicUsize::new(1),
        }
    }

    pub fn defaults(&self) -> PlaybackDefaults {
        self.defaults
    }

    /// Whether the worker thread has been started.
    pub fn is_initialized(&self) -> bool {
        self.worker.lock().map(|w| w.is_some()).unwrap_or(false)
    }

    pub fn play_note(&self, note: &Note, duration: Option<Duration>) {
        let duration = duration.unwrap_or(self.defaults.note);
        self.send_audible(ControlMsg::Play { notes: vec![*note], duration });
    }

    pub fn play_harmony(&self, notes: &[Note], duration: Option<Duration>) {
        if notes.is_empty() {
            return;
        }
        let duration = duration.unwrap_or(self.defaults.harmony);
        self.send_audible(ControlMsg::Replace { notes: notes.to_vec(), duration });
    }

    pub fn play_arpeggio(&self, notes: &[Note], interval: Option<Duration>) {
        if notes.is_empty() {
            return;
        }
        self.send_audible(ControlMsg::Arpeggio {
            notes: notes.to_vec(),
            interval: interval.unwrap_or(self.defaults.arpeggio_interval),
            duration: self.defaults.arpeggio_note,
        });
    }

    /// Cancels pending arpeggio steps and releases every voice.
    pub fn stop_all(&self) {
        self.send_if_running(ControlMsg::StopAll);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Muting also silences whatever is sounding. Listeners hear every call.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        if muted {
            self.stop_all();
        }
        // Listeners may subscribe or unsubscribe from inside the callback.
        let snapshot: Vec<MuteListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(muted);
        }
    }

    pub fn on_mute_change(
        &self,
        listener: impl Fn(bool) + Send + Sync + 'static,
    ) -> MuteSubscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        MuteSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn send_audible(&self, msg: ControlMsg) {
        if self.is_muted() {
            return;
        }
        let Ok(mut guard) = self.worker.lock() else {
            return;
        };
        if guard.is_none() {
            *guard = Some(self.spawn_worker());
        }
        let Some(worker) = guard.as_ref() else {
            return;
        };
        if let Err(mpsc::SendError(msg)) = worker.tx.send(msg) {
            // Worker exited after a device failure; try once more with a fresh one.
            let worker = self.spawn_worker();
            let _ = worker.tx.send(msg);
            *guard = Some(worker);
        }
    }

    fn send_if_running(&self, msg: ControlMsg) {
        if let Ok(guard) = self.worker.lock() {
            if let Some(worker) = guard.as_ref() {
                let _ = worker.tx.send(msg);
            }
        }
    }

    fn spawn_worker(&self) -> Worker {
        let (tx, rx) = mpsc::channel::<ControlMsg>();
        let factory = Arc::clone(&self.factory);
        let muted = Arc::clone(&self.muted);
        let handle = std::thread::spawn(move || {
            let mut backend = match factory() {
                Ok(b) => b,
                Err(e) => {
                    crate::console::error(format!("audio error: {:#}", e));
                    return;
                }
            };
            let mut pending: VecDeque<PendingStep> = VecDeque::new();
            loop {
                let now = Instant::now();
                let due = pending.front().map(|s| s.trigger_at);
                match rx.recv_timeout(wait_until(now, due)) {
                    Ok(ControlMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Ok(ControlMsg::StopAll) => {
                        pending.clear();
                        backend.release_all();
                    }
                    Ok(ControlMsg::Play { notes, duration }) => {
                        trigger_all(backend.as_mut(), &notes, duration);
                    }
                    Ok(ControlMsg::Replace { notes, duration }) => {
                        pending.clear();
                        backend.release_all();
                        trigger_all(backend.as_mut(), &notes, duration);
                    }
                    Ok(ControlMsg::Arpeggio { notes, interval, duration }) => {
                        pending.clear();
                        backend.release_all();
                        let times = arpeggio_schedule(Instant::now(), notes.len(), interval);
                        pending.extend(notes.into_iter().zip(times).map(|(note, trigger_at)| {
                            PendingStep { trigger_at, note, duration }
                        }));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                }

                let now = Instant::now();
                while pending.front().is_some_and(|s| s.trigger_at <= now) {
                    if muted.load(Ordering::SeqCst) {
                        pending.clear();
                        break;
                    }
                    if let Some(step) = pending.pop_front() {
                        trigger_all(backend.as_mut(), &[step.note], step.duration);
                    }
                }
                backend.service(now);
            }
            backend.release_all();
        });
        Worker { tx, handle: Some(handle) }
    }
}

fn trigger_all(backend: &mut dyn Backend, notes: &[Note], duration: Duration) {
    for note in notes {
        if let Err(e) = backend.trigger(note, duration) {
            crate::console::error(format!("failed to play {}: {:#}", note, e));
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let worker = match self.worker.get_mut() {
            Ok(w) => w.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut worker) = worker {
            let _ = worker.tx.send(ControlMsg::Shutdown);
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Keeps a mute listener registered. Dropping it unsubscribes.
#[must_use = "dropping the subscription removes the listener"]
pub struct MuteSubscription {
    id: usize,
    listeners: Weak<ListenerList>,
}

impl MuteSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for MuteSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}
