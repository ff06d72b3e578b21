//! rodio-backed audio element: fetches a source over HTTP (or from disk),
//! decodes it and plays it through its own sink on the shared output mixer

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::error::MediaError;
use super::element::{AudioElement, MediaEvent, MediaEventKind, SourceGeneration};

const END_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// State shared between the element and its background load task
struct Shared {
    generation: AtomicU64,
    wants_playing: AtomicBool,
    /// Set once the current source has played to its end
    ended: AtomicBool,
    looping: AtomicBool,
    volume: Mutex<f32>,
    sink: Mutex<Option<Arc<Sink>>>,
    /// Encoded bytes of the current source, kept so it can be replayed
    bytes: Mutex<Option<Arc<[u8]>>>,
}

impl Shared {
    fn is_current(&self, generation: SourceGeneration) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn sink(&self) -> Option<Arc<Sink>> {
        self.sink.lock().ok().and_then(|s| s.clone())
    }

    fn bytes(&self) -> Option<Arc<[u8]>> {
        self.bytes.lock().ok().and_then(|b| b.clone())
    }

    fn volume(&self) -> f32 {
        self.volume.lock().map(|v| *v).unwrap_or(1.0)
    }
}

pub struct RodioElement {
    name: &'static str,
    mixer: Mixer,
    http: reqwest::Client,
    events: Option<UnboundedSender<MediaEvent>>,
    shared: Arc<Shared>,
    bound: bool,
    task: Option<JoinHandle<()>>,
}

impl RodioElement {
    pub fn new(
        name: &'static str,
        mixer: Mixer,
        http: reqwest::Client,
        events: Option<UnboundedSender<MediaEvent>>,
    ) -> Self {
        Self {
            name,
            mixer,
            http,
            events,
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                wants_playing: AtomicBool::new(false),
                ended: AtomicBool::new(false),
                looping: AtomicBool::new(false),
                volume: Mutex::new(1.0),
                sink: Mutex::new(None),
                bytes: Mutex::new(None),
            }),
            bound: false,
            task: None,
        }
    }

    fn emit(&self, kind: MediaEventKind) {
        emit(&self.events, self.shared.generation.load(Ordering::SeqCst), kind);
    }

    /// Restart a source that already played to its end from the kept bytes.
    fn replay(&mut self) -> Result<(), MediaError> {
        let bytes = self.shared.bytes().ok_or(MediaError::NoSource)?;
        let generation = self.shared.generation.load(Ordering::SeqCst);

        self.shared.wants_playing.store(true, Ordering::SeqCst);
        let installed = install_sink(&self.mixer, &self.shared, bytes, generation).inspect_err(|_| {
            self.shared.wants_playing.store(false, Ordering::SeqCst);
        })?;
        let Some((sink, _)) = installed else {
            return Ok(());
        };

        tracing::debug!(element = self.name, generation, "Replaying ended source");
        self.emit(MediaEventKind::Playing);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.task = Some(tokio::spawn(watch_until_end(
            self.name,
            self.events.clone(),
            self.shared.clone(),
            sink,
            generation,
        )));
        Ok(())
    }
}

fn emit(events: &Option<UnboundedSender<MediaEvent>>, generation: SourceGeneration, kind: MediaEventKind) {
    if let Some(tx) = events {
        let _ = tx.send(MediaEvent { generation, kind });
    }
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, MediaError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        let response = http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MediaError::Fetch(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    } else {
        tokio::fs::read(url)
            .await
            .map_err(|e| MediaError::Fetch(format!("{}: {}", url, e)))
    }
}

fn build_sink(mixer: &Mixer, bytes: Arc<[u8]>, looping: bool) -> Result<Sink, MediaError> {
    let sink = Sink::connect_new(mixer);
    let cursor = Cursor::new(bytes);
    if looping {
        let source = Decoder::new_looped(cursor).map_err(|e| MediaError::Decode(e.to_string()))?;
        sink.append(source);
    } else {
        let source = Decoder::new(cursor).map_err(|e| MediaError::Decode(e.to_string()))?;
        sink.append(source);
    }
    Ok(sink)
}

/// Decode `bytes` onto a fresh sink and make it the current one. Returns
/// `None` when `generation` was superseded in the meantime.
fn install_sink(
    mixer: &Mixer,
    shared: &Shared,
    bytes: Arc<[u8]>,
    generation: SourceGeneration,
) -> Result<Option<(Arc<Sink>, bool)>, MediaError> {
    let sink = Arc::new(build_sink(mixer, bytes, shared.looping.load(Ordering::SeqCst))?);

    let Ok(mut slot) = shared.sink.lock() else {
        return Ok(None);
    };
    // dispose() may have run while decoding
    if !shared.is_current(generation) {
        sink.stop();
        return Ok(None);
    }
    sink.set_volume(shared.volume());
    let playing = shared.wants_playing.load(Ordering::SeqCst);
    if !playing {
        sink.pause();
    }
    shared.ended.store(false, Ordering::SeqCst);
    if let Some(previous) = slot.replace(sink.clone()) {
        previous.stop();
    }
    Ok(Some((sink, playing)))
}

async fn load_and_play(
    name: &'static str,
    mixer: Mixer,
    http: reqwest::Client,
    events: Option<UnboundedSender<MediaEvent>>,
    shared: Arc<Shared>,
    url: String,
    generation: SourceGeneration,
) {
    let bytes: Arc<[u8]> = match fetch(&http, &url).await {
        Ok(bytes) => bytes.into(),
        Err(e) => {
            tracing::warn!(element = name, url = %url, error = %e, "Audio fetch failed");
            if shared.is_current(generation) {
                emit(&events, generation, MediaEventKind::Error(e));
            }
            return;
        }
    };

    if !shared.is_current(generation) {
        return;
    }
    if let Ok(mut slot) = shared.bytes.lock() {
        *slot = Some(bytes.clone());
    }

    let (sink, playing) = match install_sink(&mixer, &shared, bytes, generation) {
        Ok(Some(installed)) => installed,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(element = name, url = %url, error = %e, "Audio decode failed");
            emit(&events, generation, MediaEventKind::Error(e));
            return;
        }
    };

    tracing::debug!(element = name, url = %url, generation, "Audio source ready");
    emit(&events, generation, MediaEventKind::CanPlay);
    if playing {
        emit(&events, generation, MediaEventKind::Playing);
    }

    watch_until_end(name, events, shared, sink, generation).await;
}

/// Poll the sink until it drains, then report the end of the source.
async fn watch_until_end(
    name: &'static str,
    events: Option<UnboundedSender<MediaEvent>>,
    shared: Arc<Shared>,
    sink: Arc<Sink>,
    generation: SourceGeneration,
) {
    loop {
        tokio::time::sleep(END_POLL_INTERVAL).await;
        if !shared.is_current(generation) {
            return;
        }
        if sink.empty() {
            tracing::debug!(element = name, generation, "Audio source ended");
            shared.wants_playing.store(false, Ordering::SeqCst);
            shared.ended.store(true, Ordering::SeqCst);
            emit(&events, generation, MediaEventKind::Ended);
            return;
        }
    }
}

impl AudioElement for RodioElement {
    fn set_source(&mut self, url: &str) -> SourceGeneration {
        self.dispose();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.bound = true;

        self.task = Some(tokio::spawn(load_and_play(
            self.name,
            self.mixer.clone(),
            self.http.clone(),
            self.events.clone(),
            self.shared.clone(),
            url.to_string(),
            generation,
        )));
        generation
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if !self.bound {
            return Err(MediaError::NoSource);
        }
        if self.shared.ended.load(Ordering::SeqCst) {
            return self.replay();
        }
        self.shared.wants_playing.store(true, Ordering::SeqCst);
        if let Some(sink) = self.shared.sink() {
            sink.play();
            self.emit(MediaEventKind::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.shared.wants_playing.store(false, Ordering::SeqCst);
        if let Some(sink) = self.shared.sink() {
            sink.pause();
            self.emit(MediaEventKind::Paused);
        }
    }

    fn is_paused(&self) -> bool {
        !self.shared.wants_playing.load(Ordering::SeqCst)
    }

    fn set_volume(&mut self, volume: f32) {
        if let Ok(mut v) = self.shared.volume.lock() {
            *v = volume;
        }
        if let Some(sink) = self.shared.sink() {
            sink.set_volume(volume);
        }
    }

    fn set_looping(&mut self, looping: bool) {
        self.shared.looping.store(looping, Ordering::SeqCst);
    }

    fn dispose(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.wants_playing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Ok(mut slot) = self.shared.sink.lock() {
            if let Some(sink) = slot.take() {
                sink.stop();
            }
        }
        if let Ok(mut bytes) = self.shared.bytes.lock() {
            *bytes = None;
        }
        self.shared.ended.store(false, Ordering::SeqCst);
        self.bound = false;
    }
}

impl Drop for RodioElement {
    fn drop(&mut self) {
        self.dispose();
    }
}
