//! Verse audio lifecycle: keeps the single verse element bound to whatever
//! slide the session currently cues

use tokio::task::JoinHandle;

use crate::error::MediaError;
use crate::model::{Cue, CueKey};
use super::element::{AudioElement, MediaEvent, MediaEventKind, SourceGeneration};

/// What [`VersePlayer::sync`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueAction {
    /// The cue did not change
    Unchanged,
    /// Nothing is cued any more; the element was released
    Cleared,
    /// A new source was bound and a play attempt made
    Bound(SourceGeneration),
    /// The cued slide has no audio; the caller should start the placeholder timer
    Placeholder(CueKey),
}

/// What the caller should do in response to a media event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerseSignal {
    Advance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerseAudioStatus {
    pub loading: bool,
    pub playing: bool,
}

pub struct VersePlayer {
    element: Box<dyn AudioElement>,
    bound: Option<CueKey>,
    source: Option<SourceGeneration>,
    placeholder: Option<JoinHandle<()>>,
    status: VerseAudioStatus,
}

impl VersePlayer {
    pub fn new(element: Box<dyn AudioElement>) -> Self {
        Self {
            element,
            bound: None,
            source: None,
            placeholder: None,
            status: VerseAudioStatus::default(),
        }
    }

    pub fn status(&self) -> VerseAudioStatus {
        self.status
    }

    pub fn bound(&self) -> Option<CueKey> {
        self.bound
    }

    /// Rebind to `cue` if it differs from what is bound.
    ///
    /// The previous source is always paused and unbound (and any placeholder
    /// timer cancelled) before a new one is assigned.
    pub fn sync(&mut self, cue: Option<&Cue>) -> CueAction {
        let key = cue.map(|c| c.key);
        if key == self.bound {
            return CueAction::Unchanged;
        }

        self.release();
        self.bound = key;

        let Some(cue) = cue else {
            return CueAction::Cleared;
        };

        match cue.audio_url.as_deref() {
            None => {
                tracing::debug!(slide = %cue.slide_id, "No audio for slide, using placeholder delay");
                CueAction::Placeholder(cue.key)
            }
            Some(url) => {
                self.status.loading = true;
                let generation = self.element.set_source(url);
                self.source = Some(generation);
                match self.element.play() {
                    Ok(()) => {}
                    Err(MediaError::Output) => {
                        // Nothing can be heard, so the slide is timed like a silent one
                        tracing::debug!(slide = %cue.slide_id, "No audio output, using placeholder delay");
                        self.element.dispose();
                        self.source = None;
                        self.status = VerseAudioStatus::default();
                        return CueAction::Placeholder(cue.key);
                    }
                    Err(e) => {
                        tracing::warn!(slide = %cue.slide_id, error = %e, "Play attempt failed, waiting for user interaction");
                        self.status = VerseAudioStatus::default();
                    }
                }
                tracing::debug!(slide = %cue.slide_id, generation, "Verse audio bound");
                CueAction::Bound(generation)
            }
        }
    }

    /// Hold the placeholder timer so it is aborted on the next cue change.
    pub fn set_placeholder(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.placeholder.replace(handle) {
            previous.abort();
        }
    }

    /// Track element state; ended and errored sources ask to move on.
    pub fn on_event(&mut self, event: &MediaEvent) -> Option<VerseSignal> {
        if self.source != Some(event.generation) {
            return None;
        }

        match &event.kind {
            MediaEventKind::CanPlay => {
                self.status.loading = false;
                None
            }
            MediaEventKind::Playing => {
                self.status = VerseAudioStatus {
                    loading: false,
                    playing: true,
                };
                None
            }
            MediaEventKind::Paused => {
                self.status.playing = false;
                None
            }
            MediaEventKind::Ended => {
                self.status.playing = false;
                Some(VerseSignal::Advance)
            }
            MediaEventKind::Error(e) => {
                tracing::warn!(error = %e, "Verse audio failed, skipping");
                self.status = VerseAudioStatus::default();
                Some(VerseSignal::Advance)
            }
        }
    }

    /// Play if paused, otherwise pause. Returns whether audio is now playing.
    pub fn toggle(&mut self) -> bool {
        if self.source.is_none() {
            return false;
        }

        if self.element.is_paused() {
            match self.element.play() {
                Ok(()) => self.status.playing = true,
                Err(e) => {
                    tracing::warn!(error = %e, "Manual play failed");
                    self.status = VerseAudioStatus::default();
                }
            }
        } else {
            self.element.pause();
            self.status.playing = false;
        }
        self.status.playing
    }

    /// Pause without unbinding, e.g. when the last slide completes.
    pub fn stop(&mut self) {
        self.element.pause();
        self.status.playing = false;
    }

    /// Pause and unbind; nothing is cued afterwards.
    pub fn dispose(&mut self) {
        self.release();
        self.bound = None;
    }

    fn release(&mut self) {
        if let Some(timer) = self.placeholder.take() {
            timer.abort();
        }
        self.element.pause();
        self.element.dispose();
        self.source = None;
        self.status = VerseAudioStatus::default();
    }
}

impl Drop for VersePlayer {
    fn drop(&mut self) {
        if let Some(timer) = self.placeholder.take() {
            timer.abort();
        }
    }
}
