//! Audio module - output device, audio elements and playback lifecycles
//!
//! - `element`: the `AudioElement` trait every playable slot implements
//! - `rodio_element`: rodio-backed element used at runtime
//! - `verse`: binds the verse element to the session's current slide
//! - `ambience`: looping background track with a mute toggle

mod element;
mod rodio_element;
mod verse;
mod ambience;

use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamBuilder};
use tokio::sync::mpsc::UnboundedSender;

pub use element::{AudioElement, MediaEvent, MediaEventKind, NullElement, SourceGeneration};
pub use rodio_element::RodioElement;
pub use verse::{CueAction, VerseAudioStatus, VersePlayer, VerseSignal};
pub use ambience::{AmbientSound, AMBIENCE_VOLUME};

#[cfg(test)]
pub(crate) use element::tests::FakeElement;

/// Owns the output stream. Every element plays through its mixer, so the
/// backend must outlive them.
pub struct AudioBackend {
    stream: OutputStream,
}

impl AudioBackend {
    pub fn open() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .context("failed to open default audio output")?;
        stream.log_on_drop(false);
        tracing::info!("Audio output opened");
        Ok(Self { stream })
    }

    pub fn element(
        &self,
        name: &'static str,
        http: reqwest::Client,
        events: Option<UnboundedSender<MediaEvent>>,
    ) -> RodioElement {
        RodioElement::new(name, self.stream.mixer().clone(), http, events)
    }
}
