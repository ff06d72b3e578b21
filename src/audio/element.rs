//! The audio element abstraction the playback layer drives

use crate::error::MediaError;

/// Identifies one bound source. Events carry it so that events from a source
/// that has since been replaced or disposed can be ignored.
pub type SourceGeneration = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaEventKind {
    CanPlay,
    Playing,
    Paused,
    Ended,
    Error(MediaError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaEvent {
    pub generation: SourceGeneration,
    pub kind: MediaEventKind,
}

/// A single playable audio slot, in the spirit of an HTML media element.
pub trait AudioElement: Send {
    /// Bind `url`, disposing whatever was bound before. Loading happens in the
    /// background and is reported through media events.
    fn set_source(&mut self, url: &str) -> SourceGeneration;

    /// Start or resume playback of the bound source.
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn set_volume(&mut self, volume: f32);

    fn set_looping(&mut self, looping: bool);

    /// Pause and unbind the current source.
    fn dispose(&mut self);
}

/// Element used when no output device could be opened. Every play attempt
/// fails with [`MediaError::Output`].
#[derive(Debug, Default)]
pub struct NullElement {
    generation: SourceGeneration,
    bound: bool,
}

impl AudioElement for NullElement {
    fn set_source(&mut self, _url: &str) -> SourceGeneration {
        self.generation += 1;
        self.bound = true;
        self.generation
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if !self.bound {
            return Err(MediaError::NoSource);
        }
        Err(MediaError::Output)
    }

    fn pause(&mut self) {}

    fn is_paused(&self) -> bool {
        true
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn dispose(&mut self) {
        self.bound = false;
    }
}
