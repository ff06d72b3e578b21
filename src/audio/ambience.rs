//! Looping background ambience, independent of verse playback

use super::element::AudioElement;

/// Volume the ambience plays at when enabled
pub const AMBIENCE_VOLUME: f32 = 0.05;

/// Toggled off by muting rather than pausing, so turning it back on never has
/// to retry a play attempt that failed earlier.
pub struct AmbientSound {
    element: Box<dyn AudioElement>,
    source: String,
    volume: f32,
    enabled: bool,
    started: bool,
}

impl AmbientSound {
    pub fn new(element: Box<dyn AudioElement>, source: impl Into<String>, volume: f32) -> Self {
        Self {
            element,
            source: source.into(),
            volume,
            enabled: true,
            started: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the loop optimistically. A failed play attempt is only logged.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.element.set_looping(true);
        self.element.set_volume(self.current_volume());
        self.element.set_source(&self.source);
        if let Err(e) = self.element.play() {
            tracing::warn!(error = %e, "Ambience playback failed");
        }
    }

    /// Flip the ambience on or off. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if self.enabled {
            self.element.set_volume(self.volume);
            if self.started && self.element.is_paused() {
                if let Err(e) = self.element.play() {
                    tracing::warn!(error = %e, "Ambience playback failed");
                }
            }
        } else {
            self.element.set_volume(0.0);
        }
        tracing::debug!(enabled = self.enabled, "Ambience toggled");
        self.enabled
    }

    /// Stop and unbind the loop. The on/off choice survives for the next start.
    pub fn dispose(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        self.element.pause();
        self.element.dispose();
    }

    fn current_volume(&self) -> f32 {
        if self.enabled { self.volume } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::element::tests::FakeElement;

    #[test]
    fn start_loops_at_low_volume() {
        let element = FakeElement::new();
        let mut ambience = AmbientSound::new(Box::new(element.clone()), "rain.mp3", AMBIENCE_VOLUME);
        ambience.start();

        let log = element.log.lock().unwrap();
        assert!(log.looping);
        assert_eq!(log.volume, AMBIENCE_VOLUME);
        assert_eq!(log.source.as_deref(), Some("rain.mp3"));
        assert!(!log.paused);
    }

    #[test]
    fn toggling_off_mutes_instead_of_pausing() {
        let element = FakeElement::new();
        let mut ambience = AmbientSound::new(Box::new(element.clone()), "rain.mp3", AMBIENCE_VOLUME);
        ambience.start();

        assert!(!ambience.toggle());
        {
            let log = element.log.lock().unwrap();
            assert_eq!(log.volume, 0.0);
            assert!(!log.paused);
        }

        assert!(ambience.toggle());
        assert_eq!(element.log.lock().unwrap().volume, AMBIENCE_VOLUME);
    }

    #[test]
    fn toggling_on_retries_a_rejected_start() {
        let element = FakeElement::new();
        element.log.lock().unwrap().reject_play = true;
        let mut ambience = AmbientSound::new(Box::new(element.clone()), "rain.mp3", AMBIENCE_VOLUME);
        ambience.start();
        assert!(element.log.lock().unwrap().paused);

        ambience.toggle();
        element.log.lock().unwrap().reject_play = false;
        element.clear_calls();
        ambience.toggle();
        assert!(element.calls().contains(&"play".to_string()));
        assert!(!element.log.lock().unwrap().paused);
    }

    #[test]
    fn disabled_state_carries_into_the_next_start() {
        let element = FakeElement::new();
        let mut ambience = AmbientSound::new(Box::new(element.clone()), "rain.mp3", AMBIENCE_VOLUME);
        ambience.start();
        ambience.toggle();
        ambience.dispose();
        assert_eq!(element.source(), None);

        ambience.start();
        assert_eq!(element.log.lock().unwrap().volume, 0.0);
        assert_eq!(element.generation(), 2);
    }
}
