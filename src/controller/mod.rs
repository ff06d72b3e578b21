//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and drives the Play Pleasantly session.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Session lifecycle, slide builds and verse audio binding
//! - `navigation`: Catalogue loading and surah browser actions
//! - `reader`: Surah and juz reader
//! - `player_events`: Media event listener for the verse audio element

mod input;
mod playback;
mod navigation;
mod reader;
mod player_events;

pub use navigation::SelectionOverrides;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::audio::{AmbientSound, VersePlayer};
use crate::model::{AppModel, PreferencesStore, QuranContent, SlideCaches};

/// Delay before a slide without recitation audio advances on its own
pub const DEFAULT_PLACEHOLDER_DELAY: Duration = Duration::from_millis(2000);

/// Audio resources owned for the life of the app
pub struct AudioSlots {
    pub verse: VersePlayer,
    pub ambience: AmbientSound,
}

// Lock order: `verse` before `model`. Never await the verse or ambience lock
// while holding the model lock.
#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    content: Arc<dyn QuranContent>,
    caches: SlideCaches,
    verse: Arc<Mutex<VersePlayer>>,
    ambience: Arc<Mutex<AmbientSound>>,
    preferences: PreferencesStore,
    placeholder_delay: Duration,
}

impl AppController {
    pub fn new(
        model: Arc<Mutex<AppModel>>,
        content: Arc<dyn QuranContent>,
        audio: AudioSlots,
        preferences: PreferencesStore,
    ) -> Self {
        Self {
            model,
            content,
            caches: SlideCaches::new(),
            verse: Arc::new(Mutex::new(audio.verse)),
            ambience: Arc::new(Mutex::new(audio.ambience)),
            preferences,
            placeholder_delay: DEFAULT_PLACEHOLDER_DELAY,
        }
    }

    pub fn with_placeholder_delay(mut self, delay: Duration) -> Self {
        self.placeholder_delay = delay;
        self
    }

    pub(crate) fn format_error(error: &anyhow::Error) -> String {
        let error_str = error.to_string();

        if error_str.contains("404") {
            "Content not found on the server.".to_string()
        } else if error_str.contains("429") {
            "Rate limited. Please wait a moment.".to_string()
        } else if error_str.contains(": 5") {
            "The content service is unavailable. Try again later.".to_string()
        } else if error_str.contains("timed out") || error_str.contains("timeout") {
            "Request timed out. Check your connection.".to_string()
        } else if error_str.contains("response format is invalid") {
            "Unexpected response from the content service.".to_string()
        } else {
            format!("Error: {}", error_str)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::{AudioElement, FakeElement, NullElement, AMBIENCE_VOLUME};
    use crate::model::{Catalog, FakeContent, PlaybackSession, ReciterSummary, TranslationSummary};
    use tempfile::TempDir;

    /// Controller wired to fakes, plus handles to inspect them
    pub(crate) struct Harness {
        pub controller: AppController,
        pub content: Arc<FakeContent>,
        pub verse: FakeElement,
        pub ambience: FakeElement,
        pub _dir: TempDir,
    }

    fn reciter(id: u32) -> ReciterSummary {
        ReciterSummary {
            id,
            name: format!("Reciter {}", id),
            style: None,
            translated_name: None,
        }
    }

    fn translation(id: u32) -> TranslationSummary {
        TranslationSummary {
            id,
            name: format!("Translation {}", id),
            author_name: None,
            slug: None,
            language_name: "english".to_string(),
            translated_name: None,
        }
    }

    pub(crate) async fn harness(content: FakeContent) -> Harness {
        let verse = FakeElement::new();
        harness_with_verse(content, verse.clone(), Box::new(verse)).await
    }

    /// Harness whose verse slot has no output device. `Harness::verse` is
    /// left unwired.
    pub(crate) async fn silent_harness(content: FakeContent) -> Harness {
        harness_with_verse(content, FakeElement::new(), Box::new(NullElement::default())).await
    }

    async fn harness_with_verse(
        content: FakeContent,
        verse: FakeElement,
        verse_element: Box<dyn AudioElement>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let content = Arc::new(content);
        let ambience = FakeElement::new();

        let model = AppModel::new(PlaybackSession::new(Some(7), Some(20)));
        model
            .set_catalog(Catalog {
                surahs: Vec::new(),
                reciters: vec![reciter(7), reciter(8)],
                translations: vec![translation(20), translation(21)],
            })
            .await;

        let controller = AppController::new(
            Arc::new(Mutex::new(model)),
            content.clone(),
            AudioSlots {
                verse: VersePlayer::new(verse_element),
                ambience: AmbientSound::new(Box::new(ambience.clone()), "rain.mp3", AMBIENCE_VOLUME),
            },
            PreferencesStore::new(dir.path()),
        );

        Harness {
            controller,
            content,
            verse,
            ambience,
            _dir: dir,
        }
    }

    #[test]
    fn format_error_maps_common_failures() {
        let not_found = anyhow::anyhow!("Failed to list surahs: 404 Not Found");
        assert_eq!(AppController::format_error(&not_found), "Content not found on the server.");

        let unavailable = anyhow::anyhow!("Failed to list reciters: 503 Service Unavailable");
        assert_eq!(
            AppController::format_error(&unavailable),
            "The content service is unavailable. Try again later."
        );

        let other = anyhow::anyhow!("boom");
        assert_eq!(AppController::format_error(&other), "Error: boom");
    }
}
