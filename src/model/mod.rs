//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Catalogue entries and UI state
//! - `request`: Playback requests, segments and slides
//! - `session`: The Play Pleasantly session state machine
//! - `slides`: Slide builder
//! - `juz`: The thirty juz divisions
//! - `reader`: Surah and juz reader state
//! - `cache`: Slide-building caches and the preferences store
//! - `quran_client`: Content API client
//! - `app_model`: Main application model with state management methods

mod types;
mod request;
mod session;
mod slides;
mod juz;
mod reader;
mod cache;
mod quran_client;
mod app_model;

// Re-export all public types for convenient access
pub use types::{
    BrowserTab, Catalog, RangeTarget, ReciterSummary, RevelationFilter, SurahSummary,
    TranslationSummary, UiState,
};

pub use juz::{matching_juz, Juz};

pub use reader::{load_passage, ReaderState, ReaderStatus, ReaderVerse};

pub use request::{PlaybackRequest, Segment, Slide};

pub use session::{Advance, BuildJob, Cue, CueKey, PlaybackSession, SessionStatus};

pub use slides::build_slides;

pub use cache::{PreferencesStore, SlideCaches};

pub use quran_client::{QuranApiClient, QuranContent};

pub use app_model::{AppModel, PleasantlyView};

#[cfg(test)]
pub(crate) use slides::tests::FakeContent;
