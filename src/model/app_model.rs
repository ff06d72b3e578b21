//! Main application model with state management

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::SlideError;
use super::juz::{matching_juz, Juz};
use super::reader::{ReaderState, ReaderVerse};
use super::types::{BrowserTab, Catalog, RangeTarget, SurahSummary, UiState};
use super::request::Slide;
use super::session::{PlaybackSession, SessionStatus};

/// Play Pleasantly session plus the audio state mirrored for rendering
#[derive(Clone, Debug, Default)]
pub struct PleasantlyState {
    pub session: PlaybackSession,
    pub audio_loading: bool,
    pub audio_playing: bool,
    pub ambience_enabled: bool,
}

/// Render-ready snapshot of the Play Pleasantly overlay
#[derive(Clone, Debug)]
pub struct PleasantlyView {
    pub status: SessionStatus,
    pub title: String,
    pub subtitle: Option<String>,
    pub error: Option<String>,
    pub slide: Option<Slide>,
    pub index: usize,
    pub total: usize,
    pub complete: bool,
    pub minimized: bool,
    pub audio_loading: bool,
    pub audio_playing: bool,
    pub ambience_enabled: bool,
    pub reciter_label: String,
    pub translation_label: String,
}

impl PleasantlyView {
    pub fn is_active(&self) -> bool {
        self.status != SessionStatus::Idle
    }

    pub fn progress_text(&self) -> String {
        if self.total == 0 {
            "Preparing verses".to_string()
        } else {
            format!("Verse {} of {}", self.index + 1, self.total)
        }
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ((self.index + 1) as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }

    pub fn can_retreat(&self) -> bool {
        self.index > 0
    }

    pub fn can_advance(&self) -> bool {
        self.total > 0 && self.index + 1 < self.total
    }
}

/// Main application model containing all state
pub struct AppModel {
    pub ui_state: Arc<Mutex<UiState>>,
    catalog: Arc<Mutex<Catalog>>,
    pleasantly: Arc<Mutex<PleasantlyState>>,
    should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new(session: PlaybackSession) -> Self {
        Self {
            ui_state: Arc::new(Mutex::new(UiState::default())),
            catalog: Arc::new(Mutex::new(Catalog::default())),
            pleasantly: Arc::new(Mutex::new(PleasantlyState {
                session,
                ambience_enabled: true,
                ..Default::default()
            })),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Catalogue
    // ========================================================================

    pub async fn set_catalog(&self, catalog: Catalog) {
        *self.catalog.lock().await = catalog;
    }

    pub async fn get_catalog(&self) -> Catalog {
        self.catalog.lock().await.clone()
    }

    pub async fn selected_surah(&self) -> Option<SurahSummary> {
        let catalog = self.catalog.lock().await;
        let state = self.ui_state.lock().await;
        catalog
            .filtered_surahs(&state.search_query, state.revelation_filter)
            .get(state.surah_selected)
            .map(|s| (*s).clone())
    }

    pub async fn selected_juz(&self) -> Option<Juz> {
        let catalog = self.catalog.lock().await;
        let state = self.ui_state.lock().await;
        matching_juz(&state.search_query, &catalog)
            .into_iter()
            .nth(state.juz_selected)
    }

    // ========================================================================
    // Play Pleasantly
    // ========================================================================

    /// Run `f` against the session under the lock.
    pub async fn with_session<R>(&self, f: impl FnOnce(&mut PlaybackSession) -> R) -> R {
        let mut state = self.pleasantly.lock().await;
        f(&mut state.session)
    }

    pub async fn get_session(&self) -> PlaybackSession {
        self.pleasantly.lock().await.session.clone()
    }

    pub async fn set_audio_status(&self, loading: bool, playing: bool) {
        let mut state = self.pleasantly.lock().await;
        state.audio_loading = loading;
        state.audio_playing = playing;
    }

    pub async fn set_ambience_enabled(&self, enabled: bool) {
        self.pleasantly.lock().await.ambience_enabled = enabled;
    }

    pub async fn get_pleasantly_view(&self) -> PleasantlyView {
        let catalog = self.catalog.lock().await;
        let state = self.pleasantly.lock().await;
        let session = &state.session;

        let reciter_label = session
            .reciter_id()
            .and_then(|id| catalog.reciter(id))
            .map(|r| r.label())
            .unwrap_or_else(|| "Select a reciter".to_string());
        let translation_label = session
            .translation_id()
            .and_then(|id| catalog.translation(id))
            .map(|t| t.label())
            .unwrap_or_else(|| "Select a translation".to_string());

        let request = session.request();

        PleasantlyView {
            status: session.status(),
            title: request.map(|r| r.title.clone()).unwrap_or_default(),
            subtitle: request.and_then(|r| r.subtitle.clone()),
            error: session.error().map(|e| e.to_string()),
            slide: session.current_slide().cloned(),
            index: session.current_index(),
            total: session.slides().len(),
            complete: session.is_complete(),
            minimized: session.is_minimized(),
            audio_loading: state.audio_loading,
            audio_playing: state.audio_playing,
            ambience_enabled: state.ambience_enabled,
            reciter_label,
            translation_label,
        }
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn move_selection_up(&self) {
        self.move_selection_by(-1).await;
    }

    pub async fn move_selection_down(&self) {
        self.move_selection_by(1).await;
    }

    /// Move within the list of the current tab, clamped to what the search
    /// and filter leave visible.
    pub async fn move_selection_by(&self, delta: isize) {
        let catalog = self.catalog.lock().await;
        let mut state = self.ui_state.lock().await;
        let tab = state.tab;
        let count = match tab {
            BrowserTab::Surahs => catalog
                .filtered_surahs(&state.search_query, state.revelation_filter)
                .len(),
            BrowserTab::Juz => matching_juz(&state.search_query, &catalog).len(),
        };
        let selected = match tab {
            BrowserTab::Surahs => &mut state.surah_selected,
            BrowserTab::Juz => &mut state.juz_selected,
        };
        if count == 0 {
            *selected = 0;
            return;
        }
        let target = *selected as isize + delta;
        *selected = target.clamp(0, count as isize - 1) as usize;
    }

    pub async fn toggle_tab(&self) {
        let mut state = self.ui_state.lock().await;
        state.tab = match state.tab {
            BrowserTab::Surahs => BrowserTab::Juz,
            BrowserTab::Juz => BrowserTab::Surahs,
        };
    }

    pub async fn current_tab(&self) -> BrowserTab {
        self.ui_state.lock().await.tab
    }

    pub async fn cycle_revelation_filter(&self) {
        let mut state = self.ui_state.lock().await;
        state.revelation_filter = state.revelation_filter.next();
        state.surah_selected = 0;
    }

    // ========================================================================
    // Search
    // ========================================================================

    pub async fn start_search(&self) {
        self.ui_state.lock().await.search_editing = true;
    }

    pub async fn is_search_editing(&self) -> bool {
        self.ui_state.lock().await.search_editing
    }

    pub async fn push_search_char(&self, c: char) {
        let mut state = self.ui_state.lock().await;
        if state.search_query.chars().count() < 32 {
            state.search_query.push(c);
            Self::reset_selection(&mut state);
        }
    }

    pub async fn pop_search_char(&self) {
        let mut state = self.ui_state.lock().await;
        if state.search_query.pop().is_some() {
            Self::reset_selection(&mut state);
        }
    }

    /// Stop typing, keeping the query applied.
    pub async fn finish_search(&self) {
        self.ui_state.lock().await.search_editing = false;
    }

    pub async fn clear_search(&self) {
        let mut state = self.ui_state.lock().await;
        state.search_editing = false;
        state.search_query.clear();
        Self::reset_selection(&mut state);
    }

    fn reset_selection(state: &mut UiState) {
        state.surah_selected = 0;
        state.juz_selected = 0;
    }

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn toggle_help_popup(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_help_popup = !state.show_help_popup;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // Ayah range prompt
    // ========================================================================

    pub async fn open_range_prompt(&self, target: RangeTarget) {
        let mut state = self.ui_state.lock().await;
        state.range_prompt = Some(String::new());
        state.range_target = target;
    }

    pub async fn range_target(&self) -> RangeTarget {
        self.ui_state.lock().await.range_target
    }

    pub async fn is_range_prompt_open(&self) -> bool {
        self.ui_state.lock().await.range_prompt.is_some()
    }

    pub async fn append_to_range_prompt(&self, c: char) {
        if let Some(input) = self.ui_state.lock().await.range_prompt.as_mut() {
            if input.len() < 16 {
                input.push(c);
            }
        }
    }

    pub async fn backspace_range_prompt(&self) {
        if let Some(input) = self.ui_state.lock().await.range_prompt.as_mut() {
            input.pop();
        }
    }

    /// Close the prompt, returning what was typed.
    pub async fn take_range_prompt(&self) -> Option<String> {
        self.ui_state.lock().await.range_prompt.take()
    }

    // ========================================================================
    // Reader
    // ========================================================================

    /// Replace any open reader, returning the token of its first load.
    pub async fn open_reader(&self, reader: ReaderState) -> u64 {
        let token = reader.token();
        self.ui_state.lock().await.reader = Some(reader);
        token
    }

    pub async fn close_reader(&self) {
        self.ui_state.lock().await.reader = None;
    }

    pub async fn is_reader_open(&self) -> bool {
        self.ui_state.lock().await.reader.is_some()
    }

    /// Run `f` against the open reader, if any.
    pub async fn with_reader<R>(&self, f: impl FnOnce(&mut ReaderState) -> R) -> Option<R> {
        self.ui_state.lock().await.reader.as_mut().map(f)
    }

    pub async fn finish_reader(&self, token: u64, result: Result<Vec<ReaderVerse>, SlideError>) -> bool {
        self.with_reader(|reader| reader.finish(token, result))
            .await
            .unwrap_or(false)
    }
}
