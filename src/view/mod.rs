//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists, popup placement)
//! - `layout`: Main layout structure (top bar, surah and juz browser)
//! - `reader`: Verse text and translation for a surah or juz
//! - `pleasantly`: The Play Pleasantly overlay
//! - `progress`: Bottom bar, including the minimized session bar
//! - `overlays`: Modal overlays (error, range prompt, help)

mod utils;
mod layout;
mod reader;
mod pleasantly;
mod progress;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{Catalog, PleasantlyView, UiState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, ui_state: &UiState, catalog: &Catalog, pleasantly: &PleasantlyView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Reciter + translation
                Constraint::Min(0),    // Browser or reader
                Constraint::Length(3), // Hints or minimized session
            ])
            .split(frame.area());

        layout::render_top_bar(frame, chunks[0], pleasantly);
        match ui_state.reader.as_ref() {
            Some(reader) => reader::render_reader(frame, chunks[1], reader, &pleasantly.translation_label),
            None => layout::render_browser(frame, chunks[1], catalog, ui_state),
        }
        progress::render_status_bar(frame, chunks[2], pleasantly, ui_state.reader.is_some());

        if pleasantly.is_active() && !pleasantly.minimized {
            pleasantly::render_overlay(frame, pleasantly);
        }

        if ui_state.range_prompt.is_some() {
            let surahs = catalog.filtered_surahs(&ui_state.search_query, ui_state.revelation_filter);
            overlays::render_range_prompt(frame, ui_state, surahs.get(ui_state.surah_selected).copied());
        }

        // Error notification overlay (if there's an error)
        if ui_state.error_message.is_some() {
            overlays::render_error_notification(frame, ui_state);
        }

        // Help popup overlay (if open)
        if ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
