//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{BrowserTab, RangeTarget};
use super::AppController;

/// Rows skipped by PageUp/PageDown in the browser and reader
const PAGE_SIZE: isize = 10;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            model.set_should_quit(true).await;
            return Ok(());
        }

        // Handle error message first (blocks all other interactions)
        if model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error().await;
            }
            return Ok(());
        }

        // Handle help popup
        if model.is_help_popup_open().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.hide_help_popup().await;
            }
            return Ok(());
        }

        // The overlay owns the keyboard while a session is open
        let session = model.get_session().await;
        if session.is_active() {
            drop(model);
            if session.is_minimized() {
                self.handle_minimized_key(key).await;
            } else {
                self.handle_overlay_key(key).await;
            }
            return Ok(());
        }

        // Handle ayah range prompt
        if model.is_range_prompt_open().await {
            match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                    model.append_to_range_prompt(c).await;
                }
                KeyCode::Backspace => {
                    model.backspace_range_prompt().await;
                }
                KeyCode::Enter => {
                    drop(model);
                    self.submit_range_prompt().await;
                }
                KeyCode::Esc => {
                    model.take_range_prompt().await;
                }
                _ => {}
            }
            return Ok(());
        }

        if model.is_reader_open().await {
            drop(model);
            self.handle_reader_key(key).await;
            return Ok(());
        }

        // Search input captures every printable key
        if model.is_search_editing().await {
            match key.code {
                KeyCode::Char(c) => model.push_search_char(c).await,
                KeyCode::Backspace => model.pop_search_char().await,
                KeyCode::Enter | KeyCode::Down => model.finish_search().await,
                KeyCode::Esc => model.clear_search().await,
                _ => {}
            }
            return Ok(());
        }

        // Surah and juz browser
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Char('/') => {
                model.start_search().await;
            }
            KeyCode::Esc => {
                model.clear_search().await;
            }
            KeyCode::Tab => {
                model.toggle_tab().await;
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                model.cycle_revelation_filter().await;
            }
            KeyCode::Char('o') => {
                drop(model);
                self.read_selected().await;
            }
            KeyCode::Char('O') => {
                if model.current_tab().await == BrowserTab::Surahs
                    && model.selected_surah().await.is_some()
                {
                    model.open_range_prompt(RangeTarget::Read).await;
                }
            }
            KeyCode::Up => {
                model.move_selection_up().await;
            }
            KeyCode::Down => {
                model.move_selection_down().await;
            }
            KeyCode::PageUp => {
                model.move_selection_by(-PAGE_SIZE).await;
            }
            KeyCode::PageDown => {
                model.move_selection_by(PAGE_SIZE).await;
            }
            KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('P') => {
                drop(model);
                self.play_selected().await;
            }
            KeyCode::Char('v') | KeyCode::Char('V') => {
                if model.current_tab().await == BrowserTab::Surahs
                    && model.selected_surah().await.is_some()
                {
                    model.open_range_prompt(RangeTarget::Play).await;
                }
            }
            KeyCode::Char('r') => {
                drop(model);
                self.cycle_reciter(true).await;
            }
            KeyCode::Char('R') => {
                drop(model);
                self.cycle_reciter(false).await;
            }
            KeyCode::Char('t') => {
                drop(model);
                self.cycle_translation(true).await;
            }
            KeyCode::Char('T') => {
                drop(model);
                self.cycle_translation(false).await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.toggle_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_reader_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.close_reader().await;
            }
            KeyCode::Up => self.move_reader_selection(-1).await,
            KeyCode::Down => self.move_reader_selection(1).await,
            KeyCode::PageUp => self.move_reader_selection(-PAGE_SIZE).await,
            KeyCode::PageDown => self.move_reader_selection(PAGE_SIZE).await,
            KeyCode::Home => self.move_reader_selection(isize::MIN).await,
            KeyCode::End => self.reader_select_last().await,
            KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('P') => {
                self.play_from_reader().await;
            }
            KeyCode::Char('r') => {
                self.refresh_reader().await;
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.cycle_translation(key.code == KeyCode::Char('t')).await;
                self.refresh_reader().await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.model.lock().await.toggle_help_popup().await;
            }
            _ => {}
        }
    }

    async fn handle_overlay_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_pleasantly().await,
            KeyCode::Right => self.advance().await,
            KeyCode::Left => self.retreat().await,
            KeyCode::Char(' ') => self.toggle_verse_playback().await,
            KeyCode::Char('m') | KeyCode::Char('M') => self.minimize_pleasantly().await,
            KeyCode::Char('a') | KeyCode::Char('A') => self.toggle_ambience().await,
            KeyCode::Home => self.jump_to(0).await,
            KeyCode::End => self.jump_to(usize::MAX).await,
            KeyCode::Char('r') => {
                self.cycle_reciter(true).await;
            }
            KeyCode::Char('R') => {
                self.cycle_reciter(false).await;
            }
            KeyCode::Char('t') => {
                self.cycle_translation(true).await;
            }
            KeyCode::Char('T') => {
                self.cycle_translation(false).await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.model.lock().await.toggle_help_popup().await;
            }
            _ => {}
        }
    }

    async fn handle_minimized_key(&self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_pleasantly().await,
            KeyCode::Enter | KeyCode::Char('m') | KeyCode::Char('M') => self.expand_pleasantly().await,
            _ => {}
        }
    }
}
