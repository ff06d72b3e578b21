//! Surah and juz reader

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{ReaderState, ReaderStatus};
use super::utils::{render_scrollable_list, wrap_text};

pub fn render_reader(frame: &mut Frame, area: Rect, reader: &ReaderState, translation_label: &str) {
    let passage = &reader.passage;
    let title = match passage.subtitle.as_deref() {
        Some(subtitle) => format!(" {} - {} ", passage.title, subtitle),
        None => format!(" {} ", passage.title),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(format!(" {} ", translation_label)).right_aligned())
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Cyan));

    let verses = match &reader.status {
        ReaderStatus::Loading => {
            let loading = Paragraph::new("Loading verses...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(loading, area);
            return;
        }
        ReaderStatus::Failed(message) => {
            let failed = Paragraph::new(vec![
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
                Line::from(Span::styled(
                    "r to retry, Esc to go back",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .wrap(Wrap { trim: true })
            .block(block);
            frame.render_widget(failed, area);
            return;
        }
        ReaderStatus::Ready(verses) => verses,
    };

    if verses.is_empty() {
        let empty = Paragraph::new("No verses available for this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = verses
        .iter()
        .enumerate()
        .map(|(i, verse)| {
            let selected = i == reader.selected;
            let marker_style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let arabic_style = if selected {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut lines = vec![Line::from(Span::styled(format!("[{}]", verse.key()), marker_style))];
            lines.extend(
                wrap_text(&verse.arabic_text, width)
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, arabic_style)).right_aligned()),
            );
            lines.extend(
                wrap_text(&verse.translation, width)
                    .into_iter()
                    .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Gray)))),
            );
            lines.push(Line::default());
            ListItem::new(Text::from(lines))
        })
        .collect();

    render_scrollable_list(frame, area, items, reader.selected, block);
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::error::SlideError;
    use crate::model::{PlaybackRequest, ReaderVerse, Segment};

    fn reader() -> ReaderState {
        ReaderState::open(
            PlaybackRequest::new("Al-Ikhlas", vec![Segment::surah(112)]).with_subtitle("Sincerity"),
            Some(20),
        )
    }

    fn render(reader: &ReaderState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| render_reader(f, f.area(), reader, "Saheeh International"))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn ready_reader_lists_verses_with_translations() {
        let mut state = reader();
        let token = state.token();
        let verses = (1..=4)
            .map(|ayah| ReaderVerse {
                surah_id: 112,
                ayah_number: ayah,
                arabic_text: String::new(),
                translation: format!("Translation of verse {}", ayah),
                segment: 0,
            })
            .collect();
        state.finish(token, Ok(verses));

        let screen = render(&state);
        assert!(screen.contains("Al-Ikhlas - Sincerity"));
        assert!(screen.contains("[112:1]"));
        assert!(screen.contains("Translation of verse 4"));
        assert!(screen.contains("Saheeh International"));
    }

    #[test]
    fn failed_reader_offers_a_retry() {
        let mut state = reader();
        let token = state.token();
        state.finish(token, Err(SlideError::Network("Failed to retrieve surah".into())));

        let screen = render(&state);
        assert!(screen.contains("Failed to retrieve surah"));
        assert!(screen.contains("r to retry"));
    }

    #[test]
    fn loading_reader_says_so() {
        assert!(render(&reader()).contains("Loading verses..."));
    }
}
