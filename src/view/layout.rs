//! Layout rendering (top bar, surah browser)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{matching_juz, BrowserTab, Catalog, PleasantlyView, RevelationFilter, UiState};
use super::utils::{calculate_num_width, render_scrollable_list, truncate_string};

pub fn render_top_bar(frame: &mut Frame, area: Rect, pleasantly: &PleasantlyView) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50), // Reciter
            Constraint::Percentage(50), // Translation
        ])
        .split(area);

    let reciter = Paragraph::new(format!("🎙 {}", pleasantly.reciter_label))
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Reciter (r/R) ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(reciter, chunks[0]);

    let translation = Paragraph::new(pleasantly.translation_label.as_str())
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Translation (t/T) ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(translation, chunks[1]);
}

/// Surah or juz list, with the active tab, filter and search in the title
pub fn render_browser(frame: &mut Frame, area: Rect, catalog: &Catalog, ui_state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(browser_title(ui_state))
        .title_bottom(search_line(ui_state))
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green));

    match ui_state.tab {
        BrowserTab::Surahs => render_surah_list(frame, area, catalog, ui_state, block),
        BrowserTab::Juz => render_juz_list(frame, area, catalog, ui_state, block),
    }
}

fn browser_title(ui_state: &UiState) -> Line<'static> {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                format!(" {} ", label),
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {} ", label), Style::default().fg(Color::Gray))
        }
    };

    let mut spans = vec![
        Span::raw(" "),
        tab("Surahs", ui_state.tab == BrowserTab::Surahs),
        Span::raw(" "),
        tab("Juz", ui_state.tab == BrowserTab::Juz),
        Span::raw(" "),
    ];
    if ui_state.tab == BrowserTab::Surahs && ui_state.revelation_filter != RevelationFilter::All {
        spans.push(Span::styled(
            format!("[{}] ", ui_state.revelation_filter.label()),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn search_line(ui_state: &UiState) -> Line<'static> {
    if ui_state.search_editing {
        Line::from(Span::styled(
            format!(" /{}_ ", ui_state.search_query),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else if !ui_state.search_query.is_empty() {
        Line::from(Span::styled(
            format!(" /{} (Esc clears) ", ui_state.search_query),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::default()
    }
}

fn render_empty(frame: &mut Frame, area: Rect, block: Block, message: &str) {
    let empty = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    frame.render_widget(empty, area);
}

fn render_surah_list(frame: &mut Frame, area: Rect, catalog: &Catalog, ui_state: &UiState, block: Block) {
    if catalog.surahs.is_empty() {
        render_empty(frame, area, block, "Loading surahs...");
        return;
    }

    let surahs = catalog.filtered_surahs(&ui_state.search_query, ui_state.revelation_filter);
    if surahs.is_empty() {
        render_empty(frame, area, block, "No surahs match");
        return;
    }

    let num_width = calculate_num_width(catalog.surahs.len());
    let content_width = area.width.saturating_sub(4) as usize;
    // Format: "{num} {name}  {meaning}  {verses} ayahs"
    let name_width = (content_width.saturating_sub(num_width + 14) * 45) / 100;
    let meaning_width = content_width.saturating_sub(num_width + 14 + name_width);

    let items: Vec<ListItem> = surahs
        .iter()
        .enumerate()
        .map(|(i, surah)| {
            let is_selected = i == ui_state.surah_selected;
            let name_style = if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let meaning = surah
                .translated_name
                .as_ref()
                .map(|t| t.name.as_str())
                .unwrap_or(surah.revelation_place.as_str());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>width$} ", surah.id, width = num_width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(truncate_string(&surah.name_simple, name_width), name_style),
                Span::raw("  "),
                Span::styled(
                    truncate_string(meaning, meaning_width),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{:>4} ayahs", surah.verses_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    render_scrollable_list(frame, area, items, ui_state.surah_selected, block);
}

fn render_juz_list(frame: &mut Frame, area: Rect, catalog: &Catalog, ui_state: &UiState, block: Block) {
    let juz_list = matching_juz(&ui_state.search_query, catalog);
    if juz_list.is_empty() {
        render_empty(frame, area, block, "No juz match");
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    // Format: "Juz {nn}  {range}  {surahs}"
    let surahs_width = content_width.saturating_sub(8 + 18);

    let items: Vec<ListItem> = juz_list
        .iter()
        .enumerate()
        .map(|(i, juz)| {
            let name_style = if i == ui_state.juz_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("Juz {:>2}  ", juz.number), name_style),
                Span::styled(
                    format!("{:<18}", juz.range_label(catalog)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    truncate_string(&juz.surah_names(catalog).join(", "), surahs_width),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    render_scrollable_list(frame, area, items, ui_state.juz_selected, block);
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::model::SurahSummary;

    fn catalog() -> Catalog {
        let surah = |id: u16, name: &str, place: &str| SurahSummary {
            id,
            revelation_place: place.into(),
            name_simple: name.into(),
            name_arabic: String::new(),
            verses_count: 7,
            translated_name: None,
        };
        Catalog {
            surahs: vec![
                surah(1, "Al-Fatihah", "makkah"),
                surah(2, "Al-Baqarah", "madinah"),
                surah(112, "Al-Ikhlas", "makkah"),
            ],
            ..Default::default()
        }
    }

    fn render(ui_state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| render_browser(f, f.area(), &catalog(), ui_state))
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
    fn search_and_filter_hide_non_matching_surahs() {
        let state = UiState {
            search_query: "al-".into(),
            revelation_filter: RevelationFilter::Makkah,
            ..Default::default()
        };
        let screen = render(&state);
        assert!(screen.contains("Al-Fatihah"));
        assert!(screen.contains("Al-Ikhlas"));
        assert!(!screen.contains("Al-Baqarah"));
        assert!(screen.contains("[Makkah]"));
        assert!(screen.contains("/al- (Esc clears)"));
    }

    #[test]
    fn empty_search_result_says_so() {
        let state = UiState {
            search_query: "zzz".into(),
            search_editing: true,
            ..Default::default()
        };
        let screen = render(&state);
        assert!(screen.contains("No surahs match"));
        assert!(screen.contains("/zzz_"));
    }

    #[test]
    fn juz_tab_lists_ranges_and_surahs() {
        let state = UiState {
            tab: BrowserTab::Juz,
            ..Default::default()
        };
        let screen = render(&state);
        assert!(screen.contains("Juz  1"));
        assert!(screen.contains("1:1 - 2:141"));
        assert!(screen.contains("Al-Fatihah, Al-Baqarah"));
    }
}
