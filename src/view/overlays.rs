//! Overlay rendering (error notification, ayah range prompt, help popup)

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{RangeTarget, SurahSummary, UiState};
use super::utils::centered_rect;

pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    let Some(error_msg) = ui_state.error_message.as_deref() else {
        return;
    };

    let width = 52;
    let inner_width = (width - 4) as usize;
    let wrapped_lines = error_msg.chars().count().div_ceil(inner_width).max(1) as u16;
    let popup_area = centered_rect(frame.area(), width, wrapped_lines + 2);

    frame.render_widget(Clear, popup_area);

    let error_widget = Paragraph::new(error_msg.to_string())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error (Esc to dismiss) ")
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(error_widget, popup_area);
}

pub fn render_range_prompt(frame: &mut Frame, ui_state: &UiState, surah: Option<&SurahSummary>) {
    let Some(input) = ui_state.range_prompt.as_deref() else {
        return;
    };

    let popup_area = centered_rect(frame.area(), 46, 5);
    frame.render_widget(Clear, popup_area);

    let title = match surah {
        Some(surah) => format!(" {} ({} ayahs) ", surah.name_simple, surah.verses_count),
        None => " Ayah range ".to_string(),
    };

    let submit_hint = match ui_state.range_target {
        RangeTarget::Play => " Enter Play | Esc Cancel ",
        RangeTarget::Read => " Enter Read | Esc Cancel ",
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Ayahs: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}_", input),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "255, 1-7 or 100-  (empty for whole surah)",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let prompt = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .title_bottom(Line::from(submit_hint).right_aligned())
            .padding(Padding::horizontal(1))
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(prompt, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    // Define keybindings organized by category
    let keybindings = vec![
        ("", "── Browser ──"),
        ("↑ / ↓", "Move selection"),
        ("PgUp / PgDn", "Move by a page"),
        ("Tab", "Switch between surahs and juz"),
        ("/", "Search (Enter keeps, Esc clears)"),
        ("F", "Filter by Makkah / Madinah"),
        ("Enter / P", "Play Pleasantly the selection"),
        ("V", "Play an ayah range"),
        ("o / O", "Read the selection / an ayah range"),
        ("", ""),
        ("", "── Reader ──"),
        ("Enter / P", "Play Pleasantly from the verse"),
        ("r", "Retry a failed load"),
        ("Esc / Q", "Back to the browser"),
        ("", ""),
        ("", "── Play Pleasantly ──"),
        ("← / →", "Previous / next verse"),
        ("Home / End", "First / last verse"),
        ("Space", "Play / Pause recitation"),
        ("A", "Toggle rain ambience"),
        ("M", "Minimize / expand"),
        ("Esc", "Stop and close"),
        ("", ""),
        ("", "── Selections ──"),
        ("r / R", "Next / previous reciter"),
        ("t / T", "Next / previous translation"),
        ("", ""),
        ("", "── General ──"),
        ("H", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_area = centered_rect(frame.area(), 62, keybindings.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    // Create help text lines
    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                // Section header or empty line
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        desc.to_string(),
                        Style::default().fg(Color::White),
                    ),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (H or Esc to close) ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(Color::Black)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
