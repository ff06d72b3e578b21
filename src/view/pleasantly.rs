//! Play Pleasantly overlay: header, slide body and progress footer

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{PleasantlyView, SessionStatus};
use super::progress::play_state_icon;
use super::utils::centered_rect;

pub const MISSING_TRANSLATION: &str = "Translation not available for this verse.";

pub fn render_overlay(frame: &mut Frame, view: &PleasantlyView) {
    let area = frame.area();
    let popup_area = centered_rect(area, area.width.saturating_sub(8).max(40), area.height.saturating_sub(4));

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Play Pleasantly ")
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(" ←/→ Verse | Space Play/Pause | a Ambience | m Minimize | Esc Stop ").right_aligned())
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Slide
            Constraint::Length(3), // Progress
        ])
        .split(inner);

    render_header(frame, chunks[0], view);

    match view.status {
        SessionStatus::Loading | SessionStatus::Idle => render_loading(frame, chunks[1]),
        SessionStatus::Error => render_error(frame, chunks[1], view),
        SessionStatus::Ready => render_slide(frame, chunks[1], view),
    }

    render_footer(frame, chunks[2], view);
}

fn render_header(frame: &mut Frame, area: Rect, view: &PleasantlyView) {
    let mut title = vec![Span::styled(
        view.title.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if let Some(subtitle) = &view.subtitle {
        title.push(Span::styled(format!("  {}", subtitle), Style::default().fg(Color::Gray)));
    }

    let ambience = if view.ambience_enabled { "Rain: On" } else { "Rain: Off" };

    let lines = vec![
        Line::from(title),
        Line::from(vec![
            Span::styled("Reciter: ", Style::default().fg(Color::DarkGray)),
            Span::styled(view.reciter_label.clone(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Translation: ", Style::default().fg(Color::DarkGray)),
            Span::styled(view.translation_label.clone(), Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled(ambience, Style::default().fg(Color::Blue)),
        ]),
    ];

    let header = Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(1)));
    frame.render_widget(header, area);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Preparing verses...")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().padding(Padding::top(area.height / 2)));
    frame.render_widget(loading, area);
}

fn render_error(frame: &mut Frame, area: Rect, view: &PleasantlyView) {
    let message = view.error.as_deref().unwrap_or("Something went wrong");
    let lines = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("Esc to stop", Style::default().fg(Color::DarkGray))),
    ];
    let error = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(Block::default().padding(Padding::top(area.height / 3)));
    frame.render_widget(error, area);
}

fn render_slide(frame: &mut Frame, area: Rect, view: &PleasantlyView) {
    let Some(slide) = &view.slide else {
        render_loading(frame, area);
        return;
    };

    let reference = if slide.is_intro() {
        "Bismillah".to_string()
    } else {
        format!("{}:{}", slide.surah_id, slide.ayah_number)
    };

    let mut status = vec![
        Span::styled(
            format!("{} {}", play_state_icon(view), view.progress_text()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(format!("  [{}]", reference), Style::default().fg(Color::DarkGray)),
    ];
    if let Some(label) = &slide.segment_label {
        status.push(Span::styled(format!("  {}", label), Style::default().fg(Color::Gray)));
    }

    let translation = if slide.translation.trim().is_empty() {
        Span::styled(
            MISSING_TRANSLATION,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )
    } else {
        Span::styled(slide.translation.clone(), Style::default().fg(Color::White))
    };

    let mut lines = vec![
        Line::from(status),
        Line::from(""),
        Line::from(Span::styled(
            slide.arabic_text.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(translation),
    ];

    if view.complete {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Selection complete. ← to revisit, Esc to close.",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::new(2, 2, 1, 0)));
    frame.render_widget(body, area);
}

fn render_footer(frame: &mut Frame, area: Rect, view: &PleasantlyView) {
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::TOP))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(view.progress_ratio())
        .label(view.progress_text());
    frame.render_widget(gauge, area);
}
