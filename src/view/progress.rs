//! Bottom bar: minimized session progress, or browser hints when idle

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::model::{PleasantlyView, SessionStatus};

pub fn play_state_icon(view: &PleasantlyView) -> &'static str {
    if view.complete {
        "✔"
    } else if view.audio_loading {
        "…"
    } else if view.audio_playing {
        "▶"
    } else {
        "⏸"
    }
}

const BROWSER_HINTS: &str =
    " Enter: Play | o/O: Read | /: Search | f: Filter | Tab: Surahs/Juz | v: Range | h: Help | q: Quit";
const READER_HINTS: &str =
    " ↑/↓: Select verse | Enter: Play from here | t/T: Translation | Esc: Back | h: Help";

pub fn render_status_bar(frame: &mut Frame, area: Rect, view: &PleasantlyView, reader_open: bool) {
    if !view.is_active() {
        let text = if reader_open { READER_HINTS } else { BROWSER_HINTS };
        let hints = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Play Pleasantly "));
        frame.render_widget(hints, area);
        return;
    }

    render_minimized_bar(frame, area, view);
}

/// One-line summary of the running session, shown while minimized
pub fn render_minimized_bar(frame: &mut Frame, area: Rect, view: &PleasantlyView) {
    let status_text = match view.status {
        SessionStatus::Loading => format!(" {} | Preparing verses", view.title),
        SessionStatus::Error => format!(" {} | Playback stopped", view.title),
        _ => format!(" {} {} | {}", play_state_icon(view), view.title, view.progress_text()),
    };

    let controls_info = if view.minimized {
        " m/Enter: Expand | Esc: Stop "
    } else {
        " m: Minimize | Esc: Stop "
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(status_text)
                .title_bottom(Line::from(controls_info).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(view.progress_ratio())
        .label(view.progress_text());

    frame.render_widget(gauge, area);
}
