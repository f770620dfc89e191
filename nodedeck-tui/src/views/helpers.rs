//! Common view rendering helpers.

use nodedeck_core::Timestamp;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::Span,
    widgets::{block::Title, Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::lifecycle::PanelPhase;
use crate::panel::PanelDriver;
use crate::state::App;
use crate::widgets::PanelStatusLine;

/// Human age of a payload, e.g. `12s ago`, `4m ago`.
pub fn format_age(cached_at: Timestamp, now: Timestamp) -> String {
    let secs = now.signed_duration_since(cached_at).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// Bordered block titled with the panel name and its status line.
pub fn panel_block<'a>(app: &App, title: &'a str, panel: &dyn PanelDriver) -> Block<'a> {
    let status = PanelStatusLine {
        panel,
        theme: &app.theme,
    }
    .line();
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focus))
        .title(Span::styled(title, Style::default().fg(app.theme.primary)))
        .title(Title::from(status).alignment(Alignment::Right))
}

/// Draw the loading, error or idle placeholder when the panel has nothing
/// to show. Returns false if the caller should render data instead.
pub fn render_placeholder(
    f: &mut Frame<'_>,
    app: &App,
    panel: &dyn PanelDriver,
    has_data: bool,
    block: Block<'_>,
    area: Rect,
) -> bool {
    if has_data {
        return false;
    }
    let (text, color) = match panel.phase() {
        PanelPhase::Idle => ("No device selected".to_string(), app.theme.text_dim),
        PanelPhase::AwaitingCache => ("Checking cache…".to_string(), app.theme.info),
        PanelPhase::Loading => ("Loading from device…".to_string(), app.theme.info),
        PanelPhase::Error => (
            format!(
                "{}\n\nPress r or Enter to retry.",
                panel
                    .last_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Request failed".to_string())
            ),
            app.theme.error,
        ),
        PanelPhase::Ready | PanelPhase::RefreshingInBackground => {
            ("No data".to_string(), app.theme.text_dim)
        }
    };
    let body = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(body, area);
    true
}
