//! View rendering dispatch.

pub mod helpers;
pub mod power;
pub mod sensors;
pub mod settings;
pub mod webhooks;

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::state::App;

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);
    render_tabs(f, app, layout[1]);

    match app.active_view {
        View::Settings => settings::render(f, app, layout[2]),
        View::Webhooks => webhooks::render(f, app, layout[2]),
        View::Power => power::render(f, app, layout[2]),
        View::Sensors => sensors::render(f, app, layout[2]),
    }

    render_footer(f, app, layout[3]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let device = match (app.current_device(), app.device_name()) {
        (Some(id), Some(name)) => format!("{} ({})", name, id),
        (Some(id), None) => id.to_string(),
        _ => "no device".to_string(),
    };
    let position = app
        .selected_device
        .map(|idx| format!(" [{}/{}]", idx + 1, app.devices.len()))
        .unwrap_or_default();
    let cache = match &app.cache_stats {
        Some(stats) => format!(
            "cache {} · {} entries · {:.0}% hits",
            app.cache_backend.label(),
            stats.entry_count,
            stats.hit_rate() * 100.0
        ),
        None => format!("cache {}", app.cache_backend.label()),
    };
    let line = Line::from(vec![
        Span::styled("NODEDECK ", Style::default().fg(app.theme.primary).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{}{}", device, position), Style::default().fg(app.theme.text)),
        Span::styled(format!("  |  {}", cache), Style::default().fg(app.theme.text_dim)),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(header, area);
}

fn render_tabs(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line> = View::all()
        .iter()
        .enumerate()
        .map(|(idx, view)| Line::from(format!("{} {}", idx + 1, view.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_view.index())
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(Style::default().fg(app.theme.primary).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(tabs, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = if app.settings_form.is_some() {
        "type to edit • Tab next field • Enter save • Esc cancel"
    } else {
        "Tab/1-4 panel • [ ] device • r refresh • e edit • p purge cache • q quit"
    };
    let now = Utc::now();
    let (text, style) = match app.notifications.last().filter(|n| n.is_visible_at(now)) {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Info => app.theme.info,
                NotificationLevel::Warning => app.theme.warning,
                NotificationLevel::Error => app.theme.error,
                NotificationLevel::Success => app.theme.success,
            };
            (
                format!("{}: {}", note.level.label(), note.message),
                Style::default().fg(color),
            )
        }
        None => (help.to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(style);
    f.render_widget(footer, area);
}
