//! System settings view and edit form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::helpers::{panel_block, render_placeholder};
use crate::panels::{SettingsField, SettingsForm};
use crate::state::App;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let panel = &app.panels.settings;
    let block = panel_block(app, "System Settings", panel);
    let settings = panel.displayed();
    if render_placeholder(f, app, panel, settings.is_some(), block.clone(), area) {
        return;
    }
    let Some(settings) = settings else {
        return;
    };

    let label = Style::default().fg(app.theme.secondary);
    let rows = [
        ("Hostname", settings.hostname.clone()),
        ("Timezone", settings.timezone.clone()),
        (
            "Reporting interval",
            format!("{}s", settings.reporting_interval_secs),
        ),
        ("Firmware", settings.firmware_version.clone()),
    ];
    let mut lines: Vec<Line> = rows
        .into_iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{:<20}", name), label),
                Span::styled(value, Style::default().fg(app.theme.text)),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    let hint = if app.saving_settings {
        "Saving…"
    } else {
        "e edit"
    };
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(app.theme.text_dim),
    )));

    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);

    if let Some(form) = &app.settings_form {
        render_form(f, app, form, area);
    }
}

fn render_form(f: &mut Frame<'_>, app: &App, form: &SettingsForm, area: Rect) {
    let popup = centered(area, 60, 9);
    f.render_widget(Clear, popup);

    let lines: Vec<Line> = SettingsField::all()
        .iter()
        .map(|field| {
            let focused = *field == form.focused;
            let style = if focused {
                Style::default()
                    .fg(app.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text)
            };
            let cursor = if focused { "_" } else { "" };
            Line::from(vec![
                Span::styled(
                    format!("{:<24}", field.label()),
                    Style::default().fg(app.theme.secondary),
                ),
                Span::styled(format!("{}{}", form.value(*field), cursor), style),
            ])
        })
        .chain([
            Line::from(""),
            Line::from(Span::styled(
                "Tab next field • Enter save • Esc cancel",
                Style::default().fg(app.theme.text_dim),
            )),
        ])
        .collect();

    let form_widget = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .title("Edit settings")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.primary))
            .style(Style::default().bg(app.theme.bg)),
    );
    f.render_widget(form_widget, popup);
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
