//! Webhooks view.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

use super::helpers::{panel_block, render_placeholder};
use crate::state::App;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let panel = &app.panels.webhooks;
    let block = panel_block(app, "Webhooks", panel);
    let list = panel.displayed();
    if render_placeholder(f, app, panel, list.is_some(), block.clone(), area) {
        return;
    }
    let Some(list) = list else {
        return;
    };

    let items: Vec<ListItem> = if list.webhooks.is_empty() {
        vec![ListItem::new(Span::styled(
            "No webhooks configured",
            Style::default().fg(app.theme.text_dim),
        ))]
    } else {
        list.webhooks
            .iter()
            .map(|hook| {
                let (marker, color) = if hook.enabled {
                    ("●", app.theme.success)
                } else {
                    ("○", app.theme.text_dim)
                };
                let events = if hook.events.is_empty() {
                    "all events".to_string()
                } else {
                    hook.events.join(", ")
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", marker), Style::default().fg(color)),
                    Span::styled(format!("{:<10}", hook.id), Style::default().fg(app.theme.secondary)),
                    Span::raw(format!("{}  ", hook.url)),
                    Span::styled(events, Style::default().fg(app.theme.text_dim)),
                ]))
            })
            .collect()
    };

    let title = format!(
        "{} of {} enabled",
        list.enabled_count(),
        list.webhooks.len()
    );
    f.render_widget(List::new(items).block(block.title_bottom(title)), area);
}
