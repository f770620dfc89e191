//! Power ranking view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use super::helpers::{panel_block, render_placeholder};
use crate::state::App;
use crate::widgets::ShareBar;

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let panel = &app.panels.power;
    let block = panel_block(app, "Power Ranking", panel);
    let ranking = panel.displayed();
    if render_placeholder(f, app, panel, ranking.is_some(), block.clone(), area) {
        return;
    }
    let Some(ranking) = ranking else {
        return;
    };

    let total = ranking.total_watts();
    let block = block.title_bottom(format!("total {:.1} W", total));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let ranked = ranking.ranked();
    let visible = ranked.len().min(inner.height as usize);
    if visible == 0 {
        return;
    }
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); visible])
        .split(inner);

    for (consumer, row) in ranked.iter().zip(rows.iter()) {
        ShareBar {
            label: format!("{} {:.1} W", consumer.name, consumer.watts),
            value: consumer.watts,
            total,
            theme: &app.theme,
        }
        .render(f, *row);
    }
}
