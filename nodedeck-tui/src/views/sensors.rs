//! Environment sensors view.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Row, Table},
    Frame,
};

use super::helpers::{panel_block, render_placeholder};
use crate::state::App;

fn reading(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{:.1} {}", v, unit))
        .unwrap_or_else(|| "–".to_string())
}

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let panel = &app.panels.sensors;
    let block = panel_block(app, "Environment Sensors", panel);
    let sensors = panel.displayed();
    if render_placeholder(f, app, panel, sensors.is_some(), block.clone(), area) {
        return;
    }
    let Some(sensors) = sensors else {
        return;
    };

    let header = Row::new(["Sensor", "Location", "Temp", "Humidity", "Pressure"])
        .style(
            Style::default()
                .fg(app.theme.secondary)
                .add_modifier(Modifier::BOLD),
        );
    let rows: Vec<Row> = sensors
        .readings
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.sensor_id.clone()),
                Cell::from(r.location.clone().unwrap_or_default()),
                Cell::from(reading(r.temperature_c, "°C")),
                Cell::from(reading(r.humidity_pct, "%")),
                Cell::from(reading(r.pressure_hpa, "hPa")),
            ])
        })
        .collect();

    let footer = sensors
        .average_temperature()
        .map(|t| format!("avg {:.1} °C", t))
        .unwrap_or_default();
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(block.title_bottom(footer));
    f.render_widget(table, area);
}
