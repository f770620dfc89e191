//! One-line panel status: phase, data age and background refresh marker.

use chrono::Utc;
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::lifecycle::PanelPhase;
use crate::panel::PanelDriver;
use crate::theme::{phase_color, Theme};
use crate::views::helpers::format_age;

pub struct PanelStatusLine<'a> {
    pub panel: &'a dyn PanelDriver,
    pub theme: &'a Theme,
}

impl<'a> PanelStatusLine<'a> {
    pub fn line(&self) -> Line<'static> {
        let phase = self.panel.phase();
        let mut spans = vec![Span::styled(
            format!(" {} ", phase.label()),
            Style::default().fg(phase_color(phase, self.theme)),
        )];

        if let Some(cached_at) = self.panel.cached_at() {
            spans.push(Span::styled(
                format!("updated {} ", format_age(cached_at, Utc::now())),
                Style::default().fg(self.theme.text_dim),
            ));
        }
        if phase == PanelPhase::RefreshingInBackground {
            spans.push(Span::styled("⟳ ", Style::default().fg(self.theme.primary)));
        }
        Line::from(spans)
    }
}
