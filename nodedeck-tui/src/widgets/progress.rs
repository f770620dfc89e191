//! Gauge showing one consumer's share of total power draw.

use ratatui::{layout::Rect, style::Style, widgets::Gauge, Frame};

use crate::theme::{share_color, Theme};

pub struct ShareBar<'a> {
    pub label: String,
    pub value: f64,
    pub total: f64,
    pub theme: &'a Theme,
}

impl<'a> ShareBar<'a> {
    pub fn ratio(&self) -> f64 {
        if self.total <= 0.0 {
            0.0
        } else {
            (self.value / self.total).clamp(0.0, 1.0)
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let ratio = self.ratio();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(share_color(ratio * 100.0, self.theme)))
            .label(format!("{} ({:.0}%)", self.label, ratio * 100.0))
            .ratio(ratio);
        f.render_widget(gauge, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(theme: &Theme, value: f64, total: f64) -> ShareBar<'_> {
        ShareBar {
            label: String::new(),
            value,
            total,
            theme,
        }
    }

    #[test]
    fn test_ratio_is_clamped() {
        let theme = Theme::default();
        assert_eq!(bar(&theme, 5.0, 0.0).ratio(), 0.0);
        assert_eq!(bar(&theme, 50.0, 200.0).ratio(), 0.25);
        assert_eq!(bar(&theme, 300.0, 200.0).ratio(), 1.0);
    }
}
