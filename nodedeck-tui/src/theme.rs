//! Color theme and status color helpers.

use ratatui::style::Color;

use crate::lifecycle::PanelPhase;

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    pub fn synthbrute() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 255, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::synthbrute()
    }
}

pub fn phase_color(phase: PanelPhase, theme: &Theme) -> Color {
    match phase {
        PanelPhase::Idle => theme.text_dim,
        PanelPhase::AwaitingCache | PanelPhase::Loading => theme.info,
        PanelPhase::Ready => theme.success,
        PanelPhase::RefreshingInBackground => theme.primary_dim,
        PanelPhase::Error => theme.error,
    }
}

/// Share of the top consumer, colored by how dominant it is.
pub fn share_color(percent: f64, theme: &Theme) -> Color {
    if percent < 50.0 {
        theme.success
    } else if percent < 80.0 {
        theme.warning
    } else {
        theme.error
    }
}
