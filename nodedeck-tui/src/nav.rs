//! Navigation and view switching utilities.

use nodedeck_core::DataType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Settings,
    Webhooks,
    Power,
    Sensors,
}

impl View {
    pub fn title(&self) -> &'static str {
        self.data_type().title()
    }

    pub fn all() -> &'static [View] {
        &[View::Settings, View::Webhooks, View::Power, View::Sensors]
    }

    pub fn data_type(&self) -> DataType {
        match self {
            View::Settings => DataType::SystemSettings,
            View::Webhooks => DataType::Webhooks,
            View::Power => DataType::PowerRanking,
            View::Sensors => DataType::EnvironmentSensors,
        }
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
