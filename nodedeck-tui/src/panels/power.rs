//! Power ranking panel data.

use nodedeck_core::{DataType, PanelData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerConsumer {
    pub name: String,
    pub watts: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerRanking {
    pub consumers: Vec<PowerConsumer>,
}

impl PowerRanking {
    /// Consumers ordered by draw, highest first.
    pub fn ranked(&self) -> Vec<&PowerConsumer> {
        let mut ranked: Vec<&PowerConsumer> = self.consumers.iter().collect();
        ranked.sort_by(|a, b| b.watts.total_cmp(&a.watts));
        ranked
    }

    pub fn total_watts(&self) -> f64 {
        self.consumers.iter().map(|c| c.watts).sum()
    }
}

impl PanelData for PowerRanking {
    fn data_type() -> DataType {
        DataType::PowerRanking
    }
}
