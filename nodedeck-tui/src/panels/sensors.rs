//! Environment sensors panel data.

use nodedeck_core::{DataType, PanelData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub humidity_pct: Option<f64>,
    #[serde(default)]
    pub pressure_hpa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSensors {
    pub readings: Vec<SensorReading>,
}

impl EnvironmentSensors {
    pub fn average_temperature(&self) -> Option<f64> {
        let temps: Vec<f64> = self
            .readings
            .iter()
            .filter_map(|r| r.temperature_c)
            .collect();
        if temps.is_empty() {
            return None;
        }
        Some(temps.iter().sum::<f64>() / temps.len() as f64)
    }
}

impl PanelData for EnvironmentSensors {
    fn data_type() -> DataType {
        DataType::EnvironmentSensors
    }
}
