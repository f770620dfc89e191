//! Webhooks panel data.

use nodedeck_core::{DataType, PanelData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookList {
    pub webhooks: Vec<Webhook>,
}

impl WebhookList {
    pub fn enabled_count(&self) -> usize {
        self.webhooks.iter().filter(|w| w.enabled).count()
    }
}

impl PanelData for WebhookList {
    fn data_type() -> DataType {
        DataType::Webhooks
    }
}
