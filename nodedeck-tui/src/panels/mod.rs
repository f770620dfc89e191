//! Dashboard panels: payload types, fetchers and the panel registry.

pub mod power;
pub mod sensors;
pub mod settings;
pub mod webhooks;

pub use power::{PowerConsumer, PowerRanking};
pub use sensors::{EnvironmentSensors, SensorReading};
pub use settings::{SettingsField, SettingsForm, SettingsUpdate, SystemSettings};
pub use webhooks::{Webhook, WebhookList};

use std::sync::Arc;

use async_trait::async_trait;
use nodedeck_core::{DataType, DeviceId, FetchError};

use crate::api_client::DeviceClient;
use crate::fetch::DataFetcher;
use crate::orchestrator::{CacheEvent, CacheOrchestrator};
use crate::panel::{Panel, PanelDriver};

/// Adapts a [`DeviceClient`] into a fetcher for every panel data type.
#[derive(Clone)]
pub struct DeviceFetcher {
    client: Arc<dyn DeviceClient>,
}

impl DeviceFetcher {
    pub fn new(client: Arc<dyn DeviceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataFetcher<SystemSettings> for DeviceFetcher {
    async fn fetch(&self, device: &DeviceId) -> Result<SystemSettings, FetchError> {
        self.client.system_settings(device).await
    }
}

#[async_trait]
impl DataFetcher<WebhookList> for DeviceFetcher {
    async fn fetch(&self, device: &DeviceId) -> Result<WebhookList, FetchError> {
        self.client.webhooks(device).await
    }
}

#[async_trait]
impl DataFetcher<PowerRanking> for DeviceFetcher {
    async fn fetch(&self, device: &DeviceId) -> Result<PowerRanking, FetchError> {
        self.client.power_ranking(device).await
    }
}

#[async_trait]
impl DataFetcher<EnvironmentSensors> for DeviceFetcher {
    async fn fetch(&self, device: &DeviceId) -> Result<EnvironmentSensors, FetchError> {
        self.client.environment_sensors(device).await
    }
}

/// One panel per data type, all sharing a single orchestrator.
pub struct Panels {
    pub settings: Panel<SystemSettings>,
    pub webhooks: Panel<WebhookList>,
    pub power: Panel<PowerRanking>,
    pub sensors: Panel<EnvironmentSensors>,
}

impl Panels {
    pub fn new(orchestrator: &CacheOrchestrator, client: Arc<dyn DeviceClient>) -> Self {
        let fetcher = Arc::new(DeviceFetcher::new(client));
        Self {
            settings: Panel::new(orchestrator.clone(), fetcher.clone()),
            webhooks: Panel::new(orchestrator.clone(), fetcher.clone()),
            power: Panel::new(orchestrator.clone(), fetcher.clone()),
            sensors: Panel::new(orchestrator.clone(), fetcher),
        }
    }

    pub fn get(&self, data_type: DataType) -> &dyn PanelDriver {
        match data_type {
            DataType::SystemSettings => &self.settings,
            DataType::Webhooks => &self.webhooks,
            DataType::PowerRanking => &self.power,
            DataType::EnvironmentSensors => &self.sensors,
        }
    }

    pub fn get_mut(&mut self, data_type: DataType) -> &mut dyn PanelDriver {
        match data_type {
            DataType::SystemSettings => &mut self.settings,
            DataType::Webhooks => &mut self.webhooks,
            DataType::PowerRanking => &mut self.power,
            DataType::EnvironmentSensors => &mut self.sensors,
        }
    }

    /// Deliver a cache event to the panel owning its data type.
    pub fn route(&mut self, event: &CacheEvent) -> bool {
        self.get_mut(event.key.data_type).handle_event(event)
    }

    pub fn set_device(&mut self, device: &DeviceId) {
        for data_type in DataType::all() {
            self.get_mut(*data_type).set_device(device.clone());
        }
    }

    pub fn clear_device(&mut self) {
        for data_type in DataType::all() {
            self.get_mut(*data_type).clear_device();
        }
    }
}
