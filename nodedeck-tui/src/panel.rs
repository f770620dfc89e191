//! Panel driver: runs lifecycle commands against the orchestrator.

use std::sync::Arc;

use nodedeck_core::{DataType, DeviceId, FetchError, Generation, PanelData, Timestamp};

use crate::fetch::{DataFetcher, FetchRequest};
use crate::lifecycle::{PanelCommand, PanelLifecycle, PanelPhase};
use crate::orchestrator::{CacheEvent, CacheOrchestrator};

/// One dashboard panel showing one data type of the selected device.
pub struct Panel<T: PanelData> {
    lifecycle: PanelLifecycle<T>,
    fetcher: Arc<dyn DataFetcher<T>>,
    orchestrator: CacheOrchestrator,
}

impl<T: PanelData> Panel<T> {
    pub fn new(orchestrator: CacheOrchestrator, fetcher: Arc<dyn DataFetcher<T>>) -> Self {
        Self {
            lifecycle: PanelLifecycle::new(),
            fetcher,
            orchestrator,
        }
    }

    pub fn lifecycle(&self) -> &PanelLifecycle<T> {
        &self.lifecycle
    }

    pub fn displayed(&self) -> Option<&T> {
        self.lifecycle.displayed()
    }

    fn execute(&self, command: PanelCommand) {
        match command {
            PanelCommand::Load { key, generation } => self.orchestrator.load(key, generation),
            PanelCommand::FetchBlocking { key, generation } => self
                .orchestrator
                .fetch_blocking(FetchRequest::new(key, generation, Arc::clone(&self.fetcher))),
            PanelCommand::RefreshBackground { key, generation } => self
                .orchestrator
                .refresh_background(FetchRequest::new(key, generation, Arc::clone(&self.fetcher))),
            PanelCommand::Reload { key, generation } => self
                .orchestrator
                .reload(FetchRequest::new(key, generation, Arc::clone(&self.fetcher))),
        }
    }
}

/// Type-erased panel operations so the app can drive every panel uniformly.
pub trait PanelDriver {
    fn data_type(&self) -> DataType;
    fn set_device(&mut self, device: DeviceId);
    fn clear_device(&mut self);
    fn refresh(&mut self);
    fn after_mutation(&mut self);
    fn on_focus(&mut self);
    /// Apply an event from the cache channel. Returns false if it was dropped.
    fn handle_event(&mut self, event: &CacheEvent) -> bool;
    fn phase(&self) -> PanelPhase;
    fn generation(&self) -> Generation;
    fn cached_at(&self) -> Option<Timestamp>;
    fn last_error(&self) -> Option<&FetchError>;
}

impl<T: PanelData> PanelDriver for Panel<T> {
    fn data_type(&self) -> DataType {
        T::data_type()
    }

    fn set_device(&mut self, device: DeviceId) {
        let command = self.lifecycle.set_device(device);
        self.execute(command);
    }

    fn clear_device(&mut self) {
        self.lifecycle.clear_device();
    }

    fn refresh(&mut self) {
        if let Some(command) = self.lifecycle.refresh() {
            self.execute(command);
        }
    }

    fn after_mutation(&mut self) {
        if let Some(command) = self.lifecycle.after_mutation() {
            self.execute(command);
        }
    }

    fn on_focus(&mut self) {
        let now = self.orchestrator.now();
        let ttl = self.orchestrator.ttl_policy().ttl_for(T::data_type());
        if let Some(command) = self.lifecycle.on_focus(now, ttl) {
            self.execute(command);
        }
    }

    fn handle_event(&mut self, event: &CacheEvent) -> bool {
        let outcome = self.lifecycle.apply(event);
        if outcome.is_dropped() {
            return false;
        }
        if let Some(command) = outcome.command() {
            self.execute(command);
        }
        true
    }

    fn phase(&self) -> PanelPhase {
        self.lifecycle.phase()
    }

    fn generation(&self) -> Generation {
        self.lifecycle.generation()
    }

    fn cached_at(&self) -> Option<Timestamp> {
        self.lifecycle.cached_at()
    }

    fn last_error(&self) -> Option<&FetchError> {
        self.lifecycle.last_error()
    }
}
