//! Application state. Mutated only from the event loop.

use std::sync::Arc;

use crossterm::event::KeyEvent;
use nodedeck_core::{CacheKey, DataType, DeviceId, FetchError};
use nodedeck_storage::CacheStats;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api_client::DeviceClient;
use crate::config::TuiConfig;
use crate::events::TuiEvent;
use crate::keys::{map_form_key, map_key, Action, FormAction};
use crate::lifecycle::PanelPhase;
use crate::nav::View;
use crate::notifications::{Notification, NotificationLevel};
use crate::orchestrator::{CacheEvent, CacheOrchestrator};
use crate::panel::PanelDriver;
use crate::panels::{Panels, SettingsForm};
use crate::persistence::PersistedState;
use crate::theme::Theme;

/// Ticks between cache statistics refreshes.
const STATS_EVERY_TICKS: u64 = 20;

/// Which cache backend the app ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Lmdb,
    Memory,
    Disabled,
}

impl CacheBackend {
    pub fn label(self) -> &'static str {
        match self {
            CacheBackend::Lmdb => "disk",
            CacheBackend::Memory => "memory",
            CacheBackend::Disabled => "off",
        }
    }
}

pub struct App {
    pub config: TuiConfig,
    pub theme: Theme,
    pub active_view: View,
    pub devices: Vec<DeviceId>,
    pub selected_device: Option<usize>,
    pub panels: Panels,
    pub notifications: Vec<Notification>,
    pub settings_form: Option<SettingsForm>,
    pub saving_settings: bool,
    pub cache_backend: CacheBackend,
    pub cache_stats: Option<CacheStats>,
    orchestrator: CacheOrchestrator,
    client: Arc<dyn DeviceClient>,
    events: mpsc::Sender<TuiEvent>,
    ticks: u64,
}

impl App {
    pub fn new(
        config: TuiConfig,
        orchestrator: CacheOrchestrator,
        client: Arc<dyn DeviceClient>,
        events: mpsc::Sender<TuiEvent>,
        cache_backend: CacheBackend,
    ) -> Self {
        let devices = config.device_ids();
        let panels = Panels::new(&orchestrator, Arc::clone(&client));
        Self {
            config,
            theme: Theme::synthbrute(),
            active_view: View::Settings,
            devices,
            selected_device: None,
            panels,
            notifications: Vec::new(),
            settings_form: None,
            saving_settings: false,
            cache_backend,
            cache_stats: None,
            orchestrator,
            client,
            events,
            ticks: 0,
        }
    }

    /// Restore persisted UI state and load the first device.
    pub fn start(&mut self, restored: Option<PersistedState>) {
        let mut index = 0;
        if let Some(state) = restored {
            self.active_view = state.active_view;
            if let Some(device) = state.selected_device {
                index = self
                    .devices
                    .iter()
                    .position(|d| *d == device)
                    .unwrap_or(0);
            }
        }
        self.select_device(index);
        self.request_stats();
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_view: self.active_view,
            selected_device: self.current_device().cloned(),
        }
    }

    pub fn current_device(&self) -> Option<&DeviceId> {
        self.selected_device.and_then(|idx| self.devices.get(idx))
    }

    pub fn device_name(&self) -> Option<&str> {
        let id = self.current_device()?;
        self.config.device(id).map(|d| d.name.as_str())
    }

    pub fn active_panel(&self) -> &dyn PanelDriver {
        self.panels.get(self.active_view.data_type())
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    // === Event loop entry points ===

    /// Returns true when the app should exit.
    pub fn handle_event(&mut self, event: TuiEvent) -> bool {
        match event {
            TuiEvent::Input(key) => return self.handle_key(key),
            TuiEvent::Tick => self.on_tick(),
            TuiEvent::Resize { .. } => {}
            TuiEvent::SettingsSaved { device, result } => self.on_settings_saved(device, result),
            TuiEvent::CachePurged { device, removed } => {
                self.notify(
                    NotificationLevel::Info,
                    format!("Purged {} cached entries for {}", removed, device),
                );
            }
            TuiEvent::CacheStats(stats) => self.cache_stats = Some(stats),
        }
        false
    }

    pub fn handle_cache_event(&mut self, event: CacheEvent) {
        if !self.panels.route(&event) {
            debug!(key = %event.key, kind = event.kind.name(), "Cache event dropped");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.settings_form.is_some() {
            if let Some(action) = map_form_key(key) {
                self.handle_form_action(action);
            }
            return false;
        }
        match map_key(key) {
            Some(action) => self.handle_action(action),
            None => false,
        }
    }

    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextView => self.set_view(self.active_view.next()),
            Action::PrevView => self.set_view(self.active_view.previous()),
            Action::SwitchView(index) => {
                if let Some(view) = View::from_index(index) {
                    self.set_view(view);
                }
            }
            Action::NextDevice => self.cycle_device(true),
            Action::PrevDevice => self.cycle_device(false),
            Action::Refresh => self.refresh_active(),
            Action::EditSettings => self.open_settings_form(),
            Action::PurgeDeviceCache => self.purge_device_cache(),
            Action::Confirm => {
                if self.active_panel().phase() == PanelPhase::Error {
                    self.refresh_active();
                }
            }
            Action::Cancel => self.notifications.clear(),
        }
        false
    }

    // === Navigation ===

    pub fn set_view(&mut self, view: View) {
        self.active_view = view;
        self.panels.get_mut(view.data_type()).on_focus();
    }

    pub fn select_device(&mut self, index: usize) {
        self.settings_form = None;
        let Some(device) = self.devices.get(index).cloned() else {
            self.selected_device = None;
            self.panels.clear_device();
            return;
        };
        info!(device = %device, "Selecting device");
        self.selected_device = Some(index);
        self.panels.set_device(&device);
    }

    fn cycle_device(&mut self, forward: bool) {
        let len = self.devices.len();
        if len < 2 {
            return;
        }
        let current = self.selected_device.unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.select_device(next);
    }

    fn refresh_active(&mut self) {
        if self.current_device().is_none() {
            self.notify(NotificationLevel::Warning, "No device selected");
            return;
        }
        self.panels.get_mut(self.active_view.data_type()).refresh();
    }

    // === Settings editing ===

    fn open_settings_form(&mut self) {
        if self.active_view != View::Settings {
            return;
        }
        if self.saving_settings {
            self.notify(NotificationLevel::Warning, "Settings save in progress");
            return;
        }
        match self.panels.settings.displayed() {
            Some(settings) => self.settings_form = Some(SettingsForm::from_settings(settings)),
            None => self.notify(NotificationLevel::Warning, "Settings not loaded yet"),
        }
    }

    fn handle_form_action(&mut self, action: FormAction) {
        let Some(form) = self.settings_form.as_mut() else {
            return;
        };
        match action {
            FormAction::Input(c) => form.push(c),
            FormAction::Backspace => form.backspace(),
            FormAction::NextField => form.next_field(),
            FormAction::PrevField => form.previous_field(),
            FormAction::Cancel => self.settings_form = None,
            FormAction::Submit => self.submit_settings(),
        }
    }

    fn submit_settings(&mut self) {
        let Some(form) = self.settings_form.as_ref() else {
            return;
        };
        let update = match form.to_update() {
            Ok(update) => update,
            Err(err) => {
                self.notify(NotificationLevel::Error, err.to_string());
                return;
            }
        };
        let Some(device) = self.current_device().cloned() else {
            return;
        };

        self.settings_form = None;
        self.saving_settings = true;
        let client = Arc::clone(&self.client);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.update_system_settings(&device, &update).await;
            let _ = events.send(TuiEvent::SettingsSaved { device, result }).await;
        });
    }

    fn on_settings_saved(&mut self, device: DeviceId, result: Result<(), FetchError>) {
        self.saving_settings = false;
        match result {
            Ok(()) => {
                self.notify(
                    NotificationLevel::Success,
                    format!("Settings saved on {}", device),
                );
                if self.current_device() == Some(&device) {
                    self.panels.settings.after_mutation();
                } else {
                    // The panel moved on; drop the pre-edit entry so the next visit refetches.
                    let orchestrator = self.orchestrator.clone();
                    let key = CacheKey::new(device, DataType::SystemSettings);
                    tokio::spawn(async move { orchestrator.invalidate(&key).await });
                }
            }
            Err(err) => {
                warn!(device = %device, error = %err, "Settings update failed");
                self.notify(
                    NotificationLevel::Error,
                    format!("Saving settings failed: {}", err),
                );
            }
        }
    }

    // === Cache maintenance ===

    fn purge_device_cache(&mut self) {
        let Some(device) = self.current_device().cloned() else {
            return;
        };
        let orchestrator = self.orchestrator.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let removed = orchestrator.invalidate_device(&device).await;
            let _ = events.send(TuiEvent::CachePurged { device, removed }).await;
        });
    }

    fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        let now = chrono::Utc::now();
        self.notifications.retain(|n| n.is_visible_at(now));
        if self.ticks % STATS_EVERY_TICKS == 0 {
            self.request_stats();
        }
    }

    fn request_stats(&self) {
        let orchestrator = self.orchestrator.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Some(stats) = orchestrator.stats().await {
                let _ = events.send(TuiEvent::CacheStats(stats)).await;
            }
        });
    }
}
