//! System settings panel data and the settings edit form.

use nodedeck_core::{DataType, FetchError, PanelData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub hostname: String,
    pub timezone: String,
    pub reporting_interval_secs: u32,
    pub firmware_version: String,
}

impl PanelData for SystemSettings {
    fn data_type() -> DataType {
        DataType::SystemSettings
    }
}

/// Writable subset of [`SystemSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub hostname: String,
    pub timezone: String,
    pub reporting_interval_secs: u32,
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.hostname.trim().is_empty() {
            return Err(rejected("hostname must not be empty"));
        }
        if self.hostname.len() > 63 {
            return Err(rejected("hostname must be at most 63 characters"));
        }
        if self.timezone.trim().is_empty() {
            return Err(rejected("timezone must not be empty"));
        }
        if self.reporting_interval_secs == 0 {
            return Err(rejected("reporting interval must be > 0"));
        }
        Ok(())
    }
}

impl From<&SystemSettings> for SettingsUpdate {
    fn from(settings: &SystemSettings) -> Self {
        Self {
            hostname: settings.hostname.clone(),
            timezone: settings.timezone.clone(),
            reporting_interval_secs: settings.reporting_interval_secs,
        }
    }
}

fn rejected(reason: &str) -> FetchError {
    FetchError::Rejected {
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Hostname,
    Timezone,
    ReportingInterval,
}

impl SettingsField {
    pub fn all() -> &'static [SettingsField] {
        &[
            SettingsField::Hostname,
            SettingsField::Timezone,
            SettingsField::ReportingInterval,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Hostname => "Hostname",
            SettingsField::Timezone => "Timezone",
            SettingsField::ReportingInterval => "Reporting interval (s)",
        }
    }
}

/// In-progress edit of the settings panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub hostname: String,
    pub timezone: String,
    pub reporting_interval: String,
    pub focused: SettingsField,
}

impl SettingsForm {
    pub fn from_settings(settings: &SystemSettings) -> Self {
        Self {
            hostname: settings.hostname.clone(),
            timezone: settings.timezone.clone(),
            reporting_interval: settings.reporting_interval_secs.to_string(),
            focused: SettingsField::Hostname,
        }
    }

    pub fn value(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::Hostname => &self.hostname,
            SettingsField::Timezone => &self.timezone,
            SettingsField::ReportingInterval => &self.reporting_interval,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focused {
            SettingsField::Hostname => &mut self.hostname,
            SettingsField::Timezone => &mut self.timezone,
            SettingsField::ReportingInterval => &mut self.reporting_interval,
        }
    }

    pub fn push(&mut self, c: char) {
        if self.focused == SettingsField::ReportingInterval && !c.is_ascii_digit() {
            return;
        }
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    pub fn next_field(&mut self) {
        let all = SettingsField::all();
        let idx = all.iter().position(|f| *f == self.focused).unwrap_or(0);
        self.focused = all[(idx + 1) % all.len()];
    }

    pub fn previous_field(&mut self) {
        let all = SettingsField::all();
        let idx = all.iter().position(|f| *f == self.focused).unwrap_or(0);
        self.focused = all[(idx + all.len() - 1) % all.len()];
    }

    pub fn to_update(&self) -> Result<SettingsUpdate, FetchError> {
        let reporting_interval_secs = self
            .reporting_interval
            .trim()
            .parse::<u32>()
            .map_err(|_| rejected("reporting interval must be a whole number of seconds"))?;
        let update = SettingsUpdate {
            hostname: self.hostname.trim().to_string(),
            timezone: self.timezone.trim().to_string(),
            reporting_interval_secs,
        };
        update.validate()?;
        Ok(update)
    }
}
