//! nodedeck Core - Shared Types
//!
//! Pure data structures with no I/O. Every other crate depends on this.
//! Cache keys, request generations and the opaque payload blob live here so
//! the storage layer and the TUI agree on them without knowing each other.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod error;

pub use error::{CacheError, ConfigError, FetchError};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Identifier of a device on the network (hostname or serial).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device identifier. Surrounding whitespace is trimmed.
    ///
    /// Returns `None` for an empty identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of device data shown by one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    SystemSettings,
    Webhooks,
    PowerRanking,
    EnvironmentSensors,
}

impl DataType {
    pub fn all() -> &'static [DataType] {
        &[
            DataType::SystemSettings,
            DataType::Webhooks,
            DataType::PowerRanking,
            DataType::EnvironmentSensors,
        ]
    }

    /// Stable single-byte discriminant, used in on-disk keys.
    pub fn as_byte(self) -> u8 {
        match self {
            DataType::SystemSettings => 0,
            DataType::Webhooks => 1,
            DataType::PowerRanking => 2,
            DataType::EnvironmentSensors => 3,
        }
    }

    /// Stable snake_case name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            DataType::SystemSettings => "system_settings",
            DataType::Webhooks => "webhooks",
            DataType::PowerRanking => "power_ranking",
            DataType::EnvironmentSensors => "environment_sensors",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DataType::SystemSettings => "Settings",
            DataType::Webhooks => "Webhooks",
            DataType::PowerRanking => "Power",
            DataType::EnvironmentSensors => "Sensors",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one cached artifact: one data type of one device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub device: DeviceId,
    pub data_type: DataType,
}

impl CacheKey {
    pub fn new(device: DeviceId, data_type: DataType) -> Self {
        Self { device, data_type }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.data_type)
    }
}

/// Monotonic request epoch. Results tagged with an older generation are
/// superseded and must be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Opaque serialized panel data. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Payload(Arc<[u8]>);

impl Payload {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Typed data shown by a panel.
///
/// Each data type owns its wire format: the cache only ever sees the
/// [`Payload`] produced by [`PanelData::encode`].
pub trait PanelData: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The data type this payload is cached under.
    fn data_type() -> DataType;

    fn encode(&self) -> Result<Payload, CacheError> {
        serde_json::to_vec(self)
            .map(Payload::from)
            .map_err(|e| CacheError::Encode {
                reason: e.to_string(),
            })
    }

    fn decode(payload: &Payload) -> Result<Self, CacheError> {
        serde_json::from_slice(payload.as_bytes()).map_err(|e| CacheError::Decode {
            reason: e.to_string(),
        })
    }
}
