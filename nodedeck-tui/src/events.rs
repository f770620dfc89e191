//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use nodedeck_core::{DeviceId, FetchError};
use nodedeck_storage::CacheStats;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    /// A settings write finished.
    SettingsSaved {
        device: DeviceId,
        result: Result<(), FetchError>,
    },
    /// A device's cache entries were purged.
    CachePurged { device: DeviceId, removed: u64 },
    CacheStats(CacheStats),
}
