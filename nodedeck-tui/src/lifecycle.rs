//! Per-panel state machine.
//!
//! `PanelLifecycle` is pure: it never spawns or awaits anything. Every
//! transition returns the [`PanelCommand`] the owning [`crate::panel::Panel`]
//! must hand to the orchestrator, and cache events are applied one at a time
//! from the event loop.
//!
//! ```text
//! Idle ──set_device──▶ AwaitingCache ──Miss──▶ Loading ──Loaded(ok)──▶ Ready
//!                          │                      └──Loaded(err)──▶ Error
//!                          ├──Hit(fresh)──▶ Ready
//!                          └──Hit(stale)──▶ RefreshingInBackground ──RefreshComplete──▶ Ready
//! ```

use std::fmt;
use std::time::Duration;

use nodedeck_core::{CacheKey, DeviceId, FetchError, Generation, PanelData, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::orchestrator::{is_expired, CacheEvent, CacheEventKind, Fetched};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelPhase {
    /// No device selected.
    Idle,
    /// Cache lookup issued, no answer yet.
    AwaitingCache,
    /// Blocking fetch in flight, nothing to display.
    Loading,
    Ready,
    /// Payload on screen while a background refresh is in flight.
    RefreshingInBackground,
    /// Blocking fetch failed and nothing is displayed.
    Error,
}

impl PanelPhase {
    pub fn label(self) -> &'static str {
        match self {
            PanelPhase::Idle => "idle",
            PanelPhase::AwaitingCache => "checking cache",
            PanelPhase::Loading => "loading",
            PanelPhase::Ready => "ready",
            PanelPhase::RefreshingInBackground => "refreshing",
            PanelPhase::Error => "error",
        }
    }
}

impl fmt::Display for PanelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Work the panel driver must start on the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Load { key: CacheKey, generation: Generation },
    FetchBlocking { key: CacheKey, generation: Generation },
    RefreshBackground { key: CacheKey, generation: Generation },
    /// Invalidate then fetch-and-block.
    Reload { key: CacheKey, generation: Generation },
}

impl PanelCommand {
    pub fn key(&self) -> &CacheKey {
        match self {
            PanelCommand::Load { key, .. }
            | PanelCommand::FetchBlocking { key, .. }
            | PanelCommand::RefreshBackground { key, .. }
            | PanelCommand::Reload { key, .. } => key,
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            PanelCommand::Load { generation, .. }
            | PanelCommand::FetchBlocking { generation, .. }
            | PanelCommand::RefreshBackground { generation, .. }
            | PanelCommand::Reload { generation, .. } => *generation,
        }
    }
}

/// Result of offering a cache event to a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Superseded or not addressed to this panel; state untouched.
    Dropped,
    Applied(Option<PanelCommand>),
}

impl EventOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, EventOutcome::Dropped)
    }

    pub fn command(self) -> Option<PanelCommand> {
        match self {
            EventOutcome::Applied(command) => command,
            EventOutcome::Dropped => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelLifecycle<T: PanelData> {
    device: Option<DeviceId>,
    generation: Generation,
    phase: PanelPhase,
    displayed: Option<T>,
    last_error: Option<FetchError>,
    cached_at: Option<Timestamp>,
    background_failures: u32,
}

impl<T: PanelData> Default for PanelLifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PanelData> PanelLifecycle<T> {
    pub fn new() -> Self {
        Self {
            device: None,
            generation: Generation::default(),
            phase: PanelPhase::Idle,
            displayed: None,
            last_error: None,
            cached_at: None,
            background_failures: 0,
        }
    }

    // === Accessors ===

    /// The only value the renderer draws.
    pub fn displayed(&self) -> Option<&T> {
        self.displayed.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PanelPhase::Loading
    }

    pub fn is_background_refreshing(&self) -> bool {
        self.phase == PanelPhase::RefreshingInBackground
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn cached_at(&self) -> Option<Timestamp> {
        self.cached_at
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn device(&self) -> Option<&DeviceId> {
        self.device.as_ref()
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    /// Consecutive failed background refreshes since the last delivery.
    pub fn background_failures(&self) -> u32 {
        self.background_failures
    }

    pub fn key(&self) -> Option<CacheKey> {
        self.device
            .as_ref()
            .map(|device| CacheKey::new(device.clone(), T::data_type()))
    }

    // === User and app driven transitions ===

    pub fn set_device(&mut self, device: DeviceId) -> PanelCommand {
        self.device = Some(device.clone());
        self.reset_display();
        self.phase = PanelPhase::AwaitingCache;
        let (key, generation) = self.begin_request(device);
        PanelCommand::Load { key, generation }
    }

    pub fn clear_device(&mut self) {
        self.device = None;
        self.reset_display();
        self.generation = self.generation.next();
        self.phase = PanelPhase::Idle;
    }

    /// User-requested refresh. Ignores any cached entry.
    pub fn refresh(&mut self) -> Option<PanelCommand> {
        self.force_reload()
    }

    /// Forced reload after a successful write to the device.
    pub fn after_mutation(&mut self) -> Option<PanelCommand> {
        self.force_reload()
    }

    /// Panel gained focus: retry after an error, revalidate expired data.
    pub fn on_focus(&mut self, now: Timestamp, ttl: Duration) -> Option<PanelCommand> {
        let device = self.device.clone()?;
        match self.phase {
            PanelPhase::Error => {
                self.last_error = None;
                self.phase = PanelPhase::AwaitingCache;
                let (key, generation) = self.begin_request(device);
                Some(PanelCommand::Load { key, generation })
            }
            PanelPhase::Ready => {
                let cached_at = self.cached_at?;
                if !is_expired(cached_at, ttl, now) {
                    return None;
                }
                self.phase = PanelPhase::RefreshingInBackground;
                let (key, generation) = self.begin_request(device);
                Some(PanelCommand::RefreshBackground { key, generation })
            }
            _ => None,
        }
    }

    // === Event handling ===

    pub fn apply(&mut self, event: &CacheEvent) -> EventOutcome {
        if !self.accepts(event) {
            debug!(
                key = %event.key,
                event_generation = %event.generation,
                current_generation = %self.generation,
                kind = event.kind.name(),
                "Dropping superseded cache event"
            );
            return EventOutcome::Dropped;
        }

        let key = event.key.clone();
        let generation = event.generation;

        match (self.phase, &event.kind) {
            (PanelPhase::AwaitingCache, CacheEventKind::Miss) => {
                self.phase = PanelPhase::Loading;
                EventOutcome::Applied(Some(PanelCommand::FetchBlocking { key, generation }))
            }
            (
                PanelPhase::AwaitingCache,
                CacheEventKind::Hit {
                    payload,
                    captured_at,
                    needs_refresh,
                },
            ) => match T::decode(payload) {
                Ok(value) => {
                    self.displayed = Some(value);
                    self.cached_at = Some(*captured_at);
                    if *needs_refresh {
                        self.phase = PanelPhase::RefreshingInBackground;
                        EventOutcome::Applied(Some(PanelCommand::RefreshBackground {
                            key,
                            generation,
                        }))
                    } else {
                        self.phase = PanelPhase::Ready;
                        EventOutcome::Applied(None)
                    }
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Unreadable cache entry, fetching instead");
                    self.phase = PanelPhase::Loading;
                    EventOutcome::Applied(Some(PanelCommand::FetchBlocking { key, generation }))
                }
            },
            (PanelPhase::Loading, CacheEventKind::Loaded(result)) => {
                let decoded = decode_result::<T>(result);
                match decoded {
                    Ok((value, captured_at)) => self.deliver(value, captured_at),
                    Err(e) => {
                        debug!(key = %key, error = %e, "Blocking fetch failed");
                        self.displayed = None;
                        self.cached_at = None;
                        self.last_error = Some(e);
                        self.phase = PanelPhase::Error;
                    }
                }
                EventOutcome::Applied(None)
            }
            (PanelPhase::RefreshingInBackground, CacheEventKind::RefreshComplete(result)) => {
                let decoded = decode_result::<T>(result);
                match decoded {
                    Ok((value, captured_at)) => self.deliver(value, captured_at),
                    Err(e) => {
                        self.background_failures = self.background_failures.saturating_add(1);
                        warn!(
                            key = %key,
                            error = %e,
                            consecutive_failures = self.background_failures,
                            "Background refresh failed, keeping last known value"
                        );
                        self.phase = PanelPhase::Ready;
                    }
                }
                EventOutcome::Applied(None)
            }
            (phase, kind) => {
                debug!(key = %key, phase = %phase, kind = kind.name(), "Ignoring event not expected in this phase");
                EventOutcome::Dropped
            }
        }
    }

    fn accepts(&self, event: &CacheEvent) -> bool {
        event.generation == self.generation
            && event.key.data_type == T::data_type()
            && self.device.as_ref() == Some(&event.key.device)
    }

    fn deliver(&mut self, value: T, captured_at: Timestamp) {
        self.displayed = Some(value);
        self.cached_at = Some(captured_at);
        self.last_error = None;
        self.background_failures = 0;
        self.phase = PanelPhase::Ready;
    }

    fn force_reload(&mut self) -> Option<PanelCommand> {
        let device = self.device.clone()?;
        self.reset_display();
        self.phase = PanelPhase::Loading;
        let (key, generation) = self.begin_request(device);
        Some(PanelCommand::Reload { key, generation })
    }

    fn reset_display(&mut self) {
        self.displayed = None;
        self.last_error = None;
        self.cached_at = None;
        self.background_failures = 0;
    }

    /// Start a new request epoch; everything still in flight is superseded.
    fn begin_request(&mut self, device: DeviceId) -> (CacheKey, Generation) {
        self.generation = self.generation.next();
        (CacheKey::new(device, T::data_type()), self.generation)
    }
}

/// A payload that arrives but cannot be decoded counts as a failed fetch.
fn decode_result<T: PanelData>(
    result: &Result<Fetched, FetchError>,
) -> Result<(T, Timestamp), FetchError> {
    let fetched = result.as_ref().map_err(Clone::clone)?;
    let value = T::decode(&fetched.payload).map_err(|e| FetchError::Decode {
        reason: e.to_string(),
    })?;
    Ok((value, fetched.captured_at))
}

// =============================================================================
// TESTS
// =============================================================================
