use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nodedeck_core::{CacheKey, DataType, DeviceId, FetchError, PanelData, Timestamp};
use nodedeck_storage::{CacheStore, DisabledCacheStore, InMemoryCacheStore, TtlPolicy};
use nodedeck_tui::api_client::DeviceClient;
use nodedeck_tui::config::{AuthConfig, CacheConfig, DeviceConfig, TuiConfig};
use nodedeck_tui::events::TuiEvent;
use nodedeck_tui::fetch::{DataFetcher, FnFetcher};
use nodedeck_tui::lifecycle::PanelPhase;
use nodedeck_tui::orchestrator::{CacheEvent, CacheEventKind, CacheOrchestrator, Fetched};
use nodedeck_tui::panel::{Panel, PanelDriver};
use nodedeck_tui::panels::{
    EnvironmentSensors, PowerConsumer, PowerRanking, SettingsUpdate, SystemSettings, WebhookList,
};
use nodedeck_tui::state::{App, CacheBackend};
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;

// ============================================================================
// Fixtures
// ============================================================================

const TTL: Duration = Duration::from_secs(60);

fn device(id: &str) -> DeviceId {
    DeviceId::new(id).expect("valid device id")
}

fn power(watts: f64) -> PowerRanking {
    PowerRanking {
        consumers: vec![PowerConsumer {
            name: "heater".to_string(),
            watts,
        }],
    }
}

fn power_key(id: &str) -> CacheKey {
    CacheKey::new(device(id), DataType::PowerRanking)
}

/// Clock the test advances by hand.
#[derive(Clone)]
struct ManualClock(Arc<Mutex<Timestamp>>);

impl ManualClock {
    fn new(start: Timestamp) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    fn now(&self) -> Timestamp {
        *self.0.lock().expect("clock lock")
    }

    fn advance(&self, secs: i64) {
        let mut now = self.0.lock().expect("clock lock");
        *now += ChronoDuration::seconds(secs);
    }
}

struct Harness {
    store: Arc<InMemoryCacheStore>,
    orchestrator: CacheOrchestrator,
    events: mpsc::UnboundedReceiver<CacheEvent>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryCacheStore::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let policy = TtlPolicy::new().with_ttl(DataType::PowerRanking, TTL);
    let orchestrator = CacheOrchestrator::new(store.clone(), policy, tx);
    Harness {
        store,
        orchestrator,
        events: rx,
    }
}

/// Fetcher returning a scripted sequence of results, counting calls.
fn scripted(
    results: Vec<Result<PowerRanking, FetchError>>,
) -> (Arc<dyn DataFetcher<PowerRanking>>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let results = Arc::new(results);
    let fetcher: Arc<dyn DataFetcher<PowerRanking>> =
        Arc::new(FnFetcher::new(move |_device: DeviceId| {
            let idx = counter.fetch_add(1, Ordering::SeqCst);
            let result = results.get(idx).cloned().unwrap_or_else(|| {
                Err(FetchError::Transport {
                    reason: "script exhausted".to_string(),
                })
            });
            async move { result }
        }));
    (fetcher, calls)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<CacheEvent>) -> CacheEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("cache event should arrive")
        .expect("channel open")
}

/// Receive one event and hand it to the panel, as the event loop does.
async fn pump<T: PanelData>(
    panel: &mut Panel<T>,
    rx: &mut mpsc::UnboundedReceiver<CacheEvent>,
) -> (CacheEvent, bool) {
    let event = next_event(rx).await;
    let applied = panel.handle_event(&event);
    (event, applied)
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<CacheEvent>) {
    let extra = timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(extra.is_err(), "no further cache events expected");
}

async fn seed(store: &InMemoryCacheStore, id: &str, value: &PowerRanking, age_secs: i64) {
    store
        .put(
            &power_key(id),
            value.encode().expect("encode"),
            Utc::now() - ChronoDuration::seconds(age_secs),
            TTL,
        )
        .await
        .expect("seed");
}

// ============================================================================
// Panel protocol
// ============================================================================

#[tokio::test]
async fn fresh_cache_hit_needs_no_fetch() {
    let mut h = harness();
    seed(&h.store, "plug-1", &power(10.0), 1).await;
    let (fetcher, calls) = scripted(vec![]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    let (event, applied) = pump(&mut panel, &mut h.events).await;

    assert!(applied);
    assert!(matches!(
        event.kind,
        CacheEventKind::Hit {
            needs_refresh: false,
            ..
        }
    ));
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(10.0)));
    assert_quiet(&mut h.events).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stale_hit_displays_before_refresh_completes() {
    let mut h = harness();
    seed(&h.store, "plug-1", &power(10.0), 120).await;
    let gate = Arc::new(Notify::new());
    let release = gate.clone();
    let fetcher: Arc<dyn DataFetcher<PowerRanking>> =
        Arc::new(FnFetcher::new(move |_device: DeviceId| {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok::<_, FetchError>(power(20.0))
            }
        }));
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(
        event.kind,
        CacheEventKind::Hit {
            needs_refresh: true,
            ..
        }
    ));

    // Refresh is parked on the gate: the stale value is already on screen.
    assert_eq!(panel.phase(), PanelPhase::RefreshingInBackground);
    assert!(!panel.lifecycle().is_loading());
    assert_eq!(panel.displayed(), Some(&power(10.0)));

    release.notify_one();
    let (event, applied) = pump(&mut panel, &mut h.events).await;
    assert!(applied);
    assert!(matches!(event.kind, CacheEventKind::RefreshComplete(Ok(_))));
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(20.0)));
}

#[tokio::test]
async fn miss_fetches_and_caches() {
    let mut h = harness();
    let (fetcher, calls) = scripted(vec![Ok(power(7.5))]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::Miss));
    assert_eq!(panel.phase(), PanelPhase::Loading);
    assert!(panel.displayed().is_none());

    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::Loaded(Ok(_))));
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(7.5)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let cached = h.store.peek(&power_key("plug-1")).expect("entry written");
    assert_eq!(
        PowerRanking::decode(cached.payload()).expect("decode"),
        power(7.5)
    );
    assert_eq!(panel.lifecycle().cached_at(), Some(cached.captured_at()));
}

#[tokio::test]
async fn failed_background_refresh_preserves_display() {
    let mut h = harness();
    seed(&h.store, "plug-1", &power(10.0), 120).await;
    let (fetcher, _) = scripted(vec![Err(FetchError::Status {
        code: 503,
        message: "busy".to_string(),
    })]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    pump(&mut panel, &mut h.events).await;
    let (event, _) = pump(&mut panel, &mut h.events).await;

    assert!(matches!(event.kind, CacheEventKind::RefreshComplete(Err(_))));
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(10.0)));
    assert!(panel.last_error().is_none());
    assert_eq!(panel.lifecycle().background_failures(), 1);

    // The failure did not touch the stored entry.
    let cached = h.store.peek(&power_key("plug-1")).expect("entry kept");
    assert_eq!(
        PowerRanking::decode(cached.payload()).expect("decode"),
        power(10.0)
    );
}

#[tokio::test]
async fn failed_blocking_fetch_shows_error_then_retries_on_focus() {
    let mut h = harness();
    let (fetcher, calls) = scripted(vec![
        Err(FetchError::Transport {
            reason: "timeout".to_string(),
        }),
        Ok(power(3.0)),
    ]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    pump(&mut panel, &mut h.events).await;
    pump(&mut panel, &mut h.events).await;
    assert_eq!(panel.phase(), PanelPhase::Error);
    assert!(panel.displayed().is_none());
    assert!(panel.last_error().is_some());

    panel.on_focus();
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::Miss));
    pump(&mut panel, &mut h.events).await;
    assert_eq!(panel.displayed(), Some(&power(3.0)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_fetch_for_previous_device_is_dropped() {
    let mut h = harness();
    let gate = Arc::new(Notify::new());
    let release = gate.clone();
    let slow = device("plug-a");
    let fetcher: Arc<dyn DataFetcher<PowerRanking>> =
        Arc::new(FnFetcher::new(move |requested: DeviceId| {
            let gate = gate.clone();
            let is_slow = requested == slow;
            async move {
                if is_slow {
                    gate.notified().await;
                    Ok::<_, FetchError>(power(111.0))
                } else {
                    Ok(power(222.0))
                }
            }
        }));
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-a"));
    let first_generation = panel.generation();
    pump(&mut panel, &mut h.events).await; // Miss for A, fetch A parked

    panel.set_device(device("plug-b"));
    assert!(panel.generation() > first_generation);
    pump(&mut panel, &mut h.events).await; // Miss for B
    pump(&mut panel, &mut h.events).await; // Loaded for B
    assert_eq!(panel.displayed(), Some(&power(222.0)));

    release.notify_one();
    let (event, applied) = pump(&mut panel, &mut h.events).await;
    assert_eq!(event.generation, first_generation);
    assert!(!applied);
    assert_eq!(panel.lifecycle().device(), Some(&device("plug-b")));
    assert_eq!(panel.displayed(), Some(&power(222.0)));
    assert_eq!(panel.phase(), PanelPhase::Ready);
}

#[tokio::test]
async fn stale_generation_event_is_rejected() {
    let h = harness();
    let (fetcher, _) = scripted(vec![]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-a"));
    let g1 = panel.generation();
    panel.set_device(device("plug-b"));
    let g2 = panel.generation();
    assert!(g2 > g1);

    let late = CacheEvent {
        key: power_key("plug-a"),
        generation: g1,
        kind: CacheEventKind::Loaded(Ok(Fetched {
            payload: power(1.0).encode().expect("encode"),
            captured_at: Utc::now(),
        })),
    };
    assert!(!panel.handle_event(&late));
    assert_eq!(panel.phase(), PanelPhase::AwaitingCache);
    assert!(panel.displayed().is_none());
    assert_eq!(panel.generation(), g2);
}

#[tokio::test]
async fn forced_refresh_bypasses_fresh_entry() {
    let mut h = harness();
    seed(&h.store, "plug-1", &power(10.0), 1).await;
    let (fetcher, calls) = scripted(vec![Ok(power(12.0))]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    pump(&mut panel, &mut h.events).await;
    assert_eq!(panel.phase(), PanelPhase::Ready);

    panel.refresh();
    assert_eq!(panel.phase(), PanelPhase::Loading);
    let (event, _) = pump(&mut panel, &mut h.events).await;

    assert!(matches!(event.kind, CacheEventKind::Loaded(Ok(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(panel.displayed(), Some(&power(12.0)));
    let cached = h.store.peek(&power_key("plug-1")).expect("entry rewritten");
    assert_eq!(
        PowerRanking::decode(cached.payload()).expect("decode"),
        power(12.0)
    );
}

#[tokio::test]
async fn stale_while_revalidate_end_to_end() {
    let mut h = harness();
    let clock = ManualClock::new(Utc::now());
    let source = clock.clone();
    let orchestrator = h.orchestrator.clone().with_clock(Arc::new(move || source.now()));
    let (fetcher, _) = scripted(vec![Ok(power(1.0)), Ok(power(2.0))]);
    let mut panel = Panel::new(orchestrator, fetcher);

    // t0: empty store
    panel.set_device(device("plug-1"));
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::Miss));
    pump(&mut panel, &mut h.events).await;
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(1.0)));

    // t0 + 61s with a 60s TTL
    clock.advance(61);
    panel.set_device(device("plug-1"));
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(
        event.kind,
        CacheEventKind::Hit {
            needs_refresh: true,
            ..
        }
    ));
    assert_eq!(panel.phase(), PanelPhase::RefreshingInBackground);
    assert_eq!(panel.displayed(), Some(&power(1.0)));

    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::RefreshComplete(Ok(_))));
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(2.0)));
}

#[tokio::test]
async fn disabled_cache_always_fetches() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = CacheOrchestrator::new(Arc::new(DisabledCacheStore), TtlPolicy::default(), tx);
    let (fetcher, calls) = scripted(vec![Ok(power(1.0)), Ok(power(1.0))]);
    let mut panel = Panel::new(orchestrator, fetcher);

    for _ in 0..2 {
        panel.set_device(device("plug-1"));
        let (event, _) = pump(&mut panel, &mut rx).await;
        assert!(matches!(event.kind, CacheEventKind::Miss));
        pump(&mut panel, &mut rx).await;
        assert_eq!(panel.phase(), PanelPhase::Ready);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreadable_store_degrades_to_fetch() {
    let mut h = harness();
    seed(&h.store, "plug-1", &power(10.0), 1).await;
    h.store.fail_gets(true);
    h.store.fail_puts(true);
    let (fetcher, _) = scripted(vec![Ok(power(4.0))]);
    let mut panel = Panel::new(h.orchestrator.clone(), fetcher);

    panel.set_device(device("plug-1"));
    let (event, _) = pump(&mut panel, &mut h.events).await;
    assert!(matches!(event.kind, CacheEventKind::Miss));
    pump(&mut panel, &mut h.events).await;

    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(panel.displayed(), Some(&power(4.0)));
    assert!(panel.last_error().is_none());
}

// ============================================================================
// App shell
// ============================================================================

struct FakeDevices {
    settings: Mutex<HashMap<DeviceId, SystemSettings>>,
}

impl FakeDevices {
    fn new(ids: &[&str]) -> Self {
        let settings = ids
            .iter()
            .map(|id| {
                (
                    device(id),
                    SystemSettings {
                        hostname: format!("{}-host", id),
                        timezone: "UTC".to_string(),
                        reporting_interval_secs: 30,
                        firmware_version: "1.0.0".to_string(),
                    },
                )
            })
            .collect();
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl DeviceClient for FakeDevices {
    async fn system_settings(&self, device: &DeviceId) -> Result<SystemSettings, FetchError> {
        self.settings
            .lock()
            .expect("settings lock")
            .get(device)
            .cloned()
            .ok_or_else(|| FetchError::Rejected {
                reason: "unknown device".to_string(),
            })
    }

    async fn update_system_settings(
        &self,
        device: &DeviceId,
        update: &SettingsUpdate,
    ) -> Result<(), FetchError> {
        let mut all = self.settings.lock().expect("settings lock");
        let current = all.get_mut(device).ok_or_else(|| FetchError::Rejected {
            reason: "unknown device".to_string(),
        })?;
        current.hostname = update.hostname.clone();
        current.timezone = update.timezone.clone();
        current.reporting_interval_secs = update.reporting_interval_secs;
        Ok(())
    }

    async fn webhooks(&self, _device: &DeviceId) -> Result<WebhookList, FetchError> {
        Ok(WebhookList::default())
    }

    async fn power_ranking(&self, _device: &DeviceId) -> Result<PowerRanking, FetchError> {
        Ok(power(5.0))
    }

    async fn environment_sensors(
        &self,
        _device: &DeviceId,
    ) -> Result<EnvironmentSensors, FetchError> {
        Ok(EnvironmentSensors::default())
    }
}

fn base_config(ids: &[&str]) -> TuiConfig {
    TuiConfig {
        devices: ids
            .iter()
            .map(|id| DeviceConfig {
                id: id.to_string(),
                name: id.to_uppercase(),
                base_url: format!("http://{}.local", id),
            })
            .collect(),
        auth: AuthConfig { bearer_token: None },
        request_timeout_ms: 1_000,
        tick_interval_ms: 250,
        cache: CacheConfig {
            enabled: true,
            path: "tmp/nodedeck-cache".into(),
            max_size_mb: 8,
            default_ttl_secs: None,
            ttl_secs: HashMap::new(),
        },
        persistence_path: "tmp/nodedeck-state.json".into(),
        log_path: "tmp/nodedeck.log".into(),
    }
}

struct AppHarness {
    app: App,
    store: Arc<InMemoryCacheStore>,
    cache_rx: mpsc::UnboundedReceiver<CacheEvent>,
    event_rx: mpsc::Receiver<TuiEvent>,
}

fn app_harness(ids: &[&str]) -> AppHarness {
    let config = base_config(ids);
    config.validate().expect("valid config");
    let store = Arc::new(InMemoryCacheStore::new());
    let (cache_tx, cache_rx) = mpsc::unbounded_channel();
    let orchestrator = CacheOrchestrator::new(store.clone(), config.ttl_policy(), cache_tx);
    let client: Arc<dyn DeviceClient> = Arc::new(FakeDevices::new(ids));
    let (event_tx, event_rx) = mpsc::channel(64);
    let app = App::new(config, orchestrator, client, event_tx, CacheBackend::Memory);
    AppHarness {
        app,
        store,
        cache_rx,
        event_rx,
    }
}

/// Feed cache events to the app until `done` holds.
async fn settle(h: &mut AppHarness, done: impl Fn(&App) -> bool) {
    while !done(&h.app) {
        let event = next_event(&mut h.cache_rx).await;
        h.app.handle_cache_event(event);
    }
}

/// Wait for the next app event that is not a stats update.
async fn next_app_event(rx: &mut mpsc::Receiver<TuiEvent>) -> TuiEvent {
    loop {
        let event = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("app event should arrive")
            .expect("channel open");
        if !matches!(event, TuiEvent::CacheStats(_)) {
            return event;
        }
    }
}

fn all_ready(app: &App) -> bool {
    DataType::all()
        .iter()
        .all(|dt| app.panels.get(*dt).phase() == PanelPhase::Ready)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[tokio::test]
async fn app_loads_every_panel_for_selected_device() {
    let mut h = app_harness(&["plug-1"]);
    h.app.start(None);
    settle(&mut h, all_ready).await;

    assert_eq!(
        h.app.panels.settings.displayed().map(|s| s.hostname.as_str()),
        Some("plug-1-host")
    );
    assert_eq!(h.store.len(), DataType::all().len());
}

#[tokio::test]
async fn settings_edit_forces_reload_of_written_value() {
    let mut h = app_harness(&["plug-1"]);
    h.app.start(None);
    settle(&mut h, all_ready).await;

    assert!(!h.app.handle_key(key(KeyCode::Char('e'))));
    assert!(h.app.settings_form.is_some());
    for _ in 0.."plug-1-host".len() {
        h.app.handle_key(key(KeyCode::Backspace));
    }
    for c in "barn".chars() {
        h.app.handle_key(key(KeyCode::Char(c)));
    }
    h.app.handle_key(key(KeyCode::Enter));
    assert!(h.app.settings_form.is_none());
    assert!(h.app.saving_settings);

    let saved = next_app_event(&mut h.event_rx).await;
    assert!(matches!(
        saved,
        TuiEvent::SettingsSaved { result: Ok(()), .. }
    ));
    h.app.handle_event(saved);
    assert_eq!(h.app.panels.settings.phase(), PanelPhase::Loading);

    settle(&mut h, |app| app.panels.settings.phase() == PanelPhase::Ready).await;
    assert_eq!(
        h.app.panels.settings.displayed().map(|s| s.hostname.as_str()),
        Some("barn")
    );
}

#[tokio::test]
async fn switching_device_reloads_panels() {
    let mut h = app_harness(&["plug-1", "plug-2"]);
    h.app.start(None);
    settle(&mut h, all_ready).await;

    h.app.handle_key(key(KeyCode::Char(']')));
    assert_eq!(h.app.current_device(), Some(&device("plug-2")));
    assert_eq!(h.app.panels.settings.phase(), PanelPhase::AwaitingCache);
    assert!(h.app.panels.settings.displayed().is_none());

    settle(&mut h, all_ready).await;
    assert_eq!(
        h.app.panels.settings.displayed().map(|s| s.hostname.as_str()),
        Some("plug-2-host")
    );
    assert_eq!(h.app.persisted_state().selected_device, Some(device("plug-2")));
}

#[tokio::test]
async fn purge_removes_device_entries() {
    let mut h = app_harness(&["plug-1"]);
    h.app.start(None);
    settle(&mut h, all_ready).await;

    h.app.handle_key(key(KeyCode::Char('p')));
    match next_app_event(&mut h.event_rx).await {
        TuiEvent::CachePurged { device: purged, removed } => {
            assert_eq!(purged, device("plug-1"));
            assert_eq!(removed, DataType::all().len() as u64);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(h.store.is_empty());
    // Display is untouched by invalidation.
    assert!(all_ready(&h.app));
}

#[tokio::test]
async fn quit_key_ends_loop() {
    let mut h = app_harness(&["plug-1"]);
    h.app.start(None);
    assert!(h.app.handle_key(key(KeyCode::Char('q'))));
}
