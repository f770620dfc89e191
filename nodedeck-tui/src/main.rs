//! nodedeck TUI entry point.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nodedeck_storage::{CacheStore, DisabledCacheStore, InMemoryCacheStore, LmdbCacheStore};
use nodedeck_tui::api_client::{DeviceClient, HttpDeviceClient};
use nodedeck_tui::config::TuiConfig;
use nodedeck_tui::error::TuiError;
use nodedeck_tui::events::TuiEvent;
use nodedeck_tui::orchestrator::CacheOrchestrator;
use nodedeck_tui::persistence;
use nodedeck_tui::state::{App, CacheBackend};
use nodedeck_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    nodedeck_tui::logging::init(&config.log_path)?;
    info!(devices = config.devices.len(), "Starting nodedeck");

    let (store, backend) = open_cache(&config);
    let (cache_tx, mut cache_rx) = mpsc::unbounded_channel();
    let orchestrator = CacheOrchestrator::new(store, config.ttl_policy(), cache_tx);
    let client: Arc<dyn DeviceClient> = Arc::new(HttpDeviceClient::new(&config)?);

    let restored = match persistence::load(&config.persistence_path) {
        Ok(state) => state,
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable UI state");
            None
        }
    };
    let tick_rate = config.tick_interval();

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    let mut app = App::new(config, orchestrator, client, event_tx.clone(), backend);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    spawn_input_reader(event_tx);
    app.start(restored);

    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                app.handle_event(TuiEvent::Tick);
            }
            Some(event) = event_rx.recv() => {
                if app.handle_event(event) {
                    break;
                }
            }
            Some(event) = cache_rx.recv() => {
                app.handle_cache_event(event);
            }
        }
    }

    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        warn!(error = %err, "Failed to save UI state");
    }
    info!("Exiting nodedeck");

    Ok(())
}

fn open_cache(config: &TuiConfig) -> (Arc<dyn CacheStore>, CacheBackend) {
    if !config.cache.enabled {
        info!("Cache disabled, every load fetches from the device");
        return (Arc::new(DisabledCacheStore), CacheBackend::Disabled);
    }
    match LmdbCacheStore::new(&config.cache.path, config.cache.max_size_mb) {
        Ok(store) => (Arc::new(store), CacheBackend::Lmdb),
        Err(err) => {
            warn!(
                path = %config.cache.path.display(),
                error = %err,
                "Cannot open cache directory, using in-memory cache"
            );
            (Arc::new(InMemoryCacheStore::new()), CacheBackend::Memory)
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        sender.blocking_send(TuiEvent::Input(key))
                    }
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}
