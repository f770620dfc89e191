//! nodedeck TUI library exports.
//!
//! Every panel goes from "nothing shown" to "fresh data shown" through the
//! same protocol: [`lifecycle::PanelLifecycle`] decides what to do, the
//! [`orchestrator::CacheOrchestrator`] runs cache reads and fetches as
//! tasks, and results come back as events on one channel.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod keys;
pub mod lifecycle;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod orchestrator;
pub mod panel;
pub mod panels;
pub mod persistence;
pub mod state;
pub mod theme;
pub mod views;
pub mod widgets;
