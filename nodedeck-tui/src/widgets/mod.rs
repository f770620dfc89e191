//! Reusable widget components.

pub mod progress;
pub mod status;

pub use progress::ShareBar;
pub use status::PanelStatusLine;
