// Library surface for the binary and the integration tests.
pub mod analysis;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod projector;
pub mod runtime;
pub mod session;
pub mod sources;
pub mod theme;
pub mod typing_policy;
pub mod ui;

pub use error::{Error, Result};
