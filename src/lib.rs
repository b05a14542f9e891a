// src/lib.rs

use std::sync::Arc;

pub mod actions;
pub mod api;
pub mod config;
pub mod datai;
pub mod extract;
pub mod format;
pub mod mcp;
pub mod plugin;
pub mod runtime;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, also the settings source for actions
    pub config: config::Config,
    /// The registered Datai actions
    pub plugin: Arc<plugin::DataiPlugin>,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config, plugin: Arc::new(plugin::DataiPlugin::new()) }
    }
}
