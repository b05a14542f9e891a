//! Host-runtime seam.
//!
//! Actions only need one thing from whoever hosts them: a way to look up
//! settings such as `DATAI_API_KEY`. The server passes its [`Config`];
//! embedders and tests can use [`StaticRuntime`].
//!
//! [`Config`]: crate::config::Config

use std::collections::HashMap;

pub trait AgentRuntime: Send + Sync {
    fn get_setting(&self, key: &str) -> Option<String>;
}

/// Settings held in memory, with no environment fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticRuntime {
    settings: HashMap<String, String>,
}

impl StaticRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

impl AgentRuntime for StaticRuntime {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).filter(|v| !v.is_empty()).cloned()
    }
}
