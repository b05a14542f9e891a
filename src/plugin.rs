// src/plugin.rs

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::actions::{all_actions, Action, ActionResponse, Memory};
use crate::datai::endpoints::REQUIRED_ENV_VARS;
use crate::runtime::AgentRuntime;

pub const PLUGIN_NAME: &str = "datai";
pub const PLUGIN_DESCRIPTION: &str = "Plugin for accessing Datai (Merlin) API services for DeFi data";

/// Everything one action invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRun {
    pub action: &'static str,
    pub validated: bool,
    pub success: bool,
    pub responses: Vec<ActionResponse>,
}

impl ActionRun {
    /// The last reply, which carries the final outcome.
    pub fn last(&self) -> Option<&ActionResponse> {
        self.responses.last()
    }

    pub fn text(&self) -> String {
        self.responses
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The registered action set.
pub struct DataiPlugin {
    pub name: &'static str,
    pub description: &'static str,
    pub actions: Vec<Box<dyn Action>>,
}

impl Default for DataiPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DataiPlugin {
    pub fn new() -> Self {
        Self { name: PLUGIN_NAME, description: PLUGIN_DESCRIPTION, actions: all_actions() }
    }

    /// Logs every required setting the runtime does not provide. Returns
    /// whether all of them are present.
    pub fn init(&self, runtime: &dyn AgentRuntime) -> bool {
        info!("Initializing {} plugin with {} actions", self.name, self.actions.len());
        let mut ok = true;
        for key in REQUIRED_ENV_VARS {
            if runtime.get_setting(key).is_none() {
                error!("Missing required setting: {}", key);
                ok = false;
            }
        }
        ok
    }

    /// Looks an action up by its name or any of its similes.
    pub fn get_action(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .or_else(|| self.actions.iter().find(|a| a.similes().contains(&name)))
            .map(|a| a.as_ref())
    }

    /// Names of the actions whose validators accept `message`. More than one
    /// entry means the message is ambiguous between siblings.
    pub async fn matching_actions(&self, runtime: &dyn AgentRuntime, message: &Memory) -> Vec<&'static str> {
        let mut names = Vec::new();
        for action in &self.actions {
            if action.validate(runtime, message).await {
                names.push(action.name());
            }
        }
        debug!("{} action(s) match: {:?}", names.len(), names);
        names
    }

    /// Validates then runs one action, collecting its replies. With `strict`
    /// a failed validation skips the handler.
    pub async fn run(
        &self,
        runtime: &dyn AgentRuntime,
        name: &str,
        message: &Memory,
        options: Option<&Value>,
        strict: bool,
    ) -> Option<ActionRun> {
        let action = self.get_action(name)?;
        let validated = action.validate(runtime, message).await;
        if strict && !validated {
            debug!("{} rejected the message", action.name());
            return Some(ActionRun { action: action.name(), validated, success: false, responses: Vec::new() });
        }

        let mut responses = Vec::new();
        let success = {
            let mut collect = |r: ActionResponse| responses.push(r);
            action.handler(runtime, message, None, options, Some(&mut collect)).await
        };
        Some(ActionRun { action: action.name(), validated, success, responses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    #[test]
    fn init_reports_missing_key() {
        let plugin = DataiPlugin::new();
        assert!(!plugin.init(&StaticRuntime::new()));
        assert!(plugin.init(&StaticRuntime::new().with_setting("DATAI_API_KEY", "k")));
    }

    #[test]
    fn lookup_by_simile() {
        let plugin = DataiPlugin::new();
        let action = plugin.get_action("VIEW_TOKEN_MOVEMENTS").map(|a| a.name());
        assert_eq!(action, Some("GET_TRANSACTION_TRANSFERS_BY_HASH"));
        assert!(plugin.get_action("NOPE").is_none());
    }

    #[tokio::test]
    async fn nothing_matches_without_key() {
        let plugin = DataiPlugin::new();
        let msg = Memory::from_text("show wallet balances on eth for 0x218e312fF5181290A46e3f87A73A8aD40C05A944");
        assert!(plugin.matching_actions(&StaticRuntime::new(), &msg).await.is_empty());
    }

    #[tokio::test]
    async fn strict_run_skips_handler() {
        let plugin = DataiPlugin::new();
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let run = plugin
            .run(&rt, "GET_TRANSACTION_BY_HASH_DATAI", &Memory::from_text("hello"), None, true)
            .await
            .unwrap();
        assert!(!run.validated);
        assert!(run.responses.is_empty());

        let run = plugin
            .run(&rt, "GET_TRANSACTION_BY_HASH_DATAI", &Memory::from_text("hello"), None, false)
            .await
            .unwrap();
        assert!(!run.success);
        assert_eq!(run.last().and_then(|r| r.content.error.as_deref()), Some("No wallet address provided"));
    }
}
