//! Scenario configuration types
//!
//! The `[scenario]` section of the config file. Defaults target the LifeUp
//! MCP server's task tools.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Tools and fixed arguments used by the smoke scenario
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ScenarioConfig {
    /// Read-only tool probed with no arguments
    #[serde(default = "default_read_tool")]
    pub read_tool: String,
    /// Mutating tool probed with `name` and `coin`
    #[serde(default = "default_create_tool")]
    pub create_tool: String,
    /// Tool used to remove the entity the create probe made
    #[serde(default = "default_delete_tool")]
    pub delete_tool: String,
    /// Name given to the created task
    #[serde(default = "default_task_name")]
    pub task_name: String,
    /// Coin reward given to the created task
    #[serde(default = "default_task_coin")]
    pub task_coin: i64,
    /// Pause after connecting so the server can finish its own startup
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            read_tool: default_read_tool(),
            create_tool: default_create_tool(),
            delete_tool: default_delete_tool(),
            task_name: default_task_name(),
            task_coin: default_task_coin(),
            settle_ms: default_settle_ms(),
        }
    }
}

fn default_read_tool() -> String {
    "list_all_tasks".to_string()
}

fn default_create_tool() -> String {
    "create_task".to_string()
}

fn default_delete_tool() -> String {
    "delete_task".to_string()
}

fn default_task_name() -> String {
    "MCP smoke test task".to_string()
}

fn default_task_coin() -> i64 {
    10
}

fn default_settle_ms() -> u64 {
    2_000
}

impl ScenarioConfig {
    /// Arguments for the read probe
    pub fn read_arguments(&self) -> Value {
        json!({})
    }

    /// Arguments for the create probe
    pub fn create_arguments(&self) -> Value {
        json!({
            "name": self.task_name,
            "coin": self.task_coin,
        })
    }

    /// Arguments for deleting the created entity
    pub fn delete_arguments(&self, id: u64) -> Value {
        json!({ "id": id })
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
