//! # Configuration
//!
//! Layered configuration built with the `config` crate. Later sources win:
//!
//! 1. built-in defaults (`Default` impls below)
//! 2. `config/order-workflow.toml`
//! 3. `config/order-workflow.{environment}.toml`
//! 4. `ORDER_WORKFLOW__*` environment variables, `__` separating nested keys
//!    (e.g. `ORDER_WORKFLOW__AGGREGATION__MODE=queued`)
//!
//! Both files are optional. The environment comes from `ORDER_WORKFLOW_ENV`,
//! then `APP_ENV`, and defaults to `development`.

use crate::error::{Result, WorkflowError};
use crate::models::TaskType;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_STEM: &str = "order-workflow";
pub const ENV_PREFIX: &str = "ORDER_WORKFLOW";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub environment: String,
    pub database: DatabaseConfig,
    pub events: EventsConfig,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. Without one the engine runs on in-memory stores.
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer for lifecycle events
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Task completion drives the order machine directly
    Inline,
    /// Task completion is queued and drained by a background worker
    Queued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub mode: AggregationMode,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; falls back to `RUST_LOG`, then the environment default
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// Tasks attached to an order created without an explicit task list
    pub default_task_types: Vec<TaskType>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: DatabaseConfig::default(),
            events: EventsConfig::default(),
            aggregation: AggregationConfig::default(),
            logging: LoggingConfig::default(),
            orders: OrdersConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Inline,
            queue_capacity: 256,
        }
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            default_task_types: TaskType::default_order_tasks(),
        }
    }
}

impl WorkflowConfig {
    /// Load from `./config` for the detected environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config"), &detect_environment())
    }

    /// Load from `dir` for an explicit environment
    pub fn load_from(dir: &Path, environment: &str) -> Result<Self> {
        // Unset keys fall back to the serde defaults of each section
        let config: Self = config::Config::builder()
            .set_default("environment", environment)?
            .add_source(
                config::File::from(dir.join(format!("{CONFIG_FILE_STEM}.toml"))).required(false),
            )
            .add_source(
                config::File::from(dir.join(format!("{CONFIG_FILE_STEM}.{environment}.toml")))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("orders.default_task_types")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(
            environment = %config.environment,
            aggregation_mode = ?config.aggregation.mode,
            postgres = config.database.url.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_empty() {
            return Err(WorkflowError::Configuration(
                "environment must not be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(WorkflowError::Configuration(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                return Err(WorkflowError::Configuration(
                    "database.url must not be blank when set".to_string(),
                ));
            }
        }

        if self.events.channel_capacity == 0 {
            return Err(WorkflowError::Configuration(
                "events.channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.aggregation.mode == AggregationMode::Queued && self.aggregation.queue_capacity == 0 {
            return Err(WorkflowError::Configuration(
                "aggregation.queue_capacity must be greater than 0 in queued mode".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_test_environment(&self) -> bool {
        self.environment == "test"
    }
}

/// Current environment from `ORDER_WORKFLOW_ENV`, then `APP_ENV`
pub fn detect_environment() -> String {
    environment_from(|key| std::env::var(key).ok())
}

fn environment_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("ORDER_WORKFLOW_ENV")
        .or_else(|| lookup("APP_ENV"))
        .filter(|env| !env.is_empty())
        .unwrap_or_else(|| "development".to_string())
}
