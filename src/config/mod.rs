//! Configuration module.
//!
//! Loads configuration from environment variables (and `.env` if present)
//! once at startup. Nothing here is reloaded while the process runs.

mod template;

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub use template::WrapTemplate;

const DEFAULT_GREETING: &str =
    "Hello! Thanks for reaching out. We have received your message and will get back to you shortly.";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid HEADER_FOOTER_TEMPLATE: {0}")]
    Template(String),
}

/// Where interaction records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb { uri: String, database: String },
    /// Process-local, lost on restart.
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Greeting
    /// Minimum hours between two greetings to the same contact.
    pub greeting_cooldown_hours: f64,
    pub greeting_message: String,

    // Self-edit
    /// `None` disables the outgoing self-edit.
    pub wrap_template: Option<WrapTemplate>,
    pub self_edit_delay: Duration,

    /// Decline incoming voice/video calls.
    pub auto_reject_calls: bool,

    // Storage
    pub storage: StorageBackend,

    // Bridge
    pub bridge_url: Url,
    pub bridge_token: Option<String>,
    pub listen_addr: SocketAddr,
    pub webhook_secret: Option<String>,

    // Background work
    pub task_workers: usize,
    pub task_queue_capacity: usize,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let greeting_cooldown_hours = parse_or(&get, "GREETING_COOLDOWN_HOURS", 24.0_f64)?;
        if !greeting_cooldown_hours.is_finite() || greeting_cooldown_hours <= 0.0 {
            return Err(invalid(
                "GREETING_COOLDOWN_HOURS",
                greeting_cooldown_hours.to_string(),
                "must be a positive number of hours",
            ));
        }

        // Not trimmed: leading/trailing whitespace in the greeting is intended
        let greeting_message = lookup("GREETING_MESSAGE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        let wrap_template = lookup("HEADER_FOOTER_TEMPLATE")
            .filter(|v| !v.trim().is_empty())
            .map(|t| WrapTemplate::parse(&t.replace("\\n", "\n")))
            .transpose()?;

        let self_edit_delay = Duration::from_millis(parse_or(&get, "SELF_EDIT_DELAY_MS", 1000_u64)?);
        let auto_reject_calls = parse_bool(&get, "AUTO_REJECT_CALLS", true)?;

        let storage = match get("STORAGE_BACKEND").map(|s| s.to_lowercase()).as_deref() {
            None | Some("mongodb") | Some("mongo") => StorageBackend::MongoDb {
                uri: get("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: get("MONGODB_DATABASE").unwrap_or_else(|| "concierge".to_string()),
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(invalid("STORAGE_BACKEND", other, "expected mongodb or memory"));
            }
        };

        let bridge_url = get("BRIDGE_URL").ok_or(ConfigError::Missing("BRIDGE_URL"))?;
        let bridge_url = Url::parse(&bridge_url)
            .map_err(|e| invalid("BRIDGE_URL", bridge_url.clone(), e.to_string()))?;

        let listen_addr = parse_or(&get, "LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        let task_workers = parse_or(&get, "TASK_WORKERS", 8_usize)?;
        let task_queue_capacity = parse_or(&get, "TASK_QUEUE_CAPACITY", 256_usize)?;
        if task_workers == 0 || task_queue_capacity == 0 {
            return Err(invalid(
                "TASK_WORKERS/TASK_QUEUE_CAPACITY",
                format!("{}/{}", task_workers, task_queue_capacity),
                "must be greater than zero",
            ));
        }

        let shutdown_grace = Duration::from_secs(parse_or(&get, "SHUTDOWN_GRACE_SECS", 10_u64)?);

        Ok(Self {
            greeting_cooldown_hours,
            greeting_message,
            wrap_template,
            self_edit_delay,
            auto_reject_calls,
            storage,
            bridge_url,
            bridge_token: get("BRIDGE_TOKEN"),
            listen_addr,
            webhook_secret: get("WEBHOOK_SECRET"),
            task_workers,
            task_queue_capacity,
            shutdown_grace,
        })
    }

    /// Cooldown window as a chrono duration (millisecond precision).
    pub fn greeting_cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.greeting_cooldown_hours * 3_600_000.0) as i64)
    }
}

fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.into(),
        reason: reason.into(),
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| invalid(key, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|s| s.to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(invalid(key, other, "expected true or false")),
    }
}
