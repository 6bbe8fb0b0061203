//! Daemon configuration
//!
//! Every setting has a default and can be overridden with a `TASKHIVE_*`
//! environment variable. Malformed values are rejected at startup.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use taskhive_api_rpc::RpcServerConfig;
use taskhive_core::error::{AppError, Result};
use taskhive_core::EngineConfig;
use taskhive_infra_handlers::{HandlerConfig, SimulatedDelay};

const ENV_PREFIX: &str = "TASKHIVE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Also write JSON logs to a daily rolling file here
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    pub engine: EngineConfig,
    pub rpc: RpcServerConfig,
    pub handlers: HandlerConfig,
    pub log: LogConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (keys include the `TASKHIVE_` prefix)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let mut config = DaemonConfig::default();

        // Engine
        if let Some(size) = env.parse::<usize>("MAX_QUEUE_SIZE")? {
            if size == 0 {
                return Err(invalid("MAX_QUEUE_SIZE", "must be at least 1"));
            }
            config.engine.store.max_queue_size = size;
        }
        if let Some(ms) = env.parse::<u64>("WORKER_IDLE_MS")? {
            config.engine.worker.idle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<u64>("WORKER_REARM_MS")? {
            config.engine.worker.rearm_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<u64>("HANDLER_TIMEOUT_MS")? {
            if ms == 0 {
                return Err(invalid("HANDLER_TIMEOUT_MS", "must be positive"));
            }
            config.engine.worker.handler_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<i64>("RETRY_BASE_DELAY_MS")? {
            if ms < 0 {
                return Err(invalid("RETRY_BASE_DELAY_MS", "must not be negative"));
            }
            config.engine.retry.base_delay_ms = ms;
        }
        if let Some(factor) = env.parse::<f64>("RETRY_BACKOFF_FACTOR")? {
            if !factor.is_finite() || factor < 1.0 {
                return Err(invalid("RETRY_BACKOFF_FACTOR", "must be a number >= 1.0"));
            }
            config.engine.retry.backoff_factor = factor;
        }
        if let Some(hours) = env.parse::<u64>("CLEANUP_INTERVAL_HOURS")? {
            config.engine.cleanup.interval_hours = hours.max(1);
        }
        if let Some(hours) = env.parse::<u64>("CLEANUP_RETENTION_HOURS")? {
            config.engine.cleanup.retention_hours = hours;
        }

        // RPC
        if let Some(host) = env.string("RPC_HOST") {
            config.rpc.host = host;
        }
        if let Some(port) = env.parse::<u16>("RPC_PORT")? {
            config.rpc.port = port;
        }

        // Handlers
        if let Some(url) = env.string("BACKEND_URL") {
            config.handlers.backend_url = url;
        }
        config.handlers.backend_api_key = env.string("BACKEND_API_KEY");
        let min = env.parse::<u64>("SIMULATED_DELAY_MIN_MS")?;
        let max = env.parse::<u64>("SIMULATED_DELAY_MAX_MS")?;
        if min.is_some() || max.is_some() {
            config.handlers.simulated_delay =
                SimulatedDelay::between(min.unwrap_or(0), max.unwrap_or(0));
        }

        // Logging
        if let Some(format) = env.parse::<LogFormat>("LOG_FORMAT")? {
            config.log.format = format;
        }
        config.log.dir = env.string("LOG_DIR").map(PathBuf::from);

        Ok(config)
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; blank counts as unset
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{}{}", ENV_PREFIX, name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.string(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| invalid(name, format!("'{}': {}", raw, e))),
        }
    }
}

fn invalid(name: &str, detail: impl Display) -> AppError {
    AppError::Config(format!("{}{} {}", ENV_PREFIX, name, detail))
}
