// Configuration module for viewshift
// Reads from environment variables with sensible defaults

use crate::migrate::{MigrationOptions, RouterFactory};
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory converted modules are written to (VIEWSHIFT_OUTPUT_DIR)
    pub output_dir: PathBuf,

    /// Emit routed handlers as `async def` (VIEWSHIFT_ASYNC_HANDLERS)
    pub async_handlers: bool,

    /// Worker threads for module conversion, 0 = one per core (VIEWSHIFT_JOBS)
    pub jobs: usize,

    /// Router callable used for declarations (VIEWSHIFT_ROUTER_FACTORY)
    pub router_factory: RouterFactory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            async_handlers: true,
            jobs: 0,
            router_factory: RouterFactory::InferringRouter,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("VIEWSHIFT_OUTPUT_DIR") {
            if val.trim().is_empty() {
                eprintln!(
                    "viewshift: Warning: Invalid VIEWSHIFT_OUTPUT_DIR value: {:?}, using default: {}",
                    val,
                    config.output_dir.display()
                );
            } else {
                config.output_dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = env::var("VIEWSHIFT_ASYNC_HANDLERS") {
            if let Ok(parsed) = val.parse() {
                config.async_handlers = parsed;
            } else {
                eprintln!(
                    "viewshift: Warning: Invalid VIEWSHIFT_ASYNC_HANDLERS value: {}, using default: {}",
                    val, config.async_handlers
                );
            }
        }

        if let Ok(val) = env::var("VIEWSHIFT_JOBS") {
            if let Ok(parsed) = val.parse() {
                config.jobs = parsed;
            } else {
                eprintln!(
                    "viewshift: Warning: Invalid VIEWSHIFT_JOBS value: {}, using default: {}",
                    val, config.jobs
                );
            }
        }

        if let Ok(val) = env::var("VIEWSHIFT_ROUTER_FACTORY") {
            if let Ok(parsed) = val.parse() {
                config.router_factory = parsed;
            } else {
                eprintln!(
                    "viewshift: Warning: Invalid VIEWSHIFT_ROUTER_FACTORY value: {}, using default: {}",
                    val, config.router_factory
                );
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }

    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions {
            async_handlers: self.async_handlers,
            router_factory: self.router_factory,
        }
    }
}
