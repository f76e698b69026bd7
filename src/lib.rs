pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod naming;
pub mod payloads;
pub mod project;
pub mod routes;
pub mod syntax;
pub mod util;
pub mod views;

pub use error::MigrateError;
pub use migrate::{MigrationOptions, RouterFactory, process_source};
pub use routes::Route;
