//! `residence-service`: the process around the rules engine.
//!
//! Loads [`config::ServiceConfig`], opens the SQLite store and drives the
//! daily attendance reconcile through [`scheduler`].

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod scheduler;

use std::sync::Arc;

use residence_rules::{GatewayError, RulesEngine, SystemClock};
use residence_store::SqliteGateway;

use crate::config::ServiceConfig;

/// Open the configured database and wrap it in an engine on local time.
pub fn open_engine(config: &ServiceConfig) -> Result<Arc<RulesEngine>, GatewayError> {
    let path = config.resolved_db_path();
    let gateway = SqliteGateway::open(&path)?;
    tracing::info!(path = %path.display(), "Residence store ready");
    Ok(Arc::new(RulesEngine::new(
        Arc::new(gateway),
        Arc::new(SystemClock),
    )))
}
