//! Tracing subscriber setup
//!
//! Host applications call `init_from_env()` once at startup. Library code
//! only emits `tracing` events.

use std::env;
use tracing_subscriber::{filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV_VAR: &str = "PLANNER_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build the filter from `PLANNER_LOG`, quieting the HTTP and SQL crates
pub fn build_filter(directive: Option<&str>) -> EnvFilter {
  let base = directive
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .unwrap_or(DEFAULT_LOG_LEVEL);

  let filter = EnvFilter::try_new(base).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

  ["hyper=warn", "reqwest=warn", "sqlx=warn"]
    .into_iter()
    .filter_map(|d| d.parse::<Directive>().ok())
    .fold(filter, |f, d| f.add_directive(d))
}

/// Install a compact fmt subscriber. Returns false if one was already set.
pub fn init_from_env() -> bool {
  let directive = env::var(LOG_ENV_VAR).ok();
  let filter = build_filter(directive.as_deref());

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().compact().with_target(false))
    .try_init()
    .is_ok()
}
