//! Bootstrap shared by the vitrine binaries: help styling, version and log setup.

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Level used when `service.log_level` is not a valid filter directive.
pub const FALLBACK_LOG_LEVEL: &str = "info";

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Green.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Yellow.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Parses the configured log level, falling back to [`FALLBACK_LOG_LEVEL`] with a warning on
/// stderr. The subscriber is not installed yet at this point.
pub fn log_filter(level: &str) -> EnvFilter {
	match EnvFilter::try_new(level.trim()) {
		Ok(filter) if !level.trim().is_empty() => filter,
		Ok(_) => EnvFilter::new(FALLBACK_LOG_LEVEL),
		Err(err) => {
			eprintln!("Ignoring log level '{level}': {err}. Using '{FALLBACK_LOG_LEVEL}'.");

			EnvFilter::new(FALLBACK_LOG_LEVEL)
		},
	}
}

/// Installs the global fmt subscriber. Call once per process, before anything logs.
pub fn init_tracing(level: &str) {
	tracing_subscriber::fmt().with_env_filter(log_filter(level)).init();
}
