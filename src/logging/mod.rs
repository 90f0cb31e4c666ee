//=========================================================================
// Logging
//=========================================================================
//
// Logger setup for binaries and demos embedding the engine, on top of
// `env_logger`.
//
// The engine itself only talks to the `log` facade. Targets in use:
//   engine            lifecycle (start / pause / resume / stop)
//   engine::thread    loop spawn, exit, pacing
//   engine::registry  pending queue drains, deferred notifications
//   engine::ui        UI context delivery
//
// Filter resolution, first match wins:
//   LoggingConfig::with_filter  >  RUST_LOG (unless ignored)  >  level
//
//=========================================================================

//=== External Dependencies ===============================================

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

//=== LoggingConfig =======================================================

/// Logger configuration.
///
/// # Examples
///
/// ```no_run
/// use hanabi_engine::logging::{init_logging, LoggingConfig};
/// use log::LevelFilter;
///
/// init_logging(
///     LoggingConfig::default()
///         .with_level(LevelFilter::Warn)
///         .with_target("engine::thread", LevelFilter::Trace),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    level: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
    filter: Option<String>,
    read_rust_log: bool,
    write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            targets: Vec::new(),
            filter: None,
            read_rust_log: true,
            write_style: WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Base level for every target. Default: `Info`.
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Overrides the level of one target (e.g. `"engine::registry"`).
    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        self.targets.push((target.into(), level));
        self
    }

    /// Raw `env_logger` filter string; replaces level and targets.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Do not consult `RUST_LOG`.
    pub fn ignore_rust_log(mut self) -> Self {
        self.read_rust_log = false;
        self
    }

    pub fn with_write_style(mut self, style: WriteStyle) -> Self {
        self.write_style = style;
        self
    }

    /// Filter string this config resolves to, given the `RUST_LOG` value.
    fn filter_spec(&self, rust_log: Option<String>) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        if let Some(rust_log) = rust_log.filter(|_| self.read_rust_log) {
            return rust_log;
        }

        let mut spec = self.level.as_str().to_ascii_lowercase();
        for (target, level) in &self.targets {
            spec.push_str(&format!(",{}={}", target, level.as_str().to_ascii_lowercase()));
        }
        spec
    }

    fn builder(&self) -> Builder {
        let spec = self.filter_spec(std::env::var("RUST_LOG").ok());

        let mut builder = Builder::new();
        builder
            .parse_filters(&spec)
            .format_target(true)
            .format_timestamp_millis()
            .write_style(self.write_style);
        builder
    }
}

//=== Initialization ======================================================

/// Installs the global logger.
///
/// Returns `false` if a logger was already installed (by an earlier call,
/// a test harness or the host); that logger stays in place.
pub fn init_logging(config: LoggingConfig) -> bool {
    let installed = config.builder().try_init().is_ok();
    if installed {
        log::debug!(target: "engine", "Logging initialized");
    }
    installed
}

//=========================================================================
// Unit Tests
//=========================================================================
