//! # rtvi-telemetry
//!
//! `tracing` subscriber setup for applications embedding the RTVI client.
//! The filter sits behind a reload handle so log levels can be changed while
//! a session is running.

#![deny(unsafe_code)]

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use rtvi_settings::LoggingSettings;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by `RUST_LOG` at startup.
    pub log_level: Level,
    /// Per-module level overrides (e.g. `"rtvi_client::dispatcher"` => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Seed from the `logging` section of the client settings.
    /// An unparseable level falls back to INFO.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            log_level: Level::from_str(&settings.level).unwrap_or(Level::INFO),
            module_levels: Vec::new(),
            json: settings.json,
        }
    }
}

/// Errors from installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber was already set.
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
    /// The reload handle no longer points at a live subscriber.
    #[error("failed to reload log filter: {0}")]
    Reload(#[from] reload::Error),
}

#[derive(Debug)]
struct Levels {
    base: Level,
    modules: Vec<(String, Level)>,
}

/// Handle for adjusting log levels after initialisation.
pub struct TelemetryGuard {
    handle: reload::Handle<EnvFilter, Registry>,
    levels: Arc<RwLock<Levels>>,
}

impl TelemetryGuard {
    /// Change the default log level at runtime.
    pub fn set_level(&self, level: Level) -> Result<(), TelemetryError> {
        self.levels.write().base = level;
        self.apply()
    }

    /// Change the log level for a specific module at runtime.
    pub fn set_module_level(&self, module: &str, level: Level) -> Result<(), TelemetryError> {
        {
            let mut levels = self.levels.write();
            if let Some(entry) = levels.modules.iter_mut().find(|(m, _)| m == module) {
                entry.1 = level;
            } else {
                levels.modules.push((module.to_string(), level));
            }
        }
        self.apply()
    }

    /// Current per-module log level overrides.
    pub fn module_levels(&self) -> Vec<(String, Level)> {
        self.levels.read().modules.clone()
    }

    /// The filter directives currently in effect.
    pub fn directives(&self) -> String {
        let levels = self.levels.read();
        filter_directives(levels.base, &levels.modules)
    }

    fn apply(&self) -> Result<(), TelemetryError> {
        let filter = EnvFilter::new(self.directives());
        self.handle.reload(filter)?;
        Ok(())
    }
}

/// Build `EnvFilter` directives: the base level, then one `module=level`
/// entry per override.
pub fn filter_directives(base: Level, modules: &[(String, Level)]) -> String {
    let mut directives = base.to_string().to_lowercase();
    for (module, level) in modules {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(&level.to_string().to_lowercase());
    }
    directives
}

/// Build the subscriber and its guard without installing it globally.
pub fn telemetry_subscriber(
    config: &TelemetryConfig,
) -> (impl Subscriber + Send + Sync + 'static, TelemetryGuard) {
    let directives = filter_directives(config.log_level, &config.module_levels);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
    });
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(json_layer)
        .with(text_layer);

    let guard = TelemetryGuard {
        handle,
        levels: Arc::new(RwLock::new(Levels {
            base: config.log_level,
            modules: config.module_levels.clone(),
        })),
    };
    (subscriber, guard)
}

/// Install the global subscriber, failing if one is already set.
pub fn try_init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let (subscriber, guard) = telemetry_subscriber(config);
    subscriber.try_init()?;
    Ok(guard)
}

/// Install the global subscriber. Call once at startup.
///
/// If a subscriber is already installed, the existing one stays in place and
/// the returned guard's level changes have no effect.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryGuard {
    let (subscriber, guard) = telemetry_subscriber(config);
    if let Err(e) = subscriber.try_init() {
        eprintln!("rtvi-telemetry: {e}");
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_module_overrides() {
        let modules = vec![
            ("rtvi_client::dispatcher".to_string(), Level::TRACE),
            ("reqwest".to_string(), Level::WARN),
        ];
        assert_eq!(
            filter_directives(Level::INFO, &modules),
            "info,rtvi_client::dispatcher=trace,reqwest=warn"
        );
        assert_eq!(filter_directives(Level::DEBUG, &[]), "debug");
    }

    #[test]
    fn config_from_settings() {
        let cfg = TelemetryConfig::from_settings(&LoggingSettings {
            level: "debug".into(),
            json: true,
        });
        assert_eq!(cfg.log_level, Level::DEBUG);
        assert!(cfg.json);

        let fallback = TelemetryConfig::from_settings(&LoggingSettings {
            level: "loud".into(),
            json: false,
        });
        assert_eq!(fallback.log_level, Level::INFO);
    }

    #[test]
    fn guard_updates_levels_while_subscriber_is_live() {
        let (subscriber, guard) = telemetry_subscriber(&TelemetryConfig::default());
        tracing::subscriber::with_default(subscriber, || {
            guard.set_level(Level::WARN).unwrap();
            guard
                .set_module_level("rtvi_client", Level::DEBUG)
                .unwrap();
            guard
                .set_module_level("rtvi_client", Level::TRACE)
                .unwrap();
        });
        assert_eq!(guard.directives(), "warn,rtvi_client=trace");
        assert_eq!(
            guard.module_levels(),
            vec![("rtvi_client".to_string(), Level::TRACE)]
        );
    }

    #[test]
    fn reload_fails_once_subscriber_is_dropped() {
        let (subscriber, guard) = telemetry_subscriber(&TelemetryConfig::default());
        drop(subscriber);
        assert!(matches!(
            guard.set_level(Level::DEBUG),
            Err(TelemetryError::Reload(_))
        ));
    }
}
