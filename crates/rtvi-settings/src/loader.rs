//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ClientSettings::default()`]
//! 2. If `~/.rtvi/settings.json` exists, deep-merge file values over defaults
//! 3. Apply `RTVI_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ClientSettings;

/// Resolve the path to the settings file (`~/.rtvi/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".rtvi").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; an unreadable or malformed one is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClientSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<ClientSettings> {
    let defaults = serde_json::to_value(ClientSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

fn validate(settings: &ClientSettings) -> Result<()> {
    if settings.dispatcher.gc_interval_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "dispatcher.gcIntervalMs must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Apply `RTVI_*` environment variable overrides.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut ClientSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup` instead of the process environment.
pub fn apply_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    let env = EnvReader { lookup };

    // ── Dispatcher ──────────────────────────────────────────────────
    if let Some(v) = env.u64("RTVI_REQUEST_TIMEOUT_MS", 1, 3_600_000) {
        settings.dispatcher.request_timeout_ms = v;
    }
    if let Some(v) = env.u64("RTVI_GC_INTERVAL_MS", 10, 600_000) {
        settings.dispatcher.gc_interval_ms = v;
    }

    // ── Media ───────────────────────────────────────────────────────
    if let Some(v) = env.bool("RTVI_ENABLE_MIC") {
        settings.media.enable_mic = v;
    }
    if let Some(v) = env.bool("RTVI_ENABLE_CAM") {
        settings.media.enable_cam = v;
    }

    // ── Credentials ─────────────────────────────────────────────────
    if let Some(v) = env.u64("RTVI_CREDENTIALS_TIMEOUT_MS", 1, 3_600_000) {
        settings.credentials.timeout_ms = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("RTVI_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("RTVI_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, min, max, "invalid u64 env var, ignoring");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_objects_per_key() {
        let merged = deep_merge(
            json!({"dispatcher": {"requestTimeoutMs": 10000, "gcIntervalMs": 2000}}),
            json!({"dispatcher": {"requestTimeoutMs": 500}}),
        );
        assert_eq!(
            merged,
            json!({"dispatcher": {"requestTimeoutMs": 500, "gcIntervalMs": 2000}})
        );
    }

    #[test]
    fn merge_skips_null() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged, json!({"a": 1}));
    }

    #[test]
    fn merge_replaces_arrays_and_primitives() {
        assert_eq!(deep_merge(json!({"a": [1, 2]}), json!({"a": [3]})), json!({"a": [3]}));
        assert_eq!(deep_merge(json!({"a": {"b": 1}}), json!({"a": 7})), json!({"a": 7}));
    }

    #[test]
    fn merge_adds_new_keys() {
        assert_eq!(deep_merge(json!({}), json!({"x": true})), json!({"x": true}));
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for t in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_bool(t), Some(true), "{t}");
        }
        for f in ["false", "0", "no", "OFF"] {
            assert_eq!(parse_bool(f), Some(false), "{f}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_u64_respects_bounds() {
        assert_eq!(parse_u64_range("500", 1, 1000), Some(500));
        assert_eq!(parse_u64_range(" 42 ", 1, 1000), Some(42));
        assert_eq!(parse_u64_range("0", 1, 1000), None);
        assert_eq!(parse_u64_range("1001", 1, 1000), None);
        assert_eq!(parse_u64_range("-3", 1, 1000), None);
        assert_eq!(parse_u64_range("abc", 1, 1000), None);
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let mut s = ClientSettings::default();
        apply_overrides(
            &mut s,
            lookup_from(&[
                ("RTVI_REQUEST_TIMEOUT_MS", "2500"),
                ("RTVI_GC_INTERVAL_MS", "100"),
                ("RTVI_ENABLE_MIC", "off"),
                ("RTVI_ENABLE_CAM", "yes"),
                ("RTVI_CREDENTIALS_TIMEOUT_MS", "3000"),
                ("RTVI_LOG_LEVEL", "debug"),
                ("RTVI_LOG_JSON", "1"),
            ]),
        );
        assert_eq!(s.dispatcher.request_timeout_ms, 2500);
        assert_eq!(s.dispatcher.gc_interval_ms, 100);
        assert!(!s.media.enable_mic);
        assert!(s.media.enable_cam);
        assert_eq!(s.credentials.timeout_ms, Some(3000));
        assert_eq!(s.logging.level, "debug");
        assert!(s.logging.json);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut s = ClientSettings::default();
        apply_overrides(
            &mut s,
            lookup_from(&[
                ("RTVI_REQUEST_TIMEOUT_MS", "soon"),
                ("RTVI_GC_INTERVAL_MS", "0"),
                ("RTVI_ENABLE_MIC", "perhaps"),
                ("RTVI_LOG_LEVEL", ""),
            ]),
        );
        assert_eq!(s, ClientSettings::default());
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_file_layer(&dir.path().join("nope.json")).unwrap();
        assert_eq!(s, ClientSettings::default());
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"dispatcher": {"requestTimeoutMs": 1234}, "about": {"platform": "linux"}}"#,
        )
        .unwrap();

        let s = load_file_layer(&path).unwrap();
        assert_eq!(s.dispatcher.request_timeout_ms, 1234);
        assert_eq!(s.dispatcher.gc_interval_ms, 2000);
        assert_eq!(s.about.unwrap().platform.as_deref(), Some("linux"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_file_layer(&path), Err(SettingsError::Json(_))));
    }

    #[test]
    fn zero_gc_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"dispatcher": {"gcIntervalMs": 0}}"#).unwrap();
        let err = validate(&load_file_layer(&path).unwrap()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }
}
