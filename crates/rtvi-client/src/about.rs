//! The about-client descriptor sent in the handshake.

use rtvi_core::payloads::AboutClientData;
use serde_json::{Map, Value};

/// Library name reported to the bot.
pub const LIBRARY_NAME: &str = env!("CARGO_PKG_NAME");
/// Library version reported to the bot.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Descriptor of this build: library name and version plus the host OS and
/// architecture.
pub fn default_about() -> AboutClientData {
    let mut details = Map::new();
    let _ = details.insert(
        "arch".to_string(),
        Value::String(std::env::consts::ARCH.to_string()),
    );
    let _ = details.insert(
        "family".to_string(),
        Value::String(std::env::consts::FAMILY.to_string()),
    );
    AboutClientData {
        library: LIBRARY_NAME.to_string(),
        library_version: Some(LIBRARY_VERSION.to_string()),
        platform: Some(std::env::consts::OS.to_string()),
        platform_version: None,
        platform_details: Some(details),
    }
}

/// Shallow merge: every field set in `update` replaces the one in `current`.
/// An empty `library` counts as unset.
pub fn merge_about(current: &AboutClientData, update: &AboutClientData) -> AboutClientData {
    AboutClientData {
        library: if update.library.is_empty() {
            current.library.clone()
        } else {
            update.library.clone()
        },
        library_version: update
            .library_version
            .clone()
            .or_else(|| current.library_version.clone()),
        platform: update.platform.clone().or_else(|| current.platform.clone()),
        platform_version: update
            .platform_version
            .clone()
            .or_else(|| current.platform_version.clone()),
        platform_details: update
            .platform_details
            .clone()
            .or_else(|| current.platform_details.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_this_crate() {
        let about = default_about();
        assert_eq!(about.library, "rtvi-client");
        assert_eq!(about.library_version.as_deref(), Some(LIBRARY_VERSION));
        assert_eq!(about.platform.as_deref(), Some(std::env::consts::OS));
        assert!(about.platform_details.unwrap().contains_key("arch"));
    }

    #[test]
    fn merge_overrides_only_set_fields() {
        let current = default_about();
        let update = AboutClientData {
            platform: Some("embedded".into()),
            platform_version: Some("2.1".into()),
            ..Default::default()
        };
        let merged = merge_about(&current, &update);
        assert_eq!(merged.library, current.library);
        assert_eq!(merged.library_version, current.library_version);
        assert_eq!(merged.platform.as_deref(), Some("embedded"));
        assert_eq!(merged.platform_version.as_deref(), Some("2.1"));
        assert_eq!(merged.platform_details, current.platform_details);
    }

    #[test]
    fn merge_replaces_details_wholesale() {
        let current = default_about();
        let mut details = Map::new();
        let _ = details.insert("device".into(), Value::String("kiosk".into()));
        let update = AboutClientData {
            library: "my-app".into(),
            platform_details: Some(details.clone()),
            ..Default::default()
        };
        let merged = merge_about(&current, &update);
        assert_eq!(merged.library, "my-app");
        assert_eq!(merged.platform_details, Some(details));
    }

    #[test]
    fn merge_is_pure() {
        let current = default_about();
        let snapshot = current.clone();
        let _ = merge_about(&current, &AboutClientData {
            platform: Some("x".into()),
            ..Default::default()
        });
        assert_eq!(current, snapshot);
    }
}
