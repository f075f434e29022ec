use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of a generated correlation token.
const MESSAGE_ID_LEN: usize = 8;

/// Correlation token carried in every envelope's `id` field.
///
/// Generated ids are short random hex strings; inbound ids are kept verbatim
/// so that any token the bot echoes back still matches.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        let mut raw = Uuid::new_v4().simple().to_string();
        raw.truncate(MESSAGE_ID_LEN);
        Self(raw)
    }

    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MessageId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_id_is_short_hex() {
        let id = MessageId::new();
        assert_eq!(id.as_str().len(), MESSAGE_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()), "got: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<MessageId> = (0..1000).map(|_| MessageId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn from_raw_preserves_value() {
        let id = MessageId::from_raw("123");
        assert_eq!(id.as_str(), "123");
        assert_eq!(id.to_string(), "123");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = MessageId::from_raw("abcd1234");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abcd1234\"");
        let parsed: MessageId = serde_json::from_str("\"abcd1234\"").unwrap();
        assert_eq!(parsed, id);
    }
}
