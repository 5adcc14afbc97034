//! Inbound notification payloads.
//!
//! A payload is a mapping from string keys to string leaves or nested
//! mappings. Backends deliver richer documents (FCM data messages as JSON, iOS
//! `userInfo` dictionaries as plists); both are folded into this shape:
//! scalars become strings, binary data becomes base64, arrays become mappings
//! keyed by index and nulls are dropped.

use std::collections::BTreeMap;

use base64::Engine as _;

use crate::BridgeError;

/// Keys that carry a message identity, in lookup order.
const MESSAGE_ID_KEYS: &[&str] = &["gcm.message_id", "google.message_id", "message_id"];

/// A payload value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    String(String),
    Map(BTreeMap<String, PayloadValue>),
}

impl PayloadValue {
    /// String leaf, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Map(_) => None,
        }
    }

    /// Nested mapping, if this is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, PayloadValue>> {
        match self {
            Self::Map(m) => Some(m),
            Self::String(_) => None,
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<BTreeMap<String, PayloadValue>> for PayloadValue {
    fn from(value: BTreeMap<String, PayloadValue>) -> Self {
        Self::Map(value)
    }
}

/// Identity of a pushed message, used to acknowledge it at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content and metadata of a single inbound push message.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NotificationPayload {
    entries: BTreeMap<String, PayloadValue>,
}

impl NotificationPayload {
    /// Decode a JSON document. The top level must be an object.
    pub fn from_json(data: &[u8]) -> Result<Self, BridgeError> {
        let value: serde_json::Value = serde_json::from_slice(data).map_err(BridgeError::malformed)?;
        Self::from_json_value(value)
    }

    /// Convert an already-parsed JSON value. The top level must be an object.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, BridgeError> {
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                entries: json_map(map),
            }),
            other => Err(BridgeError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decode a plist document (binary or XML). The top level must be a
    /// dictionary.
    pub fn from_plist(data: &[u8]) -> Result<Self, BridgeError> {
        let value: plist::Value = plist::from_bytes(data).map_err(BridgeError::malformed)?;
        match value {
            plist::Value::Dictionary(dict) => Ok(Self {
                entries: dict
                    .into_iter()
                    .filter_map(|(k, v)| plist_value(v).map(|v| (k, v)))
                    .collect(),
            }),
            _ => Err(BridgeError::malformed("expected a plist dictionary")),
        }
    }

    /// Look up a top-level value.
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    /// Look up a top-level string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PayloadValue::as_str)
    }

    /// Message identity assigned by the backend, if present.
    pub fn message_id(&self) -> Option<MessageId> {
        MESSAGE_ID_KEYS
            .iter()
            .find_map(|key| self.get_str(key))
            .filter(|id| !id.is_empty())
            .map(MessageId::new)
    }

    /// Best-effort notification title.
    ///
    /// Checks a top-level `title`, then `notification.title`, then the APNs
    /// `aps.alert.title`.
    pub fn title(&self) -> Option<&str> {
        if let Some(title) = self.get_str("title") {
            return Some(title);
        }

        let notification = self
            .get("notification")
            .and_then(PayloadValue::as_map)
            .and_then(|n| n.get("title"))
            .and_then(PayloadValue::as_str);

        notification.or_else(|| {
            self.get("aps")
                .and_then(PayloadValue::as_map)
                .and_then(|aps| aps.get("alert"))
                .and_then(PayloadValue::as_map)
                .and_then(|alert| alert.get("title"))
                .and_then(PayloadValue::as_str)
        })
    }

    /// Iterate over top-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for NotificationPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_map(map: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, PayloadValue> {
    map.into_iter()
        .filter_map(|(k, v)| json_value(v).map(|v| (k, v)))
        .collect()
}

fn json_value(value: serde_json::Value) -> Option<PayloadValue> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::Bool(b) => Some(PayloadValue::String(b.to_string())),
        Value::Number(n) => Some(PayloadValue::String(n.to_string())),
        Value::String(s) => Some(PayloadValue::String(s)),
        Value::Array(items) => Some(PayloadValue::Map(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| json_value(v).map(|v| (i.to_string(), v)))
                .collect(),
        )),
        Value::Object(map) => Some(PayloadValue::Map(json_map(map))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn plist_value(value: plist::Value) -> Option<PayloadValue> {
    use plist::Value;

    match value {
        Value::String(s) => Some(PayloadValue::String(s)),
        Value::Boolean(b) => Some(PayloadValue::String(b.to_string())),
        Value::Integer(i) => i
            .as_signed()
            .map(|v| v.to_string())
            .or_else(|| i.as_unsigned().map(|v| v.to_string()))
            .map(PayloadValue::String),
        Value::Real(r) => Some(PayloadValue::String(r.to_string())),
        Value::Data(bytes) => Some(PayloadValue::String(
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )),
        Value::Date(date) => {
            let time = chrono::DateTime::<chrono::Utc>::from(std::time::SystemTime::from(date));
            Some(PayloadValue::String(time.to_rfc3339()))
        }
        Value::Array(items) => Some(PayloadValue::Map(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| plist_value(v).map(|v| (i.to_string(), v)))
                .collect(),
        )),
        Value::Dictionary(dict) => Some(PayloadValue::Map(
            dict.into_iter()
                .filter_map(|(k, v)| plist_value(v).map(|v| (k, v)))
                .collect(),
        )),
        _ => None,
    }
}
