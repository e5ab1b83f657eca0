//! Request configuration and client defaults.
//!
//! # Design
//! A `RequestConfig` is both the caller's request description and the
//! client-level defaults. Every field is optional so that an unset field never
//! overrides anything during a merge: absent fields are skipped on
//! serialization, and the merge works on that JSON shape (see
//! [`crate::merge`]).
//!
//! The JSON shape uses camelCase keys: `baseAddress`, `path`, `verb`,
//! `headers`, `body`, `timeoutMs`. The cancellation handle lives outside the
//! JSON shape because it is a live object, not data.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::Cancellation;
use crate::error::{ClientError, Result};
use crate::http::HttpMethod;

/// Per-request timeout.
///
/// Serialized as a number of milliseconds, or as `""` for `Disabled` so that
/// an override can switch off a timeout inherited from the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeoutRepr", into = "TimeoutRepr")]
pub enum Timeout {
    Disabled,
    Millis(u64),
}

impl Timeout {
    /// The timer to arm, if any. `Millis(0)` arms nothing.
    pub fn duration(&self) -> Option<Duration> {
        match *self {
            Timeout::Millis(ms) if ms > 0 => Some(Duration::from_millis(ms)),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TimeoutRepr {
    Millis(u64),
    Text(String),
}

impl TryFrom<TimeoutRepr> for Timeout {
    type Error = String;

    fn try_from(repr: TimeoutRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TimeoutRepr::Millis(ms) => Ok(Timeout::Millis(ms)),
            TimeoutRepr::Text(text) if text.is_empty() => Ok(Timeout::Disabled),
            TimeoutRepr::Text(text) => Err(format!(
                "timeoutMs must be a number of milliseconds or \"\", got {text:?}"
            )),
        }
    }
}

impl From<Timeout> for TimeoutRepr {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Disabled => TimeoutRepr::Text(String::new()),
            Timeout::Millis(ms) => TimeoutRepr::Millis(ms),
        }
    }
}

/// Description of one request, or of a client's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<HttpMethod>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<Timeout>,

    #[serde(skip)]
    pub cancel: Option<Cancellation>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults every client starts from unless told otherwise: no base
    /// address, no timeout, and JSON content headers.
    pub fn client_defaults() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "*".to_string());
        headers.insert(
            "Content-Type".to_string(),
            "application/json;charset=utf-8".to_string(),
        );
        Self {
            base_address: Some(String::new()),
            headers,
            timeout_ms: Some(Timeout::Disabled),
            ..Self::default()
        }
    }

    /// Interpret an arbitrary JSON value as a config.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ClientError::invalid_config(format!(
                "config must be a JSON object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| ClientError::invalid_config(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ClientError::invalid_config(e.to_string()))?;
        Self::from_value(value)
    }

    /// The JSON shape of this config, without the cancellation handle.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ClientError::invalid_config(e.to_string()))
    }

    /// `baseAddress` followed by `path`, concatenated as-is.
    pub fn url(&self) -> String {
        format!(
            "{}{}",
            self.base_address.as_deref().unwrap_or(""),
            self.path.as_deref().unwrap_or("")
        )
    }

    pub fn with_base_address(mut self, base_address: impl Into<String>) -> Self {
        self.base_address = Some(base_address.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_verb(mut self, verb: HttpMethod) -> Self {
        self.verb = Some(verb);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(Timeout::Millis(ms));
        self
    }

    pub fn with_cancel(mut self, cancel: impl Into<Cancellation>) -> Self {
        self.cancel = Some(cancel.into());
        self
    }

    /// Drop the per-request fields (verb, path, body) so the remainder can
    /// serve as client defaults.
    pub fn into_defaults(mut self) -> Self {
        self.verb = None;
        self.path = None;
        self.body = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cancel::CancelToken;

    #[test]
    fn client_defaults_match_construction_surface() {
        let value = RequestConfig::client_defaults().to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "baseAddress": "",
                "timeoutMs": "",
                "headers": {
                    "Accept": "*",
                    "Content-Type": "application/json;charset=utf-8"
                }
            })
        );
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let value = RequestConfig::new().with_path("/a").to_value().unwrap();
        assert_eq!(value, json!({ "path": "/a" }));
    }

    #[test]
    fn from_value_reads_camel_case() {
        let config = RequestConfig::from_value(json!({
            "baseAddress": "http://h",
            "path": "/getHi",
            "verb": "POST",
            "body": { "pageNum": 1 },
            "timeoutMs": 250
        }))
        .unwrap();
        assert_eq!(config.url(), "http://h/getHi");
        assert_eq!(config.verb, Some(HttpMethod::Post));
        assert_eq!(config.body, Some(json!({ "pageNum": 1 })));
        assert_eq!(config.timeout_ms, Some(Timeout::Millis(250)));
    }

    #[test]
    fn empty_timeout_string_means_disabled() {
        let config = RequestConfig::from_json_str(r#"{"timeoutMs":""}"#).unwrap();
        assert_eq!(config.timeout_ms, Some(Timeout::Disabled));
        assert_eq!(Timeout::Disabled.duration(), None);
        assert_eq!(Timeout::Millis(0).duration(), None);
        assert_eq!(
            Timeout::Millis(5).duration(),
            Some(Duration::from_millis(5))
        );
    }

    #[test]
    fn non_empty_timeout_string_is_invalid() {
        let err = RequestConfig::from_json_str(r#"{"timeoutMs":"soon"}"#).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn unsupported_verb_is_invalid() {
        let err = RequestConfig::from_value(json!({ "verb": "PATCH" })).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn non_object_is_invalid() {
        let err = RequestConfig::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn url_concatenates_without_normalizing() {
        let config = RequestConfig::new()
            .with_base_address("http://h/")
            .with_path("/x");
        assert_eq!(config.url(), "http://h//x");
        assert_eq!(RequestConfig::new().with_path("/only").url(), "/only");
    }

    #[test]
    fn cancel_handle_is_skipped_in_json() {
        let (token, _cancel) = CancelToken::source();
        let config = RequestConfig::new().with_cancel(token);
        assert_eq!(config.to_value().unwrap(), json!({}));
        assert!(config.cancel.is_some());
    }
}
