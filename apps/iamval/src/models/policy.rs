//! Policy documents, policy types, and policies pulled out of templates.
//!
//! A `PolicyDocument` is opaque JSON text: the only local requirement is that
//! it parses to a JSON object. Grammar checks belong to the remote analyzer.

use crate::source::InputError;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Selects which remote validation ruleset applies.
pub enum PolicyType {
    #[default]
    IdentityPolicy,
    ResourcePolicy,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::IdentityPolicy => "IDENTITY_POLICY",
            PolicyType::ResourcePolicy => "RESOURCE_POLICY",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = String;

    /// Accepts the wire names plus the short forms `identity` / `resource`,
    /// case-insensitively, with `-` and `_` treated alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        match norm.as_str() {
            "IDENTITY_POLICY" | "IDENTITY" => Ok(PolicyType::IdentityPolicy),
            "RESOURCE_POLICY" | "RESOURCE" => Ok(PolicyType::ResourcePolicy),
            _ => Err(format!(
                "unknown policy type '{}' (expected IDENTITY_POLICY or RESOURCE_POLICY)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// JSON text known to parse to an object. Forwarded to the analyzer verbatim.
pub struct PolicyDocument {
    text: String,
}

impl PolicyDocument {
    /// Check well-formedness and keep the original text untouched.
    pub fn parse(text: impl Into<String>) -> Result<Self, InputError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InputError::Empty);
        }
        let value: Json = serde_json::from_str(&text)?;
        if !value.is_object() {
            return Err(InputError::NotAnObject(json_kind(&value)));
        }
        Ok(Self { text })
    }

    /// Build a document from an already-parsed value (template mode).
    ///
    /// Returns `None` for anything but a non-empty object.
    pub fn from_value(value: &Json) -> Option<Self> {
        match value {
            Json::Object(map) if !map.is_empty() => serde_json::to_string(value)
                .ok()
                .map(|text| Self { text }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Two-space indented rendering; falls back to the raw text.
    pub fn to_pretty(&self) -> String {
        serde_json::from_str::<Json>(&self.text)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| self.text.clone())
    }
}

pub(crate) fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named policy ready for one validation call.
pub struct ExtractedPolicy {
    pub name: String,
    pub document: PolicyDocument,
    pub policy_type: PolicyType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_type_parses_wire_and_short_names() {
        assert_eq!("IDENTITY_POLICY".parse(), Ok(PolicyType::IdentityPolicy));
        assert_eq!("resource".parse(), Ok(PolicyType::ResourcePolicy));
        assert_eq!("resource-policy".parse(), Ok(PolicyType::ResourcePolicy));
        assert!("SERVICE_CONTROL".parse::<PolicyType>().is_err());
        assert_eq!(PolicyType::default(), PolicyType::IdentityPolicy);
    }

    #[test]
    fn test_parse_keeps_text_verbatim() {
        let raw = r#"{ "Version":"2012-10-17",  "Statement": [] }"#;
        let doc = PolicyDocument::parse(raw).unwrap();
        assert_eq!(doc.as_str(), raw);
        assert!(doc.to_pretty().contains("\n  \"Version\": \"2012-10-17\""));
    }

    #[test]
    fn test_parse_rejects_malformed_and_non_objects() {
        assert!(matches!(
            PolicyDocument::parse("{ invalid"),
            Err(InputError::InvalidJson(_))
        ));
        assert!(matches!(
            PolicyDocument::parse("[1, 2]"),
            Err(InputError::NotAnObject("array"))
        ));
        assert!(matches!(PolicyDocument::parse("   "), Err(InputError::Empty)));
    }

    #[test]
    fn test_from_value_skips_empty_and_scalars() {
        assert!(PolicyDocument::from_value(&json!({})).is_none());
        assert!(PolicyDocument::from_value(&json!("arn")).is_none());
        let doc = PolicyDocument::from_value(&json!({"Version": "2012-10-17"})).unwrap();
        assert_eq!(doc.as_str(), r#"{"Version":"2012-10-17"}"#);
    }
}
