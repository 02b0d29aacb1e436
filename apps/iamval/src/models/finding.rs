//! Findings returned by the remote analyzer.
//!
//! Every field is optional: a finding is a pass-through copy of whatever the
//! service sent, and printers substitute placeholders for absent fields.

use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "UNKNOWN";
pub const NO_DETAILS: &str = "No details available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Finding category as reported by the service.
pub enum FindingKind {
    Error,
    SecurityWarning,
    Suggestion,
    Warning,
    Other(String),
}

impl FindingKind {
    pub fn as_str(&self) -> &str {
        match self {
            FindingKind::Error => "ERROR",
            FindingKind::SecurityWarning => "SECURITY_WARNING",
            FindingKind::Suggestion => "SUGGESTION",
            FindingKind::Warning => "WARNING",
            FindingKind::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for FindingKind {
    fn from(s: &str) -> Self {
        match s {
            "ERROR" => FindingKind::Error,
            "SECURITY_WARNING" => FindingKind::SecurityWarning,
            "SUGGESTION" => FindingKind::Suggestion,
            "WARNING" => FindingKind::Warning,
            other => FindingKind::Other(other.to_string()),
        }
    }
}

impl From<String> for FindingKind {
    fn from(s: String) -> Self {
        FindingKind::from(s.as_str())
    }
}

impl From<FindingKind> for String {
    fn from(k: FindingKind) -> Self {
        k.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Display severity derived from the finding kind.
pub enum Severity {
    Critical,
    Caution,
    Info,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// One advisory issue. Field names on the wire match the service response.
pub struct Finding {
    #[serde(rename = "findingType", default)]
    pub kind: Option<FindingKind>,
    #[serde(rename = "issueCode", default)]
    pub code: Option<String>,
    #[serde(rename = "findingDetails", default)]
    pub detail: Option<String>,
    #[serde(rename = "learnMoreLink", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self.kind {
            Some(FindingKind::Error) => Severity::Critical,
            Some(FindingKind::SecurityWarning) => Severity::Caution,
            _ => Severity::Info,
        }
    }

    pub fn kind_label(&self) -> &str {
        self.kind.as_ref().map(FindingKind::as_str).unwrap_or(UNKNOWN)
    }

    pub fn code_label(&self) -> &str {
        self.code.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn detail_label(&self) -> &str {
        self.detail.as_deref().unwrap_or(NO_DETAILS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_lookup() {
        let mut f = Finding::default();
        assert_eq!(f.severity(), Severity::Info);
        f.kind = Some(FindingKind::Error);
        assert_eq!(f.severity(), Severity::Critical);
        f.kind = Some(FindingKind::SecurityWarning);
        assert_eq!(f.severity(), Severity::Caution);
        f.kind = Some(FindingKind::Suggestion);
        assert_eq!(f.severity(), Severity::Info);
    }

    #[test]
    fn test_placeholders_for_absent_fields() {
        let f = Finding::default();
        assert_eq!(f.kind_label(), "UNKNOWN");
        assert_eq!(f.code_label(), "UNKNOWN");
        assert_eq!(f.detail_label(), "No details available");
    }

    #[test]
    fn test_wire_names_and_unknown_kind() {
        let f: Finding = serde_json::from_value(json!({
            "findingType": "NEW_KIND",
            "issueCode": "PASS_ROLE_WITH_STAR_IN_RESOURCE",
        }))
        .unwrap();
        assert_eq!(f.kind, Some(FindingKind::Other("NEW_KIND".into())));
        assert!(f.detail.is_none());
        let back = serde_json::to_value(&f).unwrap();
        assert_eq!(back["findingType"], "NEW_KIND");
        assert!(back.get("learnMoreLink").is_none());
    }
}
