//! Common types used across sitelens

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Placeholder reported when the page has no title or meta description
pub const NOT_AVAILABLE: &str = "N/A";

/// Body of an audit request: `{"url": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl AuditRequest {
    /// The requested URL, or `None` when it is missing or empty
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Severity of an audit issue
///
/// Purely informational; deductions are fixed per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
}

/// A single problem found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Warning,
            message: message.into(),
        }
    }
}

/// Raw element counts, reported regardless of pass/fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub h1: usize,
    pub images: usize,
    pub links: usize,
}

/// Scored result of auditing one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// The normalized target that was fetched
    pub url: String,
    /// 0-100, starting at 100 minus each check's deduction
    pub score: u8,
    pub title: String,
    pub meta_description: String,
    /// In check order, never reordered or deduplicated
    pub issues: Vec<Issue>,
    pub stats: PageStats,
}

impl AuditReport {
    pub fn error_count(&self) -> usize {
        self.count_kind(IssueKind::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_kind(IssueKind::Warning)
    }

    fn count_kind(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }
}

/// Error payload returned to HTTP callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&AuditError> for ErrorBody {
    fn from(error: &AuditError) -> Self {
        Self::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_camel_case_and_type_tag() {
        let report = AuditReport {
            url: "https://example.com".to_string(),
            score: 80,
            title: "Example Domain Title".to_string(),
            meta_description: NOT_AVAILABLE.to_string(),
            issues: vec![Issue::error("Missing Meta Description")],
            stats: PageStats {
                h1: 1,
                images: 0,
                links: 2,
            },
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metaDescription"], "N/A");
        assert_eq!(value["issues"][0]["type"], "error");
        assert_eq!(value["issues"][0]["message"], "Missing Meta Description");
        assert_eq!(value["stats"]["links"], 2);
        assert!(value.get("meta_description").is_none());
    }

    #[test]
    fn request_treats_empty_url_as_missing() {
        let empty: AuditRequest = serde_json::from_str(r#"{"url": ""}"#).unwrap();
        let missing: AuditRequest = serde_json::from_str("{}").unwrap();
        let present: AuditRequest = serde_json::from_str(r#"{"url": "example.com"}"#).unwrap();

        assert_eq!(empty.url(), None);
        assert_eq!(missing.url(), None);
        assert_eq!(present.url(), Some("example.com"));
    }

    #[test]
    fn counts_issues_by_kind() {
        let report = AuditReport {
            url: String::new(),
            score: 55,
            title: NOT_AVAILABLE.to_string(),
            meta_description: NOT_AVAILABLE.to_string(),
            issues: vec![
                Issue::error("Missing Title Tag"),
                Issue::error("Missing Meta Description"),
                Issue::warning("1 images missing Alt text"),
            ],
            stats: PageStats::default(),
        };

        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 1);
    }
}
