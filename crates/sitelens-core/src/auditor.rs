//! The Page Auditor: fetch one page, run the checks, score it.

use tracing::{debug, info, warn};

use crate::checks::{CHECKS, score_findings};
use crate::config::AuditConfig;
use crate::document::{HtmlDocument, PageDocument, Query};
use crate::error::{AuditError, Result};
use crate::fetch::{FetchRequest, PageFetcher};
use crate::types::{AuditReport, AuditRequest, NOT_AVAILABLE, PageStats};

pub const MISSING_URL_MESSAGE: &str = "Please provide a URL";

/// Prepend `https://` unless the input already starts with `http`.
///
/// The check is a plain, case-sensitive prefix test: `httpfoo.com` is left
/// untouched and will fail at fetch time.
pub fn normalize_target(raw_url: &str) -> String {
    if raw_url.starts_with("http") {
        raw_url.to_string()
    } else {
        format!("https://{raw_url}")
    }
}

/// Runs single-page audits with a fixed transport and configuration.
///
/// Holds no per-request state, so one auditor can serve concurrent audits.
pub struct PageAuditor<F> {
    config: AuditConfig,
    fetcher: F,
}

impl<F: PageFetcher> PageAuditor<F> {
    pub fn new(config: AuditConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit `raw_url`.
    ///
    /// Empty input fails with [`AuditError::Validation`] before any request is
    /// made. Any fetch failure aborts the audit with [`AuditError::Fetch`].
    pub async fn audit(&self, raw_url: &str) -> Result<AuditReport> {
        if raw_url.is_empty() {
            return Err(AuditError::validation(MISSING_URL_MESSAGE));
        }

        let target = normalize_target(raw_url);
        debug!(url = %target, timeout_ms = self.config.timeout.as_millis() as u64, "fetching page");

        let request = FetchRequest {
            url: &target,
            user_agent: &self.config.user_agent,
            timeout: self.config.timeout,
        };
        let html = self
            .fetcher
            .fetch(&request)
            .await
            .inspect_err(|err| warn!(url = %target, error = %err, "fetch failed"))?;

        let document = HtmlDocument::parse(&html);
        let report = audit_document(target, &document);

        info!(
            url = %report.url,
            score = report.score,
            issues = report.issues.len(),
            "audit complete"
        );
        Ok(report)
    }

    /// Audit the URL carried by a request body.
    pub async fn audit_request(&self, request: &AuditRequest) -> Result<AuditReport> {
        let url = request
            .url()
            .ok_or_else(|| AuditError::validation(MISSING_URL_MESSAGE))?;
        self.audit(url).await
    }
}

#[cfg(feature = "http")]
impl PageAuditor<crate::fetch::ReqwestFetcher> {
    /// Auditor backed by reqwest
    pub fn with_config(config: AuditConfig) -> Result<Self> {
        let fetcher = crate::fetch::ReqwestFetcher::new()?;
        Ok(Self::new(config, fetcher))
    }
}

/// Score an already-parsed page. `url` is reported verbatim.
pub fn audit_document(url: String, doc: &dyn PageDocument) -> AuditReport {
    let findings = CHECKS.iter().map(|check| {
        let finding = (check.run)(doc);
        if let Some(issue) = &finding.issue {
            debug!(
                check = check.name,
                deduction = finding.deduction,
                message = %issue.message,
                "check flagged"
            );
        }
        finding
    });
    let (score, issues) = score_findings(findings);

    AuditReport {
        url,
        score,
        title: present_or_placeholder(doc.first_element_text(Query::Title)),
        meta_description: present_or_placeholder(doc.attribute(Query::MetaDescription, "content")),
        issues,
        stats: PageStats {
            h1: doc.count(Query::H1),
            images: doc.count(Query::Image),
            links: doc.count(Query::Anchor),
        },
    }
}

/// Score raw HTML without fetching anything.
pub fn audit_html(url: impl Into<String>, html: &str) -> AuditReport {
    audit_document(url.into(), &HtmlDocument::parse(html))
}

fn present_or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
