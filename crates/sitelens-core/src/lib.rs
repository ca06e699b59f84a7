//! # sitelens-core
//!
//! Core library for single-page SEO audits.
//!
//! This library provides:
//! - A typed, read-only view over parsed HTML ([`document`])
//! - The fixed battery of on-page checks and their scoring ([`checks`])
//! - The Page Auditor that ties fetching, parsing and scoring together ([`auditor`])
//!
//! ## Features
//!
//! - `default`: checks, scoring and the [`PageFetcher`] trait (no HTTP client)
//! - `http`: [`ReqwestFetcher`] and [`PageAuditor::with_config`]
//!
//! ## Example
//!
//! ```
//! use sitelens_core::audit_html;
//!
//! let html = r#"
//!     <title>Example Domain Homepage</title>
//!     <meta name="description" content="An example">
//!     <h1>Example</h1>
//! "#;
//!
//! let report = audit_html("https://example.com", html);
//! assert_eq!(report.score, 100);
//! ```

pub mod auditor;
pub mod checks;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod types;

// Re-export commonly used types
pub use auditor::{PageAuditor, audit_document, audit_html, normalize_target};
pub use config::AuditConfig;
pub use document::{HtmlDocument, PageDocument, Query};
pub use error::{AuditError, FetchError};
pub use fetch::{FetchRequest, PageFetcher};
pub use types::{AuditReport, AuditRequest, ErrorBody, Issue, IssueKind, PageStats};

#[cfg(feature = "http")]
pub use fetch::ReqwestFetcher;
