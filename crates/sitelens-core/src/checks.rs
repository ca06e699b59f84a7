//! On-page SEO checks
//!
//! Each check is a pure function from a document to a [`Finding`]. The
//! auditor runs every entry of [`CHECKS`] in order and folds the findings
//! with [`score_findings`]; no check can stop the others from running.

use crate::document::{PageDocument, Query};
use crate::types::Issue;

/// Score of a page with no findings
pub const MAX_SCORE: u32 = 100;

pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 70;

const MISSING_TITLE_DEDUCTION: u32 = 20;
const TITLE_LENGTH_DEDUCTION: u32 = 5;
const MISSING_META_DESCRIPTION_DEDUCTION: u32 = 20;
const MISSING_H1_DEDUCTION: u32 = 15;
const MULTIPLE_H1_DEDUCTION: u32 = 5;
// Flat, however many images are affected
const MISSING_ALT_DEDUCTION: u32 = 10;

/// Outcome of a single check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finding {
    pub issue: Option<Issue>,
    pub deduction: u32,
}

impl Finding {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn fail(issue: Issue, deduction: u32) -> Self {
        Self {
            issue: Some(issue),
            deduction,
        }
    }
}

pub type Check = fn(&dyn PageDocument) -> Finding;

/// A check with a stable name for logging
pub struct NamedCheck {
    pub name: &'static str,
    pub run: Check,
}

/// Every check, in report order
pub const CHECKS: &[NamedCheck] = &[
    NamedCheck {
        name: "title",
        run: check_title,
    },
    NamedCheck {
        name: "meta_description",
        run: check_meta_description,
    },
    NamedCheck {
        name: "h1",
        run: check_h1,
    },
    NamedCheck {
        name: "image_alt",
        run: check_image_alt,
    },
];

/// Title must exist and be 10-70 characters long.
///
/// Length is measured in UTF-16 code units, as browsers report it, so an
/// astral-plane character such as an emoji counts twice.
pub fn check_title(doc: &dyn PageDocument) -> Finding {
    let title = doc.first_element_text(Query::Title).unwrap_or_default();
    if title.is_empty() {
        return Finding::fail(Issue::error("Missing Title Tag"), MISSING_TITLE_DEDUCTION);
    }

    let len = title.encode_utf16().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        return Finding::fail(
            Issue::warning(format!(
                "Title length is {len} (rec: {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS} chars)"
            )),
            TITLE_LENGTH_DEDUCTION,
        );
    }

    Finding::pass()
}

/// `<meta name="description">` must carry non-empty content.
pub fn check_meta_description(doc: &dyn PageDocument) -> Finding {
    if is_missing(doc.attribute(Query::MetaDescription, "content").as_deref()) {
        return Finding::fail(
            Issue::error("Missing Meta Description"),
            MISSING_META_DESCRIPTION_DEDUCTION,
        );
    }
    Finding::pass()
}

/// Exactly one `<h1>` is expected.
pub fn check_h1(doc: &dyn PageDocument) -> Finding {
    match doc.count(Query::H1) {
        0 => Finding::fail(Issue::error("Missing H1 Tag"), MISSING_H1_DEDUCTION),
        1 => Finding::pass(),
        n => Finding::fail(
            Issue::warning(format!("Found {n} H1 tags (rec: 1)")),
            MULTIPLE_H1_DEDUCTION,
        ),
    }
}

/// Every `<img>` should have non-empty alt text.
pub fn check_image_alt(doc: &dyn PageDocument) -> Finding {
    match doc.count_matching(Query::Image, "alt", is_missing) {
        0 => Finding::pass(),
        missing => Finding::fail(
            Issue::warning(format!("{missing} images missing Alt text")),
            MISSING_ALT_DEDUCTION,
        ),
    }
}

/// Absent and empty attribute values both count as missing.
pub fn is_missing(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Fold findings into the final score and the ordered issue list.
///
/// The score is `100 - Σdeductions`, floored at zero.
pub fn score_findings(findings: impl IntoIterator<Item = Finding>) -> (u8, Vec<Issue>) {
    let mut issues = Vec::new();
    let mut total = 0u32;

    for finding in findings {
        total = total.saturating_add(finding.deduction);
        issues.extend(finding.issue);
    }

    // MAX_SCORE fits in u8, so the floored value does too
    let score = MAX_SCORE.saturating_sub(total) as u8;
    (score, issues)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::IssueKind;

    /// Hand-built document for exercising checks without HTML.
    #[derive(Default)]
    pub(crate) struct FakeDocument {
        pub title: Option<String>,
        pub meta_description: Option<String>,
        pub h1: usize,
        /// One entry per image: its alt attribute
        pub image_alts: Vec<Option<String>>,
        pub anchors: usize,
    }

    impl FakeDocument {
        /// A page that passes every check
        pub(crate) fn compliant() -> Self {
            Self {
                title: Some("A perfectly sized title".to_string()),
                meta_description: Some("Describes the page".to_string()),
                h1: 1,
                image_alts: vec![Some("logo".to_string())],
                anchors: 4,
            }
        }
    }

    impl PageDocument for FakeDocument {
        fn first_element_text(&self, query: Query) -> Option<String> {
            match query {
                Query::Title => self.title.clone(),
                _ => None,
            }
        }

        fn attribute(&self, query: Query, name: &str) -> Option<String> {
            match (query, name) {
                (Query::MetaDescription, "content") => self.meta_description.clone(),
                _ => None,
            }
        }

        fn count(&self, query: Query) -> usize {
            match query {
                Query::Title => usize::from(self.title.is_some()),
                Query::MetaDescription => usize::from(self.meta_description.is_some()),
                Query::H1 => self.h1,
                Query::Image => self.image_alts.len(),
                Query::Anchor => self.anchors,
            }
        }

        fn count_matching(
            &self,
            query: Query,
            name: &str,
            predicate: fn(Option<&str>) -> bool,
        ) -> usize {
            match (query, name) {
                (Query::Image, "alt") => self
                    .image_alts
                    .iter()
                    .filter(|alt| predicate(alt.as_deref()))
                    .count(),
                _ => 0,
            }
        }
    }

    fn run_all(doc: &dyn PageDocument) -> Vec<Finding> {
        CHECKS.iter().map(|check| (check.run)(doc)).collect()
    }

    #[test]
    fn compliant_page_has_no_findings() {
        let doc = FakeDocument::compliant();
        let (score, issues) = score_findings(run_all(&doc));
        assert_eq!(score, 100);
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_title_is_an_error_worth_twenty() {
        let doc = FakeDocument {
            title: None,
            ..FakeDocument::compliant()
        };
        let finding = check_title(&doc);
        assert_eq!(finding.deduction, 20);
        assert_eq!(finding.issue, Some(Issue::error("Missing Title Tag")));
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let doc = FakeDocument {
            title: Some(String::new()),
            ..FakeDocument::compliant()
        };
        assert_eq!(check_title(&doc).deduction, 20);
    }

    #[test]
    fn short_title_is_a_warning() {
        let doc = FakeDocument {
            title: Some("Hello".to_string()),
            ..FakeDocument::compliant()
        };
        let finding = check_title(&doc);
        assert_eq!(finding.deduction, 5);
        assert_eq!(
            finding.issue,
            Some(Issue::warning("Title length is 5 (rec: 10-70 chars)"))
        );
    }

    #[test]
    fn title_length_bounds_are_inclusive() {
        for len in [10, 70] {
            let doc = FakeDocument {
                title: Some("x".repeat(len)),
                ..FakeDocument::compliant()
            };
            assert_eq!(check_title(&doc), Finding::pass(), "length {len}");
        }

        let doc = FakeDocument {
            title: Some("x".repeat(71)),
            ..FakeDocument::compliant()
        };
        let finding = check_title(&doc);
        assert_eq!(finding.deduction, 5);
        assert_eq!(
            finding.issue.unwrap().message,
            "Title length is 71 (rec: 10-70 chars)"
        );
    }

    #[test]
    fn title_length_counts_utf16_units() {
        // 10 BMP characters, 20 bytes
        let doc = FakeDocument {
            title: Some("éééééééééé".to_string()),
            ..FakeDocument::compliant()
        };
        assert_eq!(check_title(&doc), Finding::pass());

        // 5 emoji, each a surrogate pair
        let doc = FakeDocument {
            title: Some("🚀🚀🚀🚀🚀".to_string()),
            ..FakeDocument::compliant()
        };
        assert_eq!(check_title(&doc), Finding::pass());

        let doc = FakeDocument {
            title: Some("🚀🚀🚀🚀".to_string()),
            ..FakeDocument::compliant()
        };
        assert_eq!(
            check_title(&doc).issue.map(|issue| issue.message).as_deref(),
            Some("Title length is 8 (rec: 10-70 chars)")
        );
    }

    #[test]
    fn missing_or_empty_meta_description_is_an_error() {
        for meta_description in [None, Some(String::new())] {
            let doc = FakeDocument {
                meta_description,
                ..FakeDocument::compliant()
            };
            let finding = check_meta_description(&doc);
            assert_eq!(finding.deduction, 20);
            assert_eq!(finding.issue, Some(Issue::error("Missing Meta Description")));
        }
    }

    #[test]
    fn h1_count_drives_severity() {
        let none = FakeDocument {
            h1: 0,
            ..FakeDocument::compliant()
        };
        let finding = check_h1(&none);
        assert_eq!(finding.deduction, 15);
        assert_eq!(finding.issue, Some(Issue::error("Missing H1 Tag")));

        let two = FakeDocument {
            h1: 2,
            ..FakeDocument::compliant()
        };
        let finding = check_h1(&two);
        assert_eq!(finding.deduction, 5);
        assert_eq!(
            finding.issue,
            Some(Issue::warning("Found 2 H1 tags (rec: 1)"))
        );
    }

    #[test]
    fn missing_alt_deduction_is_flat() {
        let doc = FakeDocument {
            image_alts: vec![None, Some(String::new()), None, Some("ok".to_string())],
            ..FakeDocument::compliant()
        };
        let finding = check_image_alt(&doc);
        assert_eq!(finding.deduction, 10);
        let issue = finding.issue.unwrap();
        assert_eq!(issue.kind, IssueKind::Warning);
        assert_eq!(issue.message, "3 images missing Alt text");
    }

    #[test]
    fn images_with_alt_pass() {
        let doc = FakeDocument {
            image_alts: vec![Some("a".to_string()), Some("b".to_string())],
            ..FakeDocument::compliant()
        };
        assert_eq!(check_image_alt(&doc), Finding::pass());
    }

    #[test]
    fn issues_keep_check_order() {
        let doc = FakeDocument::default();
        let (score, issues) = score_findings(run_all(&doc));
        let messages: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            ["Missing Title Tag", "Missing Meta Description", "Missing H1 Tag"]
        );
        assert_eq!(score, 45);
    }

    #[test]
    fn score_is_floored_at_zero() {
        let findings = (0..8).map(|_| Finding::fail(Issue::error("x"), 20));
        let (score, issues) = score_findings(findings);
        assert_eq!(score, 0);
        assert_eq!(issues.len(), 8);
    }

    #[test]
    fn score_stays_in_range_for_every_check_combination() {
        let titles = [None, Some("short".to_string()), Some("a fine length title".to_string())];
        let metas = [None, Some("desc".to_string())];
        let alts = [vec![], vec![None]];

        for title in &titles {
            for meta in &metas {
                for h1 in 0..3 {
                    for image_alts in &alts {
                        let doc = FakeDocument {
                            title: title.clone(),
                            meta_description: meta.clone(),
                            h1,
                            image_alts: image_alts.clone(),
                            anchors: 0,
                        };
                        let findings = run_all(&doc);
                        let total: u32 = findings.iter().map(|f| f.deduction).sum();
                        let (score, _) = score_findings(findings);
                        assert!(score <= 100);
                        assert_eq!(u32::from(score), 100u32.saturating_sub(total));
                    }
                }
            }
        }
    }
}
