//! HTML document access for audit checks
//!
//! Checks never see selector strings. They ask a [`PageDocument`] about one of
//! the fixed [`Query`] element sets, which keeps each check testable against
//! a hand-written fake and keeps `scraper` out of the check logic.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// The element sets the audit inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Title,
    MetaDescription,
    H1,
    Image,
    Anchor,
}

impl Query {
    /// CSS selector for this element set
    pub fn css(self) -> &'static str {
        match self {
            Query::Title => "title",
            Query::MetaDescription => r#"meta[name="description"]"#,
            Query::H1 => "h1",
            Query::Image => "img",
            Query::Anchor => "a",
        }
    }

    fn selector(self) -> &'static Selector {
        static TITLE: Lazy<Selector> = Lazy::new(|| compile(Query::Title));
        static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| compile(Query::MetaDescription));
        static H1: Lazy<Selector> = Lazy::new(|| compile(Query::H1));
        static IMAGE: Lazy<Selector> = Lazy::new(|| compile(Query::Image));
        static ANCHOR: Lazy<Selector> = Lazy::new(|| compile(Query::Anchor));

        match self {
            Query::Title => &*TITLE,
            Query::MetaDescription => &*META_DESCRIPTION,
            Query::H1 => &*H1,
            Query::Image => &*IMAGE,
            Query::Anchor => &*ANCHOR,
        }
    }
}

fn compile(query: Query) -> Selector {
    Selector::parse(query.css()).expect("invalid built-in selector")
}

/// Read-only view of a parsed page, limited to what the checks need
pub trait PageDocument {
    /// Text content of the first matching element
    fn first_element_text(&self, query: Query) -> Option<String>;

    /// Attribute value on the first matching element
    fn attribute(&self, query: Query, name: &str) -> Option<String>;

    /// Number of matching elements
    fn count(&self, query: Query) -> usize;

    /// Number of matching elements whose attribute `name` satisfies `predicate`.
    /// The predicate receives `None` when the attribute is absent.
    fn count_matching(
        &self,
        query: Query,
        name: &str,
        predicate: fn(Option<&str>) -> bool,
    ) -> usize;
}

/// `scraper`-backed document
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a full HTML document. html5ever recovers from malformed markup,
    /// so parsing itself never fails.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    fn select(&self, query: Query) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.html.select(query.selector())
    }
}

impl PageDocument for HtmlDocument {
    fn first_element_text(&self, query: Query) -> Option<String> {
        self.select(query)
            .next()
            .map(|element| element.text().collect::<String>())
    }

    fn attribute(&self, query: Query, name: &str) -> Option<String> {
        self.select(query)
            .next()
            .and_then(|element| element.value().attr(name))
            .map(str::to_string)
    }

    fn count(&self, query: Query) -> usize {
        self.select(query).count()
    }

    fn count_matching(
        &self,
        query: Query,
        name: &str,
        predicate: fn(Option<&str>) -> bool,
    ) -> usize {
        self.select(query)
            .filter(|element| predicate(element.value().attr(name)))
            .count()
    }
}
