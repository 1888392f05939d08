//! Markup tree.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::RenderError;

/// Future producing the content of a deferred boundary.
pub(crate) type ContentFuture = Pin<Box<dyn Future<Output = Result<Node, RenderError>> + Send>>;

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node in the markup tree.
#[derive(Debug)]
pub enum Node {
    /// An HTML element.
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Trusted markup written verbatim (doctype, inline script bodies).
    Raw(String),
    /// Sibling nodes without a wrapping element.
    Fragment(Vec<Node>),
    /// Content that is produced later while the response streams.
    Deferred(Deferred),
}

impl Node {
    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a raw markup node.
    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(markup.into())
    }

    /// Create a deferred boundary.
    ///
    /// `content` is awaited when the stream reaches the boundary. If it fails,
    /// `fallback` is rendered in its place.
    pub fn deferred<F>(content: F, fallback: Node) -> Self
    where
        F: Future<Output = Result<Node, RenderError>> + Send + 'static,
    {
        Self::Deferred(Deferred {
            content: Box::pin(content),
            fallback: Box::new(fallback),
        })
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An HTML element with attributes and children.
#[derive(Debug)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<Node>,
}

impl Element {
    /// Create an element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. An empty value renders as a boolean attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub(crate) fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

/// Deferred boundary content and its fallback.
pub struct Deferred {
    pub(crate) content: ContentFuture,
    pub(crate) fallback: Box<Node>,
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Check a tag name: ASCII letter followed by letters, digits or hyphens.
pub(crate) fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Check an attribute name against the characters HTML forbids in one.
pub(crate) fn is_valid_attr(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace() && !c.is_control() && !matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
        })
}
