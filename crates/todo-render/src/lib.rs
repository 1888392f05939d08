//! Streaming HTML renderer.
//!
//! This crate turns a [`Node`] tree into a stream of HTML chunks so a response
//! can start flowing before the whole document is known.
//!
//! # Architecture
//!
//! - [`Node`] / [`Element`]: a small markup tree. Names are validated when the
//!   tree is serialized, not when it is built.
//! - [`Node::deferred`]: a boundary whose content is produced by a future.
//!   Everything before the first boundary forms the *shell*.
//! - [`render_to_stream`]: serializes the shell up front and returns a
//!   [`RenderStream`] whose first chunk is the shell. Boundaries are awaited in
//!   document order while the stream is polled.
//!
//! Errors in the shell reject the call. Errors inside a boundary are reported
//! through [`RenderOptions::on_error`] and the boundary's fallback markup is
//! emitted instead, so an in-flight stream is never aborted by a failing
//! boundary.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use todo_render::{Element, Node, RenderOptions, render_to_stream};
//!
//! let page = Element::new("p").child(Node::text("Hello"));
//! let mut stream = render_to_stream(page.into(), RenderOptions::default())?;
//! let shell = stream.next().await.unwrap();
//! assert_eq!(&shell[..], b"<p>Hello</p>");
//! ```

mod escape;
mod node;
mod stream;

pub use escape::{escape_html, escape_script};
pub use node::{Deferred, Element, Node};
pub use stream::{ErrorCallback, RenderOptions, RenderStream, render_to_stream};

/// Render error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Element name is empty or contains characters not allowed in a tag.
    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    /// Attribute name contains characters not allowed in an attribute.
    #[error("Invalid attribute name {name:?} on <{tag}>")]
    InvalidAttributeName {
        /// Element the attribute was set on.
        tag: String,
        /// Rejected attribute name.
        name: String,
    },

    /// Void element (e.g. `<meta>`) was given children.
    #[error("Void element <{0}> cannot have children")]
    VoidChildren(String),

    /// Content for a deferred boundary could not be produced.
    #[error("{0}")]
    Content(String),
}

impl RenderError {
    /// Wrap a data-source failure as a content error.
    pub fn content(err: impl std::fmt::Display) -> Self {
        Self::Content(err.to_string())
    }
}
