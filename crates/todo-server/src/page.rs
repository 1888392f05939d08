//! Page markup for `GET /`.

use std::sync::Arc;

use todo_render::{Element, Node, RenderError, escape_script};
use todo_store::Database;

use crate::live_reload::BuildId;

/// Data available when building the page.
pub struct PageContext {
    /// Todo store, read by deferred content.
    pub db: Arc<dyn Database>,
    /// Build identity, present when live reload is enabled.
    pub build_id: Option<BuildId>,
}

/// Builds the document rendered at `GET /`.
pub trait PageTemplate: Send + Sync {
    /// Construct the markup tree.
    ///
    /// An error here means the page cannot be rendered at all.
    fn build(&self, ctx: &PageContext) -> Result<Node, RenderError>;
}

/// The todo app document.
///
/// The shell links the stylesheet and client bundle and provides the `#root`
/// mount point. The current todos follow as a deferred JSON data block the
/// client hydrates from.
pub struct TodoPage;

impl PageTemplate for TodoPage {
    fn build(&self, ctx: &PageContext) -> Result<Node, RenderError> {
        let mut head = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(Element::new("title").child(Node::text("Todos")))
            .child(
                Element::new("link")
                    .attr("rel", "stylesheet")
                    .attr("href", "/styles.css"),
            )
            .child(
                Element::new("script")
                    .attr("type", "module")
                    .attr("async", "")
                    .attr("src", "/client.js"),
            );
        if let Some(build_id) = ctx.build_id {
            head = head.child(
                Element::new("meta")
                    .attr("name", "build-id")
                    .attr("content", build_id.to_string()),
            );
        }

        let db = Arc::clone(&ctx.db);
        let initial_state = Node::deferred(
            async move {
                let todos = db.get_todos().map_err(RenderError::content)?;
                let json = serde_json::to_string(&todos).map_err(RenderError::content)?;
                Ok(Element::new("script")
                    .attr("id", "initial-state")
                    .attr("type", "application/json")
                    .child(Node::raw(escape_script(&json)))
                    .into())
            },
            Node::Fragment(Vec::new()),
        );

        let body = Element::new("body")
            .child(Element::new("div").attr("id", "root"))
            .child(initial_state);

        Ok(Node::Fragment(vec![
            Node::raw("<!doctype html>"),
            Element::new("html")
                .attr("lang", "en")
                .child(head)
                .child(body)
                .into(),
        ]))
    }
}
