//! Incremental rendering to a byte stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::RenderError;
use crate::escape::push_escaped;
use crate::node::{Deferred, Element, Node, is_valid_attr, is_valid_tag};

/// Stream of rendered HTML chunks.
pub type RenderStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

/// Callback invoked for every recoverable render error.
pub type ErrorCallback = Arc<dyn Fn(&RenderError) + Send + Sync>;

/// Options for [`render_to_stream`].
#[derive(Clone)]
pub struct RenderOptions {
    /// Cancelling this token stops the stream at its next chunk boundary.
    pub signal: CancellationToken,
    /// Called for errors that do not abort the render.
    pub on_error: ErrorCallback,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            signal: CancellationToken::new(),
            on_error: Arc::new(|_| {}),
        }
    }
}

/// Flattened piece of the document.
enum Segment {
    Markup(String),
    Deferred(Deferred),
}

/// Render `node` incrementally.
///
/// The shell (all markup before the first deferred boundary) is serialized
/// before this function returns, so construction errors in the shell are
/// returned here rather than surfacing mid-stream. The returned stream yields
/// the shell first, then the remaining markup as boundaries resolve.
///
/// Invalid attribute names are reported through `on_error` and skipped.
///
/// # Errors
///
/// Returns an error if the shell contains an invalid tag name or a void
/// element with children.
pub fn render_to_stream(node: Node, options: RenderOptions) -> Result<RenderStream, RenderError> {
    let RenderOptions { signal, on_error } = options;

    let mut segments = flatten(node, &on_error)?;
    let shell = match segments.pop_front() {
        Some(Segment::Markup(markup)) => markup,
        Some(deferred) => {
            segments.push_front(deferred);
            String::new()
        }
        None => String::new(),
    };

    Ok(Box::pin(async_stream::stream! {
        if signal.is_cancelled() {
            return;
        }
        if !shell.is_empty() {
            yield Bytes::from(shell);
        }

        while let Some(segment) = segments.pop_front() {
            let markup = match segment {
                Segment::Markup(markup) => markup,
                Segment::Deferred(Deferred { content, fallback }) => {
                    let resolved = tokio::select! {
                        biased;
                        () = signal.cancelled() => {
                            tracing::debug!("Render cancelled while awaiting deferred content");
                            return;
                        }
                        result = content => result,
                    };

                    let node = match resolved {
                        Ok(node) => node,
                        Err(err) => {
                            on_error(&err);
                            *fallback
                        }
                    };

                    match flatten(node, &on_error) {
                        Ok(inner) => {
                            for segment in inner.into_iter().rev() {
                                segments.push_front(segment);
                            }
                        }
                        Err(err) => on_error(&err),
                    }
                    continue;
                }
            };

            if signal.is_cancelled() {
                tracing::debug!("Render cancelled between chunks");
                return;
            }
            yield Bytes::from(markup);
        }
    }))
}

/// Serialize `node` into markup runs separated by deferred boundaries.
fn flatten(node: Node, on_error: &ErrorCallback) -> Result<VecDeque<Segment>, RenderError> {
    let mut writer = SegmentWriter {
        segments: VecDeque::new(),
        current: String::new(),
        on_error,
    };
    writer.push_node(node)?;
    writer.flush();
    Ok(writer.segments)
}

struct SegmentWriter<'a> {
    segments: VecDeque<Segment>,
    current: String,
    on_error: &'a ErrorCallback,
}

impl SegmentWriter<'_> {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let markup = std::mem::take(&mut self.current);
            self.segments.push_back(Segment::Markup(markup));
        }
    }

    fn push_node(&mut self, node: Node) -> Result<(), RenderError> {
        match node {
            Node::Element(element) => self.push_element(element)?,
            Node::Text(text) => push_escaped(&mut self.current, &text),
            Node::Raw(markup) => self.current.push_str(&markup),
            Node::Fragment(nodes) => {
                for node in nodes {
                    self.push_node(node)?;
                }
            }
            Node::Deferred(deferred) => {
                self.flush();
                self.segments.push_back(Segment::Deferred(deferred));
            }
        }
        Ok(())
    }

    fn push_element(&mut self, element: Element) -> Result<(), RenderError> {
        if !is_valid_tag(&element.tag) {
            return Err(RenderError::InvalidTagName(element.tag));
        }
        let is_void = element.is_void();
        if is_void && !element.children.is_empty() {
            return Err(RenderError::VoidChildren(element.tag));
        }

        self.current.push('<');
        self.current.push_str(&element.tag);
        for (name, value) in element.attrs {
            if !is_valid_attr(&name) {
                (self.on_error)(&RenderError::InvalidAttributeName {
                    tag: element.tag.clone(),
                    name,
                });
                continue;
            }
            self.current.push(' ');
            self.current.push_str(&name);
            if !value.is_empty() {
                self.current.push_str("=\"");
                push_escaped(&mut self.current, &value);
                self.current.push('"');
            }
        }
        self.current.push('>');

        if is_void {
            return Ok(());
        }

        for child in element.children {
            self.push_node(child)?;
        }

        self.current.push_str("</");
        self.current.push_str(&element.tag);
        self.current.push('>');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn collect(stream: RenderStream) -> Vec<String> {
        stream
            .map(|chunk| String::from_utf8(chunk.to_vec()).unwrap())
            .collect()
            .await
    }

    fn counting_options() -> (RenderOptions, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let options = RenderOptions {
            signal: CancellationToken::new(),
            on_error: Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        };
        (options, count)
    }

    #[tokio::test]
    async fn test_static_document_is_single_chunk() {
        let doc = Node::Fragment(vec![
            Node::raw("<!doctype html>"),
            Element::new("html")
                .attr("lang", "en")
                .child(Element::new("body").child(Node::text("Hi")))
                .into(),
        ]);

        let chunks = collect(render_to_stream(doc, RenderOptions::default()).unwrap()).await;

        assert_eq!(
            chunks,
            vec![r#"<!doctype html><html lang="en"><body>Hi</body></html>"#]
        );
    }

    #[tokio::test]
    async fn test_attributes_escaped_and_boolean() {
        let doc = Element::new("script")
            .attr("src", "/a?x=1&y=\"2\"")
            .attr("async", "");

        let chunks = collect(render_to_stream(doc.into(), RenderOptions::default()).unwrap()).await;

        assert_eq!(
            chunks,
            vec![r#"<script src="/a?x=1&amp;y=&quot;2&quot;" async></script>"#]
        );
    }

    #[tokio::test]
    async fn test_void_element_has_no_closing_tag() {
        let doc = Element::new("head").child(Element::new("meta").attr("charset", "utf-8"));

        let chunks = collect(render_to_stream(doc.into(), RenderOptions::default()).unwrap()).await;

        assert_eq!(chunks, vec![r#"<head><meta charset="utf-8"></head>"#]);
    }

    #[test]
    fn test_void_element_with_children_fails() {
        let doc = Element::new("link").child(Node::text("x"));

        let result = render_to_stream(doc.into(), RenderOptions::default());

        assert!(matches!(result, Err(RenderError::VoidChildren(tag)) if tag == "link"));
    }

    #[test]
    fn test_invalid_tag_in_shell_fails_before_streaming() {
        let doc = Element::new("body").child(Element::new("not a tag"));

        let result = render_to_stream(doc.into(), RenderOptions::default());

        assert!(matches!(result, Err(RenderError::InvalidTagName(_))));
    }

    #[tokio::test]
    async fn test_invalid_attribute_reported_and_skipped() {
        let (options, errors) = counting_options();
        let doc = Element::new("div").attr("bad name", "x").attr("id", "root");

        let stream = render_to_stream(doc.into(), options).unwrap();
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        let chunks = collect(stream).await;
        assert_eq!(chunks, vec![r#"<div id="root"></div>"#]);
    }

    #[tokio::test]
    async fn test_deferred_content_streams_after_shell() {
        let doc = Element::new("body")
            .child(Element::new("div").attr("id", "root"))
            .child(Node::deferred(
                async { Ok(Element::new("p").child(Node::text("late")).into()) },
                Node::text("loading"),
            ));

        let chunks = collect(render_to_stream(doc.into(), RenderOptions::default()).unwrap()).await;

        assert_eq!(
            chunks,
            vec![
                r#"<body><div id="root"></div>"#,
                "<p>late</p>",
                "</body>",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_deferred_renders_fallback_and_continues() {
        let (options, errors) = counting_options();
        let doc = Element::new("body")
            .child(Node::text("shell"))
            .child(Node::deferred(
                async { Err(RenderError::content("store offline")) },
                Node::text("fallback"),
            ));

        let stream = render_to_stream(doc.into(), options).unwrap();
        assert_eq!(errors.load(Ordering::SeqCst), 0);

        let chunks = collect(stream).await;
        assert_eq!(chunks, vec!["<body>shell", "fallback", "</body>"]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_markup_in_deferred_is_not_fatal() {
        let (options, errors) = counting_options();
        let doc = Element::new("main")
            .child(Node::deferred(
                async { Ok(Element::new("<bad>").into()) },
                Node::text("unused"),
            ))
            .child(Node::text("after"));

        let chunks = collect(render_to_stream(doc.into(), options).unwrap()).await;

        assert_eq!(chunks, vec!["<main>", "after</main>"]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nested_deferred_resolves_in_order() {
        let doc = Element::new("ul").child(Node::deferred(
            async {
                Ok(Node::Fragment(vec![
                    Element::new("li").child(Node::text("one")).into(),
                    Node::deferred(
                        async { Ok(Element::new("li").child(Node::text("two")).into()) },
                        Node::text(""),
                    ),
                ]))
            },
            Node::text(""),
        ));

        let chunks = collect(render_to_stream(doc.into(), RenderOptions::default()).unwrap()).await;

        assert_eq!(chunks.concat(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[tokio::test]
    async fn test_cancel_stops_pending_deferred() {
        let options = RenderOptions::default();
        let signal = options.signal.clone();
        let doc = Element::new("body").child(Node::deferred(
            std::future::pending(),
            Node::text("never"),
        ));

        let mut stream = render_to_stream(doc.into(), options).unwrap();
        assert_eq!(&stream.next().await.unwrap()[..], b"<body>");

        signal.cancel();

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_before_start_yields_nothing() {
        let options = RenderOptions::default();
        options.signal.cancel();

        let stream = render_to_stream(Element::new("p").into(), options).unwrap();

        assert!(collect(stream).await.is_empty());
    }
}
