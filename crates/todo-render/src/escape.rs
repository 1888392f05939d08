//! Escaping helpers.

/// Escape text for use in HTML content or a double-quoted attribute value.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(&mut result, s);
    result
}

pub(crate) fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// Make a JSON or JS snippet safe to embed inside a `<script>` element.
///
/// Only `<` needs care: it is the one character that can end the script
/// element early (`</script>`) or open a comment (`<!--`).
pub fn escape_script(s: &str) -> String {
    s.replace('<', "\\u003c")
}
