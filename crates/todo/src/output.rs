//! Startup banner and error reporting on stderr.

use console::{Style, Term};

/// Width of the label column in [`Output::setting`] lines.
const LABEL_WIDTH: usize = 14;

/// Terminal output for `todo` commands.
///
/// Everything goes to stderr so stdout stays free for piping.
pub(crate) struct Output {
    term: Term,
    label: Style,
    error: Style,
    banner: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().dim(),
            error: Style::new().red(),
            banner: Style::new().cyan().bold(),
        }
    }

    /// Print the headline shown when the server starts.
    pub(crate) fn banner(&self, msg: &str) {
        let _ = self.term.write_line(&self.banner.apply_to(msg).to_string());
    }

    /// Print one `label: value` line of the startup summary.
    pub(crate) fn setting(&self, label: &str, value: impl std::fmt::Display) {
        let _ = self.term.write_line(&format_setting(&self.label, label, value));
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.error.apply_to(msg).to_string());
    }
}

fn format_setting(style: &Style, label: &str, value: impl std::fmt::Display) -> String {
    let label = format!("{label}:");
    let width = LABEL_WIDTH;
    format!("  {} {value}", style.apply_to(format!("{label:<width$}")))
}
