//! Terminal styling for command output.

use std::fmt::Display;

use colored::Colorize;

/// Message styles shared by all commands.
pub(crate) struct Theme;

impl Theme {
    /// Section title.
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    /// Completed operation or allowed decision.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", "✓".green().bold())
    }

    /// Denied decision.
    pub(crate) fn denied(text: &str) -> String {
        format!("{} {}", "✗".red().bold(), text.red())
    }

    /// Something the user should double-check.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow().bold(), text.yellow())
    }

    /// Neutral note.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {text}", "i".blue())
    }

    /// De-emphasized text.
    pub(crate) fn dimmed(text: &str) -> String {
        text.dimmed().to_string()
    }

    /// One aligned `label: value` line of a detail block.
    pub(crate) fn field(label: &str, value: impl Display) -> String {
        format!("  {:<12} {value}", format!("{label}:").dimmed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_contains_label_and_value() {
        colored::control::set_override(false);
        assert_eq!(Theme::field("Key ID", "abc"), "  Key ID:      abc");
        assert_eq!(Theme::success("done"), "✓ done");
    }
}
