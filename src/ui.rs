use colored::{ColoredString, Colorize};
use convergence::TerminalStatus;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Step counter, e.g. `[2/5]`
pub fn step_counter(num: usize, total: usize) -> ColoredString {
    format!("[{num}/{total}]").blue().bold()
}

/// Glyph for a terminal status
pub fn status_glyph(status: TerminalStatus) -> ColoredString {
    match status {
        TerminalStatus::Configured => "✓".green(),
        TerminalStatus::RebootRequired => "↻".yellow(),
        TerminalStatus::NotConfigured => "○".yellow(),
        TerminalStatus::Error => "✗".red(),
        TerminalStatus::SkippedOnCondition => "⊘".dimmed(),
        TerminalStatus::NotRun => "·".dimmed(),
    }
}

/// Status label colored by severity
pub fn status_label(status: TerminalStatus) -> ColoredString {
    let label = status.label();
    match status {
        TerminalStatus::Configured => label.green(),
        TerminalStatus::RebootRequired | TerminalStatus::NotConfigured => label.yellow(),
        TerminalStatus::Error => label.red().bold(),
        TerminalStatus::SkippedOnCondition | TerminalStatus::NotRun => label.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_text() {
        colored::control::set_override(false);
        assert_eq!(status_label(TerminalStatus::Error).to_string(), "Error");
        assert_eq!(
            status_label(TerminalStatus::SkippedOnCondition).to_string(),
            "SkippedOnCondition"
        );
        assert_eq!(step_counter(2, 5).to_string(), "[2/5]");
    }

    #[test]
    fn test_every_status_has_a_glyph() {
        colored::control::set_override(false);
        for status in [
            TerminalStatus::NotRun,
            TerminalStatus::Configured,
            TerminalStatus::RebootRequired,
            TerminalStatus::NotConfigured,
            TerminalStatus::Error,
            TerminalStatus::SkippedOnCondition,
        ] {
            assert!(!status_glyph(status).to_string().is_empty());
        }
    }
}
