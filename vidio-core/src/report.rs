//! Output sink for command progress and results.

use std::io::Write;

use console::style;

use crate::geometry::Advisory;

/// Where commands send everything meant for the user.
pub trait Reporter {
    /// Something the command is about to do
    fn info(&mut self, message: &str);

    /// Secondary detail, shown dimmed
    fn detail(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    fn success(&mut self, message: &str);

    /// Command output proper: tables, listings, JSON
    fn print(&mut self, text: &str);

    fn advisory(&mut self, advisory: &Advisory) {
        if advisory.is_warning() {
            self.warn(&advisory.to_string());
        } else {
            self.detail(&advisory.to_string());
        }
    }

    fn advisories(&mut self, advisories: &[Advisory]) {
        for advisory in advisories {
            self.advisory(advisory);
        }
    }
}

/// Styled terminal output
///
/// In quiet mode only warnings and command output get through.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, text: impl std::fmt::Display) {
        let mut out = std::io::stdout().lock();
        // A closed pipe is not worth failing the command for
        let _ = writeln!(out, "{}", text);
    }
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, message: &str) {
        if !self.quiet {
            self.line(style(message).blue());
        }
    }

    fn detail(&mut self, message: &str) {
        if !self.quiet {
            self.line(style(message).dim());
        }
    }

    fn warn(&mut self, message: &str) {
        eprintln!("{}", style(format!("Warning: {}", message)).yellow());
    }

    fn success(&mut self, message: &str) {
        if !self.quiet {
            self.line(format!("{} {}", style("✓").green(), message));
        }
    }

    fn print(&mut self, text: &str) {
        self.line(text);
    }
}

/// Severity of a captured message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Detail,
    Warn,
    Success,
    Output,
}

/// Reporter that keeps every message, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub messages: Vec<(Level, String)>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(&self, level: Level) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
    }

    /// All command output joined by newlines
    pub fn output(&self) -> String {
        self.at(Level::Output).collect::<Vec<_>>().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn info(&mut self, message: &str) {
        self.messages.push((Level::Info, message.to_string()));
    }

    fn detail(&mut self, message: &str) {
        self.messages.push((Level::Detail, message.to_string()));
    }

    fn warn(&mut self, message: &str) {
        self.messages.push((Level::Warn, message.to_string()));
    }

    fn success(&mut self, message: &str) {
        self.messages.push((Level::Success, message.to_string()));
    }

    fn print(&mut self, text: &str) {
        self.messages.push((Level::Output, text.to_string()));
    }
}
