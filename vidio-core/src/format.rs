//! Human-readable sizes, durations, time arguments and text tables.

use std::sync::OnceLock;

use console::{Color, Style};
use regex::Regex;

use crate::error::{Error, Result};

/// `1536` -> `1.5 KB`, one decimal, binary multiples.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

/// Whole seconds as `HH:MM:SS`, `00:00:00` for anything not positive.
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return "00:00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// `HH:MM:SS.mmm`
pub fn format_duration_precise(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds - hours * 3600.0) / 60.0).floor();
    let rest = seconds - hours * 3600.0 - minutes * 60.0;
    format!("{:02}:{:02}:{:06.3}", hours as u64, minutes as u64, rest)
}

/// Thousands separators: `1048576` -> `1,048,576`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `X.XX MB (N bytes)`
pub fn format_megabytes(bytes: u64) -> String {
    format!(
        "{:.2} MB ({} bytes)",
        bytes as f64 / (1024.0 * 1024.0),
        group_thousands(bytes)
    )
}

fn time_regex() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| {
        Regex::new(r"^(?:\d+(?:\.\d+)?|(?:\d+:){1,2}\d+(?:\.\d+)?)$").expect("valid time regex")
    })
}

/// Validate a time argument: seconds, `MM:SS` or `HH:MM:SS`, with optional
/// fractional seconds. The text is passed to FFmpeg unchanged.
pub fn parse_time(value: &str) -> Result<String> {
    let value = value.trim();
    if time_regex().is_match(value) {
        Ok(value.to_string())
    } else {
        Err(Error::InvalidTime(value.to_string()))
    }
}

/// Plain-text table with an optional title, a header row and sections.
#[derive(Debug, Clone, Default)]
pub struct Table {
    title: Option<String>,
    headers: Vec<String>,
    styles: Vec<Option<Color>>,
    sections: Vec<Vec<Vec<String>>>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            sections: vec![Vec::new()],
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn column(mut self, header: impl Into<String>, color: Option<Color>) -> Self {
        self.headers.push(header.into());
        self.styles.push(color);
        self
    }

    /// Start a new section, drawn after a separator line
    pub fn section(&mut self) {
        if self.sections.last().is_some_and(|s| !s.is_empty()) {
            self.sections.push(Vec::new());
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = cells.into_iter().map(Into::into).collect();
        if let Some(section) = self.sections.last_mut() {
            section.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.is_empty())
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.sections.iter().flatten() {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    fn render_row(&self, row: &[String], widths: &[usize], styled: bool) -> String {
        row.iter()
            .enumerate()
            .map(|(i, cell)| {
                let padded = format!("{:<width$}", cell, width = widths[i]);
                match self.styles.get(i).copied().flatten() {
                    Some(color) if styled => Style::new().fg(color).apply_to(padded).to_string(),
                    _ => padded,
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    /// Render as text; `styled` colors each column
    pub fn render(&self, styled: bool) -> String {
        let widths = self.widths();
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let rule = "─".repeat(rule_width);
        let mut lines = Vec::new();

        if let Some(ref title) = self.title {
            lines.push(title.clone());
        }
        if !self.headers.is_empty() {
            let header = self.render_row(&self.headers, &widths, false);
            lines.push(if styled {
                Style::new().bold().apply_to(header).to_string()
            } else {
                header
            });
            lines.push(rule.clone());
        }
        for (i, section) in self.sections.iter().filter(|s| !s.is_empty()).enumerate() {
            if i > 0 {
                lines.push(rule.clone());
            }
            for row in section {
                lines.push(self.render_row(row, &widths, styled));
            }
        }
        lines.join("\n")
    }
}
