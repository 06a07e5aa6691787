//! Rendering of merged entries for the `logmerge` binary

use crate::colors::ColorScheme;
use crate::config::OutputFormat;
use crate::entry::Entry;

/// Renders one entry as one output line (without the trailing newline)
pub trait EntryFormatter: Send + Sync {
    fn format(&self, entry: &Entry) -> String;
}

/// `YYYY-MM-DD HH:MM:SS LEVEL message`, level name padded to five columns
pub struct DefaultFormatter {
    colors: ColorScheme,
}

impl DefaultFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self {
            colors: ColorScheme::new(use_colors),
        }
    }
}

impl EntryFormatter for DefaultFormatter {
    fn format(&self, entry: &Entry) -> String {
        let level = entry.level();
        let mut output = format!(
            "{}{}{} {}{:<5}{}",
            self.colors.timestamp,
            entry.timestamp().format("%Y-%m-%d %H:%M:%S"),
            self.colors.reset,
            self.colors.level(level),
            level.name(),
            self.colors.reset,
        );
        if !entry.message().is_empty() {
            output.push(' ');
            output.push_str(entry.message());
        }
        output
    }
}

/// One JSON object per entry
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryFormatter for JsonFormatter {
    fn format(&self, entry: &Entry) -> String {
        serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Pick the formatter for the configured output format
pub fn create_formatter(format: OutputFormat, use_colors: bool) -> Box<dyn EntryFormatter> {
    match format {
        OutputFormat::Default => Box::new(DefaultFormatter::new(use_colors)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}
