use crate::entry::Level;

/// ANSI color codes for the default output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub timestamp: &'static str, // Dim for the timestamp column
    pub level_debug: &'static str, // Bright cyan
    pub level_info: &'static str,  // Bright green
    pub level_warn: &'static str,  // Bright yellow
    pub level_error: &'static str, // Bright red
    pub reset: &'static str,
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                timestamp: "\x1b[2m",
                level_debug: "\x1b[96m",
                level_info: "\x1b[92m",
                level_warn: "\x1b[93m",
                level_error: "\x1b[91m",
                reset: "\x1b[0m",
            }
        } else {
            // All empty strings for no-color mode
            Self {
                timestamp: "",
                level_debug: "",
                level_info: "",
                level_warn: "",
                level_error: "",
                reset: "",
            }
        }
    }

    pub fn level(&self, level: Level) -> &'static str {
        match level {
            Level::Debug => self.level_debug,
            Level::Info => self.level_info,
            Level::Warn => self.level_warn,
            Level::Error => self.level_error,
        }
    }
}
