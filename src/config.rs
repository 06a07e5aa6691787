use clap::ValueEnum;
use std::io::IsTerminal;

use crate::debug::DebugConfig;

/// Runtime configuration of the `logmerge` binary, built from the parsed CLI
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Files to merge; empty means stdin
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: ColorMode,
    pub stats: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Stop after this many entries
    pub take_limit: Option<usize>,
    pub verbose: u8,
}

/// Output format enumeration
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Default,
    Json,
}

/// Color output mode
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl AppConfig {
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let color = if cli.no_color {
            ColorMode::Never
        } else if cli.force_color {
            ColorMode::Always
        } else {
            ColorMode::Auto
        };

        Self {
            input: InputConfig {
                files: cli.files.clone(),
            },
            output: OutputConfig {
                format: cli.output_format,
                color,
                stats: cli.stats,
            },
            processing: ProcessingConfig {
                take_limit: cli.take,
                verbose: cli.verbose,
            },
        }
    }

    pub fn debug_config(&self) -> DebugConfig {
        DebugConfig::new(self.processing.verbose)
    }

    /// Whether the rendered output should carry ANSI colors
    pub fn use_colors(&self) -> bool {
        crate::tty::should_use_colors_with_mode(&self.output.color)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig { files: Vec::new() },
            output: OutputConfig {
                format: OutputFormat::Default,
                color: ColorMode::Auto,
                stats: false,
            },
            processing: ProcessingConfig {
                take_limit: None,
                verbose: 0,
            },
        }
    }
}

/// Emoji prefixes are used only when stderr is a terminal and NO_EMOJI is unset
fn use_emoji() -> bool {
    std::io::stderr().is_terminal() && std::env::var("NO_EMOJI").is_err()
}

fn format_message(emoji: &str, message: &str, emoji_enabled: bool) -> String {
    if emoji_enabled {
        format!("{} {}", emoji, message)
    } else {
        format!("logmerge: {}", message)
    }
}

pub fn format_error_message(message: &str, emoji_enabled: bool) -> String {
    format_message("⚠️ ", message, emoji_enabled)
}

pub fn format_info_message(message: &str, emoji_enabled: bool) -> String {
    format_message("🔹", message, emoji_enabled)
}

/// Error line for stderr, decorated according to the terminal
pub fn format_error_message_auto(message: &str) -> String {
    format_error_message(message, use_emoji())
}

/// Informational line for stderr (stats, shutdown notices)
pub fn format_info_message_auto(message: &str) -> String {
    format_info_message(message, use_emoji())
}
