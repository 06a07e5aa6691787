// Core library for the logmerge chronological log merger

pub mod cli;
pub mod colors;
pub mod config;
pub mod config_file;
pub mod debug;
pub mod decompression;
pub mod entry;
pub mod formatters;
pub mod merge;
pub mod parser;
pub mod platform;
pub mod readers;
pub mod stats;
pub mod tty;

pub use debug::DebugConfig;
pub use entry::{Entry, Level};
pub use merge::{EntryStream, LogMerger, MergerConfig, RecvTimeoutError, SourceId, SourceState};
pub use parser::{parse_entry, ParseError};
pub use stats::StatsSnapshot;
