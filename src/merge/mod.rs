//! Chronological merge of live log streams
//!
//! # Module Structure
//!
//! - `types`: source identifiers, lifecycle states, channel messages and configuration
//! - `ingestor`: per-source reader thread feeding one head entry at a time
//! - `engine`: the k-way merge loop
//! - `handle`: `LogMerger` (registration, seal, close) and `EntryStream`

mod engine;
mod handle;
mod ingestor;
mod types;

pub use crossbeam_channel::RecvTimeoutError;
pub use handle::{EntryStream, LogMerger};
pub use types::{MergerConfig, SourceId, SourceState};
