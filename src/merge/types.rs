//! Type definitions shared by the ingestors, the engine and the handle

use crossbeam_channel::Sender;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::debug::DebugConfig;
use crate::entry::Entry;
use crate::stats::MergeStats;

/// Registration index of a source. Assigned in call order starting at 0 and
/// used as the tie-break when two heads carry the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a registered source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Active,
    /// End-of-data or a read error; contributes no further entries
    Exhausted,
    /// Merging was closed while the source was still active
    Cancelled,
}

/// Configuration for a [`LogMerger`](super::LogMerger)
#[derive(Debug, Clone)]
pub struct MergerConfig {
    pub debug: DebugConfig,
    /// Prefix for the names of spawned threads
    pub thread_name_prefix: String,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            debug: DebugConfig::default(),
            thread_name_prefix: "logmerge".to_string(),
        }
    }
}

/// What an ingestor publishes into its head slot
#[derive(Debug)]
pub(crate) enum HeadEvent {
    Entry(Entry),
    Exhausted,
}

/// Message from an ingestor thread to the engine
#[derive(Debug)]
pub(crate) struct SourceReport {
    pub source: SourceId,
    pub event: HeadEvent,
}

/// A newly registered source handed to the engine
#[derive(Debug)]
pub(crate) struct Registration {
    pub id: SourceId,
    pub label: String,
    /// Refill requests for the source's ingestor (capacity 1)
    pub refill: Sender<()>,
    /// Signalled once the engine has added the source to the merge set
    pub ack: Sender<()>,
}

/// State shared between the handle, the engine and every ingestor
#[derive(Debug)]
pub(crate) struct MergeContext {
    cancelled: AtomicBool,
    states: Mutex<Vec<SourceState>>,
    pub stats: MergeStats,
    pub debug: DebugConfig,
}

impl MergeContext {
    pub fn new(debug: DebugConfig) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            states: Mutex::new(Vec::new()),
            stats: MergeStats::new(),
            debug,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Flip to cancelled; returns false if it already was
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    /// Record a new Active source and return its index
    pub fn register_source(&self) -> SourceId {
        let mut states = lock(&self.states);
        let id = SourceId(states.len() as u64);
        states.push(SourceState::Active);
        self.stats.add_source_registered();
        id
    }

    pub fn mark_exhausted(&self, id: SourceId) {
        let mut states = lock(&self.states);
        if let Some(state) = states.get_mut(id.0 as usize) {
            if *state == SourceState::Active {
                *state = SourceState::Exhausted;
                self.stats.add_source_exhausted();
            }
        }
    }

    pub fn mark_all_cancelled(&self) {
        let mut states = lock(&self.states);
        for state in states.iter_mut() {
            if *state == SourceState::Active {
                *state = SourceState::Cancelled;
            }
        }
    }

    pub fn source_states(&self) -> Vec<SourceState> {
        lock(&self.states).clone()
    }
}

/// Lock a mutex, recovering the data if another thread panicked while holding it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
