//! Consumer-facing handle: registration, the output stream and cancellation

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::entry::Entry;
use crate::stats::StatsSnapshot;

use super::engine::MergeEngine;
use super::ingestor::{spawn_ingestor, Ingestor};
use super::types::{
    lock, HeadEvent, MergeContext, MergerConfig, Registration, SourceReport, SourceState,
};

/// Channel ends needed to wire up a new source
struct Registry {
    /// Dropped by `seal()` and `close()`; the engine treats disconnection as sealed
    registrations: Option<Sender<Registration>>,
    reports: Sender<SourceReport>,
    cancel_rx: Receiver<()>,
}

/// Merges any number of line-oriented log streams into one chronological
/// [`EntryStream`].
///
/// Sources may be added before or while the stream is consumed. The stream
/// ends after [`close`](LogMerger::close), or after [`seal`](LogMerger::seal)
/// once every source is exhausted.
///
/// Ordering holds across all sources whose registration has returned by the
/// time an entry is handed over. A source added later can still produce a timestamp older
/// than entries already delivered; those entries are not buffered or
/// reordered after the fact.
///
/// ```no_run
/// use logmerge::LogMerger;
/// use std::io::Cursor;
///
/// let merger = LogMerger::new();
/// merger.add_source(Cursor::new("2024-01-01 10:00:01 INFO second\n"));
/// merger.add_source(Cursor::new("2024-01-01 10:00:00 INFO first\n"));
/// merger.seal();
///
/// let messages: Vec<String> = merger
///     .stream()
///     .map(|entry| entry.message().to_string())
///     .collect();
/// assert_eq!(messages, ["first", "second"]);
/// ```
pub struct LogMerger {
    registry: Mutex<Registry>,
    cancel_tx: Mutex<Option<Sender<()>>>,
    engine: Mutex<Option<JoinHandle<()>>>,
    output: Receiver<Entry>,
    thread_name_prefix: String,
    ctx: Arc<MergeContext>,
}

impl LogMerger {
    pub fn new() -> Self {
        Self::with_config(MergerConfig::default())
    }

    pub fn with_config(config: MergerConfig) -> Self {
        let ctx = Arc::new(MergeContext::new(config.debug));

        let (reports_tx, reports_rx) = unbounded();
        let (registrations_tx, registrations_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(0);
        let (output_tx, output_rx) = bounded(0);

        let engine = MergeEngine::new(
            reports_rx,
            registrations_rx,
            cancel_rx.clone(),
            output_tx,
            Arc::clone(&ctx),
        );
        let engine_handle = thread::spawn(move || engine.run());

        Self {
            registry: Mutex::new(Registry {
                registrations: Some(registrations_tx),
                reports: reports_tx,
                cancel_rx,
            }),
            cancel_tx: Mutex::new(Some(cancel_tx)),
            engine: Mutex::new(Some(engine_handle)),
            output: output_rx,
            thread_name_prefix: config.thread_name_prefix,
            ctx,
        }
    }

    /// Register a byte stream. Registration order breaks timestamp ties.
    ///
    /// Returns once the merge engine has taken the source into account.
    pub fn add_source<R: Read + Send + 'static>(&self, reader: R) {
        self.register(None, BufReader::new(reader));
    }

    /// Register a byte stream under a label used in diagnostics
    pub fn add_named_source<R: Read + Send + 'static>(&self, label: impl Into<String>, reader: R) {
        self.register(Some(label.into()), BufReader::new(reader));
    }

    /// Register a stream that is already buffered
    pub fn add_buffered_source<R: BufRead + Send + 'static>(
        &self,
        label: impl Into<String>,
        reader: R,
    ) {
        self.register(Some(label.into()), reader);
    }

    fn register<R: BufRead + Send + 'static>(&self, label: Option<String>, reader: R) {
        let registry = lock(&self.registry);
        let Some(registrations) = registry.registrations.as_ref() else {
            self.ctx.debug.log_basic(&format!(
                "ignoring source ({}): merger is sealed or closed",
                label.as_deref().unwrap_or("unnamed")
            ));
            return;
        };

        let id = self.ctx.register_source();
        let label = label.unwrap_or_else(|| format!("source-{}", id.0));
        let (refill_tx, refill_rx) = bounded(1);
        // First head is requested right away so sources resolve in parallel
        let _ = refill_tx.try_send(());
        let (ack_tx, ack_rx) = bounded(1);

        // The engine must see the registration before any report from this source
        let registered = registrations
            .send(Registration {
                id,
                label: label.clone(),
                refill: refill_tx,
                ack: ack_tx,
            })
            .is_ok();
        if !registered {
            return;
        }

        let ingestor = Ingestor {
            id,
            label: label.clone(),
            reader,
            refill_rx,
            report_tx: registry.reports.clone(),
            cancel_rx: registry.cancel_rx.clone(),
            ctx: Arc::clone(&self.ctx),
        };
        let thread_name = format!("{}-source-{}", self.thread_name_prefix, id.0);
        if let Err(e) = spawn_ingestor(ingestor, thread_name) {
            self.ctx.debug.log_basic(&format!(
                "source {} ({}): failed to start reader thread: {}",
                id, label, e
            ));
            self.ctx.mark_exhausted(id);
            let _ = registry.reports.send(SourceReport {
                source: id,
                event: HeadEvent::Exhausted,
            });
        }

        // Once this returns the source takes part in every later hand-over.
        // A stopped engine drops the registration, which disconnects the ack.
        let _ = ack_rx.recv();
    }

    /// Declare that no more sources will be added. The stream then ends once
    /// every registered source is exhausted.
    pub fn seal(&self) {
        lock(&self.registry).registrations.take();
    }

    /// The merged output. Every call returns a handle onto the same sequence,
    /// so entries are split between handles if more than one is read.
    pub fn stream(&self) -> EntryStream {
        EntryStream {
            receiver: self.output.clone(),
        }
    }

    /// Stop merging and close the output stream.
    ///
    /// Returns once the engine has stopped, without waiting for sources whose
    /// reads are still blocked; those never deliver another entry. An entry
    /// being handed over concurrently is either fully delivered or not at
    /// all. Sources show up as [`SourceState::Cancelled`] only after the
    /// last hand-over. Calling this again is a no-op.
    pub fn close(&self) {
        if !self.ctx.cancel() {
            return;
        }

        // Disconnecting the cancel channel wakes the engine and idle ingestors
        lock(&self.cancel_tx).take();
        lock(&self.registry).registrations.take();

        let engine = lock(&self.engine).take();
        if let Some(handle) = engine {
            if handle.join().is_err() {
                self.ctx.debug.log_basic("merge engine panicked");
            }
        }

        // The engine is gone, so no head of an active source can be emitted now
        self.ctx.mark_all_cancelled();
    }

    pub fn is_closed(&self) -> bool {
        self.ctx.is_cancelled()
    }

    /// Lifecycle state of every registered source, in registration order
    pub fn source_states(&self) -> Vec<SourceState> {
        self.ctx.source_states()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.ctx.stats.snapshot()
    }
}

impl Default for LogMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LogMerger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pull side of a [`LogMerger`]. Iterating blocks until the next entry is
/// merged and ends when the merger closes.
#[derive(Clone)]
pub struct EntryStream {
    receiver: Receiver<Entry>,
}

impl EntryStream {
    /// Wait up to `timeout` for the next entry
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Entry, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take the next entry only if one is ready to be handed over now
    pub fn try_next(&self) -> Option<Entry> {
        self.receiver.try_recv().ok()
    }
}

impl Iterator for EntryStream {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        self.receiver.recv().ok()
    }
}
