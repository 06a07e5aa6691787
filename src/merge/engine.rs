//! Merge engine: k-way merge over the heads of all active sources
//!
//! The engine emits only when every active source has a resolved head, picks
//! the earliest timestamp (registration order breaks ties) and hands the entry
//! to the consumer through a zero-capacity channel. It never prefetches beyond
//! one head per source and never runs ahead of the consumer.

use crossbeam_channel::{never, select, Receiver, Sender, TryRecvError, TrySendError};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entry::Entry;

use super::types::{HeadEvent, MergeContext, Registration, SourceId, SourceReport};

/// Per-source bookkeeping owned by the engine
struct SourceSlot {
    label: String,
    refill: Sender<()>,
    /// None while a refill is outstanding
    head: Option<Entry>,
}

/// Whether the engine loop keeps going
enum Flow {
    Continue,
    Stop,
}

/// Why the engine woke up while waiting
enum Wake {
    Report(SourceReport),
    Registration(Registration),
    RegistrationClosed,
    Cancelled,
}

pub(crate) struct MergeEngine {
    sources: BTreeMap<SourceId, SourceSlot>,
    reports: Receiver<SourceReport>,
    registrations: Receiver<Registration>,
    cancel_rx: Receiver<()>,
    output: Sender<Entry>,
    /// No further registrations can arrive
    sealed: bool,
    ctx: Arc<MergeContext>,
}

impl MergeEngine {
    pub fn new(
        reports: Receiver<SourceReport>,
        registrations: Receiver<Registration>,
        cancel_rx: Receiver<()>,
        output: Sender<Entry>,
        ctx: Arc<MergeContext>,
    ) -> Self {
        Self {
            sources: BTreeMap::new(),
            reports,
            registrations,
            cancel_rx,
            output,
            sealed: false,
            ctx,
        }
    }

    /// Run until cancelled, or until sealed with every source exhausted.
    /// Dropping `self` at the end closes the output stream.
    pub fn run(mut self) {
        loop {
            self.drain_registrations();

            if let Flow::Stop = self.resolve_heads() {
                break;
            }

            let Some(id) = self.earliest() else {
                continue;
            };

            if let Flow::Stop = self.offer(id) {
                break;
            }
        }

        if self.ctx.is_cancelled() {
            self.ctx.debug.log_basic("merge engine cancelled");
        } else {
            self.ctx.debug.log_basic("merge engine finished: all sources exhausted");
        }
    }

    /// Pick up registrations that completed before this iteration
    fn drain_registrations(&mut self) {
        loop {
            match self.registrations.try_recv() {
                Ok(registration) => self.insert(registration),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.seal();
                    break;
                }
            }
        }
    }

    /// Wait until every active source has a head. Exhausted sources are
    /// retired as they report.
    fn resolve_heads(&mut self) -> Flow {
        loop {
            if self.ctx.is_cancelled() {
                return Flow::Stop;
            }

            if self.sources.is_empty() {
                if self.sealed {
                    return Flow::Stop;
                }
            } else if self.sources.values().all(|slot| slot.head.is_some()) {
                return Flow::Continue;
            }

            let wake = select! {
                recv(self.reports) -> msg => match msg {
                    Ok(report) => Wake::Report(report),
                    Err(_) => Wake::Cancelled,
                },
                recv(self.registrations) -> msg => match msg {
                    Ok(registration) => Wake::Registration(registration),
                    Err(_) => Wake::RegistrationClosed,
                },
                recv(self.cancel_rx) -> _ => Wake::Cancelled,
            };

            match wake {
                Wake::Report(report) => {
                    // The source's registration is always sent before its
                    // ingestor starts, so it is already queued if unseen
                    self.drain_registrations();
                    self.apply_report(report);
                }
                Wake::Registration(registration) => self.insert(registration),
                Wake::RegistrationClosed => self.seal(),
                Wake::Cancelled => return Flow::Stop,
            }
        }
    }

    /// Source with the earliest head; the lower registration index wins ties
    fn earliest(&self) -> Option<SourceId> {
        let mut best: Option<(SourceId, &Entry)> = None;
        for (id, slot) in &self.sources {
            let Some(head) = slot.head.as_ref() else {
                continue;
            };
            match best {
                Some((_, current)) if current.timestamp() <= head.timestamp() => {}
                _ => best = Some((*id, head)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Hand the head of `id` to the consumer. A registration arriving first
    /// puts the decision back on the table with the head still in its slot.
    fn offer(&mut self, id: SourceId) -> Flow {
        let Some(entry) = self.sources.get(&id).and_then(|slot| slot.head.clone()) else {
            return Flow::Continue;
        };

        if self.ctx.is_cancelled() {
            return Flow::Stop;
        }

        let wake = select! {
            send(self.output, entry) -> res => match res {
                Ok(()) => None,
                Err(_) => Some(Wake::Cancelled),
            },
            recv(self.registrations) -> msg => match msg {
                Ok(registration) => Some(Wake::Registration(registration)),
                Err(_) => Some(Wake::RegistrationClosed),
            },
            recv(self.cancel_rx) -> _ => Some(Wake::Cancelled),
        };

        match wake {
            None => {
                self.ctx.stats.add_entry_emitted();
                self.request_refill(id);
                Flow::Continue
            }
            Some(Wake::Registration(registration)) => {
                self.insert(registration);
                Flow::Continue
            }
            Some(Wake::RegistrationClosed) => {
                self.seal();
                Flow::Continue
            }
            Some(Wake::Report(report)) => {
                self.apply_report(report);
                Flow::Continue
            }
            Some(Wake::Cancelled) => Flow::Stop,
        }
    }

    fn request_refill(&mut self, id: SourceId) {
        let Some(slot) = self.sources.get_mut(&id) else {
            return;
        };
        slot.head = None;
        match slot.refill.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                // The ingestor thread is gone without reporting exhaustion
                let label = slot.label.clone();
                self.retire(id);
                self.ctx
                    .debug
                    .log_basic(&format!("source {} ({}) stopped unexpectedly", id, label));
            }
        }
    }

    fn apply_report(&mut self, report: SourceReport) {
        let SourceReport { source, event } = report;
        match event {
            HeadEvent::Entry(entry) => {
                if let Some(slot) = self.sources.get_mut(&source) {
                    slot.head = Some(entry);
                }
            }
            HeadEvent::Exhausted => self.retire(source),
        }
    }

    fn insert(&mut self, registration: Registration) {
        let Registration {
            id,
            label,
            refill,
            ack,
        } = registration;
        self.ctx
            .debug
            .log_basic(&format!("source {} ({}) joined the merge", id, label));
        self.sources.insert(
            id,
            SourceSlot {
                label,
                refill,
                head: None,
            },
        );
        let _ = ack.try_send(());
    }

    fn retire(&mut self, id: SourceId) {
        self.ctx.mark_exhausted(id);
        self.sources.remove(&id);
    }

    fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            self.registrations = never();
        }
    }
}
