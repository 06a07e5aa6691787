//! Source ingestor: one thread per registered stream
//!
//! The ingestor reads only when the engine asks for a refill, so the parsed
//! entry it publishes is the only one buffered for its source. A thread
//! blocked inside `read_until` cannot be interrupted; after cancellation it is
//! left behind and exits the next time the read returns.

use crossbeam_channel::{select, Receiver, Sender};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use crate::entry::Entry;
use crate::parser::parse_entry;

use super::types::{HeadEvent, MergeContext, SourceId, SourceReport, SourceState};

pub(crate) struct Ingestor<R> {
    pub id: SourceId,
    pub label: String,
    pub reader: R,
    pub refill_rx: Receiver<()>,
    pub report_tx: Sender<SourceReport>,
    pub cancel_rx: Receiver<()>,
    pub ctx: Arc<MergeContext>,
}

/// Start the ingestor on its own named thread. The thread is detached.
pub(crate) fn spawn_ingestor<R: BufRead + Send + 'static>(
    ingestor: Ingestor<R>,
    thread_name: String,
) -> io::Result<()> {
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || ingestor.run())?;
    Ok(())
}

impl<R: BufRead> Ingestor<R> {
    fn run(mut self) {
        let final_state = self.pump();
        match final_state {
            SourceState::Exhausted => self
                .ctx
                .debug
                .log_basic(&format!("source {} ({}) exhausted", self.id, self.label)),
            _ => self
                .ctx
                .debug
                .log_basic(&format!("source {} ({}) cancelled", self.id, self.label)),
        }
    }

    /// Serve refill requests until the stream ends or merging stops
    fn pump(&mut self) -> SourceState {
        let mut buffer = Vec::new();
        loop {
            let requested = select! {
                recv(self.refill_rx) -> msg => msg.is_ok(),
                recv(self.cancel_rx) -> _ => false,
            };
            if !requested || self.ctx.is_cancelled() {
                return SourceState::Cancelled;
            }

            let event = match self.next_entry(&mut buffer) {
                Some(entry) => HeadEvent::Entry(entry),
                None => HeadEvent::Exhausted,
            };

            // A read that finished after close() must not reach the engine
            if self.ctx.is_cancelled() {
                return SourceState::Cancelled;
            }

            let exhausted = matches!(event, HeadEvent::Exhausted);
            if exhausted {
                self.ctx.mark_exhausted(self.id);
            }

            let report = SourceReport {
                source: self.id,
                event,
            };
            if self.report_tx.send(report).is_err() {
                return SourceState::Cancelled;
            }

            if exhausted {
                return SourceState::Exhausted;
            }
        }
    }

    /// Read lines until one parses. None on end-of-data, read error or cancellation.
    fn next_entry(&mut self, buffer: &mut Vec<u8>) -> Option<Entry> {
        loop {
            if self.ctx.is_cancelled() {
                return None;
            }

            buffer.clear();
            match self.reader.read_until(b'\n', buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.ctx.stats.add_line_read();
                    let parsed = std::str::from_utf8(buffer)
                        .map_err(|e| e.to_string())
                        .and_then(|line| parse_entry(line).map_err(|e| e.to_string()));
                    match parsed {
                        Ok(entry) => return Some(entry),
                        Err(reason) => {
                            self.ctx.stats.add_line_skipped();
                            self.ctx.debug.log_trace(&format!(
                                "source {} ({}): skipping line: {}",
                                self.id, self.label, reason
                            ));
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.ctx.stats.add_read_error();
                    self.ctx.debug.log_basic(&format!(
                        "source {} ({}): read error: {}",
                        self.id, self.label, e
                    ));
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugConfig;
    use crossbeam_channel::{bounded, unbounded};
    use std::io::{BufReader, Cursor, Read};
    use std::time::Duration;

    struct Harness {
        refill_tx: Sender<()>,
        report_rx: Receiver<SourceReport>,
        cancel_tx: Option<Sender<()>>,
        ctx: Arc<MergeContext>,
    }

    fn start<R: BufRead + Send + 'static>(reader: R) -> Harness {
        let ctx = Arc::new(MergeContext::new(DebugConfig::default()));
        let id = ctx.register_source();
        let (refill_tx, refill_rx) = bounded(1);
        let (report_tx, report_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(0);
        let ingestor = Ingestor {
            id,
            label: "test".to_string(),
            reader,
            refill_rx,
            report_tx,
            cancel_rx,
            ctx: Arc::clone(&ctx),
        };
        spawn_ingestor(ingestor, "test-ingestor".to_string()).unwrap();
        Harness {
            refill_tx,
            report_rx,
            cancel_tx: Some(cancel_tx),
            ctx,
        }
    }

    fn next_report(h: &Harness) -> SourceReport {
        h.refill_tx.send(()).unwrap();
        h.report_rx.recv_timeout(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_reads_only_on_request() {
        let input = "2024-01-01 10:00:00 INFO a\n2024-01-01 10:00:01 INFO b\n";
        let h = start(Cursor::new(input.as_bytes().to_vec()));

        // Nothing is published before the first refill request
        assert!(h
            .report_rx
            .recv_timeout(Duration::from_millis(50))
            .is_err());

        match next_report(&h).event {
            HeadEvent::Entry(entry) => assert_eq!(entry.message(), "a"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(h
            .report_rx
            .recv_timeout(Duration::from_millis(50))
            .is_err());

        match next_report(&h).event {
            HeadEvent::Entry(entry) => assert_eq!(entry.message(), "b"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(next_report(&h).event, HeadEvent::Exhausted));
        assert_eq!(h.ctx.source_states(), vec![SourceState::Exhausted]);
    }

    #[test]
    fn test_skips_unparseable_and_invalid_utf8_lines() {
        let mut input = b"garbage\n".to_vec();
        input.extend_from_slice(b"\xff\xfe not utf8\n");
        input.extend_from_slice(b"\n");
        input.extend_from_slice(b"2024-01-01 10:00:00 ERRO kept\n");
        let h = start(Cursor::new(input));

        match next_report(&h).event {
            HeadEvent::Entry(entry) => assert_eq!(entry.message(), "kept"),
            other => panic!("unexpected {:?}", other),
        }
        let stats = h.ctx.stats.snapshot();
        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.lines_skipped, 3);
    }

    #[test]
    fn test_last_line_without_newline_is_parsed() {
        let h = start(Cursor::new(b"2024-01-01 10:00:00 WARN tail".to_vec()));
        match next_report(&h).event {
            HeadEvent::Entry(entry) => assert_eq!(entry.message(), "tail"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(next_report(&h).event, HeadEvent::Exhausted));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_read_error_exhausts_source() {
        let h = start(BufReader::new(FailingReader));
        assert!(matches!(next_report(&h).event, HeadEvent::Exhausted));
        assert_eq!(h.ctx.stats.snapshot().read_errors, 1);
    }

    #[test]
    fn test_cancel_stops_waiting_ingestor() {
        let mut h = start(Cursor::new(b"2024-01-01 10:00:00 INFO a\n".to_vec()));
        h.ctx.cancel();
        h.cancel_tx.take();

        // The refill may or may not be accepted, but no report follows
        let _ = h.refill_tx.try_send(());
        assert!(h
            .report_rx
            .recv_timeout(Duration::from_millis(100))
            .is_err());
    }
}
