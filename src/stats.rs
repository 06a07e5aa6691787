use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by the engine and every ingestor thread
#[derive(Debug)]
pub struct MergeStats {
    sources_registered: AtomicUsize,
    sources_exhausted: AtomicUsize,
    lines_read: AtomicUsize,
    lines_skipped: AtomicUsize,
    read_errors: AtomicUsize,
    entries_emitted: AtomicUsize,
    start_time: Instant,
}

/// Point-in-time copy of [`MergeStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sources_registered: usize,
    pub sources_exhausted: usize,
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub read_errors: usize,
    pub entries_emitted: usize,
    pub processing_time: Duration,
}

impl MergeStats {
    pub fn new() -> Self {
        Self {
            sources_registered: AtomicUsize::new(0),
            sources_exhausted: AtomicUsize::new(0),
            lines_read: AtomicUsize::new(0),
            lines_skipped: AtomicUsize::new(0),
            read_errors: AtomicUsize::new(0),
            entries_emitted: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn add_source_registered(&self) {
        self.sources_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_source_exhausted(&self) {
        self.sources_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_line_read(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_line_skipped(&self) {
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_entry_emitted(&self) {
        self.entries_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sources_registered: self.sources_registered.load(Ordering::Relaxed),
            sources_exhausted: self.sources_exhausted.load(Ordering::Relaxed),
            lines_read: self.lines_read.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            processing_time: self.start_time.elapsed(),
        }
    }
}

impl Default for MergeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Sources: {} registered, {} exhausted; Lines: {} read, {} skipped; Entries: {} emitted",
            self.sources_registered,
            self.sources_exhausted,
            self.lines_read,
            self.lines_skipped,
            self.entries_emitted
        );

        if self.read_errors > 0 {
            output.push_str(&format!(", {} read errors", self.read_errors));
        }

        let processing_time_ms = self.processing_time.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.entries_emitted > 0 {
            let entries_per_sec = (self.entries_emitted as f64 * 1000.0) / processing_time_ms as f64;
            output.push_str(&format!(" ({:.0} entries/s)", entries_per_sec));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = MergeStats::new();
        stats.add_source_registered();
        stats.add_source_registered();
        stats.add_source_exhausted();
        stats.add_line_read();
        stats.add_line_read();
        stats.add_line_read();
        stats.add_line_skipped();
        stats.add_entry_emitted();
        stats.add_entry_emitted();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sources_registered, 2);
        assert_eq!(snapshot.sources_exhausted, 1);
        assert_eq!(snapshot.lines_read, 3);
        assert_eq!(snapshot.lines_skipped, 1);
        assert_eq!(snapshot.read_errors, 0);
        assert_eq!(snapshot.entries_emitted, 2);
    }

    #[test]
    fn test_format_stats() {
        let snapshot = StatsSnapshot {
            sources_registered: 2,
            sources_exhausted: 2,
            lines_read: 10,
            lines_skipped: 1,
            read_errors: 0,
            entries_emitted: 9,
            processing_time: Duration::from_millis(0),
        };
        let text = snapshot.format_stats();
        assert!(text.starts_with("Sources: 2 registered, 2 exhausted"));
        assert!(text.contains("Lines: 10 read, 1 skipped"));
        assert!(text.contains("Entries: 9 emitted"));
        assert!(!text.contains("read errors"));
        assert!(text.ends_with("in 0ms"));
    }

    #[test]
    fn test_format_stats_reports_read_errors_and_rate() {
        let snapshot = StatsSnapshot {
            read_errors: 1,
            entries_emitted: 500,
            processing_time: Duration::from_millis(250),
            ..Default::default()
        };
        let text = snapshot.format_stats();
        assert!(text.contains(", 1 read errors"));
        assert!(text.contains("(2000 entries/s)"));
    }
}
