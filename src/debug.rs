/// Verbosity-gated diagnostics written to stderr
///
/// Level 1 reports source lifecycle (registration, exhaustion, read errors),
/// level 2 adds every skipped line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugConfig {
    pub verbosity: u8,
}

impl DebugConfig {
    pub fn new(verbose_count: u8) -> Self {
        DebugConfig {
            verbosity: verbose_count,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.verbosity > 0
    }

    pub fn should_trace(&self) -> bool {
        self.verbosity >= 2
    }

    pub fn log_basic(&self, message: &str) {
        if self.is_enabled() {
            eprintln!("logmerge: {}", message);
        }
    }

    pub fn log_trace(&self, message: &str) {
        if self.should_trace() {
            eprintln!("logmerge: {}", message);
        }
    }
}
