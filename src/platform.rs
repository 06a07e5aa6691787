use anyhow::Result;
use crossbeam_channel::Sender;
use std::io::{self, Write};
use std::process;
use std::thread;

#[cfg(unix)]
use signal_hook::{
    consts::{SIGINT, SIGTERM, SIGUSR1},
    iterator::Signals,
};

#[cfg(windows)]
use signal_hook::{consts::SIGINT, flag};
#[cfg(windows)]
use std::sync::atomic::{AtomicBool, Ordering};

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalPipe = 141, // 128 + SIGPIPE (13)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Control messages sent by the signal handler to the main program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ctrl {
    /// Stop merging; `code` is the exit code to finish with
    Shutdown { code: ExitCode },
    PrintStats,
}

/// Background thread turning signals into [`Ctrl`] messages. A second
/// SIGINT/SIGTERM exits the process immediately.
pub struct SignalHandler {
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    pub fn new(ctrl_sender: Sender<Ctrl>) -> Result<Self> {
        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGINT, SIGTERM, SIGUSR1])?;

            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                for sig in signals.forever() {
                    let code = match sig {
                        SIGINT => ExitCode::SignalInt,
                        SIGTERM => ExitCode::SignalTerm,
                        SIGUSR1 => {
                            let _ = ctrl_sender.send(Ctrl::PrintStats);
                            continue;
                        }
                        _ => continue,
                    };

                    shutdown_count += 1;
                    if shutdown_count > 1 {
                        code.exit();
                    }
                    let _ = ctrl_sender.send(Ctrl::Shutdown { code });
                }
            });

            Ok(SignalHandler { _handle: handle })
        }

        #[cfg(windows)]
        {
            let term_flag = std::sync::Arc::new(AtomicBool::new(false));
            flag::register(SIGINT, std::sync::Arc::clone(&term_flag))?;

            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                loop {
                    thread::sleep(std::time::Duration::from_millis(100));
                    if term_flag.swap(false, Ordering::Relaxed) {
                        shutdown_count += 1;
                        if shutdown_count > 1 {
                            ExitCode::SignalInt.exit();
                        }
                        let _ = ctrl_sender.send(Ctrl::Shutdown {
                            code: ExitCode::SignalInt,
                        });
                    }
                }
            });

            Ok(SignalHandler { _handle: handle })
        }
    }
}

/// Stdout wrapper that exits quietly with 141 when the reader goes away
pub struct SafeStdout<W: Write = io::Stdout> {
    out: W,
}

impl SafeStdout {
    pub fn new() -> Self {
        Self::from_writer(io::stdout())
    }
}

impl Default for SafeStdout {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> SafeStdout<W> {
    pub fn from_writer(out: W) -> Self {
        Self { out }
    }

    pub fn writeln(&mut self, data: &str) -> Result<()> {
        match writeln!(self.out, "{}", data) {
            Ok(()) => Ok(()),
            Err(e) if is_broken_pipe(&e) => ExitCode::SignalPipe.exit(),
            Err(e) => Err(anyhow::anyhow!("Failed to write to stdout: {}", e)),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self.out.flush() {
            Ok(()) => Ok(()),
            Err(e) if is_broken_pipe(&e) => ExitCode::SignalPipe.exit(),
            Err(e) => Err(anyhow::anyhow!("Failed to flush stdout: {}", e)),
        }
    }
}

fn is_broken_pipe(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        e.kind() == io::ErrorKind::BrokenPipe
    }
    #[cfg(windows)]
    {
        e.kind() == io::ErrorKind::BrokenPipe
            || e.raw_os_error() == Some(232) // ERROR_NO_DATA
            || e.raw_os_error() == Some(109) // ERROR_BROKEN_PIPE
    }
}
