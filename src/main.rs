use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use crossbeam_channel::{unbounded, Receiver};
use std::sync::{Arc, OnceLock};
use std::thread;

use logmerge::cli::{extract_config_file_arg, Cli};
use logmerge::config::{format_error_message_auto, format_info_message_auto, AppConfig};
use logmerge::config_file::ConfigFile;
use logmerge::formatters::create_formatter;
use logmerge::platform::{Ctrl, ExitCode, SafeStdout, SignalHandler};
use logmerge::readers::open_inputs;
use logmerge::{LogMerger, MergerConfig};

/// Exit code requested by the first SIGINT/SIGTERM
static SHUTDOWN_CODE: OnceLock<ExitCode> = OnceLock::new();

fn main() {
    let (ctrl_tx, ctrl_rx) = unbounded::<Ctrl>();

    let _signal_handler = match SignalHandler::new(ctrl_tx) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!(
                "{}",
                format_error_message_auto(&format!("Failed to initialize signal handling: {}", e))
            );
            ExitCode::GeneralError.exit();
        }
    };

    let cli = process_args_with_config();
    let config = AppConfig::from_cli(&cli);

    match run(&config, ctrl_rx) {
        Ok(code) => code.exit(),
        Err(e) => {
            eprintln!("{}", format_error_message_auto(&format!("{:#}", e)));
            ExitCode::GeneralError.exit();
        }
    }
}

/// Merge every input to stdout. Returns the exit code to finish with.
fn run(config: &AppConfig, ctrl_rx: Receiver<Ctrl>) -> Result<ExitCode> {
    let debug = config.debug_config();
    let inputs = open_inputs(&config.input.files)?;

    let merger = Arc::new(LogMerger::with_config(MergerConfig {
        debug,
        ..MergerConfig::default()
    }));
    spawn_control_thread(Arc::clone(&merger), ctrl_rx)?;

    debug.log_basic(&format!("merging {} input(s)", inputs.len()));
    for input in inputs {
        merger.add_buffered_source(input.label, input.reader);
    }
    merger.seal();

    let formatter = create_formatter(config.output.format, config.use_colors());
    let mut stdout = SafeStdout::new();
    let limit = config.processing.take_limit.unwrap_or(usize::MAX);

    for entry in merger.stream().take(limit) {
        stdout.writeln(&formatter.format(&entry))?;
    }
    stdout.flush()?;
    merger.close();

    if config.output.stats {
        eprintln!("{}", format_info_message_auto(&merger.stats().format_stats()));
    }

    Ok(SHUTDOWN_CODE.get().copied().unwrap_or(ExitCode::Success))
}

/// React to signals: close the merger on shutdown, print stats on request
fn spawn_control_thread(merger: Arc<LogMerger>, ctrl_rx: Receiver<Ctrl>) -> Result<()> {
    thread::Builder::new()
        .name("logmerge-control".to_string())
        .spawn(move || {
            for ctrl in ctrl_rx {
                match ctrl {
                    Ctrl::Shutdown { code } => {
                        let _ = SHUTDOWN_CODE.set(code);
                        merger.close();
                    }
                    Ctrl::PrintStats => {
                        eprintln!("{}", format_info_message_auto(&merger.stats().format_stats()));
                    }
                }
            }
        })
        .context("Failed to start control thread")?;
    Ok(())
}

/// Apply the configuration file (defaults and aliases), then parse with clap
fn process_args_with_config() -> Cli {
    let raw_args: Vec<String> = std::env::args().collect();
    let config_file_path = extract_config_file_arg(&raw_args);

    if raw_args.iter().any(|arg| arg == "--show-config") {
        print!(
            "{}",
            ConfigFile::render_config_report(config_file_path.as_deref())
        );
        ExitCode::Success.exit();
    }

    let processed_args = if raw_args.iter().any(|arg| arg == "--ignore-config") {
        raw_args
    } else {
        let expanded = ConfigFile::load_with_custom_path(config_file_path.as_deref())
            .and_then(|config_file| config_file.process_args(raw_args));
        match expanded {
            Ok(args) => args,
            Err(e) => {
                eprintln!(
                    "{}",
                    format_error_message_auto(&format!("Config error: {:#}", e))
                );
                ExitCode::GeneralError.exit();
            }
        }
    };

    let cli = Cli::try_parse_from(processed_args).unwrap_or_else(|e| e.exit());

    // Aliases that survive expansion were never looked up
    if !cli.alias.is_empty() {
        eprintln!(
            "{}",
            format_error_message_auto(&format!(
                "Alias '{}' cannot be expanded: configuration loading is disabled by --ignore-config",
                cli.alias[0]
            ))
        );
        ExitCode::InvalidUsage.exit();
    }

    if logmerge::tty::is_stdin_tty() && cli.files.is_empty() {
        println!("{}", Cli::command().render_usage());
        println!("Merge live log streams into one chronological stream");
        println!("Try 'logmerge --help' for more information.");
        ExitCode::Success.exit();
    }

    cli
}
