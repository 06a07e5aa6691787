// Command-line interface definition for the logmerge binary

use clap::Parser;

use crate::config::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "logmerge")]
#[command(about = "Merge live log streams into one chronological stream")]
#[command(
    long_about = "Merge live log streams into one chronological stream\n\nEvery input is read on its own thread. Lines of the form\n  YYYY-MM-DD HH:MM:SS LEVEL message\nwith LEVEL one of DEBU, INFO, WARN, ERRO are merged by timestamp; other lines are skipped.\ngzip and zstd inputs are decompressed transparently.\n\nEXAMPLES:\n  logmerge api.log worker.log\n  tail -f app.log | logmerge - db.log.gz\n  logmerge --output-format json --take 100 *.log"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Input files (stdin if not specified, or use "-" to explicitly specify stdin)
    pub files: Vec<String>,

    /// Output format
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value_t = OutputFormat::Default,
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Stop after this many merged entries
    #[arg(long = "take", value_name = "N", help_heading = "Output Options")]
    pub take: Option<usize>,

    /// Force colored output, even when stdout is not a terminal
    #[arg(long = "force-color", help_heading = "Output Options", conflicts_with = "no_color")]
    pub force_color: bool,

    /// Disable colored output
    #[arg(long = "no-color", help_heading = "Output Options")]
    pub no_color: bool,

    /// Print merge statistics to stderr when done
    #[arg(long = "stats", help_heading = "Diagnostics")]
    pub stats: bool,

    /// Diagnostics on stderr (-v: source lifecycle and read errors, -vv: skipped lines)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Diagnostics")]
    pub verbose: u8,

    /// Expand a named alias from the configuration file
    #[arg(short = 'a', long = "alias", value_name = "NAME", help_heading = "Configuration")]
    pub alias: Vec<String>,

    /// Use this configuration file instead of the standard locations
    #[arg(long = "config-file", value_name = "PATH", help_heading = "Configuration")]
    pub config_file: Option<String>,

    /// Do not load any configuration file
    #[arg(long = "ignore-config", help_heading = "Configuration")]
    pub ignore_config: bool,

    /// Show the active configuration and where it was loaded from
    #[arg(long = "show-config", help_heading = "Configuration")]
    pub show_config: bool,
}

/// Extract `--config-file PATH` / `--config-file=PATH` before clap runs
pub fn extract_config_file_arg(args: &[String]) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config-file" {
            return iter.next().cloned();
        }
        if let Some(path) = arg.strip_prefix("--config-file=") {
            return Some(path.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "logmerge",
            "-F",
            "json",
            "--take",
            "10",
            "--stats",
            "-vv",
            "--no-color",
            "a.log",
            "-",
        ])
        .unwrap();

        assert_eq!(cli.files, vec!["a.log", "-"]);
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.take, Some(10));
        assert!(cli.stats);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["logmerge"]).unwrap();
        assert!(cli.files.is_empty());
        assert_eq!(cli.output_format, OutputFormat::Default);
        assert_eq!(cli.take, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_color_flags_conflict() {
        assert!(Cli::try_parse_from(["logmerge", "--force-color", "--no-color"]).is_err());
    }

    #[test]
    fn test_extract_config_file_arg() {
        let args: Vec<String> = ["logmerge", "--config-file", "/tmp/rc", "x.log"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_config_file_arg(&args), Some("/tmp/rc".to_string()));

        let args = vec!["logmerge".to_string(), "--config-file=/etc/rc".to_string()];
        assert_eq!(extract_config_file_arg(&args), Some("/etc/rc".to_string()));

        assert_eq!(extract_config_file_arg(&["logmerge".to_string()]), None);
    }
}
