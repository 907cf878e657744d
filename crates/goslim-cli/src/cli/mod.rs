use std::path::PathBuf;

use clap::Parser;

pub mod global;

pub use global::{GlobalFlags, OutputFormat};

/// Command-line parser for the `goslim-refresh` binary.
///
/// A run takes no positional arguments; everything else comes from
/// configuration.
#[derive(Debug, Parser)]
#[command(
    name = "goslim-refresh",
    version,
    about = "Refresh the local GO annotation mirror and its slim subsets"
)]
pub struct Cli {
    /// Config file layered over ./goslim.toml and the user config
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for the run summary: json, raw
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Build the report but do not deliver it
    #[arg(long)]
    pub no_notify: bool,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
            no_notify: self.no_notify,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, OutputFormat};

    #[test]
    fn clap_command_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn runs_without_arguments() {
        let cli = Cli::try_parse_from(["goslim-refresh"]).expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.config.is_none());
        assert!(!cli.no_notify);
    }

    #[test]
    fn flags_map_to_global_flags() {
        let cli = Cli::try_parse_from([
            "goslim-refresh",
            "--config",
            "/etc/goslim.toml",
            "--format",
            "raw",
            "--no-notify",
            "-v",
        ])
        .expect("cli should parse");

        let flags = cli.global_flags();
        assert_eq!(flags.format, OutputFormat::Raw);
        assert_eq!(flags.config.as_deref(), Some(Path::new("/etc/goslim.toml")));
        assert!(flags.no_notify);
        assert!(flags.verbose);
        assert!(!flags.quiet);
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["goslim-refresh", "now"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["goslim-refresh", "--format", "table"]).is_err());
    }
}
