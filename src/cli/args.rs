// sshconf top-level command-line arguments
// (c) 2024 Ross Younger

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::UserSettings;

#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about,
    before_help = "e.g.   sshconf get my-server port",
    infer_long_args(true)
)]
#[command(help_template(
    "\
{name} version {version}
{about-with-newline}
{usage-heading} {usage}
{before-help}
{all-args}{after-help}
"
))]
#[command(styles=super::styles::CLAP_STYLES)]
pub(crate) struct CliArgs {
    /// Reads the given file instead of the user configuration file (`~/.ssh/config`)
    #[arg(short = 'F', long, value_name("FILE"), global = true)]
    pub config: Option<PathBuf>,

    /// Reports errors in the configuration, and exits with failure status if there are any.
    ///
    /// By default, files which fail to parse are treated as empty and
    /// malformed values are treated as absent.
    #[arg(long, action, global = true)]
    pub strict: bool,

    /// Quiet mode
    ///
    /// Reports only errors
    #[arg(short, long, action, conflicts_with("debug"), global = true)]
    pub quiet: bool,

    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=sshconf=trace` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(short, long, action, help_heading("Debug"), global = true)]
    pub debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(
        short('l'),
        long,
        action,
        help_heading("Debug"),
        value_name("FILE"),
        global = true
    )]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub(crate) enum Command {
    /// Prints the value of a setting for a host
    ///
    /// The user configuration file is consulted first, then the system configuration file,
    /// then the built-in defaults.
    Get {
        /// The host alias, as it would be given to ssh
        alias: String,
        /// The setting (keyword) to look up. Case does not matter.
        key: String,
        /// Prints every value, one per line, for settings which may be given more than once
        #[arg(short, long, action)]
        all: bool,
        /// Splits values into their individual arguments, one per line
        #[arg(short, long, action)]
        splits: bool,
    },
    /// Prints every setting which applies to a host, with where it came from
    Show {
        /// The host alias, as it would be given to ssh
        alias: String,
    },
    /// Parses a configuration file and prints it back out
    ///
    /// The output should be identical to the input.
    Render {
        /// The file to read [default: the user configuration file]
        file: Option<PathBuf>,
    },
}

impl CliArgs {
    pub(crate) fn trace_level(&self) -> &'static str {
        if self.debug {
            "trace"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    pub(crate) fn settings(&self) -> UserSettings {
        let settings = UserSettings::new().ignore_errors(!self.strict);
        match &self.config {
            Some(path) => {
                let path = path.clone();
                settings.config_finder(move || Some(path.clone()))
            }
            None => settings,
        }
    }
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::{CliArgs, Command};

    #[test]
    fn get_command() {
        let args = CliArgs::try_parse_from(["sshconf", "get", "myhost", "Port", "--all"]).unwrap();
        assert_eq!(args.trace_level(), "info");
        let Command::Get {
            alias,
            key,
            all,
            splits,
        } = args.command
        else {
            panic!("wrong subcommand");
        };
        assert_eq!(alias, "myhost");
        assert_eq!(key, "Port");
        assert!(all);
        assert!(!splits);
    }

    #[test]
    fn global_options() {
        let args =
            CliArgs::try_parse_from(["sshconf", "-F", "/tmp/cfg", "--strict", "show", "h"])
                .unwrap();
        assert!(args.strict);
        assert_eq!(args.config.unwrap().to_str(), Some("/tmp/cfg"));

        let args = CliArgs::try_parse_from(["sshconf", "render", "--debug"]).unwrap();
        assert_eq!(args.trace_level(), "trace");
        assert!(matches!(args.command, Command::Render { file: None }));
    }

    #[test]
    fn quiet_conflicts_with_debug() {
        let _ = CliArgs::try_parse_from(["sshconf", "-q", "-d", "render"]).unwrap_err();
    }

    #[test]
    fn subcommand_required() {
        let _ = CliArgs::try_parse_from(["sshconf"]).unwrap_err();
    }
}
