use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Simple, file-backed task manager.
/// Storage defaults to ~/.taskman/tasks.json or a path passed via --db.
/// Run without a command to start the interactive shell.
#[derive(Parser, Debug)]
#[command(name = "tm", version, about = "Personal task manager")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true, env = "TASKMAN_DB")]
    pub db: Option<PathBuf>,

    /// Disable coloured output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
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
    fn test_no_subcommand_means_shell() {
        let cli = Cli::try_parse_from(["tm", "--no-color"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.no_color);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tm", "list", "--db", "/tmp/x.json", "-vv"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.json")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::List { .. })));
    }
}
