//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Replay add/remove/move scripts against a rooted, cycle-free tree
#[derive(Parser, Debug)]
#[command(name = "fstree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding `.fstree.toml` (default: the script's directory)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a script and show the resulting tree
    Run {
        /// Mutation script
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Continue after a rejected mutation
        #[arg(short, long)]
        keep_going: bool,
        /// Apply all mutations or none
        #[arg(short, long, conflicts_with = "keep_going")]
        atomic: bool,
        /// Check every tree invariant after each mutation
        #[arg(long)]
        verify: bool,
        /// Do not print the final tree
        #[arg(long)]
        no_tree: bool,
        /// Print a structural digest of the final tree
        #[arg(long)]
        digest: bool,
    },

    /// Replay scripts in parallel and report which ones are clean
    Check {
        /// Mutation scripts
        #[arg(required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
        scripts: Vec<PathBuf>,
    },

    /// Print the path from a node to the root after replaying a script
    Path {
        /// Mutation script
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Node to trace
        node: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a commented template
    Template,
    /// Show config file locations
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_repeated_debug_flags_when_parsing_then_counts_them() {
        let cli = Cli::parse_from(["fstree", "-dd", "run", "x.fst", "--keep-going"]);
        assert_eq!(cli.debug, 2);
        assert!(matches!(
            cli.command,
            Some(Commands::Run { keep_going: true, atomic: false, .. })
        ));
    }

    #[test]
    fn given_atomic_and_keep_going_when_parsing_then_conflicts() {
        let res = Cli::try_parse_from(["fstree", "run", "x.fst", "--atomic", "--keep-going"]);
        assert!(res.is_err());
    }
}
