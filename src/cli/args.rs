//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Composer Layer - cached Composer dependencies for buildpack builds
///
/// Installs an app's Composer packages into a reusable layer and links it
/// into the app as its vendor directory.
#[derive(Parser, Debug)]
#[command(name = "composer-layer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the app uses Composer and write a build plan
    Detect(DetectArgs),

    /// Install packages into the packages layer and publish them
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// App source directory (defaults to the current directory)
    #[arg(short = 'w', long)]
    pub working_dir: Option<PathBuf>,

    /// Where to write the build plan
    #[arg(long, env = "CNB_BUILD_PLAN_PATH")]
    pub plan: PathBuf,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// App source directory (defaults to the current directory)
    #[arg(short = 'w', long)]
    pub working_dir: Option<PathBuf>,

    /// Root directory for layers
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,

    /// Resolved buildpack plan; missing means no layer type requests
    #[arg(long, env = "CNB_BP_PLAN_PATH")]
    pub plan: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build() {
        let cli = Cli::parse_from([
            "composer-layer",
            "-vv",
            "build",
            "--working-dir",
            "/workspace",
            "--layers",
            "/layers",
            "--plan",
            "/plan.toml",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.working_dir, Some(PathBuf::from("/workspace")));
                assert_eq!(args.layers, PathBuf::from("/layers"));
                assert_eq!(args.plan, Some(PathBuf::from("/plan.toml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_detect() {
        let cli = Cli::parse_from(["composer-layer", "detect", "--plan", "/plan.toml"]);
        match cli.command {
            Commands::Detect(args) => {
                assert_eq!(args.working_dir, None);
                assert_eq!(args.plan, PathBuf::from("/plan.toml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
