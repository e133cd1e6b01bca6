//! modpub - publish Go modules from the command line
//!
//! Bumps the `//v` version annotation on the `module` line of `go.mod`,
//! commits, tags and pushes the release with git, and then asks the Go
//! module proxy to list the new version.

mod modfile;
mod publish;

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use modpub_core::{DecideConfig, NumericPolicy};
use publish::{PublishConfig, Publisher, SystemRunner};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

const ACTIONS_HELP: &str = "\
Actions:
  h, help      Display this help message
  v, version   Display the current version
  p, patch     Publish changes as the next patch version
  v#.#.#       Publish changes as the specified version

On publish, all changes are committed and pushed to the remote as the
new version. The module is then tagged and the new version is listed
on the module proxy.";

/// Publish Go modules: bump the go.mod version, tag, push and list it
#[derive(Parser, Debug)]
#[command(name = "modpub")]
#[command(author, version, about, long_about = None)]
#[command(after_help = ACTIONS_HELP)]
struct Cli {
    /// What to do: help, version, patch, or v<version>
    action: Option<String>,

    /// Module file to read and rewrite
    #[arg(short, long, env = "MODPUB_FILE", default_value = "go.mod")]
    file: PathBuf,

    /// Git remote to push the commit and tag to
    #[arg(long, env = "MODPUB_REMOTE", default_value = "origin")]
    remote: String,

    /// Branch to push after the tag
    #[arg(long, env = "MODPUB_BRANCH", default_value = "main")]
    branch: String,

    /// GOPROXY used to list the published version
    #[arg(long, env = "MODPUB_PROXY", default_value = "proxy.golang.org")]
    proxy: String,

    /// Skip listing the version on the module proxy
    #[arg(long)]
    skip_proxy: bool,

    /// Dry run - don't write the module file or run any command
    #[arg(long)]
    dry_run: bool,

    /// Read version components that are not numbers as 0
    #[arg(long)]
    lenient_versions: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn publish_config(&self) -> PublishConfig {
        let policy = if self.lenient_versions {
            NumericPolicy::Lenient
        } else {
            NumericPolicy::Strict
        };

        PublishConfig {
            file: self.file.clone(),
            remote: self.remote.clone(),
            branch: self.branch.clone(),
            proxy: (!self.skip_proxy).then(|| self.proxy.clone()),
            decide: DecideConfig::new().policy(policy),
            dry_run: self.dry_run,
        }
    }
}

/// What the positional argument asks for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Help,
    Version,
    /// Publish a given version, or the next patch when `None`
    Publish(Option<String>),
    Invalid(String),
}

fn parse_action(word: Option<&str>) -> Action {
    match word {
        None | Some("h" | "help") => Action::Help,
        Some("v" | "version") => Action::Version,
        Some("p" | "patch") => Action::Publish(None),
        Some(word) => match word.strip_prefix('v') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                Action::Publish(Some(rest.to_string()))
            }
            _ => Action::Invalid(word.to_string()),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match parse_action(cli.action.as_deref()) {
        Action::Help => {
            Cli::command().print_help()?;
            Ok(())
        }
        Action::Version => {
            println!("modpub v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Action::Invalid(word) => {
            bail!("Invalid command '{word}'. Use 'modpub help' for usage.")
        }
        Action::Publish(requested) => {
            let stdout = std::io::stdout();
            let mut publisher = Publisher::new(cli.publish_config(), SystemRunner, stdout.lock());
            let published = publisher.publish(requested.as_deref())?;
            debug!("Released {}@v{}", published.module, published.version);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action(None), Action::Help);
        assert_eq!(parse_action(Some("h")), Action::Help);
        assert_eq!(parse_action(Some("help")), Action::Help);
        assert_eq!(parse_action(Some("v")), Action::Version);
        assert_eq!(parse_action(Some("version")), Action::Version);
        assert_eq!(parse_action(Some("p")), Action::Publish(None));
        assert_eq!(parse_action(Some("patch")), Action::Publish(None));
        assert_eq!(
            parse_action(Some("v1.2.3")),
            Action::Publish(Some("1.2.3".to_string()))
        );
        // Syntax is checked later, by version decision.
        assert_eq!(
            parse_action(Some("v1.x")),
            Action::Publish(Some("1.x".to_string()))
        );
        assert_eq!(parse_action(Some("vx")), Action::Invalid("vx".to_string()));
        assert_eq!(parse_action(Some("1.2.3")), Action::Invalid("1.2.3".to_string()));
    }

    #[test]
    fn test_publish_config_from_flags() {
        let cli = Cli::parse_from([
            "modpub",
            "patch",
            "--file",
            "sub/go.mod",
            "--skip-proxy",
            "--lenient-versions",
            "--dry-run",
        ]);
        let config = cli.publish_config();

        assert_eq!(config.file, PathBuf::from("sub/go.mod"));
        assert_eq!(config.remote, "origin");
        assert_eq!(config.branch, "main");
        assert_eq!(config.proxy, None);
        assert_eq!(config.decide.policy, NumericPolicy::Lenient);
        assert!(config.dry_run);
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
