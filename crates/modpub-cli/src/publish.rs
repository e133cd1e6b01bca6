//! The publish workflow: bump, persist, commit, tag, push, list.

use crate::modfile;
use anyhow::{bail, Context, Result};
use modpub_core::{decide_with, parse_module, update_declaration, DecideConfig, Version};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

const PARSE_HINT: &str = "Could not parse the module file. Ensure you are in the correct directory and have a go.mod file";

/// Settings for one publish run
#[derive(Debug, Clone)]
pub(crate) struct PublishConfig {
    /// Module file to rewrite
    pub(crate) file: PathBuf,
    /// Git remote to push to
    pub(crate) remote: String,
    /// Branch pushed after the tag
    pub(crate) branch: String,
    /// `GOPROXY` for the listing step, `None` to skip it
    pub(crate) proxy: Option<String>,
    /// Version acceptance rules
    pub(crate) decide: DecideConfig,
    /// Print what would happen without writing or running anything
    pub(crate) dry_run: bool,
}

/// An external command with the message shown when it fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandSpec {
    pub(crate) program: &'static str,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(&'static str, String)>,
    pub(crate) failure: &'static str,
}

impl CommandSpec {
    fn new(program: &'static str, args: &[&str], failure: &'static str) -> Self {
        Self {
            program,
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
            failure,
        }
    }

    fn env(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.env.push((key, value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands for the workflow
pub(crate) trait CommandRunner {
    /// Runs the command to completion, failing on a non-zero exit
    fn run(&mut self, command: &CommandSpec) -> Result<()>;
}

/// Runs commands as child processes
pub(crate) struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &CommandSpec) -> Result<()> {
        debug!("Running: {}", command);
        let output = Command::new(command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (*k, v.as_str())))
            .output()
            .with_context(|| format!("Failed to start `{command}`"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("`{}` exited with {}: {}", command, output.status, stderr.trim());
        }
        Ok(())
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Published {
    pub(crate) module: String,
    pub(crate) version: Version,
}

/// Drives the workflow, reporting progress to `out`
pub(crate) struct Publisher<R, W> {
    config: PublishConfig,
    runner: R,
    out: W,
}

impl<R: CommandRunner, W: Write> Publisher<R, W> {
    pub(crate) fn new(config: PublishConfig, runner: R, out: W) -> Self {
        Self {
            config,
            runner,
            out,
        }
    }

    /// Publishes `requested`, or the next patch version when `None`.
    pub(crate) fn publish(&mut self, requested: Option<&str>) -> Result<Published> {
        writeln!(self.out, "Preparing to publish.")?;
        let file = self.config.file.clone();

        write!(self.out, "Parsing {}: ", file.display())?;
        let parsed = modfile::read(&file).and_then(|data| {
            let declaration = parse_module(&data)?;
            Ok((data, declaration))
        });
        let (data, declaration) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                writeln!(self.out, "failed.")?;
                return Err(e.context(PARSE_HINT));
            }
        };
        writeln!(
            self.out,
            "done. (module: {}, version: {})",
            declaration.name, declaration.version
        )?;

        let requested = requested.unwrap_or("");
        let version = decide_with(&declaration.version, requested, &self.config.decide)
            .with_context(|| {
                if requested.is_empty() {
                    format!("Could not bump version {}", declaration.version)
                } else {
                    format!("Invalid version: {requested}")
                }
            })?;
        writeln!(self.out, "New version: {version}")?;

        write!(self.out, "Updating {}: ", file.display())?;
        let updated = update_declaration(&data, &declaration, version.as_str())
            .context("Could not update the module file")?;
        if self.config.dry_run {
            writeln!(self.out, "skipped (dry run).")?;
        } else {
            if let Err(e) = modfile::write_atomic(&file, &updated) {
                writeln!(self.out, "failed.")?;
                return Err(e.context("Could not update the module file"));
            }
            writeln!(self.out, "done.")?;
        }

        self.run_step("Committing changes", self.git_commands(&version))?;

        if let Some(proxy) = &self.config.proxy {
            let list = CommandSpec::new(
                "go",
                &["list", "-m", &format!("{}@v{}", declaration.name, version)],
                "Could not list version on GOPROXY",
            )
            .env("GOPROXY", proxy.as_str());
            self.run_step("Listing version on GOPROXY", vec![list])?;
        }

        writeln!(self.out, "Your module has been published.")?;
        info!("Published {} v{}", declaration.name, version);

        Ok(Published {
            module: declaration.name,
            version,
        })
    }

    fn git_commands(&self, version: &Version) -> Vec<CommandSpec> {
        let tag = format!("v{version}");
        let remote = self.config.remote.as_str();
        vec![
            CommandSpec::new("git", &["add", "."], "Could not add files to git"),
            CommandSpec::new("git", &["commit", "-m", &tag], "Could not commit changes"),
            CommandSpec::new("git", &["tag", &tag], "Could not tag version"),
            CommandSpec::new("git", &["push", remote, &tag], "Could not push the tag"),
            CommandSpec::new(
                "git",
                &["push", remote, &self.config.branch],
                "Could not push changes",
            ),
        ]
    }

    fn run_step(&mut self, label: &str, commands: Vec<CommandSpec>) -> Result<()> {
        if self.config.dry_run {
            writeln!(self.out, "{label}: skipped (dry run).")?;
            for command in &commands {
                writeln!(self.out, "  would run: {command}")?;
            }
            return Ok(());
        }

        write!(self.out, "{label}: ")?;
        for command in &commands {
            if let Err(e) = self.runner.run(command) {
                writeln!(self.out, "failed.")?;
                return Err(e.context(command.failure));
            }
        }
        writeln!(self.out, "done.")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpub_core::NumericPolicy;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const GO_MOD: &str = "// widget does things\nmodule example.com/widget //v0.1.0\n\ngo 1.21\n";

    #[derive(Default)]
    struct RecordingRunner {
        commands: Vec<String>,
        fail_program_arg: Option<&'static str>,
    }

    impl CommandRunner for &mut RecordingRunner {
        fn run(&mut self, command: &CommandSpec) -> Result<()> {
            self.commands.push(command.to_string());
            if let Some(arg) = self.fail_program_arg {
                if command.args.first().map(String::as_str) == Some(arg) {
                    bail!("simulated failure");
                }
            }
            Ok(())
        }
    }

    fn setup(content: &str) -> (TempDir, PublishConfig) {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("go.mod");
        fs::write(&file, content).unwrap();
        let config = PublishConfig {
            file,
            remote: "origin".to_string(),
            branch: "main".to_string(),
            proxy: Some("proxy.golang.org".to_string()),
            decide: DecideConfig::default(),
            dry_run: false,
        };
        (temp_dir, config)
    }

    #[test]
    fn test_publish_next_patch() {
        let (_dir, config) = setup(GO_MOD);
        let file = config.file.clone();
        let mut runner = RecordingRunner::default();
        let mut out = Vec::new();

        let published = Publisher::new(config, &mut runner, &mut out)
            .publish(None)
            .unwrap();

        assert_eq!(published.module, "example.com/widget");
        assert_eq!(published.version.as_str(), "0.1.1");
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "// widget does things\nmodule example.com/widget //v0.1.1\n\ngo 1.21\n"
        );
        assert_eq!(
            runner.commands,
            vec![
                "git add .",
                "git commit -m v0.1.1",
                "git tag v0.1.1",
                "git push origin v0.1.1",
                "git push origin main",
                "GOPROXY=proxy.golang.org go list -m example.com/widget@v0.1.1",
            ]
        );

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("done. (module: example.com/widget, version: 0.1.0)"));
        assert!(out.contains("New version: 0.1.1"));
        assert!(out.ends_with("Your module has been published.\n"));
    }

    #[test]
    fn test_publish_inserts_missing_annotation() {
        let (_dir, mut config) = setup("module example.com/widget\n\ngo 1.21\n");
        config.proxy = None;
        let file = config.file.clone();
        let mut runner = RecordingRunner::default();

        Publisher::new(config, &mut runner, Vec::new())
            .publish(Some("1.0.0"))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "module example.com/widget //v1.0.0\n\ngo 1.21\n"
        );
        assert_eq!(runner.commands.len(), 5);
    }

    #[test]
    fn test_rejected_version_changes_nothing() {
        let (_dir, config) = setup(GO_MOD);
        let file = config.file.clone();
        let mut runner = RecordingRunner::default();

        let err = Publisher::new(config, &mut runner, Vec::new())
            .publish(Some("0.0.9"))
            .unwrap_err();

        assert!(err.to_string().contains("Invalid version: 0.0.9"));
        assert_eq!(fs::read_to_string(&file).unwrap(), GO_MOD);
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn test_lenient_policy_is_forwarded() {
        let (_dir, mut config) = setup("module x\n");
        config.proxy = None;
        let mut runner = RecordingRunner::default();

        let err = Publisher::new(config.clone(), &mut runner, Vec::new())
            .publish(Some("1..00"))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid version: 1..00"));

        config.decide = DecideConfig::new().policy(NumericPolicy::Lenient);
        let published = Publisher::new(config, &mut runner, Vec::new())
            .publish(Some("1..00"))
            .unwrap();
        assert_eq!(published.version.as_str(), "1..00");
    }

    #[test]
    fn test_failed_bump_names_current_version() {
        let (_dir, config) = setup("module x //v0.0.18446744073709551615\n");
        let file = config.file.clone();
        let mut runner = RecordingRunner::default();

        let err = Publisher::new(config, &mut runner, Vec::new())
            .publish(None)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Could not bump version 0.0.18446744073709551615"
        );
        assert!(runner.commands.is_empty());
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "module x //v0.0.18446744073709551615\n"
        );
    }

    #[test]
    fn test_dry_run_writes_and_runs_nothing() {
        let (_dir, mut config) = setup(GO_MOD);
        config.dry_run = true;
        let file = config.file.clone();
        let mut runner = RecordingRunner::default();
        let mut out = Vec::new();

        Publisher::new(config, &mut runner, &mut out)
            .publish(Some("0.2.0"))
            .unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), GO_MOD);
        assert!(runner.commands.is_empty());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("would run: git tag v0.2.0"));
        assert!(out.contains("would run: GOPROXY=proxy.golang.org go list -m example.com/widget@v0.2.0"));
    }

    #[test]
    fn test_missing_module_file() {
        let (dir, mut config) = setup(GO_MOD);
        config.file = dir.path().join("missing.mod");
        let mut runner = RecordingRunner::default();
        let mut out = Vec::new();

        let err = Publisher::new(config, &mut runner, &mut out)
            .publish(None)
            .unwrap_err();

        assert!(err.to_string().contains("Ensure you are in the correct directory"));
        assert!(String::from_utf8(out).unwrap().contains("failed."));
    }

    #[test]
    fn test_file_without_module_line() {
        let (_dir, config) = setup("go 1.21\n");
        let mut runner = RecordingRunner::default();

        let err = Publisher::new(config, &mut runner, Vec::new())
            .publish(None)
            .unwrap_err();

        assert!(err.to_string().contains("Could not parse the module file"));
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn test_failed_command_stops_workflow() {
        let (_dir, config) = setup(GO_MOD);
        let mut runner = RecordingRunner {
            fail_program_arg: Some("tag"),
            ..Default::default()
        };

        let err = Publisher::new(config, &mut runner, Vec::new())
            .publish(None)
            .unwrap_err();

        assert_eq!(err.to_string(), "Could not tag version");
        assert_eq!(runner.commands.last().unwrap(), "git tag v0.1.1");
        assert_eq!(runner.commands.len(), 3);
    }
}
