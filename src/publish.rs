use eyre::{Result, eyre};
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

const COMMIT_TITLE_CHARS: usize = 64;

/// Something that can run an external command and hand back its stdout.
///
/// Implementations return the trimmed stdout on success. On failure the error
/// message carries the command's own diagnostic text.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// An external command exited unsuccessfully (or could not start). Carries the
/// command's own diagnostic text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Command failed: {0}")]
pub struct CommandFailed(pub String);

/// Runs real processes in the current working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl CommandRunner for GitCli {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        debug!(program, ?args, "running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| CommandFailed(format!("{program}: {e}")))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let diagnostic = if stderr.is_empty() {
            format!("{} {} ({})", program, args.join(" "), output.status)
        } else {
            stderr.to_string()
        };
        Err(CommandFailed(diagnostic).into())
    }
}

pub fn commit_message(title: &str) -> String {
    let short: String = title.chars().take(COMMIT_TITLE_CHARS).collect();
    format!("Publish confirmed partner request: {short}")
}

/// Stage, commit and push `json_file` on the current branch.
///
/// Steps run strictly in order and the first failure aborts the rest. Nothing is
/// rolled back: a failed push leaves the local commit in place.
pub fn publish<R: CommandRunner>(
    runner: &R,
    json_file: &Path,
    title: &str,
    remote: &str,
) -> Result<String> {
    let branch = runner.run("git", &["branch", "--show-current"])?;
    if branch.is_empty() {
        return Err(eyre!("Unable to detect current git branch."));
    }
    debug!(%branch, "detected branch");

    let file = json_file.to_string_lossy();
    runner.run("git", &["add", file.as_ref()])?;

    let message = commit_message(title);
    runner.run("git", &["commit", "-m", message.as_str()])?;

    runner.run("git", &["push", "-u", remote, branch.as_str()])?;
    info!(%branch, remote, "published collection");
    Ok(branch)
}
