use eyre::{Context, Result, eyre};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing::debug;

const PROMPT: &str = "Вставьте текст заявки из Telegram и нажмите \
                      Ctrl+D (Linux/macOS) или Ctrl+Z Enter (Windows):";

/// Where the message text comes from. Exactly one source per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Inline(String),
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Inline,
    File,
    Stream,
}

/// The message text as received, before any field extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSubmission {
    pub origin: Origin,
    /// Trimmed, never empty.
    pub text: String,
}

impl InputSource {
    /// Pick the source from the `--message` / `--input-file` pair. Neither means stdin.
    pub fn from_args(message: Option<String>, input_file: Option<PathBuf>) -> Result<Self> {
        match (message, input_file) {
            (Some(_), Some(_)) => Err(eyre!("Use either --message or --input-file, not both.")),
            (Some(message), None) => Ok(Self::Inline(message)),
            (None, Some(path)) => Ok(Self::File(path)),
            (None, None) => Ok(Self::Stdin),
        }
    }
}

/// Read the submission from the process's stdin, prompting first if it is a terminal.
pub fn read_submission(source: InputSource) -> Result<RawSubmission> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    read_submission_from(source, stdin.lock(), interactive)
}

/// Same as [`read_submission`] with the stream injected.
pub fn read_submission_from<R: Read>(
    source: InputSource,
    mut stream: R,
    interactive: bool,
) -> Result<RawSubmission> {
    let (origin, raw) = match source {
        InputSource::Inline(text) => (Origin::Inline, text),
        InputSource::File(path) => {
            let text = fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read input file: {}", path.display()))?;
            (Origin::File, text)
        }
        InputSource::Stdin => {
            if interactive {
                eprintln!("{PROMPT}");
            }
            let mut text = String::new();
            stream
                .read_to_string(&mut text)
                .wrap_err("Failed to read message from stdin")?;
            (Origin::Stream, text)
        }
    };

    let text = raw.trim();
    if text.is_empty() {
        return Err(eyre!(
            "Empty input: provide the message via --message, --input-file or stdin."
        ));
    }
    debug!(?origin, chars = text.chars().count(), "read submission");
    Ok(RawSubmission {
        origin,
        text: text.to_string(),
    })
}
