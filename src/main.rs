use clap::Parser;
use eyre::{Context, Result, eyre};
use partner_intake::collection::{Placement, merge_into_file};
use partner_intake::fields::FieldMap;
use partner_intake::input::{InputSource, read_submission};
use partner_intake::publish::{GitCli, publish};
use partner_intake::record::build_record;
use partner_intake::utils::{self, IntakeConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Create a partner JSON block from a Telegram application message.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Message text with the application fields.
    #[arg(long, value_name = "TEXT")]
    message: Option<String>,

    /// Path to a text file with the message.
    /// Stdin is read when neither --message nor --input-file is given.
    #[arg(long, value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Target collection file.
    /// Defaults to ./confirmed-partners.json if not set in config.
    #[arg(long, value_name = "PATH")]
    json_file: Option<PathBuf>,

    /// Status label for the generated item (default: Подтверждено).
    #[arg(long, value_name = "LABEL")]
    status: Option<String>,

    /// Source label used in the note and the collection (default: Telegram).
    #[arg(long, value_name = "LABEL")]
    source: Option<String>,

    /// Git remote to push to when publishing (default: origin).
    #[arg(long, value_name = "NAME")]
    remote: Option<String>,

    /// Add the generated item to the collection file and update updatedAt.
    #[arg(long)]
    append: bool,

    /// After appending, git add/commit/push the current branch (implies --append).
    #[arg(long)]
    publish: bool,

    /// When appending, insert the new item at the top of the list.
    #[arg(long)]
    prepend: bool,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/partner-intake/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log each pipeline step to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Only print errors; skip the generated block on stdout.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    json_file: Option<PathBuf>,
    status: Option<String>,
    source: Option<String>,
    remote: Option<String>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("partner-intake/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // 1. Pick the input before touching anything else
    let input = InputSource::from_args(cli.message, cli.input_file)?;

    // 2. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 3. Resolve settings (CLI > Config > Default)
    let defaults = IntakeConfig::default();
    let config = IntakeConfig {
        json_file: cli.json_file.or(file_cfg.json_file).unwrap_or(defaults.json_file),
        status: cli.status.or(file_cfg.status).unwrap_or(defaults.status),
        source: cli.source.or(file_cfg.source).unwrap_or(defaults.source),
        remote: cli.remote.or(file_cfg.remote).unwrap_or(defaults.remote),
        append: cli.append,
        publish: cli.publish,
        placement: if cli.prepend {
            Placement::Prepend
        } else {
            Placement::Append
        },
        quiet: cli.quiet,
    };

    // 4. Text -> fields -> record
    let submission = read_submission(input)?;
    let fields = FieldMap::parse(&submission.text);
    let record = build_record(&fields, &config.status, &config.source);

    if !config.quiet {
        println!("Generated JSON block:");
        println!("{}", utils::format_json_pretty(&record)?);
    }

    if !config.should_merge() {
        return Ok(());
    }

    // 5. Merge into the collection
    let today = chrono::Local::now().date_naive();
    let count = merge_into_file(
        &config.json_file,
        &record,
        config.placement,
        &config.source,
        today,
    )?;
    if !config.quiet {
        println!();
        println!(
            "Updated file: {} (items: {})",
            config.json_file.display(),
            count
        );
    }

    // 6. Publish
    if config.publish {
        publish(&GitCli, &config.json_file, &record.title, &config.remote)?;
        if !config.quiet {
            println!("Published: git add + commit + push completed.");
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", utils::error_line(&e));
            ExitCode::FAILURE
        }
    }
}
