//! CLI entry point for `maildoc`.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use maildoc::config::Config;
use maildoc::index::batch::{self, BatchItem};
use maildoc::{
    DefaultTextExtractor, DocumentBuilder, Flags, IndexAttachments, MaildocError, MessageUid,
    RawMessage,
};

#[derive(Parser)]
#[command(
    name = "maildoc",
    version,
    about = "Build full-text search documents from raw email messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Options shared by the commands that build documents.
#[derive(clap::Args)]
struct BuildOptions {
    /// Mailbox identifier stored in the documents
    #[arg(long)]
    mailbox: Option<String>,

    /// Owner of the mailbox (repeatable)
    #[arg(long = "user", value_name = "USER")]
    users: Vec<String>,

    /// IANA time zone for document dates (overrides the config file)
    #[arg(long, env = "MAILDOC_TZ")]
    zone: Option<String>,

    /// Extract text from attachments
    #[arg(long)]
    attachments: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the document for a single .eml file and print it as JSON
    Build {
        path: PathBuf,
        /// Message UID
        #[arg(long, default_value_t = 1)]
        uid: u32,
        /// IMAP flag such as '\Seen' or '$Work' (repeatable)
        #[arg(long = "flag", value_name = "FLAG")]
        flags: Vec<String>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
        #[command(flatten)]
        options: BuildOptions,
    },
    /// Build documents for every .eml file in a directory (JSON lines)
    Index {
        dir: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Worker threads
        #[arg(short, long, default_value_t = default_threads())]
        threads: usize,
        #[command(flatten)]
        options: BuildOptions,
    },
    /// Show the config file location and the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = maildoc::config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Build {
            path,
            uid,
            flags,
            pretty,
            options,
        } => cmd_build(&path, uid, &flags, pretty, &options, &config),
        Commands::Index {
            dir,
            output,
            threads,
            options,
        } => cmd_index(&dir, output.as_deref(), threads, &options, &config),
        Commands::Config { init } => cmd_config(init, &config),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = maildoc::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "maildoc.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Builder configured from the config file, with CLI overrides applied.
fn make_builder(
    options: &BuildOptions,
    config: &Config,
) -> anyhow::Result<DocumentBuilder<DefaultTextExtractor>> {
    let zone = match &options.zone {
        Some(name) => maildoc::parse_zone(name)?,
        None => config.indexing.zone()?,
    };
    let policy = if options.attachments {
        IndexAttachments::Yes
    } else {
        config.indexing.index_attachments
    };
    Ok(DocumentBuilder::new(DefaultTextExtractor, zone, policy)
        .with_max_attachment_size(config.indexing.max_attachment_size))
}

/// Read an .eml file; its modification time stands in for the internal date.
fn read_message(path: &Path, mailbox: &str, uid: u32) -> maildoc::Result<RawMessage> {
    let content = std::fs::read(path).map_err(|e| MaildocError::io(path, e))?;
    let internal_date = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH));
    Ok(RawMessage::new(mailbox, MessageUid(uid), content).with_internal_date(internal_date))
}

/// Mailbox stored in the documents when `--mailbox` is not given.
const DEFAULT_MAILBOX: &str = "INBOX";

fn mailbox_id(options: &BuildOptions) -> &str {
    options.mailbox.as_deref().unwrap_or(DEFAULT_MAILBOX)
}

fn cmd_build(
    path: &Path,
    uid: u32,
    flags: &[String],
    pretty: bool,
    options: &BuildOptions,
    config: &Config,
) -> anyhow::Result<()> {
    let builder = make_builder(options, config)?;
    let message = read_message(path, mailbox_id(options), uid)?
        .with_flags(Flags::from_atoms(flags.iter().map(String::as_str)));

    let doc = builder.build(&message, &options.users);
    let json = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        doc.to_json()?
    };
    println!("{json}");
    Ok(())
}

fn cmd_index(
    dir: &Path,
    output: Option<&Path>,
    threads: usize,
    options: &BuildOptions,
    config: &Config,
) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let builder = make_builder(options, config)?;
    let mailbox = mailbox_id(options);

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| MaildocError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
        })
        .collect();
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        match read_message(path, mailbox, i as u32 + 1) {
            Ok(message) => items.push(BatchItem {
                message,
                users: options.users.clone(),
            }),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }

    let pb = ProgressBar::new(items.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Building [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let docs = batch::build_batch(
        &builder,
        &items,
        threads,
        Some(&|done: usize, _: usize| {
            pb.set_position(done as u64);
            true
        }),
    );
    pb.finish_and_clear();

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path).map_err(|e| MaildocError::io(path, e))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut written = 0;
    let mut with_attachments = 0;
    for (item, doc) in items.iter().zip(&docs) {
        match doc {
            Some(doc) => {
                writeln!(out, "{}", doc.to_json()?)?;
                written += 1;
                if doc.has_attachment() {
                    with_attachments += 1;
                }
            }
            None => tracing::warn!(uid = %item.message.uid, "No document built"),
        }
    }
    out.flush()?;

    eprintln!(
        "Built {} of {} documents ({} with attachments) in {:.2?}",
        written,
        items.len(),
        with_attachments,
        start.elapsed()
    );
    Ok(())
}

fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    let path = maildoc::config::config_file_path();
    if init {
        let defaults = Config::default();
        maildoc::config::save_config(&defaults)?;
        if let Some(path) = &path {
            eprintln!("Wrote default configuration to {}", path.display());
        }
        return Ok(());
    }

    match &path {
        Some(path) if path.exists() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not found, using defaults)", path.display()),
        None => println!("# no config location, using defaults"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "maildoc", &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> BuildOptions {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Build { options, .. } | Commands::Index { options, .. } => options,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_build_and_index_share_mailbox_default() {
        let build = options(&["maildoc", "build", "msg.eml"]);
        let index = options(&["maildoc", "index", "Archive"]);
        assert_eq!(mailbox_id(&build), DEFAULT_MAILBOX);
        assert_eq!(mailbox_id(&index), DEFAULT_MAILBOX);

        let named = options(&["maildoc", "index", "Archive", "--mailbox", "42"]);
        assert_eq!(mailbox_id(&named), "42");
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
