use anyhow::{Context, Result};
use clap::Parser;
use futures::channel::mpsc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relative_path::RelativePathBuf;
use std::{env, fs, path::PathBuf, process, thread, time::Duration};
use streamedit_config::{Config, PolicySetting, StreamSettings};
use streamedit_engine::{
    BlockPolicy, DocumentBuffer, DriverError, EditOutcome, SessionRegistry, StreamDriver,
    Workspace, io, run_stream,
};

mod preview;

/// Replay a SEARCH/REPLACE diff against a document as a paced stream
#[derive(Debug, Parser)]
#[command(name = "streamedit-cli")]
struct Args {
    /// Document to edit, relative to the workspace root
    #[arg(value_parser = parse_document)]
    document: RelativePathBuf,
    /// File holding the raw diff text
    diff_file: PathBuf,
    /// Workspace root; defaults to the config file's, then the current directory
    #[arg(long)]
    root: Option<PathBuf>,
    /// Show the document live while it is edited
    #[arg(long)]
    preview: bool,
    /// Stream every block as soon as it matches
    #[arg(long)]
    concurrent: bool,
    /// Seed for the chunk sizes, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_document(path: &str) -> Result<RelativePathBuf, String> {
    RelativePathBuf::from_path(path)
        .map_err(|e| format!("'{path}' must be relative to the workspace root: {e}"))
}

/// Cut `text` into pieces of `min_chunk..=max_chunk` characters
fn split_into_chunks(text: &str, settings: &StreamSettings, rng: &mut impl Rng) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut at = 0;
    while at < chars.len() {
        let len = rng
            .gen_range(settings.min_chunk..=settings.max_chunk)
            .min(chars.len() - at);
        chunks.push(chars[at..at + len].iter().collect());
        at += len;
    }
    chunks
}

/// Deliver chunks from a background thread, pausing between them
fn spawn_producer(chunks: Vec<String>, delay: Duration) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();
    thread::spawn(move || {
        for chunk in chunks {
            // Receiver gone: the edit finished or was cancelled
            if tx.unbounded_send(chunk).is_err() {
                break;
            }
            thread::sleep(delay);
        }
    });
    rx
}

fn block_policy(args: &Args, config: &Config) -> BlockPolicy {
    if args.concurrent {
        return BlockPolicy::Concurrent;
    }
    match config.driver.policy {
        PolicySetting::Sequential => BlockPolicy::Sequential,
        PolicySetting::Concurrent => BlockPolicy::Concurrent,
    }
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    // Log lines would tear the preview, so only warnings go through there
    let level = if args.preview {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", config_path.display());
            process::exit(1);
        }
    };

    let from_config = args.root.is_none() && config.workspace_root.is_some();
    let root = match args.root.clone().or_else(|| config.workspace_root.clone()) {
        Some(root) => root,
        None => env::current_dir()?,
    };
    if let Err(e) = io::validate_root_dir(&root) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!("Error: Workspace root '{}'{source} is invalid: {e}", root.display());
        process::exit(1);
    }

    let diff = fs::read_to_string(&args.diff_file)
        .with_context(|| format!("reading diff file {}", args.diff_file.display()))?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let chunks = split_into_chunks(&diff, &config.stream, &mut rng);
    log::info!(
        "streaming {} bytes of diff into {} as {} chunk(s)",
        diff.len(),
        args.document,
        chunks.len()
    );
    let rx = spawn_producer(chunks, Duration::from_millis(config.stream.delay_ms));

    let mut workspace = Workspace::new(&root);
    if let Err(e) = workspace.read(&args.document) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    let mut registry = SessionRegistry::new();
    let driver = StreamDriver::new(
        &mut registry,
        &mut workspace,
        args.document.clone(),
        block_policy(&args, &config),
    );

    let result = if args.preview {
        preview::run(driver, rx)?
    } else {
        futures::executor::block_on(run_stream(
            driver,
            rx,
            futures::future::pending(),
            |driver| {
                log::debug!(
                    "{} chunk(s), {} block(s) open",
                    driver.chunks_received(),
                    driver.sessions_opened()
                )
            },
        ))
    };

    report(&args, result);
    Ok(())
}

fn report(args: &Args, result: Result<EditOutcome, DriverError>) {
    match result {
        Ok(outcome) => {
            println!(
                "Applied {} block(s) to {} from {} chunk(s)",
                outcome.blocks, outcome.path, outcome.chunks
            );
        }
        Err(DriverError::Cancelled { path }) => {
            eprintln!("Cancelled: {path} left unchanged");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: editing {} failed: {e}", args.document);
            process::exit(1);
        }
    }
}
