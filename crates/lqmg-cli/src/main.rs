//! LQMG configuration inspector.
//!
//! Loads the main configuration document and the documents contributed by
//! bundle directories into one merge store, then reports on the merged
//! state:
//! - `check`: ingest everything and print partition sizes
//! - `resolve`: print the generation target of one table
//! - `snapshot`: print the merged state as JSON

mod exit_codes;
mod logging;

use clap::{Args, Parser, Subcommand};
use exit_codes::ExitCode;
use logging::{init_logging, LogConfig, LogFormat, LogLevel};
use lqmg_config::{
    BundleId, ConfigError, ConfigKey, ConfigPath, ConfigSnapshot, ConfigurationContainer,
    FsDocumentProvider, TargetSource, DEFAULT_RESOURCE,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Merge and inspect LQMG configuration documents
#[derive(Parser, Debug)]
#[command(name = "lqmg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Minimum log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest all documents and report partition sizes
    Check(CheckArgs),
    /// Print the generation target for one table
    Resolve(ResolveArgs),
    /// Print the merged configuration as a JSON snapshot
    Snapshot(SnapshotArgs),
}

/// Where configuration documents come from
#[derive(Args, Debug)]
struct SourceArgs {
    /// Main (global) configuration document
    #[arg(long, value_name = "FILE", env = "LQMG_MAIN")]
    main: Option<PathBuf>,

    /// Bundle directory contributing a document (repeatable)
    #[arg(long = "bundle", value_name = "ID=DIR", value_parser = parse_bundle)]
    bundles: Vec<(BundleId, PathBuf)>,

    /// Resource path of the document inside each bundle directory
    #[arg(long, value_name = "PATH", default_value = DEFAULT_RESOURCE)]
    resource: String,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Schema the table belongs to
    #[arg(long)]
    schema: Option<String>,

    /// Table (entity) name
    entity: String,

    /// Print the target as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[command(flatten)]
    source: SourceArgs,
}

fn parse_bundle(s: &str) -> Result<(BundleId, PathBuf), String> {
    let (id, dir) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=DIR, got '{}'", s))?;
    if id.is_empty() || dir.is_empty() {
        return Err(format!("expected ID=DIR, got '{}'", s));
    }
    Ok((BundleId::new(id), PathBuf::from(dir)))
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Resolve(args) => run_resolve(&args),
        Commands::Snapshot(args) => run_snapshot(&args),
    };

    let exit_code = exit_code.unwrap_or_else(|err| {
        eprintln!("error: {}", err);
        ExitCode::from(&err)
    });
    if exit_code.is_error() {
        debug!(exit_code = %exit_code, "Exiting with error");
    }
    std::process::exit(exit_code.as_i32());
}

/// Register the main document first, then bundles in command-line order.
fn load(source: &SourceArgs) -> Result<ConfigurationContainer, ConfigError> {
    let mut provider = FsDocumentProvider::new();
    let mut paths = Vec::new();

    if let Some(main) = &source.main {
        let (root, resource) = split_main(main);
        provider = provider.with_main_root(root);
        paths.push(ConfigPath::main(resource));
    }
    for (bundle, dir) in &source.bundles {
        provider = provider.with_bundle(bundle.clone(), dir.clone());
        paths.push(ConfigPath::bundle(bundle.clone(), source.resource.as_str()));
    }

    let mut container = ConfigurationContainer::new();
    for path in &paths {
        container.add_from_provider(&provider, path)?;
    }
    info!(documents = paths.len(), "Configuration loaded");
    Ok(container)
}

/// Split a main document path into the directory used as provider root and
/// the file name used as resource.
fn split_main(file: &Path) -> (PathBuf, String) {
    let root = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let resource = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (root, resource)
}

fn run_check(args: &CheckArgs) -> Result<ExitCode, ConfigError> {
    if let Some(code) = require_source(&args.source) {
        return Ok(code);
    }
    let container = load(&args.source)?;
    let stats = container.stats();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats);
    }
    Ok(ExitCode::Clean)
}

fn run_resolve(args: &ResolveArgs) -> Result<ExitCode, ConfigError> {
    if let Some(code) = require_source(&args.source) {
        return Ok(code);
    }
    let mut container = load(&args.source)?;

    let Some(target) = container.resolve_target(args.schema.as_deref(), &args.entity) else {
        let key = ConfigKey::new(args.schema.clone(), args.entity.as_str());
        eprintln!("no configuration for {}", key);
        return Ok(ExitCode::NotFound);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&target)?);
    } else {
        let source = match target.source {
            TargetSource::Entity => "entity",
            TargetSource::NamingRule => "naming rule",
        };
        println!("entity:  {}", target.entity);
        println!("package: {}", target.package.as_deref().unwrap_or("<none>"));
        println!("schema:  {}", target.schema.as_deref().unwrap_or("<none>"));
        println!("source:  {}", source);
        println!("defined: {}", target.provenance);
    }
    Ok(ExitCode::Clean)
}

fn run_snapshot(args: &SnapshotArgs) -> Result<ExitCode, ConfigError> {
    if let Some(code) = require_source(&args.source) {
        return Ok(code);
    }
    let container = load(&args.source)?;
    let snapshot = ConfigSnapshot::capture(&container)?;
    debug!(id = snapshot.short_id(), "Snapshot captured");
    println!("{}", snapshot.to_json()?);
    Ok(ExitCode::Clean)
}

fn require_source(source: &SourceArgs) -> Option<ExitCode> {
    if source.main.is_none() && source.bundles.is_empty() {
        eprintln!("error: no configuration documents given (use --main or --bundle)");
        return Some(ExitCode::ArgsError);
    }
    None
}
