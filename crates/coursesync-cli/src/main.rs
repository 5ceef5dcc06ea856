//! Coursesync CLI
//!
//! Bulk-imports "course + single page" rows from a delimited file:
//! - `import`: reconcile the source against a store and report each line
//! - `headers`: show how source columns map onto import fields

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use coursesync_core::{ColumnMapping, ImportField, REQUIRED_FIELD_COUNT};
use coursesync_import::{
    ImportError, ImportOrchestrator, ImportReport, PlainTextSink, RunSummary, SourceTable,
    StructuredSink,
};
use coursesync_storage::{snapshot, MemoryBackend};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::{load_mapping, OptionOverrides};

#[derive(Parser)]
#[command(name = "coursesync")]
#[command(author, version, about = "Upload single page courses from a delimited file")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import courses and pages from a source file.
    Import {
        #[command(flatten)]
        source: SourceArgs,

        /// Default category: numeric id or category idnumber
        #[arg(short = 'c', long = "categoryid")]
        category: Option<String>,

        /// Separator inside the COURSE_TAGS cell
        #[arg(long)]
        tag_delimiter: Option<String>,

        /// JSON store to import into; created if missing
        #[arg(long)]
        store: Option<PathBuf>,

        /// JSON column mapping: field key -> column index (negative = absent)
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// List required fields next to the headers found in a source file.
    Headers {
        #[command(flatten)]
        source: SourceArgs,

        /// JSON column mapping to preview instead of the default order
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Source file
    #[arg(short, long)]
    source: PathBuf,

    /// Field delimiter: comma, semicolon, colon, tab or cfg
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Source encoding label, e.g. UTF-8 or ISO-8859-1
    #[arg(short, long)]
    encoding: Option<String>,

    /// Base options as JSON; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Import {
            source,
            category,
            tag_delimiter,
            store,
            mapping,
            format,
        } => {
            let overrides = OptionOverrides {
                delimiter: source.delimiter.clone(),
                encoding: source.encoding.clone(),
                category,
                tag_delimiter,
            };
            cmd_import(
                &source,
                &overrides,
                store.as_deref(),
                mapping.as_deref(),
                format,
            )?;
        }
        Commands::Headers { source, mapping } => {
            let overrides = OptionOverrides {
                delimiter: source.delimiter.clone(),
                encoding: source.encoding.clone(),
                ..OptionOverrides::default()
            };
            cmd_headers(&source, &overrides, mapping.as_deref())?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
fn init_logging(verbose: u8, quiet: bool) {
    let fallback = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = if verbose > 0 || quiet {
        tracing_subscriber::EnvFilter::new(fallback)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        bail!("source file not found: {}", path.display());
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_import(
    args: &SourceArgs,
    overrides: &OptionOverrides,
    store: Option<&Path>,
    mapping: Option<&Path>,
    format: ReportFormat,
) -> Result<()> {
    let options = config::build_options(args.config.as_deref(), overrides)?;
    let mapping = mapping.map(load_mapping).transpose()?;
    let bytes = read_source(&args.source)?;
    tracing::debug!(source = %args.source.display(), bytes = bytes.len(), "source read");

    let mut backend = match store {
        Some(path) => snapshot::load(path)
            .with_context(|| format!("failed to load store {}", path.display()))?,
        None => MemoryBackend::new(),
    };

    let report = {
        let mut importer = ImportOrchestrator::load(&mut backend, &bytes, options, mapping)
            .map_err(explain_load_error)?;
        match format {
            ReportFormat::Text => {
                let mut sink = PlainTextSink::stdout();
                importer.execute(&mut sink)?
            }
            ReportFormat::Json => {
                let mut sink = StructuredSink::new();
                let report = importer.execute(&mut sink)?;
                println!("{}", serde_json::to_string_pretty(sink.report())?);
                report
            }
        }
    };

    if let Some(path) = store {
        snapshot::save(&backend, path)
            .with_context(|| format!("failed to save store {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }

    print_outcome(&report);
    Ok(())
}

fn explain_load_error(err: ImportError) -> anyhow::Error {
    match err {
        ImportError::InvalidFormat(_) | ImportError::HeaderMismatch { .. } => {
            anyhow::Error::new(err).context("File format is invalid.")
        }
        ImportError::UnsupportedEncoding(_) => {
            anyhow::Error::new(err).context("Invalid Encoding Specified")
        }
        ImportError::CategoryResolution(_) => {
            anyhow::Error::new(err).context("Invalid parent category specified")
        }
        other => anyhow::Error::new(other),
    }
}

fn print_outcome(report: &ImportReport) {
    let RunSummary {
        total,
        created,
        updated,
        unchanged,
        errors,
        ..
    } = report.summary;
    let status = if errors == 0 {
        "ok".green().bold()
    } else {
        "done".yellow().bold()
    };
    eprintln!(
        "{status} import {} (total={total} created={created} updated={updated} unchanged={unchanged} errors={errors})",
        &report.import_id[..12.min(report.import_id.len())]
    );
}

fn cmd_headers(args: &SourceArgs, overrides: &OptionOverrides, mapping: Option<&Path>) -> Result<()> {
    let options = config::build_options(args.config.as_deref(), overrides)?;
    let mapping = match mapping {
        Some(path) => load_mapping(path)?,
        None => ColumnMapping::positional(),
    };
    let bytes = read_source(&args.source)?;
    let table = SourceTable::parse(&bytes, &options).context("File format is invalid.")?;

    println!(
        "{} {} ({} columns, {} rows)",
        "Headers".green().bold(),
        args.source.display(),
        table.headers.len(),
        table.rows.len()
    );
    for field in ImportField::ALL {
        let (column, found) = match mapping.column(field) {
            Some(idx) => (
                idx.to_string(),
                table.headers.get(idx).map(String::as_str).unwrap_or("-"),
            ),
            None => ("-".to_string(), "-"),
        };
        let line = format!("{:<26} {:>3}  {}", field.header(), column, found);
        if found.eq_ignore_ascii_case(field.header()) {
            println!("  {line}");
        } else {
            println!("  {}", line.yellow());
        }
    }

    if table.headers.len() < REQUIRED_FIELD_COUNT {
        eprintln!(
            "{} found {} columns, at least {} required",
            "warning:".yellow().bold(),
            table.headers.len(),
            REQUIRED_FIELD_COUNT
        );
    }
    Ok(())
}
