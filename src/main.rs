use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paper_rename::config::{expand_home, load_config, Config, ResolverBackend};
use paper_rename::identifiers::{locate_all, normalize};
use paper_rename::models::{CanonicalDoi, RenamePlan};
use paper_rename::naming::FilenameComposer;
use paper_rename::pipeline::{scan_paths, Pipeline};
use paper_rename::sources::{self, CrossRefSource, MetadataSource};
use paper_rename::ui::{self, BatchProgress, Status};
use paper_rename::utils::{PdfTextExtractor, TextExtractor};
use paper_rename::venue::{normalize_venue, AcronymStore, VenueAcronymResolver};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// paper-rename - Rename academic paper PDFs from their DOI metadata
#[derive(Parser, Debug)]
#[command(name = "paper-rename")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rename academic paper PDFs to [Year]+[Venue]--Title.pdf", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Acronym map file
    #[arg(long, global = true)]
    acronyms: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rename PDF files (or every PDF in the given directories)
    #[command(alias = "r")]
    Rename {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(long, short)]
        recursive: bool,

        /// Show the new names without renaming anything
        #[arg(long, short = 'n')]
        dry_run: bool,

        /// Search CrossRef by title when no DOI can be used
        #[arg(long)]
        title_search: bool,

        /// Metadata service for DOI lookups
        #[arg(long, value_enum)]
        backend: Option<ResolverBackend>,

        /// Number of leading pages searched for a DOI
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// List the DOI candidates found in a PDF, in priority order
    Locate {
        /// PDF file
        pdf: PathBuf,

        /// Number of leading pages searched
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Resolve a DOI and show the filename it would produce
    Doi {
        /// DOI, with or without a doi.org prefix
        doi: String,

        /// Metadata service for the lookup
        #[arg(long, value_enum)]
        backend: Option<ResolverBackend>,
    },

    /// Inspect and curate the venue acronym map
    Acronyms {
        #[command(subcommand)]
        action: AcronymsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AcronymsCommand {
    /// Print the map
    List {
        /// Only venues still waiting for an acronym
        #[arg(long)]
        unresolved: bool,
    },

    /// Assign an acronym to a venue
    Set {
        /// Venue full name
        name: String,

        /// Acronym to use in filenames
        acronym: String,
    },

    /// Look a venue up without recording it
    Lookup {
        /// Venue full name
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = if cli.quiet {
        "error".to_string()
    } else {
        log_level
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("paper_rename={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match config.context("Failed to load configuration") {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", ui::status_icon(Status::Error), e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<ExitCode> {
    if let Some(timeout) = cli.timeout {
        config.resolver.timeout_secs = timeout;
    }
    if let Some(path) = cli.acronyms {
        config.acronyms.path = expand_home(&path);
    }
    let format = cli.output.resolve();

    match cli.command {
        Commands::Rename {
            paths,
            recursive,
            dry_run,
            title_search,
            backend,
            max_pages,
        } => {
            if let Some(backend) = backend {
                config.resolver.backend = backend;
            }
            if let Some(max_pages) = max_pages {
                config.extraction.max_pages = max_pages;
            }
            config.resolver.title_search |= title_search;
            config.scan.recursive |= recursive;

            rename(&config, &paths, dry_run, format, cli.quiet).await
        }

        Commands::Locate { pdf, max_pages } => {
            let extractor =
                PdfTextExtractor::new(max_pages.unwrap_or(config.extraction.max_pages));
            let text = extractor
                .extract(&pdf)
                .with_context(|| format!("Failed to read {}", pdf.display()))?;

            let candidates = locate_all(&text);
            if candidates.is_empty() {
                if format != OutputFormat::Json {
                    ui::print_status(Status::Warning, "No DOI found");
                } else {
                    println!("[]");
                }
                return Ok(ExitCode::from(1));
            }

            if format == OutputFormat::Json {
                let rows: Vec<_> = candidates
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "format": c.format,
                            "raw": c.raw,
                            "offset": c.offset,
                            "doi": normalize(c).ok(),
                            "continuation": c.continuation,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (i, c) in candidates.iter().enumerate() {
                    let normalized = match normalize(c) {
                        Ok(doi) => doi.to_string(),
                        Err(e) => e.to_string(),
                    };
                    let mut line = format!("{:<8} {}  =>  {}", c.format, c.raw, normalized);
                    if let Some(joined) = &c.continuation {
                        line.push_str(&format!("  (or {})", joined));
                    }
                    if i == 0 {
                        ui::print_status(Status::Success, &line);
                    } else {
                        ui::print_status(Status::Pending, &line);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Doi { doi, backend } => {
            if let Some(backend) = backend {
                config.resolver.backend = backend;
            }
            let doi: CanonicalDoi = doi.parse()?;
            let source = sources::from_config(&config.resolver)?;
            let meta = source.resolve(&doi).await?;

            let store = AcronymStore::load(&config.acronyms.path)?;
            let resolver = VenueAcronymResolver::new(store);
            let venue_tag = meta.venue_full_name.as_deref().map(|v| {
                resolver
                    .lookup(v)
                    .map(String::from)
                    .unwrap_or_else(|| normalize_venue(v))
            });

            let composer = FilenameComposer::new(&config.naming, true);
            let plan = RenamePlan::resolved("", meta.year, venue_tag, meta.title.clone());
            let filename = format!("{}.pdf", composer.stem(&plan));

            if format == OutputFormat::Json {
                let out = serde_json::json!({
                    "doi": doi,
                    "metadata": meta,
                    "filename": filename,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("DOI:      {}", doi);
                println!("URL:      {}", doi.url());
                println!("Title:    {}", meta.title);
                println!("Authors:  {}", meta.authors.join(", "));
                if let Some(year) = meta.year {
                    println!("Year:     {}", year);
                }
                if let Some(venue) = &meta.venue_full_name {
                    println!("Venue:    {}", venue);
                }
                ui::print_status(Status::Info, &filename);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Acronyms { action } => acronyms(&config, action, format),
    }
}

async fn rename(
    config: &Config,
    paths: &[PathBuf],
    dry_run: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let store = AcronymStore::load(&config.acronyms.path)?;
    let source = sources::from_config(&config.resolver)?;

    let files = scan_paths(paths, config.scan.recursive);
    if files.is_empty() {
        tracing::warn!("No PDF files found");
        return Ok(ExitCode::SUCCESS);
    }
    tracing::info!(count = files.len(), dry_run, "Processing files");

    let mut pipeline = Pipeline::new(
        Box::new(PdfTextExtractor::new(config.extraction.max_pages)),
        source.clone(),
        VenueAcronymResolver::new(store),
        FilenameComposer::new(&config.naming, dry_run),
    );

    if config.resolver.title_search {
        let searcher: Arc<dyn MetadataSource> = if source.supports_title_search() {
            source
        } else {
            Arc::new(CrossRefSource::new(
                Duration::from_secs(config.resolver.timeout_secs),
                config.resolver.mailto.as_deref().filter(|m| !m.is_empty()),
            )?)
        };
        pipeline = pipeline.with_title_search(searcher, config.resolver.title_match_threshold);
    }

    let progress = BatchProgress::new(
        files.len() as u64,
        format == OutputFormat::Table && !quiet && ui::is_terminal(),
    );
    let report = pipeline.run(&files, |outcome| progress.advance(outcome)).await;
    progress.finish();

    let mut code = if report.has_failures() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    };

    if let Err(e) = pipeline.finish() {
        tracing::error!(error = %e, "Failed to save acronym map");
        code = ExitCode::from(1);
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => ui::print_report_plain(&report),
        _ => ui::print_report(&report),
    }

    Ok(code)
}

fn acronyms(config: &Config, action: AcronymsCommand, format: OutputFormat) -> Result<ExitCode> {
    let path = &config.acronyms.path;
    let mut store = AcronymStore::load(path)?;

    match action {
        AcronymsCommand::List { unresolved } => {
            if format == OutputFormat::Json {
                let out = if unresolved {
                    serde_json::json!(store.unresolved().collect::<Vec<_>>())
                } else {
                    serde_json::json!({
                        "venues": store.venues().collect::<std::collections::BTreeMap<_, _>>(),
                        "unresolved": store.unresolved().collect::<Vec<_>>(),
                    })
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(ExitCode::SUCCESS);
            }

            if !unresolved {
                ui::print_section("Venues");
                for (name, acronym) in store.venues() {
                    println!("{:<12} {}", acronym, name);
                }
            }
            ui::print_section("Unresolved");
            for name in store.unresolved() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }

        AcronymsCommand::Set { name, acronym } => {
            let previous = store.set(&name, &acronym);
            store
                .flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;

            let key = normalize_venue(&name);
            let msg = match previous {
                Some(old) => format!("{}: {} -> {}", key, old, acronym),
                None => format!("{}: {}", key, acronym),
            };
            ui::print_status(Status::Success, &msg);
            Ok(ExitCode::SUCCESS)
        }

        AcronymsCommand::Lookup { name } => match store.get(&name) {
            Some(acronym) => {
                println!("{}", acronym);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                let note = if store.is_unresolved(&name) {
                    "recorded as unresolved"
                } else {
                    "not in map"
                };
                ui::print_status(
                    Status::Warning,
                    &format!("{} ({})", normalize_venue(&name), note),
                );
                Ok(ExitCode::from(1))
            }
        },
    }
}
