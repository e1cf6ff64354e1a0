mod audit;
mod browser;
mod census;
mod clean;
mod columns;
mod config;
mod harvest;
mod parser;
mod rank;
mod records;
mod store;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use browser::dom::{DomNavigator, HttpSource, PageSource, SnapshotSource};
use config::Settings;
use harvest::{ScrapeOptions, ScrapeSummary};
use store::{CsvStore, RunSummary};

#[derive(Parser)]
#[command(name = "race_results", about = "Race results scraper and cleaner")]
struct Cli {
    /// Settings file (default: ./race_results.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through the results viewer and save raw rows
    Scrape {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Clean, enrich and rank a raw results file
    Clean {
        /// Raw CSV (default: the final scrape output)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Cleaned CSV (default: processed_dir/cleaned_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scrape + clean in one pipeline
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List US state codes in a cleaned file and flag suspicious ones
    States {
        /// Cleaned CSV (default: processed_dir/cleaned_file)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default, PartialEq)]
struct SourceArgs {
    /// Max pages to visit
    #[arg(short = 'n', long)]
    max_pages: Option<u32>,
    /// Results page to start from
    #[arg(long)]
    url: Option<String>,
    /// Replay saved HTML pages from a directory instead of fetching
    #[arg(long)]
    snapshots: Option<PathBuf>,
}

impl SourceArgs {
    /// Fold the flags into `settings`; returns the snapshot directory, if any.
    fn apply(self, settings: &mut Settings) -> Option<PathBuf> {
        if let Some(n) = self.max_pages {
            settings.max_pages = n;
        }
        if let Some(u) = self.url {
            settings.start_url = u;
        }
        self.snapshots
    }
}

/// Append-mode writer for the log file, flushed when the guard drops.
fn log_file_writer(path: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let name = path
        .file_name()
        .with_context(|| format!("Log file {:?} has no file name", path))?;
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;
    Ok(non_blocking(rolling::never(dir, name)))
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = log_file_writer(path)?;
            let layer = fmt::layer().with_writer(writer).with_target(false).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    let _log_guard = init_tracing(settings.log_file.as_deref())?;

    let result = match cli.command {
        Commands::Scrape { source } => {
            let snapshots = source.apply(&mut settings);
            let summary = scrape_from(snapshots.as_deref(), &settings).await?;
            print_scrape(&summary, &settings);
            Ok(())
        }
        Commands::Clean { input, output } => {
            let input = input.unwrap_or_else(|| settings.final_raw_path());
            let output = output.unwrap_or_else(|| settings.cleaned_path());
            run_clean(&input, &output, &settings)
        }
        Commands::Run { source } => {
            let snapshots = source.apply(&mut settings);

            // Phase 1: Scrape
            let t_scrape = Instant::now();
            println!("Pipeline: scraping up to {} pages...", settings.max_pages);
            let summary = scrape_from(snapshots.as_deref(), &settings).await?;
            print_scrape(&summary, &settings);
            println!("Scraped in {:.1}s", t_scrape.elapsed().as_secs_f64());

            // Phase 2: Clean
            let t_clean = Instant::now();
            run_clean(&settings.final_raw_path(), &settings.cleaned_path(), &settings)?;
            println!("Cleaned in {:.1}s", t_clean.elapsed().as_secs_f64());
            Ok(())
        }
        Commands::States { input } => {
            let input = input.unwrap_or_else(|| settings.cleaned_path());
            let audit = audit::audit_file(&input)?;
            if audit.counts.is_empty() {
                println!("No US rows with a state in {:?}.", input);
                return Ok(());
            }
            audit.print();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn scrape_from(snapshots: Option<&Path>, settings: &Settings) -> anyhow::Result<ScrapeSummary> {
    match snapshots {
        Some(dir) => run_scrape(SnapshotSource::from_dir(dir)?, settings).await,
        None => run_scrape(HttpSource::new(&settings.start_url)?, settings).await,
    }
}

async fn run_scrape<S: PageSource>(source: S, settings: &Settings) -> anyhow::Result<ScrapeSummary> {
    let options = ScrapeOptions::from_settings(settings);
    let nav = DomNavigator::open(source, options.wait_timeout)
        .await
        .context("Failed to open the results viewer")?;
    let mut store = CsvStore::new(settings.clone());
    harvest::scrape(nav, &mut store, &options).await
}

fn print_scrape(summary: &ScrapeSummary, settings: &Settings) {
    println!(
        "Done: {} rows from {} pages ({} failed, {} excluded), stopped: {:?}.",
        summary.rows, summary.pages, summary.failed_rows, summary.excluded_rows, summary.stop
    );
    println!("Saved to {:?}", settings.final_raw_path());
}

fn run_clean(input: &Path, output: &Path, settings: &Settings) -> anyhow::Result<()> {
    let raw = store::read_raw(input)?;
    println!("Cleaning {} records from {:?}...", raw.len(), input);

    let (records, report) = clean::clean(raw);
    let records = rank::rank(records);

    store::write_cleaned(output, &records)?;
    let dictionary = output
        .parent()
        .map(|dir| dir.join(&settings.dictionary_file))
        .unwrap_or_else(|| settings.dictionary_path());
    store::write_dictionary(&dictionary, &records)?;

    let summary = RunSummary::new(input, output, report);
    let summary_path = output
        .parent()
        .map(|dir| dir.join("run_summary.json"))
        .unwrap_or_else(|| settings.summary_path());
    store::write_summary(&summary_path, &summary)?;

    info!("Cleaned data saved to {:?}", output);
    println!("Original records:  {}", summary.original_records);
    println!("Final records:     {}", summary.final_records);
    println!("Records removed:   {}", summary.records_removed);
    println!("Data dictionary:   {:?}", dictionary);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let total = d.as_secs();
    let (h, m, sec) = (total / 3600, total % 3600 / 60, total % 60);
    match (h, m) {
        (0, 0) => format!("{:.1}s", d.as_secs_f64()),
        (0, _) => format!("{}m {}s", m, sec),
        _ => format!("{}h {}m {}s", h, m, sec),
    }
}

// ── Tests ──
