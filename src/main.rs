mod config;
mod dedup;
mod feed;
mod ingest;
mod parser;
mod record;
mod report;
mod store;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use config::IngestConfig;

#[derive(Parser)]
#[command(name = "nihmeet", about = "NIH closed meeting notices from the Federal Register")]
struct Cli {
    /// JSON-lines record store
    #[arg(long, global = true, default_value = config::DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new closed meeting notices and append unseen meetings to the store
    Run {
        /// Ignore notices published before this date (YYYY-MM-DD)
        #[arg(long, default_value = config::DEFAULT_CUTOFF)]
        cutoff: NaiveDate,
        /// Max listing pages to read
        #[arg(short = 'n', long, default_value_t = config::DEFAULT_MAX_PAGES)]
        pages: u32,
        /// Pause before each request, in milliseconds
        #[arg(long, default_value_t = config::DEFAULT_REQUEST_DELAY_MS)]
        delay_ms: u64,
    },
    /// Extract meetings from a local notice XML file and print them as JSON lines
    Parse {
        file: PathBuf,
        /// Publication date to attach (YYYY-MM-DD)
        #[arg(short, long)]
        published: NaiveDate,
    },
    /// Stored meetings, most recently published first
    List {
        /// Filter by committee name (case-insensitive substring)
        #[arg(short, long)]
        committee: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show store statistics
    Stats,
    /// Write the HTML report
    Report {
        #[arg(short, long, default_value = config::DEFAULT_REPORT_PATH)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let store = store::RecordStore::open(&cli.store);

    let result = match cli.command {
        Commands::Run { cutoff, pages, delay_ms } => {
            let config = IngestConfig {
                max_pages: pages,
                request_delay: std::time::Duration::from_millis(delay_ms),
                ..IngestConfig::new(cutoff)
            };
            let known = dedup::KnownHashes::from_store(&store)?;
            let feed = feed::FeedClient::new(&config)?;
            let stats = ingest::run(&config, &feed, &store, &known).await?;
            println!(
                "Done: {} notices ({} failed), {} meetings extracted, {} new, {} already stored.",
                stats.candidates,
                stats.documents_failed,
                stats.extracted,
                stats.appended,
                stats.duplicates
            );
            Ok(())
        }
        Commands::Parse { file, published } => {
            let xml = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let published = published.format("%Y-%m-%d").to_string();
            let records = parser::extract_meetings(&xml, &published)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            for r in &records {
                println!("{}", r.to_json_line()?);
            }
            Ok(())
        }
        Commands::List { committee, limit } => {
            let records = store.load()?;
            let rows = store::fetch_overview(&records, committee.as_deref(), limit);
            if rows.is_empty() {
                println!("No meetings found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<10} | {:<40} | {:<10} | {:<10} | {:<5} | {:<5}",
                "#", "Published", "Committee", "Start", "End", "From", "To"
            );
            println!("{}", "-".repeat(102));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<40} | {:<10} | {:<10} | {:<5} | {:<5}",
                    i + 1,
                    r.publication_date(),
                    truncate(r.committee(), 37),
                    r.start_date().unwrap_or("-"),
                    r.end_date().unwrap_or("-"),
                    r.start_time().unwrap_or("-"),
                    r.end_time().unwrap_or("-"),
                );
            }

            println!("\n{} of {} meetings", rows.len(), records.len());
            Ok(())
        }
        Commands::Stats => {
            let records = store.load()?;
            let s = store::get_stats(&records);
            println!("Meetings:      {}", s.total);
            println!("Committees:    {}", s.committees);
            println!("First notice:  {}", s.first_published.as_deref().unwrap_or("-"));
            println!("Last notice:   {}", s.last_published.as_deref().unwrap_or("-"));
            println!("No dates:      {}", s.missing_dates);
            println!("No times:      {}", s.missing_times);
            Ok(())
        }
        Commands::Report { output } => {
            let records = store.load()?;
            report::write_report(&records, &output)?;
            println!("Report generated at {}", output.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
