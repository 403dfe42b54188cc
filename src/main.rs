mod db;
mod fetch;
mod parser;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ld_scraper", about = "Irish Courts legal diary scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the diary listing and populate the sittings queue
    Init {
        /// Jurisdiction segment of the listing URL
        #[arg(short, long, default_value = "circuit-court")]
        jurisdiction: String,
        /// Start date (yyyy-mm-dd); defaults to yesterday
        #[arg(short, long)]
        date_from: Option<String>,
        /// Explicit listing URL (overrides jurisdiction/date)
        #[arg(long)]
        listing_url: Option<String>,
        /// Bypass the HTML cache
        #[arg(long)]
        refresh: bool,
    },
    /// Fetch unvisited detail pages
    Fetch {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Bypass the HTML cache
        #[arg(long)]
        refresh: bool,
    },
    /// Parse fetched detail pages into cases and headers
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + process in one pipeline
    Run {
        /// Max pages to fetch+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Bypass the HTML cache
        #[arg(long)]
        refresh: bool,
    },
    /// Show pipeline statistics
    Stats,
    /// Sittings overview table
    Overview {
        /// Filter by venue substring
        #[arg(short, long)]
        venue: Option<String>,
        /// Filter by ISO date (yyyy-mm-dd)
        #[arg(short, long)]
        date: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Parse a local HTML file and print the result as JSON
    Parse {
        file: PathBuf,
        /// Treat the file as a listings page instead of a detail page
        #[arg(long)]
        listing: bool,
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

    let result = match cli.command {
        Commands::Init { jurisdiction, date_from, listing_url, refresh } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let url = listing_url
                .unwrap_or_else(|| fetch::listing_url(&jurisdiction, date_from.as_deref()));
            println!("Fetching listing from {url}");
            let client = fetch::client()?;
            let opts = fetch::FetchOptions { use_cache: !refresh, ..Default::default() };
            let html = fetch::fetch_html(&client, &url, opts).await?;
            let entries = parser::parse_listing(&html, fetch::BASE_URL);
            let inserted = db::insert_entries(&conn, &entries)?;
            println!("Inserted {} new sittings ({} total found)", inserted, entries.len());
            Ok(())
        }
        Commands::Fetch { limit, refresh } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited sittings. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} detail pages (streaming to DB)...", pages.len());
            let opts = fetch::FetchOptions { use_cache: !refresh, ..Default::default() };
            let stats = fetch::fetch_pages_streaming(&conn, pages, opts).await?;
            println!("Done: {} fetched ({} ok, {} errors).", stats.total, stats.ok, stats.errors);
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let counts = process_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit, refresh } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited sittings. Run 'init' first.");
                return Ok(());
            }

            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} detail pages...", pages.len());
            let opts = fetch::FetchOptions { use_cache: !refresh, ..Default::default() };
            let stats = fetch::fetch_pages_streaming(&conn, pages, opts).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_fetch.elapsed().as_secs_f64()
            );

            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process (all fetched pages had errors).");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let counts = process_pages(&conn, &unprocessed)?;
            counts.print();
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Sittings:  {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.fetched);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            println!("Cases:     {}", s.cases);
            println!("Headers:   {}", s.headers);
            Ok(())
        }
        Commands::Overview { venue, date, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, venue.as_deref(), date.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No sittings found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<10} | {:<20} | {:<16} | {:<28} | {:>5} | {:>4}",
                "#", "Date", "Venue", "Type", "Subtitle", "Cases", "Hdrs"
            );
            println!("{}", "-".repeat(105));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<20} | {:<16} | {:<28} | {:>5} | {:>4}",
                    i + 1,
                    r.date_iso.as_deref().unwrap_or("-"),
                    truncate(&r.venue, 20),
                    truncate(&r.court_type, 16),
                    truncate(&r.subtitle, 28),
                    r.case_count,
                    r.header_count,
                );
            }
            println!("\n{} sittings", rows.len());
            Ok(())
        }
        Commands::Parse { file, listing } => {
            let html = std::fs::read_to_string(&file)?;
            let json = if listing {
                serde_json::to_string_pretty(&parser::parse_listing(&html, fetch::BASE_URL))?
            } else {
                serde_json::to_string_pretty(&parser::parse_cases(&html))?
            };
            println!("{json}");
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    pages: usize,
    cases: usize,
    headers: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} pages, {} cases, {} headers.",
            self.pages, self.cases, self.headers,
        );
    }
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::StoredPage],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts { pages: 0, cases: 0, headers: 0 };

    for chunk in pages.chunks(200) {
        let results: Vec<_> = chunk.par_iter().map(parser::process_page).collect();

        for parsed in &results {
            counts.cases += parsed.result.cases.len();
            counts.headers += parsed.result.headers.len();
        }
        counts.pages += results.len();

        db::save_parsed(conn, &results)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
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
