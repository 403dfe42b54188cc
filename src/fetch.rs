use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::db::FetchRow;
use crate::parser::dates::iso_to_url_date;

pub const BASE_URL: &str = "https://legaldiary.courts.ie";
const USER_AGENT: &str = "ld-scraper/0.1";

// The source is a small public service; keep concurrency polite.
const CONCURRENCY: usize = 4;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub use_cache: bool,
    /// Cache expiry in hours; 0 means entries never expire.
    pub cache_hours: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { use_cache: true, cache_hours: 0 }
    }
}

pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

/// Listing URL for a jurisdiction; dateFrom defaults to yesterday.
pub fn listing_url(jurisdiction: &str, date_from_iso: Option<&str>) -> String {
    let date_from = date_from_iso
        .and_then(iso_to_url_date)
        .unwrap_or_else(|| {
            let yesterday = chrono::Local::now().date_naive() - chrono::Days::new(1);
            yesterday.format("%d-%m-%Y").to_string()
        });
    format!(
        "{BASE_URL}/legaldiary.nsf/{jurisdiction}?OpenView&Jurisdiction={jurisdiction}\
         &area=&type=&dateType=Range&dateFrom={date_from}&dateTo=&text="
    )
}

/// Fetch one page, cache-aware. Used for the listing page and ad-hoc fetches.
pub async fn fetch_html(client: &reqwest::Client, url: &str, opts: FetchOptions) -> Result<String> {
    if opts.use_cache {
        if let Some(html) = read_cache(url, opts.cache_hours) {
            debug!(url, "cache hit");
            return Ok(html);
        }
    }
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .with_context(|| format!("failed to fetch {url}"))?;
    if opts.use_cache {
        write_cache(url, &html);
    }
    Ok(html)
}

/// Fetch detail pages concurrently, saving each result to the DB as it
/// arrives. Error rows are saved too so the page still counts as visited.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String)>,
    opts: FetchOptions,
) -> Result<FetchStats> {
    let client = client()?;
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for (diary_id, url) in pages {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_one(&client, diary_id, &url, opts).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (diary_id, url, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE diary SET visited = 1, visited_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        insert_stmt.execute(rusqlite::params![
            row.diary_id,
            row.url,
            row.html,
            row.status,
            row.error,
            row.latency_ms,
        ])?;
        update_stmt.execute(rusqlite::params![row.diary_id])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

async fn fetch_one(
    client: &reqwest::Client,
    diary_id: i64,
    url: &str,
    opts: FetchOptions,
) -> FetchRow {
    if opts.use_cache {
        if let Some(html) = read_cache(url, opts.cache_hours) {
            return FetchRow {
                diary_id,
                url: url.to_string(),
                html: Some(html),
                status: Some(200),
                error: None,
                latency_ms: None,
            };
        }
    }

    let start = Instant::now();
    for attempt in 0..=MAX_RETRIES {
        let (status, error): (Option<reqwest::StatusCode>, String) =
            match client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        match resp.text().await {
                            Ok(html) => {
                                if opts.use_cache {
                                    write_cache(url, &html);
                                }
                                return FetchRow {
                                    diary_id,
                                    url: url.to_string(),
                                    html: Some(html),
                                    status: Some(status.as_u16() as i32),
                                    error: None,
                                    latency_ms: Some(start.elapsed().as_millis() as i64),
                                };
                            }
                            Err(e) => (None, e.to_string()),
                        }
                    } else {
                        (Some(status), format!("HTTP {status}"))
                    }
                }
                Err(e) => (None, e.to_string()),
            };

        let retryable =
            status.map_or(true, |s| s.as_u16() == 429 || s.is_server_error());
        if !retryable || attempt == MAX_RETRIES {
            return FetchRow {
                diary_id,
                url: url.to_string(),
                html: None,
                status: status.map(|s| s.as_u16() as i32),
                error: Some(error),
                latency_ms: Some(start.elapsed().as_millis() as i64),
            };
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            url,
            attempt = attempt + 1,
            "fetch failed ({error}), backing off {:.1}s",
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    unreachable!("retry loop always returns")
}

fn cache_dir() -> PathBuf {
    std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/cache"))
}

fn cache_path(url: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    let mut name = String::with_capacity(digest.len() * 2 + 5);
    for b in digest {
        name.push_str(&format!("{b:02x}"));
    }
    name.push_str(".html");
    cache_dir().join(name)
}

fn read_cache(url: &str, max_age_hours: u64) -> Option<String> {
    let path = cache_path(url);
    if max_age_hours > 0 {
        let mtime = std::fs::metadata(&path).ok()?.modified().ok()?;
        let age = SystemTime::now().duration_since(mtime).ok()?;
        if age > Duration::from_secs(max_age_hours * 3600) {
            return None;
        }
    }
    std::fs::read_to_string(&path).ok()
}

fn write_cache(url: &str, html: &str) {
    let path = cache_path(url);
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            debug!("cache dir create failed: {e}");
            return;
        }
    }
    if let Err(e) = std::fs::write(&path, html) {
        debug!("cache write failed: {e}");
    }
}
