use anyhow::Result;
use rusqlite::{params, Connection};

use crate::parser::{DiaryEntry, ParsedPage};

const DB_PATH: &str = "data/legaldiary.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS diary (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            date_text  TEXT NOT NULL,
            date_iso   TEXT,
            venue      TEXT NOT NULL DEFAULT '',
            court_type TEXT NOT NULL DEFAULT '',
            subtitle   TEXT NOT NULL DEFAULT '',
            updated    TEXT NOT NULL DEFAULT '',
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_diary_visited ON diary(visited);
        CREATE INDEX IF NOT EXISTS idx_diary_date ON diary(date_iso);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            diary_id   INTEGER NOT NULL REFERENCES diary(id),
            url        TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            list_type  TEXT,
            processed  BOOLEAN NOT NULL DEFAULT 0,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_diary ON page_data(diary_id);
        CREATE INDEX IF NOT EXISTS idx_page_data_processed ON page_data(processed);

        CREATE TABLE IF NOT EXISTS cases (
            id           INTEGER PRIMARY KEY,
            diary_id     INTEGER NOT NULL REFERENCES diary(id),
            page_data_id INTEGER NOT NULL REFERENCES page_data(id),
            ordinal      INTEGER NOT NULL,
            list_number  INTEGER,
            list_suffix  TEXT,
            case_number  TEXT,
            title        TEXT NOT NULL,
            parties      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_cases_diary ON cases(diary_id);
        CREATE INDEX IF NOT EXISTS idx_cases_number ON cases(case_number);

        CREATE TABLE IF NOT EXISTS headers (
            id           INTEGER PRIMARY KEY,
            diary_id     INTEGER NOT NULL REFERENCES diary(id),
            page_data_id INTEGER NOT NULL REFERENCES page_data(id),
            ordinal      INTEGER NOT NULL,
            text         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_headers_diary ON headers(diary_id);
        ",
    )?;
    Ok(())
}

/// Insert listing entries, ignoring URLs already queued. Returns new rows.
pub fn insert_entries(conn: &Connection, entries: &[DiaryEntry]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO diary (url, date_text, date_iso, venue, court_type, subtitle, updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut inserted = 0;
    for e in entries {
        inserted += stmt.execute(params![
            e.source_url,
            e.date_text,
            e.date_iso,
            e.venue,
            e.court_type,
            e.subtitle,
            e.updated,
        ])?;
    }
    Ok(inserted)
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<(i64, String)>> {
    let mut stmt =
        conn.prepare("SELECT id, url FROM diary WHERE visited = 0 ORDER BY id LIMIT ?1")?;
    let rows = stmt
        .query_map(params![limit.map(|n| n as i64).unwrap_or(-1)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One fetch result, streamed to the DB as it arrives.
pub struct FetchRow {
    pub diary_id: i64,
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

/// A fetched detail page awaiting parsing.
pub struct StoredPage {
    pub page_data_id: i64,
    pub diary_id: i64,
    pub url: String,
    pub html: String,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<StoredPage>> {
    let mut stmt = conn.prepare(
        "SELECT id, diary_id, url, html FROM page_data
         WHERE processed = 0 AND html IS NOT NULL
         ORDER BY id LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit.map(|n| n as i64).unwrap_or(-1)], |row| {
            Ok(StoredPage {
                page_data_id: row.get(0)?,
                diary_id: row.get(1)?,
                url: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Persist parse output for a batch of pages. Reprocessing a page replaces
/// its previous cases and headers.
pub fn save_parsed(conn: &Connection, pages: &[ParsedPage]) -> Result<()> {
    conn.execute_batch("BEGIN")?;
    let result = save_parsed_inner(conn, pages);
    match result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(_) => conn.execute_batch("ROLLBACK")?,
    }
    result
}

fn save_parsed_inner(conn: &Connection, pages: &[ParsedPage]) -> Result<()> {
    let mut delete_cases = conn.prepare("DELETE FROM cases WHERE diary_id = ?1")?;
    let mut delete_headers = conn.prepare("DELETE FROM headers WHERE diary_id = ?1")?;
    let mut insert_case = conn.prepare(
        "INSERT INTO cases (diary_id, page_data_id, ordinal, list_number, list_suffix, case_number, title, parties)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut insert_header = conn.prepare(
        "INSERT INTO headers (diary_id, page_data_id, ordinal, text) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut mark = conn.prepare(
        "UPDATE page_data SET processed = 1, list_type = ?2 WHERE id = ?1",
    )?;

    for page in pages {
        delete_cases.execute(params![page.diary_id])?;
        delete_headers.execute(params![page.diary_id])?;
        for (i, c) in page.result.cases.iter().enumerate() {
            insert_case.execute(params![
                page.diary_id,
                page.page_data_id,
                i as i64,
                c.list_number,
                c.list_suffix,
                c.case_number,
                c.title,
                c.parties,
            ])?;
        }
        for (i, h) in page.result.headers.iter().enumerate() {
            insert_header.execute(params![page.diary_id, page.page_data_id, i as i64, h])?;
        }
        mark.execute(params![page.page_data_id, page.list_type.as_str()])?;
    }
    Ok(())
}

pub struct Stats {
    pub total: i64,
    pub visited: i64,
    pub unvisited: i64,
    pub fetched: i64,
    pub errors: i64,
    pub processed: i64,
    pub cases: i64,
    pub headers: i64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<i64> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };
    Ok(Stats {
        total: count("SELECT COUNT(*) FROM diary")?,
        visited: count("SELECT COUNT(*) FROM diary WHERE visited = 1")?,
        unvisited: count("SELECT COUNT(*) FROM diary WHERE visited = 0")?,
        fetched: count("SELECT COUNT(*) FROM page_data WHERE html IS NOT NULL")?,
        errors: count("SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL")?,
        processed: count("SELECT COUNT(*) FROM page_data WHERE processed = 1")?,
        cases: count("SELECT COUNT(*) FROM cases")?,
        headers: count("SELECT COUNT(*) FROM headers")?,
    })
}

pub struct OverviewRow {
    pub date_iso: Option<String>,
    pub date_text: String,
    pub venue: String,
    pub court_type: String,
    pub subtitle: String,
    pub case_count: i64,
    pub header_count: i64,
}

pub fn fetch_overview(
    conn: &Connection,
    venue: Option<&str>,
    date_iso: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT d.date_iso, d.date_text, d.venue, d.court_type, d.subtitle,
                (SELECT COUNT(*) FROM cases c WHERE c.diary_id = d.id),
                (SELECT COUNT(*) FROM headers h WHERE h.diary_id = d.id)
         FROM diary d
         WHERE (?1 IS NULL OR d.venue LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR d.date_iso = ?2)
         ORDER BY d.date_iso, d.venue
         LIMIT ?3",
    )?;
    let rows = stmt
        .query_map(params![venue, date_iso, limit as i64], |row| {
            Ok(OverviewRow {
                date_iso: row.get(0)?,
                date_text: row.get(1)?,
                venue: row.get(2)?,
                court_type: row.get(3)?,
                subtitle: row.get(4)?,
                case_count: row.get(5)?,
                header_count: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
