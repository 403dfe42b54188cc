use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use super::dates::sort_token_to_iso;

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.clickable-row").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// One row of the diary index. `source_url` is the natural key that ties a
/// sitting to everything parsed from its detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiaryEntry {
    pub date_text: String,
    pub date_iso: Option<String>,
    pub venue: String,
    #[serde(rename = "type")]
    pub court_type: String,
    pub subtitle: String,
    pub updated: String,
    pub source_url: String,
}

/// Extract diary entries from a listings page, in document order. No matching
/// rows is an empty vec, not an error.
pub fn parse_listing(html: &str, base_url: &str) -> Vec<DiaryEntry> {
    let doc = Html::parse_document(html);
    let mut entries = Vec::new();

    for row in doc.select(&ROW_SEL) {
        let Some(path) = row.value().attr("data-url").map(str::trim).filter(|p| !p.is_empty())
        else {
            continue;
        };
        let cells: Vec<ElementRef> = row.select(&CELL_SEL).collect();
        if cells.len() < 3 {
            continue;
        }

        let date_sort = cells[0].value().attr("data-text").unwrap_or("");
        // Column layout varies by court type; the count tells them apart.
        let (venue, court_type, subtitle, updated) = if cells.len() >= 5 {
            (cell_text(&cells[1]), cell_text(&cells[2]), cell_text(&cells[3]), cell_text(&cells[4]))
        } else if cells.len() == 4 {
            (cell_text(&cells[1]), String::new(), cell_text(&cells[2]), cell_text(&cells[3]))
        } else {
            (String::new(), cell_text(&cells[1]), String::new(), cell_text(&cells[2]))
        };

        entries.push(DiaryEntry {
            date_text: cell_text(&cells[0]),
            date_iso: sort_token_to_iso(date_sort),
            venue,
            court_type,
            subtitle,
            updated,
            source_url: format!("{base_url}{path}"),
        });
    }

    entries
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
