use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// Explicit declaration takes priority over keyword sniffing, e.g.
// "List Type: Chancery" somewhere in the page preamble.
static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^.*?list\s+type\s*:\s*(.+)$").unwrap());

/// The text grammar governing a detail page. Fixed once per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Chancery,
    Bail,
    Circuit,
    Commercial,
    Family,
    HighCourtGeneral,
    CourtOfAppeal,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Chancery => "chancery",
            ListType::Bail => "bail",
            ListType::Circuit => "circuit",
            ListType::Commercial => "commercial",
            ListType::Family => "family",
            ListType::HighCourtGeneral => "high_court_general",
            ListType::CourtOfAppeal => "court_of_appeal",
        }
    }
}

/// Determine the list type for a detail page. Total: defaults to the general
/// High Court grammar when nothing matches.
pub fn classify_page(text: &str) -> ListType {
    if let Some(caps) = DECLARATION_RE.captures(text) {
        return keyword_match(&caps[1]).unwrap_or(ListType::HighCourtGeneral);
    }
    keyword_match(text).unwrap_or(ListType::HighCourtGeneral)
}

// Check order matters: the specific categories come before "circuit", which
// comes before the general fallback, because circuit pages mention the other
// categories' keywords in passing far less often than the reverse.
fn keyword_match(text: &str) -> Option<ListType> {
    let lower = text.to_lowercase();
    if lower.contains("bail") {
        Some(ListType::Bail)
    } else if lower.contains("commercial") {
        Some(ListType::Commercial)
    } else if lower.contains("family") {
        Some(ListType::Family)
    } else if lower.contains("chancery") {
        Some(ListType::Chancery)
    } else if lower.contains("court of appeal") {
        Some(ListType::CourtOfAppeal)
    } else if lower.contains("circuit") {
        Some(ListType::Circuit)
    } else {
        None
    }
}
