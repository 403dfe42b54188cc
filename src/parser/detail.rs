use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use super::line::{classify_line, LineClassification, ParsedCase};
use super::list_type::{classify_page, ListType};

static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ld-content").unwrap());

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:p|li|div|tr|h[1-6])>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

// "Monday 7th April 2025" style headings mark the end of a page's preamble.
static DATE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b.*\d").unwrap()
});
// "FOR TUESDAY 8TH APRIL" headings separate today's sitting from future ones.
static FUTURE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^for\s+(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .unwrap()
});
static TERM_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:hilary|easter|trinity|michaelmas)\s+term\b").unwrap());

const MIN_HEADER_LEN: usize = 3;

/// Parse output of one detail page: cases in source order, headers flattened
/// into one page-level list in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CasesResult {
    pub cases: Vec<ParsedCase>,
    pub headers: Vec<String>,
}

/// Parse a detail page. Missing content container yields an empty result.
pub fn parse_cases(html: &str) -> CasesResult {
    parse_detail(html).1
}

/// Like [`parse_cases`] but also reports the grammar the page was read under.
pub fn parse_detail(html: &str) -> (ListType, CasesResult) {
    let lines = content_lines(html);
    if lines.is_empty() {
        return (ListType::HighCourtGeneral, CasesResult::default());
    }
    let list_type = classify_page(&lines.join("\n"));

    let mut past_preamble = list_type != ListType::CourtOfAppeal;
    let mut seen_first_date = false;
    let mut pending: Vec<String> = Vec::new();
    let mut out = CasesResult::default();

    for line in &lines {
        if !past_preamble {
            if !DATE_HEADING_RE.is_match(line) {
                continue;
            }
            past_preamble = true;
        }

        if matches!(list_type, ListType::Commercial | ListType::Family) {
            if FUTURE_DATE_RE.is_match(line) {
                if seen_first_date {
                    break;
                }
                seen_first_date = true;
                continue;
            }
            if TERM_HEADING_RE.is_match(line) {
                break;
            }
        }

        match classify_line(line, list_type) {
            LineClassification::Case(case) => {
                out.headers.append(&mut pending);
                out.cases.push(case);
            }
            LineClassification::NotCase(text) => {
                let text = text.trim();
                if text.len() > MIN_HEADER_LEN {
                    pending.push(text.to_string());
                }
            }
        }
    }
    out.headers.append(&mut pending);

    (list_type, out)
}

/// Extract the content container's text as trimmed, non-empty lines.
fn content_lines(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Some(div) = doc.select(&CONTENT_SEL).next() else {
        return Vec::new();
    };
    let text = strip_markup(&div.inner_html());
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// Line breaks and block-element closers become newlines, every other tag is
// dropped, then the small entity set the source actually emits is decoded.
fn strip_markup(html: &str) -> String {
    let s = BR_RE.replace_all(html, "\n");
    let s = BLOCK_END_RE.replace_all(&s, "\n");
    let s = TAG_RE.replace_all(&s, "");
    decode_entities(&s)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
