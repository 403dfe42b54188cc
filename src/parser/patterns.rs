use std::sync::LazyLock;

use regex::Regex;

use super::list_type::ListType;

// List position: optional clock-time prefix ("10.30 " / "10:30 "), 1-3 digits,
// optional single letter suffix, optional period, then whitespace. The 3-digit
// cap keeps a bare 4-digit year ("2021 5113 P ...") from reading as a position.
static POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}[:.]\d{2}\s+)?(\d{1,3})([A-Za-z])?\.?\s+").unwrap()
});

// Party separator between plaintiff and defendant: "-V-", "v", "vs", "versus",
// case-insensitive, whitespace-bounded.
static PARTY_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)(?:-\s*v\s*-|vs?\.?|versus)(?:\s|$)").unwrap());

// Case-number shapes seen across the diary grammars.
const RECORD_SPACED: &str = r"\b\d{4}[ \t]+\d{1,5}[ \t]*[A-Z]{1,4}\b"; // 2021 5113 P
const RECORD_NO: &str = r"\b\d{4}[ \t]+No\.?[ \t]*\d{1,5}[ \t]*[A-Z]{1,4}\b"; // 2019 No. 6734 P
const RECORD_SLASH: &str = r"\b\d{4}/[A-Z]*\d{1,5}\b"; // 2024/1234, 2024/CA118
const RECORD_PREFIXED: &str = r"\b[A-Z]{2,4}[DP]?\d{1,5}/\d{4}\b"; // WOC123/2024
const APPEAL_RECORD: &str = r"\b\d{4}/\d{1,5}\b"; // 2023/145

static CHANCERY: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[RECORD_SPACED, RECORD_NO, RECORD_SLASH]));
static BAIL: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&[RECORD_SPACED, RECORD_SLASH]));
static CIRCUIT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[RECORD_SLASH, RECORD_PREFIXED, RECORD_SPACED]));
static COMMERCIAL: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[RECORD_NO, RECORD_SPACED, RECORD_SLASH]));
static FAMILY: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[RECORD_SPACED, RECORD_SLASH, RECORD_PREFIXED]));
static HIGH_COURT: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[RECORD_SPACED, RECORD_NO, RECORD_SLASH, RECORD_PREFIXED]));
static COURT_OF_APPEAL: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(&[APPEAL_RECORD, RECORD_SPACED]));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Ordered case-number patterns for a list type, first match wins.
pub fn case_patterns(list_type: ListType) -> &'static [Regex] {
    match list_type {
        ListType::Chancery => &CHANCERY,
        ListType::Bail => &BAIL,
        ListType::Circuit => &CIRCUIT,
        ListType::Commercial => &COMMERCIAL,
        ListType::Family => &FAMILY,
        ListType::HighCourtGeneral => &HIGH_COURT,
        ListType::CourtOfAppeal => &COURT_OF_APPEAL,
    }
}

/// First case-number match in `text` under the type's pattern table.
pub fn find_case_number(list_type: ListType, text: &str) -> Option<regex::Match<'_>> {
    case_patterns(list_type).iter().find_map(|re| re.find(text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMatch {
    pub number: u32,
    pub suffix: Option<String>,
    /// Byte offset where the remainder of the line starts.
    pub end: usize,
}

/// Match the shared list-position rule at the start of a line.
pub fn match_position(line: &str) -> Option<PositionMatch> {
    let caps = POSITION_RE.captures(line)?;
    let number: u32 = caps[1].parse().ok()?;
    if number == 0 {
        return None;
    }
    Some(PositionMatch {
        number,
        suffix: caps.get(2).map(|m| m.as_str().to_lowercase()),
        end: caps.get(0).unwrap().end(),
    })
}

/// Whether the line carries a plaintiff/defendant separator token.
pub fn has_party_indicator(text: &str) -> bool {
    PARTY_SEPARATOR_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_plain() {
        let p = match_position("1\t2024/1234\tSmith v Jones").unwrap();
        assert_eq!(p.number, 1);
        assert_eq!(p.suffix, None);
        assert_eq!(&"1\t2024/1234\tSmith v Jones"[p.end..], "2024/1234\tSmith v Jones");
    }

    #[test]
    fn position_with_suffix() {
        let p = match_position("4a\t2024/1234\tSmith v Jones").unwrap();
        assert_eq!(p.number, 4);
        assert_eq!(p.suffix.as_deref(), Some("a"));
    }

    #[test]
    fn position_suffix_lowercased() {
        let p = match_position("4A. Smith v Jones").unwrap();
        assert_eq!(p.suffix.as_deref(), Some("a"));
    }

    #[test]
    fn position_with_period() {
        let p = match_position("12. In re Byrne 2024 88 P").unwrap();
        assert_eq!(p.number, 12);
    }

    #[test]
    fn position_with_clock_prefix() {
        let p = match_position("10.30 3. Smith -v- Jones 2024/55").unwrap();
        assert_eq!(p.number, 3);
        let q = match_position("10:30 3. Smith -v- Jones 2024/55").unwrap();
        assert_eq!(q.number, 3);
    }

    #[test]
    fn four_digit_year_is_not_a_position() {
        assert_eq!(match_position("2021 5113 P EASTWOOD & ANOR -V- RICHARDS"), None);
    }

    #[test]
    fn bare_clock_time_is_not_a_position() {
        // "10.30" backtracks into "10" + "." but then lacks trailing whitespace
        assert_eq!(match_position("10.30am sitting"), None);
    }

    #[test]
    fn zero_is_not_a_position() {
        assert_eq!(match_position("0 2024/1234"), None);
    }

    #[test]
    fn spaced_record_number() {
        let m = find_case_number(ListType::Chancery, "EASTWOOD -V- RICHARDS 2021 5113 P").unwrap();
        assert_eq!(m.as_str(), "2021 5113 P");
    }

    #[test]
    fn bail_record_number() {
        let m =
            find_case_number(ListType::Bail, "DPP -V- JOYCE DONNA\tDOCHAS\t\t2025 2073 SS").unwrap();
        assert_eq!(m.as_str(), "2025 2073 SS");
    }

    #[test]
    fn no_record_number_style() {
        let m = find_case_number(ListType::Commercial, "Kelly plc -v- Murphy 2019 No. 6734 P")
            .unwrap();
        assert_eq!(m.as_str(), "2019 No. 6734 P");
    }

    #[test]
    fn slash_record_first_for_circuit() {
        let m = find_case_number(ListType::Circuit, "2024/1234\tSmith v Jones").unwrap();
        assert_eq!(m.as_str(), "2024/1234");
    }

    #[test]
    fn prefixed_record_for_circuit() {
        let m = find_case_number(ListType::Circuit, "WOC123/2024 In re Doyle").unwrap();
        assert_eq!(m.as_str(), "WOC123/2024");
    }

    #[test]
    fn party_indicator_variants() {
        assert!(has_party_indicator("EASTWOOD & ANOR -V- RICHARDS"));
        assert!(has_party_indicator("Smith v Jones"));
        assert!(has_party_indicator("Smith VS Jones"));
        assert!(has_party_indicator("Smith versus Jones"));
        assert!(!has_party_indicator("Vacated hearing"));
        assert!(!has_party_indicator("In re an application"));
    }
}
