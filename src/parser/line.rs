use regex::Match;
use serde::Serialize;
use tracing::debug;

use super::list_type::ListType;
use super::patterns::{self, PositionMatch};

/// One accepted docket line. `is_case` is always true on a constructed value;
/// rejected lines travel as `LineClassification::NotCase` instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedCase {
    pub list_number: Option<u32>,
    pub list_suffix: Option<String>,
    pub case_number: Option<String>,
    pub title: String,
    pub parties: Option<String>,
    pub is_case: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineClassification {
    Case(ParsedCase),
    NotCase(String),
}

/// Classify one trimmed, non-empty line under the page's grammar.
pub fn classify_line(line: &str, list_type: ListType) -> LineClassification {
    match list_type {
        ListType::CourtOfAppeal => classify_appeal(line),
        ListType::Commercial | ListType::Family => classify_unnumbered(line, list_type),
        _ => classify_numbered(line, list_type),
    }
}

// Chancery, bail, circuit, high-court-general: a case line needs both a list
// position and a case number. A position without a case number stays a
// non-case because the case number forms the downstream natural key; the drop
// is logged so numbered-but-number-less grammars can be audited.
fn classify_numbered(line: &str, list_type: ListType) -> LineClassification {
    let Some(pos) = patterns::match_position(line) else {
        return LineClassification::NotCase(line.to_string());
    };
    let remainder = line[pos.end..].trim();
    match patterns::find_case_number(list_type, remainder) {
        Some(m) => LineClassification::Case(build_case(Some(pos), remainder, m, list_type)),
        None => {
            debug!(
                list_type = list_type.as_str(),
                position = pos.number,
                "numbered line without a case number kept as non-case"
            );
            LineClassification::NotCase(remainder.to_string())
        }
    }
}

// Commercial and family lists invert the rule: numbered lines are practice
// directions, case lines are unnumbered.
fn classify_unnumbered(line: &str, list_type: ListType) -> LineClassification {
    if patterns::match_position(line).is_some() {
        return LineClassification::NotCase(line.to_string());
    }
    match patterns::find_case_number(list_type, line) {
        Some(m) => LineClassification::Case(build_case(None, line, m, list_type)),
        None => LineClassification::NotCase(line.to_string()),
    }
}

// Court of Appeal pages mix numbered call-over items with unnumbered hearing
// items, so two independent attempts run and the first success wins.
fn classify_appeal(line: &str) -> LineClassification {
    let attempts = [positional_attempt(line), hearing_attempt(line)];
    match attempts.into_iter().flatten().next() {
        Some(case) => LineClassification::Case(case),
        None => LineClassification::NotCase(line.to_string()),
    }
}

fn positional_attempt(line: &str) -> Option<ParsedCase> {
    let pos = patterns::match_position(line)?;
    let remainder = line[pos.end..].trim();
    let m = patterns::find_case_number(ListType::CourtOfAppeal, remainder)?;
    Some(build_case(Some(pos), remainder, m, ListType::CourtOfAppeal))
}

fn hearing_attempt(line: &str) -> Option<ParsedCase> {
    if !patterns::has_party_indicator(line) {
        return None;
    }
    let m = patterns::find_case_number(ListType::CourtOfAppeal, line)?;
    Some(build_case(None, line, m, ListType::CourtOfAppeal))
}

fn build_case(
    position: Option<PositionMatch>,
    remainder: &str,
    m: Match<'_>,
    list_type: ListType,
) -> ParsedCase {
    let parties = extract_parties(remainder, m.start(), m.end(), list_type);
    let title = parties.clone().unwrap_or_else(|| remainder.to_string());
    ParsedCase {
        list_number: position.as_ref().map(|p| p.number),
        list_suffix: position.and_then(|p| p.suffix),
        case_number: Some(m.as_str().trim().to_string()),
        title,
        parties,
        is_case: true,
    }
}

// A case number near the start of the remainder is leading (parties follow
// it); otherwise the longer of the two sides tells us which way round the
// line is written. Bail lines put solicitor/prison columns between the
// parties and the record number, so they compare lengths directly.
const LEADING_WINDOW: usize = 30;

fn extract_parties(remainder: &str, start: usize, end: usize, list_type: ListType) -> Option<String> {
    let before = remainder[..start].trim();
    let after = remainder[end..].trim();
    let trailing = if list_type == ListType::Bail {
        before.len() > after.len()
    } else {
        start > LEADING_WINDOW && after.len() <= before.len()
    };
    let raw = if trailing {
        before.split('\t').next().unwrap_or("")
    } else {
        after
    };
    let cleaned = trim_separators(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_case(line: &str, list_type: ListType) -> ParsedCase {
        match classify_line(line, list_type) {
            LineClassification::Case(c) => c,
            LineClassification::NotCase(t) => panic!("expected case, got non-case: {t:?}"),
        }
    }

    fn expect_not_case(line: &str, list_type: ListType) -> String {
        match classify_line(line, list_type) {
            LineClassification::NotCase(t) => t,
            LineClassification::Case(c) => panic!("expected non-case, got {c:?}"),
        }
    }

    #[test]
    fn circuit_numbered_case() {
        let c = expect_case("1\t2024/1234\tSmith v Jones", ListType::Circuit);
        assert_eq!(c.list_number, Some(1));
        assert_eq!(c.list_suffix, None);
        assert_eq!(c.case_number.as_deref(), Some("2024/1234"));
        assert_eq!(c.parties.as_deref(), Some("Smith v Jones"));
        assert_eq!(c.title, "Smith v Jones");
        assert!(c.is_case);
    }

    #[test]
    fn circuit_suffix_case() {
        let c = expect_case("4a\t2024/1234\tSmith v Jones", ListType::Circuit);
        assert_eq!(c.list_number, Some(4));
        assert_eq!(c.list_suffix.as_deref(), Some("a"));
    }

    #[test]
    fn chancery_year_led_line_is_not_a_case() {
        let t = expect_not_case("2021 5113 P EASTWOOD & ANOR -V- RICHARDS", ListType::Chancery);
        assert_eq!(t, "2021 5113 P EASTWOOD & ANOR -V- RICHARDS");
    }

    #[test]
    fn chancery_numbered_case() {
        let c = expect_case("7. 2021 5113 P EASTWOOD & ANOR -V- RICHARDS", ListType::Chancery);
        assert_eq!(c.list_number, Some(7));
        assert_eq!(c.case_number.as_deref(), Some("2021 5113 P"));
        assert_eq!(c.parties.as_deref(), Some("EASTWOOD & ANOR -V- RICHARDS"));
    }

    #[test]
    fn bail_trailing_record_number() {
        let c = expect_case("1\tDPP -V- JOYCE DONNA\tDOCHAS\t\t2025 2073 SS", ListType::Bail);
        assert_eq!(c.list_number, Some(1));
        assert_eq!(c.case_number.as_deref(), Some("2025 2073 SS"));
        assert_eq!(c.parties.as_deref(), Some("DPP -V- JOYCE DONNA"));
    }

    #[test]
    fn position_without_case_number_is_dropped() {
        let t = expect_not_case("3. Counsel to attend at 10.30", ListType::HighCourtGeneral);
        assert_eq!(t, "Counsel to attend at 10.30");
    }

    #[test]
    fn plain_notice_is_not_a_case() {
        expect_not_case("The following cases stand adjourned", ListType::Circuit);
    }

    #[test]
    fn commercial_numbered_line_is_practice_direction() {
        expect_not_case("1. Practice Direction HC100 applies 2019 No. 6734 P", ListType::Commercial);
    }

    #[test]
    fn commercial_unnumbered_case() {
        let c = expect_case(
            "Kellystown Holdings plc -v- Murphy Logistics 2019 No. 6734 P",
            ListType::Commercial,
        );
        assert_eq!(c.list_number, None);
        assert_eq!(c.case_number.as_deref(), Some("2019 No. 6734 P"));
        assert_eq!(c.parties.as_deref(), Some("Kellystown Holdings plc -v- Murphy Logistics"));
    }

    #[test]
    fn family_unnumbered_case() {
        let c = expect_case("2024 112 M\tK. v K.", ListType::Family);
        assert_eq!(c.list_number, None);
        assert_eq!(c.case_number.as_deref(), Some("2024 112 M"));
        assert_eq!(c.parties.as_deref(), Some("K. v K."));
    }

    #[test]
    fn appeal_numbered_callover_item() {
        let c = expect_case("5.\tDirector of Public Prosecutions -v- Walsh 2024/87", ListType::CourtOfAppeal);
        assert_eq!(c.list_number, Some(5));
        assert_eq!(c.case_number.as_deref(), Some("2024/87"));
        assert_eq!(c.parties.as_deref(), Some("Director of Public Prosecutions -v- Walsh"));
    }

    #[test]
    fn appeal_unnumbered_hearing_item() {
        let c = expect_case("Allied Holdings Limited -v- Byrne & Anor 2023/145", ListType::CourtOfAppeal);
        assert_eq!(c.list_number, None);
        assert_eq!(c.case_number.as_deref(), Some("2023/145"));
        assert_eq!(c.parties.as_deref(), Some("Allied Holdings Limited -v- Byrne & Anor"));
    }

    #[test]
    fn appeal_unnumbered_needs_party_indicator() {
        // Carries a record number but no -v-/vs token, so it stays a notice.
        expect_not_case("Directions in appeal 2023/145 adjourned generally", ListType::CourtOfAppeal);
    }

    #[test]
    fn appeal_numbered_without_case_number_is_not_a_case() {
        expect_not_case("2. Ruling to be delivered electronically", ListType::CourtOfAppeal);
    }

    #[test]
    fn leading_case_number_takes_parties_from_after() {
        let c = expect_case("9. 2024/221\tO'Brien -v- Clare County Council", ListType::Circuit);
        assert_eq!(c.parties.as_deref(), Some("O'Brien -v- Clare County Council"));
    }

    #[test]
    fn title_falls_back_to_remainder_when_parties_empty() {
        let c = expect_case("3. 2024/77", ListType::Circuit);
        assert_eq!(c.parties, None);
        assert_eq!(c.title, "2024/77");
    }

    #[test]
    fn classification_is_deterministic() {
        let line = "1\t2024/1234\tSmith v Jones";
        assert_eq!(
            classify_line(line, ListType::Circuit),
            classify_line(line, ListType::Circuit)
        );
    }
}
