use chrono::NaiveDate;

/// Convert the listing page's sortable date token (yyyymmdd) to an ISO date.
/// Anything other than exactly 8 ASCII digits yields None.
pub fn sort_token_to_iso(token: &str) -> Option<String> {
    let token = token.trim();
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y%m%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// Convert an ISO date back to the sortable token form.
pub fn iso_to_sort_token(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y%m%d").to_string())
}

/// Convert an ISO date to the dd-mm-yyyy form the source uses in query
/// strings (dateFrom/dateTo).
pub fn iso_to_url_date(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d-%m-%Y").to_string())
}

/// Parse a dd-mm-yyyy URL date back to ISO.
pub fn url_date_to_iso(s: &str) -> Option<String> {
    NaiveDate::parse_from_str(s.trim(), "%d-%m-%Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
