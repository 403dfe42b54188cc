pub mod dates;
pub mod detail;
pub mod line;
pub mod list_type;
pub mod listing;
pub mod patterns;

pub use detail::{parse_cases, parse_detail, CasesResult};
pub use line::{LineClassification, ParsedCase};
pub use list_type::ListType;
pub use listing::{parse_listing, DiaryEntry};

use crate::db::StoredPage;

/// Parse output for one stored detail page, ready for persistence.
pub struct ParsedPage {
    pub diary_id: i64,
    pub page_data_id: i64,
    pub list_type: ListType,
    pub result: CasesResult,
}

/// Pipeline entry for the process phase: stored HTML → cases + headers.
pub fn process_page(page: &StoredPage) -> ParsedPage {
    let (list_type, result) = parse_detail(&page.html);
    ParsedPage {
        diary_id: page.diary_id,
        page_data_id: page.page_data_id,
        list_type,
        result,
    }
}
