//! Pattern-based SOP metadata extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::types::SopMetadata;

static SOP_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"SOP #:\s*(\d+\.\d+)").unwrap());
static FILENAME_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[._](\d+)").unwrap());
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version:\s*(\d+\.\d+)").unwrap());
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Standard Operating Procedures?\s*\n(.+?)(?:\n|Page)").unwrap()
});
static EFFECTIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Effective Date[:\s]+(\d{1,2}/\d{1,2}/\d{4})").unwrap());

fn first_group(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Derive SOP metadata from document text and its file name.
///
/// Every field is searched independently and defaults to an empty string.
/// The SOP number falls back to a `{digits}[._]{digits}` file name prefix, and
/// the title falls back to the file name without `.pdf` and with underscores
/// turned into spaces.
#[must_use]
pub fn extract_metadata(text: &str, filename: &str) -> SopMetadata {
    let sop_number = first_group(&SOP_NUMBER_RE, text)
        .or_else(|| {
            FILENAME_NUMBER_RE
                .captures(filename)
                .map(|c| format!("{}.{}", &c[1], &c[2]))
        })
        .unwrap_or_default();

    let title = first_group(&TITLE_RE, text)
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_filename(filename));

    SopMetadata {
        filename: filename.to_owned(),
        sop_number,
        version: first_group(&VERSION_RE, text).unwrap_or_default(),
        title,
        effective_date: first_group(&EFFECTIVE_DATE_RE, text).unwrap_or_default(),
    }
}

fn title_from_filename(filename: &str) -> String {
    filename.replace(".pdf", "").replace('_', " ")
}
