//! Series title extraction
//!
//! Broadcast program titles carry markers the server search can't use:
//! `[新]`, `【字】`, `#3`, `第3話`, and so on. `extract_series_title` peels
//! those off and returns the bare series name used as the keyword for the
//! "same series" row.

use regex::Regex;
use std::sync::OnceLock;

/// Leading broadcast flags removed before extraction
const DELETE_PATTERN: &str = r"^(?:\s*[\[［【](?:新番組|最終回|新|終|再|字|デ|解|無|二|多|生|映|双|手|初|SS|S|N|HV|PV|New|NEW)[\]］】])+";

/// Episode numbering that ends the series part of a title
const EPISODE_PATTERN: &str = r"[＃#][0-9０-９]+|第[0-9０-９]+[話回]";

/// One optional leading annotation, the series name, then an optional trailing marker
const EXTRACTION_PATTERN: &str = r"^(?:\[[^\]]*\]|【[^】]*】|\(吹\)|［[^］]*］)?\s*([^\d【\s\[\]]+(?:\s*[^\d【\s\[\]]+)*)\s*(?:[＃#]\d+|第[0-9０-９]+[話回]|【[^】]*】|\[\d*\])?.*";

static DELETE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static EPISODE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static EXTRACTION_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Extract the series name from a raw program title.
///
/// Returns an empty string when nothing usable is left, in which case no
/// "same series" row should be built.
pub fn extract_series_title(raw_title: &str) -> String {
    let stripped = match compiled(&DELETE_RE, DELETE_PATTERN) {
        Some(re) => re.replace(raw_title, "").into_owned(),
        None => raw_title.to_string(),
    };

    // Everything from the first episode number onward is episode-specific
    let series_part = match compiled(&EPISODE_RE, EPISODE_PATTERN).and_then(|re| re.find(&stripped)) {
        Some(m) => &stripped[..m.start()],
        None => stripped.as_str(),
    };

    compiled(&EXTRACTION_RE, EXTRACTION_PATTERN)
        .and_then(|re| re.captures(series_part))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
