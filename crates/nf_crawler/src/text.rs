use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE regex"));

pub(crate) fn decode_entities(s: &str) -> String {
    escaper::decode_html(s).unwrap_or_else(|_| s.to_string())
}

pub(crate) fn to_printable(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

/// Entity-decode, strip control characters, trim.
pub(crate) fn clean_line(s: &str) -> String {
    to_printable(&decode_entities(s)).trim().to_string()
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Truncate to at most `max_chars` characters, cutting back to the last
/// word boundary when a cut lands mid-word.
pub(crate) fn trunc_at_word(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(i) => cut[..i].trim_end().to_string(),
        None => cut,
    }
}
