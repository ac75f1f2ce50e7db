use chrono::{DateTime, Utc};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::html::escape;

const TITLE_SUFFIXES: &[&str] = &[
    " - Fill-in-the-blank Exercise (Version 1)",
    " - Fill-in-the-blank Exercise (Version 2)",
    " - Fill-in-the-blank Exercise (Version 3)",
];

/// Remove the generator's version boilerplate from a page title.
pub fn clean_title(title: &str) -> String {
    TITLE_SUFFIXES
        .iter()
        .fold(title.to_string(), |t, suffix| t.replacen(suffix, "", 1))
}

/// First `budget` characters of `text`, trimmed, with `...` appended when
/// anything was cut.
pub fn truncate_description(text: &str, budget: usize) -> String {
    let mut out: String = text.chars().take(budget).collect::<String>().trim().to_string();
    if text.chars().count() > budget {
        out.push_str("...");
    }
    out
}

/// Lowercase, strip diacritics, keep only ASCII letters, digits and `_`.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

pub fn calculate_score(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}

/// Escape `text` for markup and wrap case-insensitive matches of `term` in
/// `<mark>`.
pub fn highlight_search_term(text: &str, term: &str) -> String {
    if term.is_empty() || text.is_empty() {
        return escape(text);
    }
    let re = match Regex::new(&format!("(?i){}", regex::escape(term))) {
        Ok(re) => re,
        Err(_) => return escape(text),
    };

    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape(&text[last..m.start()]));
        out.push_str(r#"<mark class="search-highlight">"#);
        out.push_str(&escape(m.as_str()));
        out.push_str("</mark>");
        last = m.end();
    }
    out.push_str(&escape(&text[last..]));
    out
}

/// `Oct 18, 2026` style date for an RFC 3339 timestamp.
pub fn format_date(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.with_timezone(&Utc).format("%b %-d, %Y").to_string(),
        Err(_) => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_suffixes_removed() {
        for v in 1..=3 {
            let t = format!("les12 - Fill-in-the-blank Exercise (Version {})", v);
            assert_eq!(clean_title(&t), "les12");
        }
        assert_eq!(clean_title("Plain title"), "Plain title");
        assert_eq!(
            clean_title("A - Fill-in-the-blank Exercise (Version 4)"),
            "A - Fill-in-the-blank Exercise (Version 4)"
        );
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_description("  short  ", 150), "short");
        let long = "x".repeat(160);
        let d = truncate_description(&long, 150);
        assert_eq!(d.len(), 153);
        assert!(d.ends_with("..."));
        assert_eq!(truncate_description(&"é".repeat(200), 200).chars().count(), 200);
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_text("Ééne,"), "eene");
        assert_eq!(normalize_text("  Café! "), "cafe");
        assert_eq!(normalize_text("snake_case"), "snake_case");
        assert_eq!(normalize_text("Straße"), "strae");
        assert_eq!(normalize_text("Ærø"), "r");
    }

    #[test]
    fn score() {
        assert_eq!(calculate_score(0, 0), 0);
        assert_eq!(calculate_score(2, 3), 67);
        assert_eq!(calculate_score(5, 5), 100);
    }

    #[test]
    fn highlight() {
        assert_eq!(
            highlight_search_term("Lesson 12 lesson", "LESSON"),
            r#"<mark class="search-highlight">Lesson</mark> 12 <mark class="search-highlight">lesson</mark>"#
        );
        assert_eq!(highlight_search_term("a.b", "."), r#"a<mark class="search-highlight">.</mark>b"#);
        assert_eq!(highlight_search_term("<b>", ""), "&lt;b&gt;");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2026-10-18T09:30:00Z"), "Oct 18, 2026");
        assert_eq!(format_date("yesterday"), "Unknown");
    }
}
