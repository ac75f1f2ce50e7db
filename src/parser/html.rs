//! Lenient HTML scanning over raw page text.
//!
//! Legacy exercise pages are machine-generated and flat, so a tag scanner with
//! depth matching covers everything the parser asks for. Nothing here fails:
//! unbalanced or truncated markup yields shorter or absent results.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap()
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A page with comments, scripts and styles removed.
pub struct Document {
    src: String,
}

/// One element located in a [`Document`].
#[derive(Debug, Clone)]
pub struct Element<'a> {
    attrs: Vec<(String, String)>,
    inner: &'a str,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let src = COMMENT_RE.replace_all(html, "");
        let src = SCRIPT_RE.replace_all(&src, "");
        let src = STYLE_RE.replace_all(&src, "");
        Document { src: src.into_owned() }
    }

    /// First element with the given tag name, anywhere in the page.
    pub fn first(&self, tag: &str) -> Option<Element<'_>> {
        find_first(&self.src, |name, _| name.eq_ignore_ascii_case(tag))
    }

    /// First element whose class list contains `class`.
    pub fn first_with_class(&self, class: &str) -> Option<Element<'_>> {
        find_first(&self.src, |_, attrs| has_class(attrs, class))
    }
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn inner_html(&self) -> &'a str {
        self.inner
    }

    /// Concatenated text of all descendants, whitespace preserved.
    pub fn text(&self) -> String {
        text_content(self.inner)
    }

    /// Descendants whose class list contains `class`, in document order.
    pub fn descendants_with_class(&self, class: &str) -> Vec<Element<'a>> {
        let src = self.inner;
        let mut found = Vec::new();
        for caps in TAG_RE.captures_iter(src) {
            if !caps[1].is_empty() {
                continue;
            }
            let attrs = parse_attrs(&caps[3]);
            if has_class(&attrs, class) {
                let whole = caps.get(0).map_or(0..0, |m| m.range());
                found.push(element_at(src, &caps[2], attrs, &caps[3], whole.end));
            }
        }
        found
    }
}

fn find_first<'a, F>(src: &'a str, pred: F) -> Option<Element<'a>>
where
    F: Fn(&str, &[(String, String)]) -> bool,
{
    for caps in TAG_RE.captures_iter(src) {
        if !caps[1].is_empty() {
            continue;
        }
        let attrs = parse_attrs(&caps[3]);
        if pred(&caps[2], &attrs) {
            let end = caps.get(0).map_or(0, |m| m.end());
            return Some(element_at(src, &caps[2], attrs, &caps[3], end));
        }
    }
    None
}

/// Build the element whose opening tag ends at `open_end`, scanning forward
/// for its matching close tag. An unclosed element runs to the end of input.
fn element_at<'a>(
    src: &'a str,
    name: &str,
    attrs: Vec<(String, String)>,
    raw_attrs: &str,
    open_end: usize,
) -> Element<'a> {
    let tag = name.to_ascii_lowercase();
    if VOID_TAGS.contains(&tag.as_str()) || raw_attrs.trim_end().ends_with('/') {
        return Element { attrs, inner: "" };
    }

    let rest = &src[open_end..];
    let mut depth = 1usize;
    let mut close_at = rest.len();
    for caps in TAG_RE.captures_iter(rest) {
        if !caps[2].eq_ignore_ascii_case(&tag) {
            continue;
        }
        if caps[1].is_empty() {
            if !caps[3].trim_end().ends_with('/') {
                depth += 1;
            }
        } else {
            depth -= 1;
            if depth == 0 {
                close_at = caps.get(0).map_or(rest.len(), |m| m.start());
                break;
            }
        }
    }

    Element {
        attrs,
        inner: &rest[..close_at],
    }
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str());
            (c[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

fn has_class(attrs: &[(String, String)], class: &str) -> bool {
    attrs
        .iter()
        .any(|(k, v)| k == "class" && v.split_whitespace().any(|c| c == class))
}

/// Strip tags and decode entities; whitespace is kept as written.
pub fn text_content(html: &str) -> String {
    decode_entities(&TAG_RE.replace_all(html, ""))
}

pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITY_RE
        .replace_all(s, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Minimal escaping for text and attribute values written into markup.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
