//! Open Graph / Twitter card metadata extraction.
//!
//! Third-party pages are often malformed and we only ever need a handful of
//! `<meta>` tags plus `<title>`, so this works on the raw text with regexes
//! instead of building a DOM.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A `<meta ...>` tag. Quoted attribute values may contain `>`.
static META_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("meta tag regex should compile")
});

/// One `name=value` attribute with a double-quoted, single-quoted or bare value.
static ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute regex should compile")
});

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex should compile")
});

/// Named, decimal and hex character references. Digit counts are bounded so
/// the numeric parse cannot overflow.
static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);")
        .expect("entity regex should compile")
});

/// Metadata extracted from an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Image URL exactly as written in the page; may be relative.
    pub image: Option<String>,
    pub site_name: Option<String>,
}

/// Extract title, description, image and site name from raw HTML.
///
/// Precedence:
/// - title: `og:title`, `twitter:title`, `<title>`
/// - description: `og:description`, `description`, `twitter:description`
/// - image: `og:image`, `twitter:image`, `twitter:image:src`
/// - site name: `og:site_name`
///
/// Values are entity-decoded and trimmed; empty values are treated as absent.
pub fn extract_html_metadata(html: &str) -> HtmlMetadata {
    let meta = collect_meta(html);
    let pick = |keys: &[&str]| keys.iter().find_map(|k| meta.get(*k).cloned());

    let title = pick(&["og:title", "twitter:title"]).or_else(|| title_text(html));

    HtmlMetadata {
        title,
        description: pick(&["og:description", "description", "twitter:description"]),
        image: pick(&["og:image", "twitter:image", "twitter:image:src"]),
        site_name: pick(&["og:site_name"]),
    }
}

/// Map `property`/`name` (lowercased) to decoded `content`, first non-empty wins.
fn collect_meta(html: &str) -> HashMap<String, String> {
    let mut found = HashMap::new();

    for tag in META_TAG_REGEX.find_iter(html) {
        let mut key = None;
        let mut name = None;
        let mut content = None;

        for attr in ATTRIBUTE_REGEX.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            match attr[1].to_ascii_lowercase().as_str() {
                "property" => key = key.or(Some(value)),
                "name" => name = name.or(Some(value)),
                "content" => content = content.or(Some(value)),
                _ => {}
            }
        }

        let Some(key) = key.or(name) else { continue };
        let Some(value) = content.and_then(clean) else {
            continue;
        };
        found
            .entry(key.trim().to_ascii_lowercase())
            .or_insert(value);
    }

    found
}

fn title_text(html: &str) -> Option<String> {
    TITLE_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| clean(m.as_str()))
}

/// Decode and trim; `None` if nothing is left.
fn clean(raw: &str) -> Option<String> {
    let decoded = decode_html_entities(raw);
    let trimmed = decoded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decode the HTML character references that show up in meta tags.
///
/// Handles `&amp; &lt; &gt; &quot; &#39; &apos; &nbsp;` plus decimal and hex
/// numeric references. Anything unknown or invalid (e.g. a surrogate code
/// point) is left as written.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    let named = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    };
    if let Some(c) = named {
        return Some(c.to_string());
    }

    let numeric = body.strip_prefix('#')?;
    let code = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => numeric.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(String::from)
}
