//! Tagged-Output Parser: `<name>content</name>` segments to a tag map.
//!
//! Parsing policy:
//! - Scan left to right. At each `<name>` take the content up to the nearest
//!   `</name>` with the same name, then resume after that closing tag. Tags of a
//!   different name inside the pair stay in the content and are not extracted.
//! - An opening tag with no matching close is skipped and scanning resumes one
//!   character later, so `<result>pass` alone yields an empty map.
//! - A repeated tag name overwrites: the last occurrence wins.
//! - Content may span lines and is kept verbatim (no trimming).
//!
//! Malformed output never fails here; it yields a partial or empty map.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

pub type TagMap = BTreeMap<String, String>;

fn opening_tag() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<(\w+)>").expect("opening tag pattern is valid"))
}

pub fn parse_tags(raw: &str) -> TagMap {
    let mut tags = TagMap::new();
    let mut pos = 0;

    while let Some(caps) = opening_tag().captures_at(raw, pos) {
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let close = format!("</{}>", name.as_str());

        match raw[open.end()..].find(&close) {
            Some(offset) => {
                let content_end = open.end() + offset;
                tags.insert(
                    name.as_str().to_string(),
                    raw[open.end()..content_end].to_string(),
                );
                pos = content_end + close.len();
            }
            // `<` is one byte, so start + 1 is always a char boundary
            None => pos = open.start() + 1,
        }
    }

    tags
}
