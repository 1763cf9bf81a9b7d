// Shared prompt-building utilities.
// Each service that needs model calls defines its own prompts.rs alongside it;
// this file holds the cross-cutting helpers.

use std::sync::OnceLock;

use regex::Regex;

/// Fills `{name}` placeholders in a single left-to-right pass over the template.
///
/// Values are inserted verbatim and never re-scanned, so a retrieved record that
/// happens to contain `{content}` cannot pull the input text in a second time.
/// Placeholders with no matching key are left untouched.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = values.iter().find_map(|(key, value)| {
            after
                .strip_prefix(key)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (value, tail))
        });

        match replaced {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn tag_markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"</?\w+>").expect("tag markup pattern is valid"))
}

/// Returns the tag-shaped substrings (`<name>` or `</name>`) found in `text`.
///
/// Interpolated text is never escaped; callers log these so a corrupted prompt or
/// parse can be traced back to the record that caused it.
pub fn find_tag_markup(text: &str) -> Vec<&str> {
    tag_markup_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}
