//! Translation prompt assembly: a glossary of keep-as-is terms and a mapping table
//! of known term translations, built from retrieved terminology records.

use std::collections::HashSet;

use serde_json::Value;

use crate::llm_client::prompts::{find_tag_markup, render_template};
use crate::translation::models::{TermRecord, TerminologyMapping};
use crate::translation::prompts::TRANSLATION_PROMPT_TEMPLATE;

#[derive(Debug, Clone, PartialEq)]
pub struct TranslationPrompt {
    pub instruction: String,
    pub tag_markup: Vec<String>,
}

/// `{"term": ..., "entity_type": ...}` with non-ASCII text left unescaped.
pub fn glossary_line(record: &TermRecord) -> String {
    // Value's Display writes a quoted, escaped JSON string
    format!(
        r#"{{"term": {}, "entity_type": {}}}"#,
        Value::from(record.content.as_str()),
        Value::from(record.doc_category.as_str()),
    )
}

/// Rendered mapping lines in retrieval order, each distinct line kept once at its
/// first position. Records without both languages or an entity type are skipped.
pub fn mapping_lines(records: &[TermRecord], src_lang: &str, dest_lang: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| TerminologyMapping::from_record(r, src_lang, dest_lang))
        .map(|m| m.render())
        .filter(|line| seen.insert(line.clone()))
        .collect()
}

pub fn build_translation_prompt(
    multilingual: &[TermRecord],
    crosslingual: &[TermRecord],
    content: &str,
    src_lang: &str,
    dest_lang: &str,
) -> TranslationPrompt {
    let vocabulary = crosslingual
        .iter()
        .map(glossary_line)
        .collect::<Vec<_>>()
        .join("\n");
    let mappings = mapping_lines(multilingual, src_lang, dest_lang).join("\n");

    let instruction = render_template(
        TRANSLATION_PROMPT_TEMPLATE,
        &[
            ("src_lang", src_lang),
            ("dest_lang", dest_lang),
            ("vocabulary", vocabulary.as_str()),
            ("mappings", mappings.as_str()),
            ("content", content),
        ],
    );

    let tag_markup = [vocabulary.as_str(), mappings.as_str(), content]
        .into_iter()
        .flat_map(find_tag_markup)
        .map(str::to_string)
        .collect();

    TranslationPrompt {
        instruction,
        tag_markup,
    }
}
