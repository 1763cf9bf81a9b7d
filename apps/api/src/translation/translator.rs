//! Terminology-grounded translation.
//!
//! Each item runs its own retrieve → prompt → generate cycle. Batches run the
//! items one after another in input order; an item that fails is logged and
//! left as `None` without stopping the rest.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::generation::generator::{
    GenerationOutcome, GenerationRequest, GroundedGenerator, RetryPolicy,
};
use crate::llm_client::{ModelInvoker, SamplingParams, DEFAULT_MAX_TOKENS};
use crate::retrieval::{FallbackRetriever, LookupScope, RetrievalResult};
use crate::search::{FieldFilter, RecordStore, RetrievalError, CONTENT_FIELD};
use crate::translation::models::{
    TermDocType, TermRecord, TranslationJob, DOC_CATEGORY_FIELD, DOC_TYPE_FIELD, IDX_FIELD,
};
use crate::translation::prompt_builder::build_translation_prompt;
use crate::translation::prompts::{
    TRANSLATION_PREFILL, TRANSLATION_STOP, TRANSLATION_TEMPLATE_VERSION,
};

/// Terminology records per doc type.
pub const TERM_PAGE_SIZE: usize = 10;
pub const TRANSLATION_MAX_ATTEMPTS: u32 = 2;

/// Low temperature, narrow nucleus: translations should be repeatable.
pub const TRANSLATION_SAMPLING: SamplingParams = SamplingParams {
    temperature: Some(0.1),
    top_p: Some(0.5),
    top_k: Some(50),
};

pub fn terminology_scope(doc_type: TermDocType) -> LookupScope {
    LookupScope::new(TERM_PAGE_SIZE)
        .with_filter(FieldFilter::term(DOC_TYPE_FIELD, doc_type.as_str()))
        .with_source_fields(&[IDX_FIELD, DOC_CATEGORY_FIELD, CONTENT_FIELD, DOC_TYPE_FIELD])
}

fn term_records(result: &RetrievalResult) -> Result<Vec<TermRecord>, RetrievalError> {
    result.hits.iter().map(TermRecord::from_hit).collect()
}

pub struct Translator {
    retriever: FallbackRetriever,
    generator: GroundedGenerator,
}

impl Translator {
    pub fn new(store: Arc<dyn RecordStore>, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            retriever: FallbackRetriever::new(store),
            generator: GroundedGenerator::new(
                invoker,
                RetryPolicy::fixed(TRANSLATION_MAX_ATTEMPTS),
            ),
        }
    }

    /// Translates one text. Returns the model's text between the prefilled
    /// `<translation>` and the stop sequence, untrimmed.
    pub async fn translate_item(
        &self,
        content: &str,
        src_lang: &str,
        dest_lang: &str,
        model_id: &str,
    ) -> Result<String, AppError> {
        let multilingual = self
            .retriever
            .retrieve(content, &terminology_scope(TermDocType::Multilingual))
            .await?;
        let crosslingual = self
            .retriever
            .retrieve(content, &terminology_scope(TermDocType::Crosslingual))
            .await?;
        debug!(
            "Terminology: {} multilingual ({:?}), {} crosslingual ({:?})",
            multilingual.hits.len(),
            multilingual.tier,
            crosslingual.hits.len(),
            crosslingual.tier
        );

        let prompt = build_translation_prompt(
            &term_records(&multilingual)?,
            &term_records(&crosslingual)?,
            content,
            src_lang,
            dest_lang,
        );
        if !prompt.tag_markup.is_empty() {
            warn!(
                "Translation prompt carries tag-shaped text: {:?}",
                prompt.tag_markup
            );
        }
        debug!(
            "Translation prompt ({TRANSLATION_TEMPLATE_VERSION}):\n{}",
            prompt.instruction
        );

        let request = GenerationRequest {
            model_id: model_id.to_string(),
            prompt: prompt.instruction,
            system_context: None,
            stop_sequences: vec![TRANSLATION_STOP.to_string()],
            prefill: TRANSLATION_PREFILL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            sampling: TRANSLATION_SAMPLING,
        };

        match self.generator.generate(&request).await {
            GenerationOutcome::Success(text) => Ok(text),
            GenerationOutcome::Failure {
                reason,
                attempts_made,
            } => Err(AppError::Generation {
                reason,
                attempts: attempts_made,
            }),
        }
    }

    /// One slot per input, in input order.
    pub async fn translate_batch(
        &self,
        items: &[String],
        src_lang: &str,
        dest_lang: &str,
        model_id: &str,
    ) -> Vec<Option<String>> {
        let mut translated = Vec::with_capacity(items.len());

        for (i, content) in items.iter().enumerate() {
            match self.translate_item(content, src_lang, dest_lang, model_id).await {
                Ok(text) => translated.push(Some(text)),
                Err(e) => {
                    warn!("Translation of item {i} failed: {e}");
                    translated.push(None);
                }
            }
        }

        translated
    }

    /// Fills `dest_content` for the whole job.
    pub async fn translate_job(&self, mut job: TranslationJob, model_id: &str) -> TranslationJob {
        let dest = self
            .translate_batch(&job.src_content, &job.src_lang, &job.dest_lang, model_id)
            .await;
        info!(
            "Translated {}/{} item(s) {} → {}",
            dest.iter().filter(|d| d.is_some()).count(),
            dest.len(),
            job.src_lang,
            job.dest_lang
        );
        job.dest_content = Some(dest);
        job
    }
}
