//! Moderation pipeline: whitelist/blacklist precedents → prompt → model → decision.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::generation::decision::{DecisionRecord, RetrievalDiagnostics};
use crate::generation::generator::{
    GenerationOutcome, GenerationRequest, GroundedGenerator, RetryPolicy,
};
use crate::generation::tags::parse_tags;
use crate::llm_client::{ModelInvoker, SamplingParams, DEFAULT_MAX_TOKENS};
use crate::moderation::models::{
    Bucket, PrecedentRecord, ASSESSMENT_FIELD, CATEGORY_FIELD, CONTENT_TYPE_FIELD, REASON_FIELD,
};
use crate::moderation::prompt_builder::build_moderation_prompt;
use crate::moderation::prompts::{MODERATION_STOP, MODERATION_TEMPLATE_VERSION};
use crate::retrieval::{FallbackRetriever, LookupScope, RetrievalResult};
use crate::search::{FieldFilter, RecordStore, RetrievalError, CONTENT_FIELD};

/// Precedents per bucket.
pub const PRECEDENT_PAGE_SIZE: usize = 5;
pub const MODERATION_MAX_ATTEMPTS: u32 = 3;

/// Both tiers filter on the content category and the bucket label.
pub fn precedent_scope(content_type: &str, bucket: Bucket) -> LookupScope {
    LookupScope::new(PRECEDENT_PAGE_SIZE)
        .with_filter(FieldFilter::term(CONTENT_TYPE_FIELD, content_type))
        .with_filter(FieldFilter::matching(ASSESSMENT_FIELD, bucket.label()))
        .with_source_fields(&[CONTENT_FIELD, CATEGORY_FIELD, REASON_FIELD])
}

fn precedents(
    result: &RetrievalResult,
    bucket: Bucket,
) -> Result<Vec<PrecedentRecord>, RetrievalError> {
    result
        .hits
        .iter()
        .map(|hit| PrecedentRecord::from_hit(hit, bucket))
        .collect()
}

pub struct Moderator {
    retriever: FallbackRetriever,
    generator: GroundedGenerator,
}

impl Moderator {
    pub fn new(store: Arc<dyn RecordStore>, invoker: Arc<dyn ModelInvoker>) -> Self {
        Self {
            retriever: FallbackRetriever::new(store),
            generator: GroundedGenerator::new(
                invoker,
                RetryPolicy::fixed(MODERATION_MAX_ATTEMPTS),
            ),
        }
    }

    /// Produces one decision for `text`.
    ///
    /// Retrieval failures and exhausted generation are errors. A reply the parser
    /// cannot read is not: it yields a record with only the diagnostic counts.
    pub async fn moderate(
        &self,
        text: &str,
        content_type: &str,
        model_id: &str,
    ) -> Result<DecisionRecord, AppError> {
        let white = self
            .retriever
            .retrieve(text, &precedent_scope(content_type, Bucket::Whitelist))
            .await?;
        let black = self
            .retriever
            .retrieve(text, &precedent_scope(content_type, Bucket::Blacklist))
            .await?;

        let diagnostics = RetrievalDiagnostics {
            white_response_cnt: white.precise_hit_count(),
            black_response_cnt: black.precise_hit_count(),
        };
        info!(
            "Moderating {content_type} content: {} whitelist ({:?}), {} blacklist ({:?}) precedent(s)",
            white.hits.len(),
            white.tier,
            black.hits.len(),
            black.tier
        );

        let prompt = build_moderation_prompt(
            &precedents(&white, Bucket::Whitelist)?,
            &precedents(&black, Bucket::Blacklist)?,
            text,
        );
        if !prompt.tag_markup.is_empty() {
            warn!(
                "Moderation prompt carries tag-shaped text that may confuse the output parser: {:?}",
                prompt.tag_markup
            );
        }
        debug!(
            "Moderation prompt ({MODERATION_TEMPLATE_VERSION}):\n{}",
            prompt.instruction
        );

        let request = GenerationRequest {
            model_id: model_id.to_string(),
            prompt: prompt.instruction,
            system_context: Some(prompt.system),
            stop_sequences: vec![MODERATION_STOP.to_string()],
            prefill: prompt.prefill.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            sampling: SamplingParams::default(),
        };

        let raw = match self.generator.generate(&request).await.with_prefix(&prompt.prefill) {
            GenerationOutcome::Success(raw) => raw,
            GenerationOutcome::Failure {
                reason,
                attempts_made,
            } => {
                return Err(AppError::Generation {
                    reason,
                    attempts: attempts_made,
                })
            }
        };
        debug!("Moderation output:\n{raw}");

        let record = DecisionRecord::assemble(parse_tags(&raw), diagnostics);
        if record.is_unparseable() {
            warn!("Moderation output has no parseable <result> verdict");
        }

        Ok(record)
    }
}
