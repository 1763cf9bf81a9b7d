// Two-tier retrieval over the record store.
// Both the moderation and translation pipelines fetch their grounding records here.

pub mod fallback;

pub use fallback::{FallbackRetriever, LookupScope, RetrievalResult, Tier};
