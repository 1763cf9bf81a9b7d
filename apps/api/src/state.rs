use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ModelInvoker;
use crate::search::RecordStore;
use crate::storage::blob::BlobStore;
use crate::storage::terms::TermStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every handle is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Search index holding terminology and moderation precedents.
    pub record_store: Arc<dyn RecordStore>,
    pub llm: Arc<dyn ModelInvoker>,
    /// Job objects and translation output.
    pub blobs: Arc<dyn BlobStore>,
    /// Key-value terminology table.
    pub terms: Arc<dyn TermStore>,
    pub config: Config,
}
