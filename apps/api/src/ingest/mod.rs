// Offline ingestion jobs: source objects in the blob store feed the search
// index (terminology and precedents) and the key-value terminology table.

pub mod documents;
pub mod handlers;
pub mod terminology;
