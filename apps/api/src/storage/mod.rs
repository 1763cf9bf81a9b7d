// External collaborators: object storage, object-key handling, and the
// key-value terminology table.

pub mod blob;
pub mod keys;
pub mod terms;
