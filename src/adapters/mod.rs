// Adapters layer: concrete implementations of the domain ports for files,
// HTTP and in-memory collection.

pub mod sink;
pub mod source;
pub mod storage;
