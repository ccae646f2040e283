//! Storage adapters - ProfileStore implementations.

mod file_store;
mod in_memory_store;

pub use file_store::FileProfileStore;
pub use in_memory_store::InMemoryProfileStore;
