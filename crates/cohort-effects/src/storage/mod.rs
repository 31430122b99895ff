//! Storage Effect Handlers
//!
//! Implementations of `StorageEffects` from cohort-core: an in-memory map for
//! embedding and tests, and a one-file-per-key directory store for hosts that
//! need values to survive restarts.

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemStorageHandler;
pub use memory::MemoryStorageHandler;
