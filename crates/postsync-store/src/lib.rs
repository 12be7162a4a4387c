//! Persistence for postsync: the [`PostStore`] seam, a PostgREST-backed store,
//! an in-memory store, and the policy-enforcing [`StoreWriter`].

pub mod error;
pub mod memory;
pub mod rest;
pub mod store;
pub mod writer;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use store::PostStore;
pub use writer::{StoreWriter, WriteOutcome};
