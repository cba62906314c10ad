//! The Binding Store (§2 item 1, §3.1, §5).
//!
//! A transactional key/value store over AOR → set of bindings. The trait
//! is implementation-agnostic so a future persistent engine can stand in
//! for [`memory::InMemoryBindingStore`] without touching the rest of this
//! crate; correctness only requires that `commit` is serializable against
//! other transactions on the same AOR (§5 Shared resources).

pub mod memory;

use crate::domain::Binding;
use crate::error::RegistrarError;
use async_trait::async_trait;

pub use memory::InMemoryBindingStore;

/// A single REGISTER's mutation, scoped to one AOR. Dropping without
/// calling [`BindingTxn::commit`] discards every mutation made through it —
/// the rollback signal named in §9 Design Notes, modeled as ordinary Rust
/// drop semantics rather than a distinct error type.
#[async_trait]
pub trait BindingTxn: Send {
    /// Snapshot of this AOR's bindings as of `begin`, plus any mutation
    /// already applied within this transaction.
    fn list(&self) -> &[Binding];

    /// Insert or replace the binding matching `(aor, contact_uri_str)`.
    fn upsert(&mut self, binding: Binding);

    /// Remove the binding matching `contact_uri_str`, if any.
    fn remove(&mut self, contact_uri_str: &str);

    /// Make every mutation made through this transaction visible to future
    /// transactions and reads.
    async fn commit(self: Box<Self>) -> Result<(), RegistrarError>;
}

#[async_trait]
pub trait BindingStore: Send + Sync {
    /// Begin a transaction scoped to `aor`. Serializes with any other
    /// in-flight transaction for the same AOR; transactions on distinct
    /// AORs proceed concurrently (§5 Scheduling, §9 Design Notes).
    async fn begin<'a>(&'a self, aor: &'a str) -> Box<dyn BindingTxn + 'a>;

    /// Non-transactional snapshot read, for the Query Surface (§4.8, §5
    /// Suspension points: "Reads in the Query Surface are non-transactional
    /// snapshots acceptable for routing decisions").
    async fn snapshot(&self, aor: &str) -> Vec<Binding>;

    /// Non-transactional snapshot read across every AOR currently known to
    /// the store, for reverse contact lookup (§4.8 `GetUserWithContact`).
    async fn snapshot_all(&self) -> Vec<Binding>;
}
