//! In-memory reference implementation of the Binding Store.
//!
//! Per §9 Design Notes: "an in-memory implementation with a single writer
//! lock per AOR is a correct minimal design". Each AOR gets its own
//! `tokio::sync::Mutex` token serializing writers; the bindings themselves
//! live behind a `tokio::sync::RwLock<HashMap<..>>` so non-transactional
//! reads (the Query Surface) never block on a writer holding an AOR lock
//! for longer than the final, brief map update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{BindingStore, BindingTxn};
use crate::domain::Binding;
use crate::error::RegistrarError;

#[derive(Default)]
pub struct InMemoryBindingStore {
    aor_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    bindings: RwLock<HashMap<String, Vec<Binding>>>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn aor_lock(&self, aor: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.aor_locks.read().await.get(aor) {
            return lock.clone();
        }
        let mut locks = self.aor_locks.write().await;
        locks
            .entry(aor.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl BindingStore for InMemoryBindingStore {
    async fn begin<'a>(&'a self, aor: &'a str) -> Box<dyn BindingTxn + 'a> {
        let lock = self.aor_lock(aor).await;
        let guard = lock.lock_owned().await;
        let snapshot = self
            .bindings
            .read()
            .await
            .get(aor)
            .cloned()
            .unwrap_or_default();

        Box::new(MemoryTxn {
            store: self,
            aor: aor.to_string(),
            _guard: guard,
            bindings: snapshot,
        })
    }

    async fn snapshot(&self, aor: &str) -> Vec<Binding> {
        self.bindings
            .read()
            .await
            .get(aor)
            .cloned()
            .unwrap_or_default()
    }

    async fn snapshot_all(&self) -> Vec<Binding> {
        self.bindings
            .read()
            .await
            .values()
            .flat_map(|bindings| bindings.iter().cloned())
            .collect()
    }
}

struct MemoryTxn<'a> {
    store: &'a InMemoryBindingStore,
    aor: String,
    _guard: OwnedMutexGuard<()>,
    bindings: Vec<Binding>,
}

#[async_trait]
impl<'a> BindingTxn for MemoryTxn<'a> {
    fn list(&self) -> &[Binding] {
        &self.bindings
    }

    fn upsert(&mut self, binding: Binding) {
        self.bindings
            .retain(|b| b.contact_uri_str != binding.contact_uri_str);
        self.bindings.push(binding);
    }

    fn remove(&mut self, contact_uri_str: &str) {
        self.bindings.retain(|b| b.contact_uri_str != contact_uri_str);
    }

    async fn commit(self: Box<Self>) -> Result<(), RegistrarError> {
        let mut bindings = self.store.bindings.write().await;
        if self.bindings.is_empty() {
            bindings.remove(&self.aor);
        } else {
            bindings.insert(self.aor.clone(), self.bindings);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BindingClass, BindingFlags, Expiry};
    use chrono::Utc;

    fn binding(contact: &str, call_id: &str, cseq: u32) -> Binding {
        Binding {
            aor: "sip:alice@example.com".to_string(),
            contact_uri: rsip::Uri::try_from(contact).unwrap(),
            contact_uri_str: contact.to_string(),
            class: BindingClass::Dynamic,
            expires_at: Expiry::At(Utc::now() + chrono::Duration::seconds(3600)),
            call_id: call_id.to_string(),
            cseq,
            flags: BindingFlags::default(),
        }
    }

    #[tokio::test]
    async fn commit_makes_mutation_visible() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";

        let mut txn = store.begin(aor).await;
        txn.upsert(binding("sip:alice@192.0.2.1", "call-1", 1));
        txn.commit().await.unwrap();

        let snapshot = store.snapshot(aor).await;
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";

        {
            let mut txn = store.begin(aor).await;
            txn.upsert(binding("sip:alice@192.0.2.1", "call-1", 1));
            // txn dropped here without commit
        }

        let snapshot = store.snapshot(aor).await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn empty_commit_removes_aor() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";

        let mut txn = store.begin(aor).await;
        txn.upsert(binding("sip:alice@192.0.2.1", "call-1", 1));
        txn.commit().await.unwrap();

        let mut txn = store.begin(aor).await;
        txn.remove("sip:alice@192.0.2.1");
        txn.commit().await.unwrap();

        assert!(store.snapshot(aor).await.is_empty());
        assert!(store.snapshot_all().await.is_empty());
    }
}
