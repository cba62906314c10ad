//! Outbound interface to the transaction/transport layer (§6 Outbound).
//!
//! The transport/transaction layer itself is out of scope (§1); this is
//! only the shape this core calls into it through.

use async_trait::async_trait;

use crate::collaborators::AuthChallenge;
use crate::response::RegistrarResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmKind {
    Www,
    Proxy,
}

#[async_trait]
pub trait TransactionHandle: Send + Sync {
    async fn send_response(&self, response: RegistrarResponse);
    async fn send_challenge(&self, realm_kind: RealmKind, stale: bool, retry_hint: Option<u32>, challenge: AuthChallenge);
}

/// A `TransactionHandle` that records what was sent, for tests.
#[derive(Default)]
pub struct RecordingTransactionHandle {
    pub responses: tokio::sync::Mutex<Vec<RegistrarResponse>>,
    pub challenges: tokio::sync::Mutex<Vec<(RealmKind, bool, Option<u32>)>>,
}

impl RecordingTransactionHandle {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionHandle for RecordingTransactionHandle {
    async fn send_response(&self, response: RegistrarResponse) {
        self.responses.lock().await.push(response);
    }

    async fn send_challenge(&self, realm_kind: RealmKind, stale: bool, retry_hint: Option<u32>, _challenge: AuthChallenge) {
        self.challenges.lock().await.push((realm_kind, stale, retry_hint));
    }
}
