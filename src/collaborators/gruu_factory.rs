//! GRUU factory collaborator (§2 item 2, §6).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::GruuEntry;

#[async_trait]
pub trait GruuFactory: Send + Sync {
    /// Look up an existing entry without creating one.
    async fn fetch_or_none(&self, aor: &str, instance_id: &str) -> Option<GruuEntry>;

    /// Look up an existing entry, creating one if absent (§4.5).
    async fn create_if_not_exists(&self, aor: &str, instance_id: &str) -> GruuEntry;

    /// Render the public GRUU URL for an entry, scoped to the request's To header (§4.6).
    fn make_url(&self, entry: &GruuEntry, to_header: &str) -> String;
}

/// In-memory GRUU Registry (§2 item 2). Entries are created lazily and
/// never removed by this core (§9 Design Notes).
#[derive(Default)]
pub struct InMemoryGruuRegistry {
    entries: RwLock<HashMap<(String, String), GruuEntry>>,
}

impl InMemoryGruuRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GruuFactory for InMemoryGruuRegistry {
    async fn fetch_or_none(&self, aor: &str, instance_id: &str) -> Option<GruuEntry> {
        self.entries
            .read()
            .await
            .get(&(aor.to_string(), instance_id.to_string()))
            .cloned()
    }

    async fn create_if_not_exists(&self, aor: &str, instance_id: &str) -> GruuEntry {
        let key = (aor.to_string(), instance_id.to_string());
        let mut entries = self.entries.write().await;
        entries
            .entry(key)
            .or_insert_with(|| GruuEntry {
                aor: aor.to_string(),
                instance_id: instance_id.to_string(),
                token: Uuid::new_v4().to_string(),
            })
            .clone()
    }

    fn make_url(&self, entry: &GruuEntry, to_header: &str) -> String {
        // Scheme/host derived from the To header's AOR, per draft-ietf-sip-gruu:
        // a GRUU is a normal SIP URI carrying an opaque `gr` parameter.
        let host = to_header
            .rsplit_once('@')
            .map(|(_, host)| host.trim_end_matches('>'))
            .unwrap_or("invalid");
        format!("sip:{}@{};gr={}", entry.aor_user(), host, entry.token)
    }
}

impl GruuEntry {
    fn aor_user(&self) -> &str {
        self.aor
            .rsplit_once(':')
            .map(|(_, rest)| rest.split('@').next().unwrap_or(rest))
            .unwrap_or(&self.aor)
    }
}
