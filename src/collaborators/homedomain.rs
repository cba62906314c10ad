//! The homedomain oracle (§6): "is this registrar authoritative for host H".

use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait HomedomainOracle: Send + Sync {
    async fn is_homedomain(&self, host: &str) -> bool;
}

/// Reference implementation backed by a configured set of domains.
pub struct StaticHomedomainOracle {
    domains: HashSet<String>,
}

impl StaticHomedomainOracle {
    pub fn new(domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            domains: domains.into_iter().map(|d| d.into().to_ascii_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl HomedomainOracle for StaticHomedomainOracle {
    async fn is_homedomain(&self, host: &str) -> bool {
        self.domains.contains(&host.to_ascii_lowercase())
    }
}
