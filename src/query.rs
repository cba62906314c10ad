//! Query Surface (§2 item 9, §4.8): read-only lookups for the surrounding
//! proxy's routing decisions. All reads here are non-transactional
//! snapshots (§5 Suspension points).

use crate::domain::Binding;
use crate::store::BindingStore;

/// The first AOR whose bindings include `uri`, if any (§4.8).
pub async fn get_user_with_contact(store: &dyn BindingStore, uri: &str) -> Option<String> {
    store
        .snapshot_all()
        .await
        .into_iter()
        .find(|b| b.contact_uri_str == uri)
        .map(|b| b.aor)
}

/// Concatenated bindings for each AOR in `aors`, preserving input order (§4.8).
pub async fn get_locations_for_users(store: &dyn BindingStore, aors: &[String]) -> Vec<Binding> {
    let mut result = Vec::new();
    for aor in aors {
        result.extend(store.snapshot(aor).await);
    }
    result
}

/// Entries whose `priority` flag equals the minimum seen across the input.
/// Entries without a `priority` flag are excluded from the result, unless
/// no entry has one at all, in which case the input is returned unchanged (§4.8).
pub fn prioritize_locations(bindings: Vec<Binding>) -> Vec<Binding> {
    match bindings.iter().filter_map(|b| b.flags.priority).min() {
        None => bindings,
        Some(min) => bindings.into_iter().filter(|b| b.flags.priority == Some(min)).collect(),
    }
}

/// The stored contact URI of a binding (§4.8 `ToURL`).
pub fn to_url(binding: &Binding) -> &rsip::Uri {
    &binding.contact_uri
}
