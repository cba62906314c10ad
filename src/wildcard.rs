//! Wildcard Handler (§2 item 5, §4.2): validates and executes `Contact: *`
//! deregistrations.

use tracing::debug;

use crate::error::RegistrarError;
use crate::headers::Headers;
use crate::request::ContactEntry;
use crate::store::BindingStore;

/// Whether any contact in the request is the literal `*`.
pub fn contains_wildcard(contacts: &[ContactEntry]) -> bool {
    contacts.iter().any(|c| c.is_wildcard())
}

/// Validates a wildcard REGISTER's `Expires` header and contact-list shape,
/// in the order given by §4.2's table (first failure wins).
pub fn validate(headers: &Headers, contacts: &[ContactEntry]) -> Result<(), RegistrarError> {
    let expires_values = headers.get_all("Expires");

    if expires_values.is_empty() {
        return Err(RegistrarError::WildcardMissingExpires);
    }
    if expires_values.len() > 1 {
        return Err(RegistrarError::WildcardMultipleExpires);
    }

    match expires_values[0].parse::<i64>() {
        Ok(0) => {}
        _ => return Err(RegistrarError::WildcardNonZeroExpires),
    }

    if contacts.len() > 1 {
        return Err(RegistrarError::WildcardNotAlone);
    }

    Ok(())
}

/// Executes a validated wildcard deregistration for `aor` (§4.2).
pub async fn execute(
    store: &dyn BindingStore,
    aor: &str,
    call_id: &str,
    cseq: u32,
) -> Result<(), RegistrarError> {
    let mut txn = store.begin(aor).await;

    for binding in txn.list().to_vec() {
        if !binding.is_dynamic() {
            debug!(aor, contact = %binding.contact_uri_str, "skipping static binding in wildcard deregister");
            continue;
        }

        let same_call_id = binding.call_id == call_id;
        let higher_cseq = cseq > binding.cseq;

        if same_call_id && !higher_cseq {
            return Err(RegistrarError::OutOfOrderCSeq);
        }

        if !same_call_id || higher_cseq {
            txn.remove(&binding.contact_uri_str);
        }
    }

    txn.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Binding, BindingClass, BindingFlags, Expiry};
    use crate::store::InMemoryBindingStore;
    use chrono::Utc;

    fn binding(aor: &str, contact: &str, call_id: &str, cseq: u32, class: BindingClass) -> Binding {
        Binding {
            aor: aor.to_string(),
            contact_uri: rsip::Uri::try_from(contact).unwrap(),
            contact_uri_str: contact.to_string(),
            class,
            expires_at: Expiry::At(Utc::now() + chrono::Duration::seconds(3600)),
            call_id: call_id.to_string(),
            cseq,
            flags: BindingFlags::default(),
        }
    }

    #[test]
    fn missing_expires_header_is_rejected() {
        let headers = Headers::new();
        let contacts = vec![ContactEntry::new("*")];
        assert!(matches!(
            validate(&headers, &contacts),
            Err(RegistrarError::WildcardMissingExpires)
        ));
    }

    #[test]
    fn leading_zero_nonzero_expires_is_rejected() {
        let mut headers = Headers::new();
        headers.set("Expires", "01");
        let contacts = vec![ContactEntry::new("*")];
        assert!(matches!(
            validate(&headers, &contacts),
            Err(RegistrarError::WildcardNonZeroExpires)
        ));
    }

    #[test]
    fn wildcard_with_other_contact_is_rejected() {
        let mut headers = Headers::new();
        headers.set("Expires", "0");
        let contacts = vec![ContactEntry::new("*"), ContactEntry::new("sip:a@b")];
        assert!(matches!(
            validate(&headers, &contacts),
            Err(RegistrarError::WildcardNotAlone)
        ));
    }

    #[test]
    fn valid_wildcard_passes() {
        let mut headers = Headers::new();
        headers.set("Expires", "0");
        let contacts = vec![ContactEntry::new("*")];
        assert!(validate(&headers, &contacts).is_ok());
    }

    #[tokio::test]
    async fn removes_all_dynamic_bindings_at_lower_cseq() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";
        {
            let mut txn = store.begin(aor).await;
            txn.upsert(binding(aor, "sip:a@1", "call-x", 1, BindingClass::Dynamic));
            txn.upsert(binding(aor, "sip:a@2", "call-x", 2, BindingClass::Dynamic));
            txn.upsert(binding(aor, "sip:a@3", "call-y", 1, BindingClass::Dynamic));
            txn.commit().await.unwrap();
        }

        execute(&store, aor, "call-z", 10).await.unwrap();
        assert!(store.snapshot(aor).await.is_empty());
    }

    #[tokio::test]
    async fn same_call_id_lower_cseq_aborts_with_no_mutation() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";
        {
            let mut txn = store.begin(aor).await;
            txn.upsert(binding(aor, "sip:a@1", "call-x", 5, BindingClass::Dynamic));
            txn.commit().await.unwrap();
        }

        let err = execute(&store, aor, "call-x", 1).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(store.snapshot(aor).await.len(), 1);
    }

    #[tokio::test]
    async fn static_bindings_are_preserved() {
        let store = InMemoryBindingStore::new();
        let aor = "sip:alice@example.com";
        {
            let mut txn = store.begin(aor).await;
            txn.upsert(binding(aor, "sip:static@1", "call-s", 1, BindingClass::Static));
            txn.commit().await.unwrap();
        }

        execute(&store, aor, "call-z", 1).await.unwrap();
        let remaining = store.snapshot(aor).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].class, BindingClass::Static);
    }
}
