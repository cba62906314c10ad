//! Per-Contact Updater and the shared `register_contact` operation
//! (§2 items 6, §4.3, §4.5).

use chrono::{Duration, Utc};
use tracing::debug;

use crate::collaborators::GruuFactory;
use crate::domain::{Binding, BindingClass, BindingFlags, Expiry};
use crate::error::RegistrarError;
use crate::expiration;
use crate::request::ContactEntry;
use crate::store::BindingTxn;

/// Default contact priority when none is supplied by the caller (§4.5).
pub const DEFAULT_PRIORITY: i32 = 100;

fn canonicalize(uri: &str) -> Result<rsip::Uri, RegistrarError> {
    rsip::Uri::try_from(uri).map_err(|e| RegistrarError::Internal(format!("invalid contact URI: {e}")))
}

/// Insert or refresh a single binding (§4.5).
#[allow(clippy::too_many_arguments)]
pub async fn register_contact(
    txn: &mut dyn BindingTxn,
    gruu: &dyn GruuFactory,
    aor: &str,
    contact: &ContactEntry,
    priority: i32,
    expires_header: Option<u32>,
    call_id: &str,
    cseq: u32,
    path_vector: &[String],
    max_register_time: u32,
    default_register_time: u32,
) -> Result<(), RegistrarError> {
    let effective_expiry = expiration::effective(expires_header, contact, max_register_time, default_register_time);
    let expires_at = Utc::now() + Duration::seconds(effective_expiry as i64);

    let mut flags = BindingFlags {
        priority: Some(priority),
        registration_time: Some(Utc::now()),
        instance_id: None,
        path: path_vector.to_vec(),
    };

    if let Some(raw) = &contact.instance_param {
        match contact.quoted_instance_id() {
            Some(instance_id) => {
                gruu.create_if_not_exists(aor, &instance_id).await;
                flags.instance_id = Some(instance_id);
            }
            None => debug!(value = %raw, "ignoring unquoted +sip.instance contact parameter"),
        }
    }

    let uri = canonicalize(&contact.uri)?;
    let contact_uri_str = uri.to_string();

    txn.upsert(Binding {
        aor: aor.to_string(),
        contact_uri: uri,
        contact_uri_str,
        class: BindingClass::Dynamic,
        expires_at: Expiry::At(expires_at),
        call_id: call_id.to_string(),
        cseq,
        flags,
    });

    Ok(())
}

/// Applies every non-wildcard contact of a REGISTER, in input order,
/// inside `txn` (§4.3). Any out-of-order CSeq aborts the whole operation —
/// callers drop `txn` without committing on `Err`.
#[allow(clippy::too_many_arguments)]
pub async fn apply(
    txn: &mut dyn BindingTxn,
    gruu: &dyn GruuFactory,
    aor: &str,
    contacts: &[ContactEntry],
    expires_header: Option<u32>,
    call_id: &str,
    cseq: u32,
    path_vector: &[String],
    max_register_time: u32,
    default_register_time: u32,
) -> Result<(), RegistrarError> {
    for contact in contacts {
        let canonical = canonicalize(&contact.uri)?.to_string();
        let existing = txn.list().iter().find(|b| b.contact_uri_str == canonical).cloned();

        match existing {
            None => {
                register_contact(
                    txn,
                    gruu,
                    aor,
                    contact,
                    DEFAULT_PRIORITY,
                    expires_header,
                    call_id,
                    cseq,
                    path_vector,
                    max_register_time,
                    default_register_time,
                )
                .await?;
            }
            Some(existing) => {
                let same_call_id = existing.call_id == call_id;
                let effective_expiry =
                    expiration::effective(expires_header, contact, max_register_time, default_register_time);

                if same_call_id && cseq <= existing.cseq {
                    return Err(RegistrarError::OutOfOrderCSeq);
                }

                if effective_expiry == 0 {
                    txn.remove(&existing.contact_uri_str);
                } else {
                    register_contact(
                        txn,
                        gruu,
                        aor,
                        contact,
                        DEFAULT_PRIORITY,
                        expires_header,
                        call_id,
                        cseq,
                        path_vector,
                        max_register_time,
                        default_register_time,
                    )
                    .await?;
                }
            }
        }
    }

    Ok(())
}
