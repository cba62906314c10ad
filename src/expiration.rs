//! Expiration Policy (§2 item 3, §4.7): pure functions computing effective
//! expiry from header/contact parameters and configured bounds.

use crate::request::ContactEntry;

/// A contact's own expiry, or the request's single `Expires` header value,
/// or neither (§4.7 `perContact`).
pub fn per_contact(expires_header: Option<u32>, contact: &ContactEntry) -> Option<u32> {
    contact.expires_param.or(expires_header)
}

/// Effective expiry in seconds, clamped to `max_register_time` (§4.7
/// `effective`). Callers handle `0` (deregistration) before reaching here —
/// this function assumes `per_contact` was already confirmed non-zero, or
/// is being asked for the default.
pub fn effective(
    expires_header: Option<u32>,
    contact: &ContactEntry,
    max_register_time: u32,
    default_register_time: u32,
) -> u32 {
    match per_contact(expires_header, contact) {
        None => default_register_time.min(max_register_time),
        Some(requested) => requested.min(max_register_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_nothing_supplied() {
        let contact = ContactEntry::new("sip:a@b");
        assert_eq!(effective(None, &contact, 7200, 3600), 3600);
    }

    #[test]
    fn contact_expires_wins_over_header() {
        let contact = ContactEntry::new("sip:a@b").with_expires(20);
        assert_eq!(effective(Some(100), &contact, 7200, 3600), 20);
    }

    #[test]
    fn header_expires_used_when_contact_has_none() {
        let contact = ContactEntry::new("sip:a@b");
        assert_eq!(effective(Some(100), &contact, 7200, 3600), 100);
    }

    #[test]
    fn clamps_to_max_register_time() {
        let contact = ContactEntry::new("sip:a@b").with_expires(9999);
        assert_eq!(effective(None, &contact, 3600, 3600), 3600);
    }

    #[test]
    fn no_lower_bound_enforced() {
        let contact = ContactEntry::new("sip:a@b").with_expires(1);
        assert_eq!(effective(None, &contact, 7200, 3600), 1);
    }
}
