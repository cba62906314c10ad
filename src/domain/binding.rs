//! The Binding type (§3): one row per reachable contact of one AOR.

use chrono::{DateTime, Utc};

/// Whether a binding was written by REGISTER processing or provisioned
/// out-of-band. Only `Dynamic` bindings are created, refreshed, or removed
/// by this core; `Static` bindings are read-only here (§3, Testable Property 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingClass {
    Dynamic,
    Static,
}

/// A binding's expiration: either an absolute instant, or `Never` — only
/// valid in combination with `BindingClass::Static` (§3 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    At(DateTime<Utc>),
    Never,
}

impl Expiry {
    /// Seconds remaining until expiry, floored at zero. `Never` has no
    /// finite remaining time and is not meant to be rendered in a response
    /// (Response Composer skips `Never` bindings defensively, §4.6).
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            Expiry::At(at) => Some((*at - now).num_seconds().max(0)),
            Expiry::Never => None,
        }
    }
}

/// Typed attributes carried alongside a binding (§3).
#[derive(Debug, Clone, Default)]
pub struct BindingFlags {
    pub priority: Option<i32>,
    pub registration_time: Option<DateTime<Utc>>,
    /// The raw string between the quotes of a `+sip.instance` contact
    /// parameter. Absent when the UA supplied no instance-id, or supplied
    /// one that was not quoted (§4.5).
    pub instance_id: Option<String>,
    /// Path vector stored with this binding, ingress-to-egress order (§3, §4.4).
    pub path: Vec<String>,
}

/// One (AOR, contact-URI) association (§3).
#[derive(Debug, Clone)]
pub struct Binding {
    pub aor: String,
    /// The UA-supplied reachable address, as parsed by the upstream URI parser.
    pub contact_uri: rsip::Uri,
    /// Canonical serialized form of `contact_uri`; the stable equality key
    /// within an AOR and the reverse-lookup key (§3).
    pub contact_uri_str: String,
    pub class: BindingClass,
    pub expires_at: Expiry,
    pub call_id: String,
    pub cseq: u32,
    pub flags: BindingFlags,
}

impl Binding {
    pub fn is_dynamic(&self) -> bool {
        matches!(self.class, BindingClass::Dynamic)
    }
}
