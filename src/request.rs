//! The REGISTER request shape this core consumes (§6 Inbound).
//!
//! Wire parsing and low-level Contact/URI parsing are explicitly out of
//! scope (§1 Non-goals); callers hand this core an already-parsed request.
//! [`RegisterRequestBuilder`] exists so callers (and tests) can assemble one
//! by hand without a wire parser.

use crate::headers::Headers;

/// Whether this node is acting as the first hop that authenticates the UA,
/// or as an edge proxy that also needs to insert itself into the Path (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTag {
    IncomingProxy,
    OutgoingProxy,
}

/// One Contact header field-value (§2 item 6, §4.5).
#[derive(Debug, Clone)]
pub struct ContactEntry {
    /// The literal contact URI string, or `"*"` for a wildcard contact.
    pub uri: String,
    /// The contact's own `expires=` parameter, if present.
    pub expires_param: Option<u32>,
    /// The raw text of a `+sip.instance` parameter, exactly as it appeared
    /// (including surrounding quotes, if any). `None` if the parameter was
    /// absent (§3, §4.5).
    pub instance_param: Option<String>,
}

impl ContactEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            expires_param: None,
            instance_param: None,
        }
    }

    pub fn with_expires(mut self, expires: u32) -> Self {
        self.expires_param = Some(expires);
        self
    }

    /// A quoted `+sip.instance` parameter, e.g. `"<urn:uuid:...>"`, supplies
    /// an instance-id; an unquoted one does not (§3, §4.5).
    pub fn with_instance_param(mut self, raw: impl Into<String>) -> Self {
        self.instance_param = Some(raw.into());
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.uri == "*"
    }

    /// The unquoted instance-id, iff `instance_param` was quoted.
    pub fn quoted_instance_id(&self) -> Option<String> {
        let raw = self.instance_param.as_deref()?;
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            Some(raw[1..raw.len() - 1].to_string())
        } else {
            None
        }
    }
}

/// An already-parsed REGISTER request (§6 Inbound).
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub request_uri_host: String,
    pub to_uri: String,
    pub headers: Headers,
    pub call_id: String,
    pub cseq: u32,
    pub contacts: Vec<ContactEntry>,
}

impl RegisterRequest {
    pub fn builder() -> RegisterRequestBuilder {
        RegisterRequestBuilder::default()
    }

    /// AOR this request registers against, per §4.1: the To-header URI.
    pub fn aor(&self) -> &str {
        &self.to_uri
    }
}

#[derive(Default)]
pub struct RegisterRequestBuilder {
    request_uri_host: String,
    to_uri: String,
    headers: Headers,
    call_id: String,
    cseq: u32,
    contacts: Vec<ContactEntry>,
}

impl RegisterRequestBuilder {
    pub fn request_uri_host(mut self, host: impl Into<String>) -> Self {
        self.request_uri_host = host.into();
        self
    }

    pub fn to_uri(mut self, uri: impl Into<String>) -> Self {
        self.to_uri = uri.into();
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }

    pub fn cseq(mut self, cseq: u32) -> Self {
        self.cseq = cseq;
        self
    }

    pub fn contact(mut self, contact: ContactEntry) -> Self {
        self.contacts.push(contact);
        self
    }

    pub fn build(self) -> RegisterRequest {
        RegisterRequest {
            request_uri_host: self.request_uri_host,
            to_uri: self.to_uri,
            headers: self.headers,
            call_id: self.call_id,
            cseq: self.cseq,
            contacts: self.contacts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_instance_id_strips_quotes() {
        let contact = ContactEntry::new("sip:alice@192.0.2.1")
            .with_instance_param(r#""<urn:uuid:1>""#);
        assert_eq!(contact.quoted_instance_id(), Some("<urn:uuid:1>".to_string()));
    }

    #[test]
    fn unquoted_instance_param_yields_no_instance_id() {
        let contact = ContactEntry::new("sip:alice@192.0.2.1").with_instance_param("<urn:uuid:1>");
        assert_eq!(contact.quoted_instance_id(), None);
    }
}
