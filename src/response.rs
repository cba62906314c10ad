//! The Response Composer (§2 item 7, §4.6) and the response shape emitted
//! to the transaction layer (§6 Outbound).

use chrono::{DateTime, Utc};

use crate::collaborators::GruuFactory;
use crate::domain::{Binding, BindingClass, Expiry};

/// A response tuple handed to the transaction layer's `SendResponse` (§6).
#[derive(Debug, Clone)]
pub struct RegistrarResponse {
    pub status_code: u16,
    pub reason: String,
    /// Ordered `(name, value)` pairs; a header repeated under the same name
    /// (e.g. multiple `Contact`s) appears as multiple entries.
    pub headers: Vec<(String, String)>,
}

impl RegistrarResponse {
    fn ok() -> Self {
        Self {
            status_code: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((name.to_string(), value.into()));
    }
}

fn rfc1123_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Inputs the composer needs beyond the post-mutation binding snapshot.
pub struct ComposeContext<'a> {
    pub to_header: &'a str,
    pub path_echo: Option<&'a [String]>,
    pub request_supports_gruu: bool,
    pub gruu_enabled: bool,
    pub gruu: &'a dyn GruuFactory,
    pub now: DateTime<Utc>,
}

/// Builds the 200 OK payload for a REGISTER (§4.6). `bindings` is the
/// AOR's post-mutation snapshot; static and `never`-expiring bindings are
/// skipped (Testable Property 7).
pub async fn compose(bindings: &[Binding], ctx: ComposeContext<'_>) -> RegistrarResponse {
    let mut response = RegistrarResponse::ok();
    response.push("Date", rfc1123_date(ctx.now));

    if let Some(path) = ctx.path_echo {
        if !path.is_empty() {
            response.push("Path", path.join(", "));
        }
    }

    let mut any_gruu = false;

    for binding in bindings {
        if binding.class != BindingClass::Dynamic {
            continue;
        }
        let Expiry::At(expires_at) = binding.expires_at else {
            continue;
        };

        let remaining = (expires_at - ctx.now).num_seconds().max(0);
        let mut value = format!("<{}>;expires={}", binding.contact_uri_str, remaining);

        if ctx.request_supports_gruu && ctx.gruu_enabled {
            if let Some(instance_id) = &binding.flags.instance_id {
                let entry = ctx.gruu.create_if_not_exists(&binding.aor, instance_id).await;
                let gruu_url = ctx.gruu.make_url(&entry, ctx.to_header);
                value.push_str(&format!(r#";gruu="{gruu_url}";+sip.instance="{instance_id}""#));
                any_gruu = true;
            }
        }

        response.push("Contact", value);
    }

    if any_gruu {
        response.push("Require", "gruu");
    }

    response
}
