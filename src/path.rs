//! Path Vector Builder (§2 item 4, §4.4).

use tracing::debug;

use crate::error::RegistrarError;
use crate::headers::Headers;
use crate::request::RoleTag;

/// Result of building the Path vector for one REGISTER (§4.4).
#[derive(Debug, Clone, Default)]
pub struct PathOutcome {
    /// Stored in the `path` flag of every binding written by this request.
    pub vector: Vec<String>,
    /// The Path header to echo back in the response, if one was accepted (§4.6).
    pub echo: Option<Vec<String>>,
}

fn request_path(headers: &Headers) -> Vec<String> {
    headers
        .get_all("Path")
        .iter()
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub fn build(
    headers: &Headers,
    role: RoleTag,
    record_route_uri: &str,
    allow_proxy_inserted_path: bool,
) -> Result<PathOutcome, RegistrarError> {
    if !headers.contains("Path") {
        let vector = match role {
            RoleTag::OutgoingProxy => vec![record_route_uri.to_string()],
            RoleTag::IncomingProxy => Vec::new(),
        };
        return Ok(PathOutcome { vector, echo: None });
    }

    let path = request_path(headers);
    let ua_supports_path = headers.tokens("Supported").iter().any(|t| t.eq_ignore_ascii_case("path"));

    if !ua_supports_path && !allow_proxy_inserted_path {
        return Err(RegistrarError::PathExtensionRequired);
    }

    if !ua_supports_path {
        debug!("accepting Path header without Supported: path (allow_proxy_inserted_path override)");
    }

    let vector = match role {
        RoleTag::OutgoingProxy => {
            let mut v = vec![record_route_uri.to_string()];
            v.extend(path.iter().cloned());
            v
        }
        RoleTag::IncomingProxy => path.clone(),
    };

    Ok(PathOutcome { vector, echo: Some(path) })
}
