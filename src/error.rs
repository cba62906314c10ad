//! Error taxonomy for the location service core

use std::fmt;
use thiserror::Error;

/// A single extra header to attach to an error response, as an ordered
/// `(name, value)` pair so multiple values under one name can be expressed
/// by repeating the name.
pub type ExtraHeader = (String, String);

/// Errors raised while processing a REGISTER request.
///
/// Each policy variant carries the wire status it maps to; [`RegistrarError::status_code`]
/// and [`RegistrarError::extra_headers`] are what the orchestrator reads to build the
/// final response. `Internal` is the catch-all for anything unexpected and is always
/// logged with its full cause before being collapsed to a bare 500 on the wire.
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Wildcard without Expires header")]
    WildcardMissingExpires,

    #[error("Wildcard with more than one expires parameter")]
    WildcardMultipleExpires,

    #[error("Wildcard with non-zero contact expires parameter")]
    WildcardNonZeroExpires,

    #[error("Wildcard present but not alone, invalid (RFC3261 10.3 #6)")]
    WildcardNotAlone,

    #[error("Request out of order, contained old CSeq number")]
    OutOfOrderCSeq,

    #[error("Bad Extension")]
    BadExtension { unsupported: Vec<String> },

    #[error("Extension Required")]
    PathExtensionRequired,

    #[error("Server Internal Error: {0}")]
    Internal(String),
}

impl RegistrarError {
    /// Wire status code this error maps to (§7).
    pub fn status_code(&self) -> u16 {
        match self {
            RegistrarError::WildcardMissingExpires
            | RegistrarError::WildcardMultipleExpires
            | RegistrarError::WildcardNonZeroExpires
            | RegistrarError::WildcardNotAlone => 400,
            RegistrarError::OutOfOrderCSeq => 403,
            RegistrarError::BadExtension { .. } => 420,
            RegistrarError::PathExtensionRequired => 421,
            RegistrarError::Internal(_) => 500,
        }
    }

    /// Reason phrase sent on the wire. Deliberately does not include the
    /// `Internal` cause string — that detail stays in the logs (§7).
    pub fn reason(&self) -> String {
        match self {
            RegistrarError::Internal(_) => "Server Internal Error".to_string(),
            other => other.to_string(),
        }
    }

    /// Extra headers this error wants attached to the response (§7).
    pub fn extra_headers(&self) -> Vec<ExtraHeader> {
        match self {
            RegistrarError::BadExtension { unsupported } => {
                vec![("Unsupported".to_string(), unsupported.join(", "))]
            }
            RegistrarError::PathExtensionRequired => {
                vec![("Require".to_string(), "path".to_string())]
            }
            _ => Vec::new(),
        }
    }
}

/// Protocol-neutral terminal returned by the orchestrator's homedomain check (§1, §7).
/// Not an error: the surrounding proxy is expected to forward the request elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotHomedomain;

impl fmt::Display for NotHomedomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-uri host is not a homedomain")
    }
}
