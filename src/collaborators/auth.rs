//! Authentication/authorization collaborator (§1, §6): "may user U register AOR A?".
//!
//! This core only consumes the outcome; the challenge/response exchange
//! itself is explicitly out of scope (§1 Non-goals). [`DigestAuthenticator`]
//! is a reference implementation so the crate is exercisable end to end
//! without a real user database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::headers::Headers;

/// Outcome of `CanRegister(header, toURI)` (§4.1 step 4, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanRegister {
    Ok { user: String },
    Stale,
    Forbidden { user: String },
    NoMatch { user: String },
    None,
}

/// A fresh authentication challenge to attach to a 401/407 (§6 `SendChallenge`).
#[derive(Debug, Clone)]
pub struct AuthChallenge {
    pub realm: String,
    pub nonce: String,
    pub algorithm: String,
    pub qop: Option<String>,
    pub stale: bool,
}

impl AuthChallenge {
    pub fn to_header_value(&self) -> String {
        let stale = if self.stale { ", stale=true" } else { "" };
        match &self.qop {
            Some(qop) => format!(
                r#"Digest realm="{}", nonce="{}", algorithm={}, qop="{}"{}"#,
                self.realm, self.nonce, self.algorithm, qop, stale
            ),
            None => format!(
                r#"Digest realm="{}", nonce="{}", algorithm={}{}"#,
                self.realm, self.nonce, self.algorithm, stale
            ),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn can_register(&self, headers: &Headers, to_uri: &str) -> CanRegister;
    async fn create_challenge(&self, stale: bool) -> AuthChallenge;
}

#[derive(Debug, Clone)]
struct ParsedAuthorization {
    username: String,
    realm: String,
    nonce: String,
    uri: String,
    response: String,
    qop: Option<String>,
    nc: Option<String>,
    cnonce: Option<String>,
}

impl ParsedAuthorization {
    fn parse(value: &str) -> Option<Self> {
        let digest_str = value.strip_prefix("Digest ").unwrap_or(value).trim();
        let mut params = HashMap::new();
        for part in digest_str.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                params.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
            }
        }
        Some(Self {
            username: params.get("username")?.clone(),
            realm: params.get("realm")?.clone(),
            nonce: params.get("nonce")?.clone(),
            uri: params.get("uri")?.clone(),
            response: params.get("response")?.clone(),
            qop: params.get("qop").cloned(),
            nc: params.get("nc").cloned(),
            cnonce: params.get("cnonce").cloned(),
        })
    }
}

/// A provisioned user and the AORs they are entitled to register.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub password: String,
    pub aors: HashSet<String>,
}

/// Reference digest-auth collaborator.
pub struct DigestAuthenticator {
    realm: String,
    users: Arc<RwLock<HashMap<String, UserCredentials>>>,
    active_nonces: Arc<RwLock<HashMap<String, Instant>>>,
}

impl DigestAuthenticator {
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            users: Arc::new(RwLock::new(HashMap::new())),
            active_nonces: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add_user(&self, username: &str, password: &str, aors: impl IntoIterator<Item = String>) {
        self.users.write().await.insert(
            username.to_string(),
            UserCredentials {
                password: password.to_string(),
                aors: aors.into_iter().collect(),
            },
        );
    }

    fn generate_nonce() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.gen()).collect();
        hex::encode(bytes)
    }

    pub(crate) fn calculate_response(
        username: &str,
        password: &str,
        realm: &str,
        nonce: &str,
        method: &str,
        uri: &str,
        qop: Option<&str>,
        nc: Option<&str>,
        cnonce: Option<&str>,
    ) -> String {
        let ha1 = format!("{:x}", md5::compute(format!("{username}:{realm}:{password}")));
        let ha2 = format!("{:x}", md5::compute(format!("{method}:{uri}")));
        match qop {
            Some(qop) => {
                let nc = nc.unwrap_or("00000001");
                let cnonce = cnonce.unwrap_or("");
                format!("{:x}", md5::compute(format!("{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}")))
            }
            None => format!("{:x}", md5::compute(format!("{ha1}:{nonce}:{ha2}"))),
        }
    }
}

#[async_trait]
impl Authenticator for DigestAuthenticator {
    async fn can_register(&self, headers: &Headers, to_uri: &str) -> CanRegister {
        let raw = headers
            .get_one("Authorization")
            .or_else(|| headers.get_one("Proxy-Authorization"));
        let Some(raw) = raw else {
            debug!("REGISTER without Authorization header");
            return CanRegister::None;
        };

        let Some(auth) = ParsedAuthorization::parse(raw) else {
            debug!("malformed Authorization header");
            return CanRegister::None;
        };

        {
            let nonces = self.active_nonces.read().await;
            match nonces.get(&auth.nonce) {
                None => {
                    debug!(nonce = %auth.nonce, "unknown nonce");
                    return CanRegister::None;
                }
                Some(issued) if issued.elapsed().as_secs() > 300 => {
                    debug!(nonce = %auth.nonce, "stale nonce");
                    return CanRegister::Stale;
                }
                Some(_) => {}
            }
        }

        let users = self.users.read().await;
        let Some(credentials) = users.get(&auth.username) else {
            warn!(user = %auth.username, "REGISTER from unknown user");
            return CanRegister::None;
        };

        if auth.realm != self.realm {
            warn!(expected = %self.realm, got = %auth.realm, "realm mismatch");
            return CanRegister::None;
        }

        let expected = Self::calculate_response(
            &auth.username,
            &credentials.password,
            &auth.realm,
            &auth.nonce,
            "REGISTER",
            &auth.uri,
            auth.qop.as_deref(),
            auth.nc.as_deref(),
            auth.cnonce.as_deref(),
        );

        if auth.response != expected {
            warn!(user = %auth.username, "digest response mismatch");
            return CanRegister::None;
        }

        if credentials.aors.contains(to_uri) {
            CanRegister::Ok { user: auth.username }
        } else if users.values().any(|u| u.aors.contains(to_uri)) {
            warn!(user = %auth.username, aor = %to_uri, "user not entitled to register this AOR");
            CanRegister::Forbidden { user: auth.username }
        } else {
            CanRegister::NoMatch { user: auth.username }
        }
    }

    async fn create_challenge(&self, stale: bool) -> AuthChallenge {
        let nonce = Self::generate_nonce();
        self.active_nonces.write().await.insert(nonce.clone(), Instant::now());
        AuthChallenge {
            realm: self.realm.clone(),
            nonce,
            algorithm: "MD5".to_string(),
            qop: Some("auth".to_string()),
            stale,
        }
    }
}
