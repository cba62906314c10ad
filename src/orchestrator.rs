//! Register Orchestrator (§2 item 8, §4.1): the top-level `ProcessRegister`
//! entry point sequencing every other module.

use tracing::{debug, info, warn};

use crate::collaborators::{Authenticator, CanRegister, GruuFactory, HomedomainOracle};
use crate::config::RegistrarConfig;
use crate::error::{NotHomedomain, RegistrarError};
use crate::path;
use crate::request::{RegisterRequest, RoleTag};
use crate::response::{self, ComposeContext, RegistrarResponse};
use crate::store::BindingStore;
use crate::transport::{RealmKind, TransactionHandle};
use crate::updater;
use crate::wildcard;

/// Extension tokens this core understands in a `Require` header (§4.1 step 2).
/// `path` is always honored; `gruu` only when configured on.
fn is_supported_extension(token: &str, gruu_enabled: bool) -> bool {
    token.eq_ignore_ascii_case("path") || (token.eq_ignore_ascii_case("gruu") && gruu_enabled)
}

/// Ties the Homedomain Oracle, extension gate, Authenticator, Path Vector
/// Builder, Wildcard Handler, Per-Contact Updater, and Response Composer
/// into the single `ProcessRegister` operation (§4.1).
pub struct RegisterOrchestrator {
    homedomain: Box<dyn HomedomainOracle>,
    authenticator: Box<dyn Authenticator>,
    store: Box<dyn BindingStore>,
    gruu: Box<dyn GruuFactory>,
    config: RegistrarConfig,
}

impl RegisterOrchestrator {
    pub fn new(
        homedomain: Box<dyn HomedomainOracle>,
        authenticator: Box<dyn Authenticator>,
        store: Box<dyn BindingStore>,
        gruu: Box<dyn GruuFactory>,
        config: RegistrarConfig,
    ) -> Self {
        Self {
            homedomain,
            authenticator,
            store,
            gruu,
            config,
        }
    }

    /// Processes one REGISTER request, dispatching its outcome to `handle` (§4.1, §6).
    ///
    /// Returns `Err(NotHomedomain)` when the request-URI host is not
    /// authoritative for this registrar; per §4.1 step 1 no response is sent
    /// here, and the caller is expected to forward the request elsewhere.
    pub async fn process_register(
        &self,
        request: &RegisterRequest,
        handle: &dyn TransactionHandle,
        role: RoleTag,
    ) -> Result<(), NotHomedomain> {
        if !self.homedomain.is_homedomain(&request.request_uri_host).await {
            return Err(NotHomedomain);
        }

        let gruu_enabled = self.config.extensions.experimental_gruu_enable;
        let unsupported: Vec<String> = request
            .headers
            .tokens("Require")
            .into_iter()
            .filter(|token| !is_supported_extension(token, gruu_enabled))
            .collect();

        if !unsupported.is_empty() {
            let err = RegistrarError::BadExtension { unsupported };
            self.emit_failure(request, &err);
            handle.send_response(self.error_response(&err)).await;
            return Ok(());
        }

        let mut headers = request.headers.clone();
        headers.remove("Record-Route");

        let aor = request.aor();
        match self.authenticator.can_register(&headers, aor).await {
            CanRegister::Ok { user } => {
                self.apply_and_respond(request, &headers, &user, role, handle).await;
            }
            CanRegister::Stale => {
                let challenge = self.authenticator.create_challenge(true).await;
                handle.send_challenge(RealmKind::Www, true, None, challenge).await;
            }
            CanRegister::Forbidden { user } => {
                warn!(event = "register_forbidden", %user, %aor, "user not entitled to register this AOR");
                handle
                    .send_response(RegistrarResponse {
                        status_code: 403,
                        reason: "Forbidden".to_string(),
                        headers: Vec::new(),
                    })
                    .await;
            }
            CanRegister::NoMatch { user } => {
                warn!(event = "register_invalid_address", %user, %aor, "no such address-of-record for this user");
                handle
                    .send_response(RegistrarResponse {
                        status_code: 404,
                        reason: "Not Found".to_string(),
                        headers: Vec::new(),
                    })
                    .await;
            }
            CanRegister::None => {
                if !headers.contains("Authorization") && !headers.contains("Proxy-Authorization") {
                    debug!(%aor, "REGISTER without credentials, challenging");
                } else {
                    warn!(%aor, "REGISTER with invalid credentials, challenging");
                }
                let challenge = self.authenticator.create_challenge(false).await;
                handle.send_challenge(RealmKind::Www, false, None, challenge).await;
            }
        }

        Ok(())
    }

    async fn apply_and_respond(
        &self,
        request: &RegisterRequest,
        headers: &crate::headers::Headers,
        user: &str,
        role: RoleTag,
        handle: &dyn TransactionHandle,
    ) {
        match self.apply_update(request, headers, role).await {
            Ok(response) => {
                info!(
                    event = "register_ok",
                    %user,
                    aor = %request.aor(),
                    contacts = request.contacts.len(),
                    "REGISTER applied"
                );
                handle.send_response(response).await;
            }
            Err(err) => {
                if let RegistrarError::Internal(cause) = &err {
                    tracing::error!(%cause, aor = %request.aor(), "internal error processing REGISTER");
                }
                self.emit_failure(request, &err);
                handle.send_response(self.error_response(&err)).await;
            }
        }
    }

    async fn apply_update(
        &self,
        request: &RegisterRequest,
        headers: &crate::headers::Headers,
        role: RoleTag,
    ) -> Result<RegistrarResponse, RegistrarError> {
        let path_outcome = path::build(
            headers,
            role,
            &self.config.location.record_route_uri,
            self.config.extensions.allow_proxy_inserted_path,
        )?;

        let aor = request.aor();
        let expires_header = headers.get_one("Expires").and_then(|v| v.parse().ok());

        if wildcard::contains_wildcard(&request.contacts) {
            wildcard::validate(headers, &request.contacts)?;
            wildcard::execute(self.store.as_ref(), aor, &request.call_id, request.cseq).await?;
        } else if !request.contacts.is_empty() {
            let mut txn = self.store.begin(aor).await;
            let result = updater::apply(
                &mut *txn,
                self.gruu.as_ref(),
                aor,
                &request.contacts,
                expires_header,
                &request.call_id,
                request.cseq,
                &path_outcome.vector,
                self.config.location.max_register_time,
                self.config.location.default_register_time,
            )
            .await;

            match result {
                Ok(()) => txn.commit().await?,
                Err(err) => return Err(err),
            }
        }

        let bindings = self.store.snapshot(aor).await;
        let request_supports_gruu = headers.tokens("Supported").iter().any(|t| t.eq_ignore_ascii_case("gruu"));

        Ok(response::compose(
            &bindings,
            ComposeContext {
                to_header: &request.to_uri,
                path_echo: path_outcome.echo.as_deref(),
                request_supports_gruu,
                gruu_enabled: self.config.extensions.experimental_gruu_enable,
                gruu: self.gruu.as_ref(),
                now: chrono::Utc::now(),
            },
        )
        .await)
    }

    fn emit_failure(&self, request: &RegisterRequest, err: &RegistrarError) {
        warn!(
            event = "register_rejected",
            aor = %request.aor(),
            status = err.status_code(),
            reason = %err,
            "REGISTER rejected"
        );
    }

    fn error_response(&self, err: &RegistrarError) -> RegistrarResponse {
        RegistrarResponse {
            status_code: err.status_code(),
            reason: err.reason(),
            headers: err.extra_headers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{DigestAuthenticator, InMemoryGruuRegistry, StaticHomedomainOracle};
    use crate::request::ContactEntry;
    use crate::store::InMemoryBindingStore;
    use crate::transport::RecordingTransactionHandle;

    async fn orchestrator_with_user(user: &str, password: &str, aor: &str) -> (RegisterOrchestrator, String) {
        let homedomain = StaticHomedomainOracle::new(["example.com"]);
        let authenticator = DigestAuthenticator::new("example.com");
        authenticator.add_user(user, password, [aor.to_string()]).await;
        let challenge = authenticator.create_challenge(false).await;

        let orchestrator = RegisterOrchestrator::new(
            Box::new(homedomain),
            Box::new(authenticator),
            Box::new(InMemoryBindingStore::new()),
            Box::new(InMemoryGruuRegistry::new()),
            RegistrarConfig::default(),
        );
        (orchestrator, challenge.nonce)
    }

    fn digest_header(user: &str, password: &str, nonce: &str) -> String {
        let response = DigestAuthenticator::calculate_response(
            user,
            password,
            "example.com",
            nonce,
            "REGISTER",
            "sip:example.com",
            None,
            None,
            None,
        );
        format!(
            r#"Digest username="{user}", realm="example.com", nonce="{nonce}", uri="sip:example.com", response="{response}""#,
        )
    }

    #[tokio::test]
    async fn non_homedomain_request_uri_is_rejected_before_auth() {
        let (orchestrator, _) = orchestrator_with_user("alice", "secret", "sip:alice@example.com").await;
        let request = RegisterRequest::builder()
            .request_uri_host("other.invalid")
            .to_uri("sip:alice@example.com")
            .call_id("call-1")
            .cseq(1)
            .build();
        let handle = RecordingTransactionHandle::new();

        let result = orchestrator.process_register(&request, &handle, RoleTag::IncomingProxy).await;
        assert!(result.is_err());
        assert!(handle.responses.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_require_extension_yields_420() {
        let (orchestrator, _) = orchestrator_with_user("alice", "secret", "sip:alice@example.com").await;
        let request = RegisterRequest::builder()
            .request_uri_host("example.com")
            .to_uri("sip:alice@example.com")
            .header("Require", "totally-unknown-extension")
            .call_id("call-1")
            .cseq(1)
            .build();
        let handle = RecordingTransactionHandle::new();

        orchestrator.process_register(&request, &handle, RoleTag::IncomingProxy).await.unwrap();
        let responses = handle.responses.lock().await;
        assert_eq!(responses[0].status_code, 420);
    }

    #[tokio::test]
    async fn missing_credentials_yields_challenge_not_response() {
        let (orchestrator, _) = orchestrator_with_user("alice", "secret", "sip:alice@example.com").await;
        let request = RegisterRequest::builder()
            .request_uri_host("example.com")
            .to_uri("sip:alice@example.com")
            .call_id("call-1")
            .cseq(1)
            .build();
        let handle = RecordingTransactionHandle::new();

        orchestrator.process_register(&request, &handle, RoleTag::IncomingProxy).await.unwrap();
        assert!(handle.responses.lock().await.is_empty());
        assert_eq!(handle.challenges.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn valid_register_commits_binding_and_responds_ok() {
        let (orchestrator, nonce) = orchestrator_with_user("alice", "secret", "sip:alice@example.com").await;
        let request = RegisterRequest::builder()
            .request_uri_host("example.com")
            .to_uri("sip:alice@example.com")
            .header("Authorization", digest_header("alice", "secret", &nonce))
            .call_id("call-1")
            .cseq(1)
            .contact(ContactEntry::new("sip:alice@192.0.2.1").with_expires(3600))
            .build();
        let handle = RecordingTransactionHandle::new();

        orchestrator.process_register(&request, &handle, RoleTag::IncomingProxy).await.unwrap();
        let responses = handle.responses.lock().await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status_code, 200);
        assert!(responses[0].headers.iter().any(|(n, v)| n == "Contact" && v.contains("192.0.2.1")));
    }

    #[tokio::test]
    async fn registering_someone_elses_aor_yields_403_not_challenge() {
        let homedomain = StaticHomedomainOracle::new(["example.com"]);
        let authenticator = DigestAuthenticator::new("example.com");
        authenticator.add_user("alice", "secret", ["sip:alice@example.com".to_string()]).await;
        authenticator.add_user("bob", "hunter2", ["sip:bob@example.com".to_string()]).await;
        let challenge = authenticator.create_challenge(false).await;
        let orchestrator = RegisterOrchestrator::new(
            Box::new(homedomain),
            Box::new(authenticator),
            Box::new(InMemoryBindingStore::new()),
            Box::new(InMemoryGruuRegistry::new()),
            RegistrarConfig::default(),
        );

        let request = RegisterRequest::builder()
            .request_uri_host("example.com")
            .to_uri("sip:bob@example.com")
            .header("Authorization", digest_header("alice", "secret", &challenge.nonce))
            .call_id("call-1")
            .cseq(1)
            .contact(ContactEntry::new("sip:alice@192.0.2.1").with_expires(3600))
            .build();
        let handle = RecordingTransactionHandle::new();

        orchestrator.process_register(&request, &handle, RoleTag::IncomingProxy).await.unwrap();
        let responses = handle.responses.lock().await;
        assert_eq!(responses[0].status_code, 403);
    }
}
