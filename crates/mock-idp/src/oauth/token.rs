//! Token endpoint state machine.
//!
//! A request moves through [`Stage`]s in a fixed order and stops at the first
//! failed check. The session is removed from the store as soon as it is found,
//! so a code can never be redeemed twice even when a later check fails.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::claims::{ClaimsContext, IdTokenOutcome, build_claims};
use super::jwt;
use super::pkce;
use super::profiles::ProfileDirectory;
use super::store::{SessionStore, generate_token};
use super::types::{AuthorizationSession, Scopes, TokenResponse};
use crate::config::Config;
use crate::config::defaults::ACCESS_TOKEN_EXPIRES_IN;
use crate::error::{ErrorKind, OAuthError, OAuthResult};

/// Standard alphabet, padding optional.
const BASIC_CREDENTIALS: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Form body of a token request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}

impl TokenForm {
    /// Collect known fields; the first occurrence of a name wins.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "grant_type" => &mut form.grant_type,
                "code" => &mut form.code,
                "code_verifier" => &mut form.code_verifier,
                "redirect_uri" => &mut form.redirect_uri,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }
        form
    }
}

/// Last stage a request reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    GrantValidated,
    CodeResolved,
    SessionConsumed,
    PkceVerified,
    RedirectVerified,
    ClientAuthenticated,
    ScopeResolved,
    Issued,
}

/// Client credentials decoded from an HTTP Basic `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl ClientCredentials {
    /// Parse `Basic <base64(client_id:client_secret)>`.
    pub fn from_basic_header(header: &str) -> OAuthResult<Self> {
        let (prefix, credentials) = match header.split_once(' ') {
            Some((prefix, rest)) => (prefix, rest.trim()),
            None => (header, ""),
        };

        if prefix != "Basic" {
            return Err(OAuthError::unexpected_value(
                "Authorization header prefix",
                prefix,
                "Basic",
            ));
        }
        if credentials.is_empty() {
            return Err(OAuthError::malformed("Credentials not found in Authorization header."));
        }

        let decoded = BASIC_CREDENTIALS
            .decode(credentials)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| {
                OAuthError::malformed("Invalid credentials in Authorization header.")
            })?;

        let (client_id, client_secret) = match decoded.split_once(':') {
            Some((id, secret)) => (id.to_owned(), Some(secret.to_owned())),
            None => (decoded, None),
        };
        Ok(Self { client_id, client_secret })
    }
}

/// Everything the token endpoint needs to complete an exchange.
#[derive(Clone, Copy)]
pub struct TokenEndpoint<'a> {
    pub config: &'a Config,
    pub store: &'a dyn SessionStore,
    pub profiles: &'a dyn ProfileDirectory,
}

impl TokenEndpoint<'_> {
    /// Exchange an authorization code for tokens.
    ///
    /// `authorization` is the raw `Authorization` header value, if any.
    pub async fn exchange(
        &self,
        form: &TokenForm,
        authorization: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        let mut stage = Stage::Received;
        let result = self.run(&mut stage, form, authorization).await;

        match &result {
            Ok(response) => {
                tracing::info!(
                    scope = %response.scope,
                    id_token = response.id_token.is_some(),
                    "Issued tokens"
                );
            }
            Err(err) => log_rejection(err, stage),
        }
        result
    }

    async fn run(
        &self,
        stage: &mut Stage,
        form: &TokenForm,
        authorization: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        match form.grant_type.as_deref() {
            Some("authorization_code") => {}
            Some(other) => {
                return Err(OAuthError::unexpected_value(
                    "grant_type",
                    other,
                    "authorization_code",
                ));
            }
            None => return Err(OAuthError::missing_parameter("grant_type")),
        }
        *stage = Stage::GrantValidated;

        let code = form.code.as_deref().ok_or_else(|| OAuthError::missing_parameter("code"))?;
        *stage = Stage::CodeResolved;

        let session = self
            .store
            .take(code)
            .await
            .map_err(|e| OAuthError::storage("load auth session", e))?
            .ok_or_else(|| OAuthError::SessionNotFound { code: code.to_owned() })?;
        *stage = Stage::SessionConsumed;

        self.verify_pkce(&session, form.code_verifier.as_deref())?;
        *stage = Stage::PkceVerified;

        if form.redirect_uri.as_deref() != Some(session.redirect_uri.as_str()) {
            return Err(OAuthError::protocol("Invalid redirect_uri."));
        }
        *stage = Stage::RedirectVerified;

        self.authenticate_client(&session, authorization)?;
        *stage = Stage::ClientAuthenticated;

        let Some(scope) = session.scope.as_deref() else {
            return Err(OAuthError::malformed("scope is required."));
        };
        let scopes = Scopes::parse(scope);
        *stage = Stage::ScopeResolved;

        let access_token = generate_token();
        let ctx = ClaimsContext {
            issuer: &self.config.issuer,
            session: &session,
            scopes: &scopes,
            access_token: &access_token,
            issued_at: chrono::Utc::now().timestamp(),
        };
        let id_token = match build_claims(&ctx, self.profiles)? {
            IdTokenOutcome::NotRequested => None,
            IdTokenOutcome::Issued(claims) => {
                Some(jwt::encode(&claims).map_err(|e| OAuthError::Encoding(e.to_string()))?)
            }
        };
        *stage = Stage::Issued;

        Ok(TokenResponse {
            access_token,
            id_token,
            scope: scope.to_owned(),
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_EXPIRES_IN,
        })
    }

    fn verify_pkce(
        &self,
        session: &AuthorizationSession,
        code_verifier: Option<&str>,
    ) -> OAuthResult<()> {
        let Some(challenge) = &session.code_challenge else {
            return Ok(());
        };
        let code_verifier =
            code_verifier.ok_or_else(|| OAuthError::missing_parameter("code_verifier"))?;

        let method = challenge.effective_method();
        if !self.config.pkce_policy.permits(method) {
            return Err(OAuthError::UnsupportedChallengeMethod { method });
        }
        if !pkce::verify(method, &challenge.challenge, code_verifier) {
            return Err(OAuthError::protocol("Code verifier does not match code challenge."));
        }
        Ok(())
    }

    fn authenticate_client(
        &self,
        session: &AuthorizationSession,
        authorization: Option<&str>,
    ) -> OAuthResult<()> {
        let header =
            authorization.ok_or_else(|| OAuthError::malformed("Authorization header is required."))?;
        let credentials = ClientCredentials::from_basic_header(header)?;

        if credentials.client_id != session.client_id {
            return Err(OAuthError::protocol("Invalid client_id."));
        }
        if credentials.client_secret.as_deref() != Some(self.config.client_secret.as_str()) {
            tracing::warn!(
                client_id = %credentials.client_id,
                "Rejected client_secret; never use production client secrets against the mock provider"
            );
            return Err(OAuthError::protocol(format!(
                "Invalid client_secret. Expected \"{}\". Never use production client_secret in tests.",
                self.config.client_secret
            )));
        }
        Ok(())
    }
}

fn log_rejection(err: &OAuthError, stage: Stage) {
    match err.kind() {
        ErrorKind::Configuration => {
            tracing::error!(stage = ?stage, error = %err, "Token request failed on provider configuration");
        }
        ErrorKind::Internal => {
            tracing::error!(stage = ?stage, error = ?err, "Token request failed internally");
        }
        kind => {
            tracing::warn!(stage = ?stage, kind = ?kind, error = %err, "Rejected token request");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn basic(raw: &str) -> String {
        format!("Basic {}", STANDARD.encode(raw))
    }

    #[test]
    fn test_basic_header() {
        let creds = ClientCredentials::from_basic_header(&basic("client:secret")).unwrap();
        assert_eq!(creds.client_id, "client");
        assert_eq!(creds.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn test_basic_header_secret_keeps_colons() {
        let creds = ClientCredentials::from_basic_header(&basic("client:se:cret")).unwrap();
        assert_eq!(creds.client_secret.as_deref(), Some("se:cret"));
    }

    #[test]
    fn test_basic_header_unpadded() {
        let unpadded = STANDARD.encode("client:secret").trim_end_matches('=').to_string();
        assert!(!unpadded.ends_with('='));

        let creds = ClientCredentials::from_basic_header(&format!("Basic {unpadded}")).unwrap();
        assert_eq!(creds.client_id, "client");
        assert_eq!(creds.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn test_token_form_first_wins() {
        let pairs = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), "a".to_string()),
            ("code".to_string(), "b".to_string()),
            ("client_assertion".to_string(), "ignored".to_string()),
        ];
        let form = TokenForm::from_pairs(&pairs);
        assert_eq!(form.grant_type.as_deref(), Some("authorization_code"));
        assert_eq!(form.code.as_deref(), Some("a"));
        assert!(form.code_verifier.is_none());
        assert!(form.redirect_uri.is_none());
    }

    #[test]
    fn test_basic_header_without_secret() {
        let creds = ClientCredentials::from_basic_header(&basic("client")).unwrap();
        assert_eq!(creds.client_id, "client");
        assert!(creds.client_secret.is_none());
    }

    #[test]
    fn test_wrong_scheme() {
        let err = ClientCredentials::from_basic_header("Bearer abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid Authorization header prefix: "Bearer". Expected "Basic"."#
        );
    }

    #[test]
    fn test_missing_credentials() {
        let err = ClientCredentials::from_basic_header("Basic").unwrap_err();
        assert_eq!(err.to_string(), "Credentials not found in Authorization header.");
    }

    #[test]
    fn test_invalid_base64() {
        let err = ClientCredentials::from_basic_header("Basic !!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRequest);
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Received < Stage::SessionConsumed);
        assert!(Stage::SessionConsumed < Stage::PkceVerified);
        assert!(Stage::ScopeResolved < Stage::Issued);
    }
}
