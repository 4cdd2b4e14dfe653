//! Authorization endpoint logic.
//!
//! Validates login requests and, on submission, mints a single-use code
//! bound to the submitted parameters.

use url::Url;

use super::pkce::ChallengeMethod;
use super::store::{SessionStore, generate_token};
use super::types::{AuthorizationSession, CodeChallenge};
use crate::config::defaults::STATE_LENGTH;
use crate::error::{OAuthError, OAuthResult};

/// Name of the form field carrying the chosen end-user.
pub const SUBJECT_FIELD: &str = "id_token_sub";

/// Parameters passed through to the redirect when present.
const PASSTHROUGH: [&str; 3] = ["state", "scope", "prompt"];

/// Authorization request parameters, from either the query string or the
/// submitted login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizeParams {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub prompt: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub subject: Option<String>,
}

impl AuthorizeParams {
    /// Collect known parameters; the first occurrence of a name wins.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "response_type" => &mut params.response_type,
                "client_id" => &mut params.client_id,
                "redirect_uri" => &mut params.redirect_uri,
                "scope" => &mut params.scope,
                "state" => &mut params.state,
                "prompt" => &mut params.prompt,
                "code_challenge" => &mut params.code_challenge,
                "code_challenge_method" => &mut params.code_challenge_method,
                SUBJECT_FIELD => &mut params.subject,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.clone());
            }
        }
        params
    }

    fn passthrough(&self, name: &str) -> Option<&str> {
        match name {
            "state" => self.state.as_deref(),
            "scope" => self.scope.as_deref(),
            "prompt" => self.prompt.as_deref(),
            _ => None,
        }
    }

    /// Run the checks shared by the login form and its submission.
    pub fn validate(&self) -> OAuthResult<ValidatedParams<'_>> {
        match self.response_type.as_deref() {
            Some("code") => {}
            Some(other) => return Err(OAuthError::unexpected_value("response_type", other, "code")),
            None => return Err(OAuthError::missing_parameter("response_type")),
        }

        let client_id =
            self.client_id.as_deref().ok_or_else(|| OAuthError::missing_parameter("client_id"))?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .ok_or_else(|| OAuthError::missing_parameter("redirect_uri"))?;

        if let Some(state) = self.state.as_deref() {
            validate_state(state)?;
        }

        Ok(ValidatedParams { client_id, redirect_uri })
    }
}

/// Required parameters that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedParams<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
}

/// Check the `state` parameter's length and alphabet.
pub fn validate_state(state: &str) -> OAuthResult<()> {
    let length = state.chars().count();
    if length != STATE_LENGTH {
        return Err(OAuthError::malformed(format!(
            "Invalid state length: {length}. Expected {STATE_LENGTH}."
        )));
    }
    if let Some(c) = state.chars().find(|c| !is_url_safe(*c)) {
        return Err(OAuthError::malformed(format!(
            "Invalid state character: \"{c}\". Expected URL-safe character."
        )));
    }
    Ok(())
}

const fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

/// Validate a login submission, persist its session and build the redirect.
///
/// Nothing is written unless every check passes.
pub async fn authorize(store: &dyn SessionStore, params: &AuthorizeParams) -> OAuthResult<Url> {
    let validated = params.validate()?;

    let subject =
        params.subject.as_deref().ok_or_else(|| OAuthError::missing_parameter(SUBJECT_FIELD))?;

    let mut redirect_url = Url::parse(validated.redirect_uri).map_err(|_| {
        OAuthError::malformed(format!("Invalid redirect_uri: \"{}\".", validated.redirect_uri))
    })?;

    let method = params
        .code_challenge_method
        .as_deref()
        .map(str::parse::<ChallengeMethod>)
        .transpose()
        .map_err(|e| OAuthError::malformed(e.to_string()))?;

    let code_challenge = params
        .code_challenge
        .as_ref()
        .map(|challenge| CodeChallenge { challenge: challenge.clone(), method });

    let code = generate_token();
    let session = AuthorizationSession {
        code: code.clone(),
        client_id: validated.client_id.to_owned(),
        redirect_uri: validated.redirect_uri.to_owned(),
        scope: params.scope.clone(),
        subject: subject.to_owned(),
        code_challenge,
    };

    store
        .insert(session)
        .await
        .map_err(|e| OAuthError::storage("store login session", e))?;

    {
        let mut query = redirect_url.query_pairs_mut();
        query.append_pair("code", &code);
        for name in PASSTHROUGH {
            if let Some(value) = params.passthrough(name) {
                query.append_pair(name, value);
            }
        }
    }

    tracing::info!(client_id = %validated.client_id, subject = %subject, "Issued authorization code");

    Ok(redirect_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::store::MemorySessionStore;

    const STATE: &str = "0123456789abcdef0123456789abcdef0123456789a";

    fn params() -> AuthorizeParams {
        AuthorizeParams {
            response_type: Some("code".into()),
            client_id: Some("123".into()),
            redirect_uri: Some("https://example.com/cb".into()),
            subject: Some("alice".into()),
            ..AuthorizeParams::default()
        }
    }

    #[test]
    fn test_from_pairs_first_wins() {
        let pairs = vec![
            ("client_id".to_string(), "first".to_string()),
            ("client_id".to_string(), "second".to_string()),
            ("unknown".to_string(), "x".to_string()),
            ("id_token_sub".to_string(), "alice".to_string()),
        ];
        let params = AuthorizeParams::from_pairs(&pairs);
        assert_eq!(params.client_id.as_deref(), Some("first"));
        assert_eq!(params.subject.as_deref(), Some("alice"));
    }

    #[test]
    fn test_validate_order() {
        let mut p = AuthorizeParams::default();
        assert_eq!(
            p.validate().unwrap_err().to_string(),
            "Parameter response_type is required."
        );
        p.response_type = Some("token".into());
        assert_eq!(
            p.validate().unwrap_err().to_string(),
            r#"Invalid response_type: "token". Expected "code"."#
        );
        p.response_type = Some("code".into());
        assert_eq!(p.validate().unwrap_err().to_string(), "Parameter client_id is required.");
        p.client_id = Some("123".into());
        assert_eq!(p.validate().unwrap_err().to_string(), "Parameter redirect_uri is required.");
        p.redirect_uri = Some("https://example.com".into());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_state_rules() {
        assert!(validate_state(STATE).is_ok());
        assert!(validate_state("abcdefghijklmnopqrstuvwxyz-_.~ABCDEFGHIJKLM").is_ok());
        assert_eq!(
            validate_state("123").unwrap_err().to_string(),
            "Invalid state length: 3. Expected 43."
        );
        assert_eq!(
            validate_state("[123456789abcdef0123456789abcdef0123456789a")
                .unwrap_err()
                .to_string(),
            r#"Invalid state character: "[". Expected URL-safe character."#
        );
    }

    #[tokio::test]
    async fn test_authorize_persists_session() {
        let store = MemorySessionStore::new();
        let mut p = params();
        p.state = Some(STATE.into());
        p.scope = Some("openid email".into());
        p.code_challenge = Some("challenge".into());

        let url = authorize(&store, &p).await.unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], STATE);
        assert_eq!(pairs["scope"], "openid email");
        assert!(!pairs.contains_key("prompt"));

        let session = store.get(&pairs["code"]).await.unwrap().unwrap();
        assert_eq!(session.subject, "alice");
        let challenge = session.code_challenge.unwrap();
        assert_eq!(challenge.method, None);
        assert_eq!(challenge.effective_method(), ChallengeMethod::Plain);
    }

    #[tokio::test]
    async fn test_authorize_requires_subject() {
        let store = MemorySessionStore::new();
        let mut p = params();
        p.subject = None;
        let err = authorize(&store, &p).await.unwrap_err();
        assert_eq!(err.to_string(), "Parameter id_token_sub is required.");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authorize_rejects_unknown_method() {
        let store = MemorySessionStore::new();
        let mut p = params();
        p.code_challenge = Some("challenge".into());
        p.code_challenge_method = Some("S512".into());
        let err = authorize(&store, &p).await.unwrap_err();
        assert!(err.to_string().contains("S512"));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authorize_rejects_unparseable_redirect() {
        let store = MemorySessionStore::new();
        let mut p = params();
        p.redirect_uri = Some("not a url".into());
        let err = authorize(&store, &p).await.unwrap_err();
        assert_eq!(err.to_string(), r#"Invalid redirect_uri: "not a url"."#);
    }
}
