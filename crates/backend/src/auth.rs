//! Client for the backend's `/auth/v1` identity routes.

use serde::Deserialize;
use serde_json::json;

use lutspace_core::types::EntityId;

/// Errors from the auth routes.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The auth service rejected the request.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success body that failed to deserialize into the expected shape.
    #[error("Auth service returned an unexpected body: {0}")]
    Decode(String),
}

/// The identity record the auth service returns inside sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: EntityId,
    pub email: String,
    /// Free-form profile metadata set at signup (`display_name` et al.).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// The user's display name, falling back to the email local part.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.user_metadata["display_name"].as_str() {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        self.email
            .split('@')
            .next()
            .unwrap_or(&self.email)
            .to_string()
    }
}

/// A signed-in session: both tokens plus the identity they belong to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// Outcome of a signup request.
///
/// Projects with email confirmation enabled return the user without a
/// session; the session only materializes after the confirmation link is
/// followed and the user logs in.
#[derive(Debug, Clone)]
pub enum SignupOutcome {
    /// Confirmation required; no session yet.
    ConfirmationSent(AuthUser),
    /// Confirmation disabled; the user is signed in immediately.
    SignedIn(AuthSession),
}

/// HTTP client for the auth routes of one backend project.
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthApi {
    /// Create a client from the project URL and anonymous key. No network
    /// I/O happens here.
    pub fn new(project_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: project_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/auth/v1/{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Register a new account.
    ///
    /// `redirect_to` is where the confirmation email's link lands the
    /// user (the site URL).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        redirect_to: &str,
    ) -> Result<SignupOutcome, AuthError> {
        let body = self
            .send(
                self.request("signup")
                    .query(&[("redirect_to", redirect_to)])
                    .json(&json!({
                        "email": email,
                        "password": password,
                        "data": { "display_name": display_name },
                    })),
            )
            .await?;
        // A session in the response means confirmation is disabled.
        if body.get("access_token").is_some() {
            return Ok(SignupOutcome::SignedIn(decode(body)?));
        }
        Ok(SignupOutcome::ConfirmationSent(decode(body)?))
    }

    /// Exchange email/password credentials for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let body = self
            .send(
                self.request("token")
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        decode(body)
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let body = self
            .send(
                self.request("token")
                    .query(&[("grant_type", "refresh_token")])
                    .json(&json!({ "refresh_token": refresh_token })),
            )
            .await?;
        decode(body)
    }

    /// Re-send the signup confirmation email.
    pub async fn resend_confirmation(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError> {
        self.send(
            self.request("resend")
                .query(&[("redirect_to", redirect_to)])
                .json(&json!({ "type": "signup", "email": email })),
        )
        .await
        .map(|_| ())
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, AuthError> {
        let response = request.send().await?;
        let response = check(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response onto [`AuthError::Api`], digging the message out
/// of the service's several error-envelope shapes.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(AuthError::Api {
        status: status.as_u16(),
        message: extract_error_message(&text, status.as_u16()),
    })
}

fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "error_description", "message"] {
            if let Some(message) = value[key].as_str() {
                return message.to_string();
            }
        }
    }
    format!("auth request failed with status {status}")
}

fn decode<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, AuthError> {
    serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_metadata() {
        let user = AuthUser {
            id: uuid::Uuid::nil(),
            email: "pat@example.com".into(),
            user_metadata: json!({ "display_name": "Pat Q" }),
        };
        assert_eq!(user.display_name(), "Pat Q");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let user = AuthUser {
            id: uuid::Uuid::nil(),
            email: "pat@example.com".into(),
            user_metadata: json!({}),
        };
        assert_eq!(user.display_name(), "pat");

        let blank = AuthUser {
            id: uuid::Uuid::nil(),
            email: "pat@example.com".into(),
            user_metadata: json!({ "display_name": "   " }),
        };
        assert_eq!(blank.display_name(), "pat");
    }

    #[test]
    fn error_message_extraction_tries_known_keys() {
        assert_eq!(
            extract_error_message(r#"{"msg":"Email not confirmed"}"#, 400),
            "Email not confirmed"
        );
        assert_eq!(
            extract_error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#, 400),
            "Invalid login credentials"
        );
        assert_eq!(
            extract_error_message(r#"{"message":"Signups not allowed"}"#, 422),
            "Signups not allowed"
        );
        assert_eq!(
            extract_error_message("<html>bad gateway</html>", 502),
            "auth request failed with status 502"
        );
    }

    #[test]
    fn session_deserializes() {
        let session: AuthSession = serde_json::from_value(json!({
            "access_token": "jwt",
            "refresh_token": "r1",
            "token_type": "bearer",
            "user": {
                "id": "6dfc8d6e-5b1a-4a4f-9c3e-2f6a1f0b9d11",
                "email": "pat@example.com",
                "user_metadata": { "display_name": "Pat" }
            }
        }))
        .expect("session shape");
        assert_eq!(session.refresh_token, "r1");
        assert_eq!(session.user.display_name(), "Pat");
    }
}
