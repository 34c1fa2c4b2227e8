//! Sign-in and the admin gate.
//!
//! Authentication exchanges an email and password for a session with the
//! backend's auth endpoint. Authorization is a single client-side rule: the
//! signed-in user's profile email must equal the configured admin email.

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::client::rest::error_message;
use crate::client::ResourceClient;
use crate::domain::error::{AdminError, Result};
use crate::listing::get_profile;
use crate::Config;

/// Authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Email/password authentication against the backend.
pub trait AuthClient: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AdminError::Unauthorized`] for rejected credentials and
    /// [`AdminError::Remote`] for transport failures.
    fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] when the backend rejects the request.
    fn sign_out(&self, session: &Session) -> Result<()>;
}

/// GoTrue-style auth over blocking HTTP.
pub struct RestAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestAuth {
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the URL or key is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (url, key) = config.validate_remote()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

impl AuthClient for RestAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let _span = tracing::info_span!("sign_in", email = %email).entered();

        let response = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status.is_client_error() {
            let message = error_message(&body).unwrap_or_else(|| "Invalid login credentials".to_string());
            return Err(AdminError::Unauthorized(message));
        }
        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(AdminError::remote(Some(status.as_u16()), message));
        }

        let session: Session = serde_json::from_str(&body)?;
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(&response.text().unwrap_or_default()).unwrap_or_else(|| status.to_string());
            return Err(AdminError::remote(Some(status.as_u16()), message));
        }
        tracing::info!("signed out");
        Ok(())
    }
}

/// Only the configured admin account may reach the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminGate {
    admin_email: String,
}

impl AdminGate {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
        }
    }

    /// Whether `email` is the admin account. Comparison ignores case and
    /// surrounding whitespace.
    #[must_use]
    pub fn is_admin(&self, email: &str) -> bool {
        email.trim().eq_ignore_ascii_case(self.admin_email.trim())
    }

    /// Checks the signed-in user's profile email against the admin email.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Unauthorized`] for any other account, and the
    /// profile lookup error when the profile cannot be read.
    pub fn authorize(&self, client: &dyn ResourceClient, session: &Session) -> Result<()> {
        let profile = get_profile(client, &session.user.id)?;
        let email = profile.str_field("email").unwrap_or_default();

        if self.is_admin(email) {
            tracing::info!(user_id = %session.user.id, "admin authorized");
            Ok(())
        } else {
            tracing::warn!(user_id = %session.user.id, "non-admin sign-in rejected");
            Err(AdminError::Unauthorized(
                "Unauthorized user to access the dashboard".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryBackend;
    use crate::domain::{Record, Resource};
    use chrono::Utc;

    fn session(user_id: &str) -> Session {
        Session {
            access_token: "jwt".into(),
            refresh_token: None,
            user: SessionUser {
                id: user_id.into(),
                email: None,
            },
        }
    }

    fn backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .seed(
                Resource::Customers,
                vec![
                    Record::new("admin", Utc::now()).with_field("email", "Admin@EquilinkApp.com"),
                    Record::new("rider", Utc::now()).with_field("email", "rider@example.com"),
                ],
            )
            .unwrap();
        backend
    }

    #[test]
    fn admin_profile_is_authorized() {
        let gate = AdminGate::new("admin@equilinkapp.com");
        assert!(gate.authorize(&backend(), &session("admin")).is_ok());
    }

    #[test]
    fn other_profiles_are_rejected() {
        let gate = AdminGate::new("admin@equilinkapp.com");
        let err = gate.authorize(&backend(), &session("rider")).unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
    }

    #[test]
    fn missing_profile_is_not_found() {
        let gate = AdminGate::new("admin@equilinkapp.com");
        let err = gate.authorize(&backend(), &session("ghost")).unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }

    #[test]
    fn session_parses_token_response() {
        let session: Session = serde_json::from_str(
            r#"{"access_token":"a","token_type":"bearer","expires_in":3600,"refresh_token":"r","user":{"id":"u1","email":"x@y.z","role":"authenticated"}}"#,
        )
        .unwrap();
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }
}
