//! Credential handshake and per-attempt BI logon

use std::sync::Arc;
use std::time::Instant;

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::transport::ReportTransport;
use crate::types::{DataContext, Session};

/// Produces sessions from credentials and data contexts from sessions
#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn ReportTransport>,
}

impl SessionManager {
    /// Create a manager over the given transport
    pub fn new(transport: Arc<dyn ReportTransport>) -> Self {
        Self { transport }
    }

    /// Run the login handshake
    ///
    /// Credentials are validated before anything is sent. A response without
    /// a token is an [`Error::Authentication`].
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;

        let started = Instant::now();
        tracing::info!(phase = "authenticate", username = %credentials.username, "authenticating");

        let token = self
            .transport
            .authenticate(credentials)
            .await
            .map_err(|e| match e {
                Error::Authentication(_) => e,
                other => Error::Authentication(other.to_string()),
            })?;

        if token.trim().is_empty() {
            return Err(Error::Authentication(
                "login service returned no token".to_string(),
            ));
        }

        tracing::info!(
            phase = "authenticate",
            elapsed_ms = started.elapsed().as_millis() as u64,
            "authenticated"
        );
        Ok(Session::new(token, credentials.client_access_key.clone()))
    }

    /// Exchange the session token for a fresh BI data context
    ///
    /// May be called any number of times per session.
    pub async fn log_on_with_token(&self, session: &Session) -> Result<DataContext> {
        tracing::debug!(phase = "logon", "logging on with session token");

        let context = self
            .transport
            .log_on_with_token(session.token(), session.client_access_key())
            .await?;

        if !context.is_logged_on() {
            return Err(Error::Authentication(format!(
                "logon returned status {:?}: {}",
                context.status(),
                context.status_message()
            )));
        }
        Ok(context)
    }
}
