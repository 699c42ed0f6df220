use crate::dto::LoginResponse;
use crate::error::ContentError;
use crate::http_client::{ApiClient, ApiRequest};
use crate::session::AuthSession;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Logs in against the credential endpoint and keeps the session store in
/// step with the result.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The backend expects a form-encoded body with `username`/`password`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ContentError> {
        tracing::debug!("Login called for {}", credentials.email);

        let request = ApiRequest::post("admin/auth/login").form(&[
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ]);

        let response: LoginResponse = match self.client.send_json(request).await {
            Ok(response) => response,
            Err(ContentError::Api { status, .. }) => {
                tracing::warn!("Login rejected for {}: HTTP {}", credentials.email, status);
                return Err(ContentError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let session = AuthSession::new(response.access_token, credentials.email.clone());
        self.client.session().set(session.clone());
        tracing::info!("Logged in as {}", credentials.email);

        Ok(session)
    }

    /// Always ends with a cleared local session, whatever the server says.
    pub async fn logout(&self) {
        if let Err(e) = self
            .client
            .send_empty(ApiRequest::post("admin/auth/logout"))
            .await
        {
            tracing::warn!("Remote logout failed: {}", e);
        }

        self.client.session().clear();
        tracing::info!("Logged out");
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.client.session().current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }
}
