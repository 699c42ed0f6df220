use crate::config::ClientConfig;
use crate::error::ContentError;
use crate::session::SessionStore;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// One logical request against the content API.
///
/// The `retried` mark survives manual retries of the same value, so a second
/// 401 for it is passed through without clearing the session again.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ContentError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Single point of outbound HTTP for the content layer.
///
/// Every request gets the current session token attached, and a 401 clears
/// the session before the failure is returned to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send the request and return the raw response if it was 2xx.
    pub async fn execute(&self, request: &mut ApiRequest) -> Result<Response, ContentError> {
        let url = self.url(&request.path);
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = self.add_auth_header(builder).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED && !request.retried {
            request.retried = true;
            tracing::warn!(
                "{} {} returned 401, clearing session",
                request.method,
                request.path
            );
            self.session.clear();
        }

        Err(ContentError::Api { status, body })
    }

    pub async fn send_json<T: DeserializeOwned>(
        &self,
        mut request: ApiRequest,
    ) -> Result<T, ContentError> {
        let response = self.execute(&mut request).await?;
        let value = response.json::<T>().await?;
        Ok(value)
    }

    /// Send a request whose response body is irrelevant.
    pub async fn send_empty(&self, mut request: ApiRequest) -> Result<(), ContentError> {
        self.execute(&mut request).await?;
        Ok(())
    }
}
