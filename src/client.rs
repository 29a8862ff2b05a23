//! Backend HTTP client
//!
//! Every outgoing request is built through [`ApiClient::request`], which
//! attaches `Authorization: Bearer <token>` whenever the credential store
//! holds a token. Services never touch `reqwest` directly.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::credentials::CredentialStore;
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
    ) -> ApiResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Reuse an existing connection pool
    pub fn with_client(http: Client, base_url: &str, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request with the bearer token attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.credentials.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON body; non-2xx becomes [`ApiError::Status`]
    pub async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = Self::checked(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        // DELETE/POST endpoints may answer 2xx with an empty body
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null".as_slice()
        } else {
            bytes.as_ref()
        };
        Ok(serde_json::from_slice(body)?)
    }

    async fn checked(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!("{} -> {}", url, status);
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    pub async fn get(&self, path: &str) -> ApiResult<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ApiResult<Value> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// POST without a body
    pub async fn post_empty(&self, path: &str) -> ApiResult<Value> {
        self.send(self.request(Method::POST, path)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Value> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<Value> {
        self.send(self.request(Method::POST, path).multipart(form))
            .await
    }
}
