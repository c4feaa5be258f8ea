use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::model::{
    AuthResponse, Credentials, CurrentUser, Product, ProductDraft, ProductEnvelope, ProductPatch,
    SignupRequest,
};
use crate::store::RememberStore;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

const NO_BODY: Option<&()> = None;

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            proxy: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL: {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// No response at all: connection refused, timeout, reset mid-body.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }
}

/// Credentialed JSON client for the inventory API.
///
/// Cookies set by the API are kept in a jar shared by every request, which is how the
/// session travels. `session_token`/`restore_session` move that cookie header in and out
/// so a later process can resume the session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    store: Option<RememberStore>,
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let trimmed = options.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
            url: options.base_url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("stockboard/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy_cfg);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::HttpClientBuild { source: e })?;

        Ok(Self {
            http,
            jar,
            base_url,
            store: None,
        })
    }

    /// Attaches the store that `logout` clears.
    pub fn with_store(mut self, store: RememberStore) -> Self {
        self.store = Some(store);
        self
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint)
    }

    /// Current cookie header for the API origin, if the server has set any.
    pub fn session_token(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .filter(|v| !v.is_empty())
    }

    pub fn restore_session(&self, token: &str) {
        for cookie in token.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &self.base_url);
        }
        debug!("restored stored session cookies");
    }

    pub async fn request<B, T>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);
        debug!(%method, %url, "sending request");

        let mut req = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, %method, endpoint, "API request failed");
                return Err(ClientError::Transport {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, %method, endpoint, "failed to read API response");
                return Err(ClientError::Transport {
                    endpoint: endpoint.to_string(),
                    source: e,
                });
            }
        };

        // Bodies that are not JSON are treated as an empty object.
        let value: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default()));

        if !status.is_success() {
            let message = error_message(&value);
            warn!(status = status.as_u16(), %method, endpoint, %message, "API request rejected");
            return Err(ClientError::Request {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_value(value).map_err(|e| {
            error!(error = %e, %method, endpoint, "API response did not match the expected shape");
            ClientError::Decode {
                endpoint: endpoint.to_string(),
                source: e,
            }
        })
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response = self
            .request("/login", Method::POST, Some(credentials))
            .await?;
        info!(username = %credentials.username, "logged in");
        Ok(response)
    }

    pub async fn signup(&self, credentials: &Credentials) -> Result<CurrentUser, ClientError> {
        let body = SignupRequest { user: credentials };
        self.request("/users", Method::POST, Some(&body)).await
    }

    pub async fn get_current_user(&self) -> Result<CurrentUser, ClientError> {
        self.request("/me", Method::GET, NO_BODY).await
    }

    /// Ends the server session. The remembered username and session token are cleared
    /// whether or not the server call succeeds.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self
            .request::<_, Value>("/logout", Method::DELETE, NO_BODY)
            .await
            .map(|_| ());
        if let Some(store) = &self.store {
            if let Err(e) = store.forget() {
                warn!(error = %e, "failed to clear remembered session");
            }
        }
        if result.is_ok() {
            info!("logged out");
        }
        result
    }

    pub async fn get_products(&self) -> Result<Vec<Product>, ClientError> {
        self.request("/products", Method::GET, NO_BODY).await
    }

    /// Returns the created record exactly as the API sent it.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Value, ClientError> {
        let body = ProductEnvelope { product: draft };
        self.request("/products", Method::POST, Some(&body)).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
    ) -> Result<Value, ClientError> {
        let body = ProductEnvelope { product: patch };
        self.request(&format!("/products/{id}"), Method::PATCH, Some(&body))
            .await
    }

    pub async fn delete_product(&self, id: i64) -> Result<Value, ClientError> {
        self.request(&format!("/products/{id}"), Method::DELETE, NO_BODY)
            .await
    }
}

/// Picks the server-provided message out of an error body, falling back to the generic one.
pub fn error_message(body: &Value) -> String {
    if let Some(message) = body
        .get("error")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
    {
        return message.to_string();
    }
    if let Some(list) = body.get("errors").and_then(Value::as_array) {
        let parts: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
        if !parts.is_empty() {
            return parts.join(", ");
        }
    }
    GENERIC_ERROR_MESSAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(&json!({"error": "Invalid credentials"})), "Invalid credentials");
        assert_eq!(
            error_message(&json!({"errors": ["Username taken", "Password too short"]})),
            "Username taken, Password too short"
        );
        assert_eq!(error_message(&json!({})), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(&json!({"error": ""})), GENERIC_ERROR_MESSAGE);
        assert_eq!(error_message(&json!([1, 2])), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let options = ClientOptions {
            base_url: "not a url".to_string(),
            ..ClientOptions::default()
        };
        assert!(matches!(
            ApiClient::new(&options),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn endpoint_is_appended_to_base() {
        let options = ClientOptions {
            base_url: "http://localhost:3000/api/".to_string(),
            ..ClientOptions::default()
        };
        let client = ApiClient::new(&options).unwrap();
        assert_eq!(client.endpoint_url("/products/4"), "http://localhost:3000/api/products/4");
    }

    #[test]
    fn restored_session_is_exported_again() {
        let client = ApiClient::new(&ClientOptions::default()).unwrap();
        assert!(client.session_token().is_none());
        client.restore_session("_session=abc; theme=dark");
        let token = client.session_token().unwrap();
        assert!(token.contains("_session=abc"));
        assert!(token.contains("theme=dark"));
    }
}
