//! Client configuration and transport layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client as HttpClient;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use google_cloud_auth::credentials::{
    Builder as AuthBuilder, CacheableResource, Credentials as GoogleCredentials,
};
use http::Extensions;

/// Generative-AI client, cheap to clone.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub http: HttpClient,
    pub config: ClientConfig,
    pub api_client: ApiClient,
    pub(crate) auth_provider: Option<AuthProvider>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub backend: Backend,
    pub vertex_config: Option<VertexConfig>,
    pub http_options: HttpOptions,
    pub credentials: Credentials,
}

/// Backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    GeminiApi,
    VertexAi,
}

/// Authentication mode.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API key (public Gemini API).
    ApiKey(String),
    /// Application Default Credentials (Vertex AI).
    ApplicationDefault,
}

#[derive(Debug, Clone)]
pub struct VertexConfig {
    pub project: String,
    pub location: String,
}

#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    pub timeout: Option<u64>,
    pub headers: HashMap<String, String>,
    pub base_url: Option<String>,
    pub api_version: Option<String>,
}

/// Which credential path a resolved client ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedMode {
    /// Vertex AI with project credentials.
    Vertex,
    /// Public Gemini API with an API key.
    Public,
}

impl Client {
    /// New public-API client from an API key.
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder()
            .api_key(api_key)
            .backend(Backend::GeminiApi)
            .build()
    }

    /// New Vertex AI client (Application Default Credentials).
    ///
    /// # Errors
    /// Returns an error when the configuration is invalid.
    pub fn new_vertex(project: impl Into<String>, location: impl Into<String>) -> Result<Self> {
        Self::builder()
            .backend(Backend::VertexAi)
            .vertex_project(project)
            .vertex_location(location)
            .build()
    }

    /// Resolve a client from the environment, falling back across the two
    /// authentication modes.
    ///
    /// Order: `FORCE_GEMINI_PUBLIC` short-circuits to the public API; then
    /// `GCP_PROJECT` selects Vertex, validated with a `models.list` probe
    /// and degraded to the public API when the probe fails and an API key
    /// exists; otherwise the API key alone selects the public API.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` when neither mode is configured, and
    /// the probe error when Vertex fails with no API key to fall back to.
    pub async fn resolve_from_env() -> Result<(Self, ResolvedMode)> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let project = std::env::var("GCP_PROJECT")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let location =
            std::env::var("GCP_LOCATION").unwrap_or_else(|_| "us-central1".to_string());
        let force_public = std::env::var("FORCE_GEMINI_PUBLIC")
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if force_public {
            if let Some(key) = &api_key {
                let client = Self::public_from_env(key)?;
                return Ok((client, ResolvedMode::Public));
            }
        }

        if let Some(project) = project {
            let vertex = Self::builder()
                .backend(Backend::VertexAi)
                .vertex_project(project)
                .vertex_location(location)
                .apply_env_overrides()
                .build()?;
            match vertex.models().list().await {
                Ok(_) => return Ok((vertex, ResolvedMode::Vertex)),
                Err(err) => {
                    if let Some(key) = &api_key {
                        tracing::warn!(error = %err, "vertex probe failed, using public API");
                        let client = Self::public_from_env(key)?;
                        return Ok((client, ResolvedMode::Public));
                    }
                    return Err(err);
                }
            }
        }

        if let Some(key) = &api_key {
            let client = Self::public_from_env(key)?;
            return Ok((client, ResolvedMode::Public));
        }

        Err(Error::InvalidConfig {
            message: "Set GCP_PROJECT or GOOGLE_API_KEY".into(),
        })
    }

    fn public_from_env(api_key: &str) -> Result<Self> {
        Self::builder()
            .api_key(api_key)
            .backend(Backend::GeminiApi)
            .apply_env_overrides()
            .build()
    }

    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Models API surface.
    #[must_use]
    pub fn models(&self) -> crate::models::Models {
        crate::models::Models::new(self.inner.clone())
    }

    /// Operations API surface.
    #[must_use]
    pub fn operations(&self) -> crate::operations::Operations {
        crate::operations::Operations::new(self.inner.clone())
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.inner.config.backend
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    credentials: Option<Credentials>,
    backend: Option<Backend>,
    vertex_project: Option<String>,
    vertex_location: Option<String>,
    http_options: HttpOptions,
}

impl ClientBuilder {
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub const fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn vertex_project(mut self, project: impl Into<String>) -> Self {
        self.vertex_project = Some(project.into());
        self
    }

    #[must_use]
    pub fn vertex_location(mut self, location: impl Into<String>) -> Self {
        self.vertex_location = Some(location.into());
        self
    }

    /// Request timeout in seconds.
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.http_options.timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_options.headers.insert(key.into(), value.into());
        self
    }

    /// Custom base URL (tests point this at a mock server).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http_options.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.http_options.api_version = Some(api_version.into());
        self
    }

    /// Pick up `GENAI_BASE_URL` / `GENAI_API_VERSION` overrides when set.
    #[must_use]
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(base_url) = std::env::var("GENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.http_options.base_url = Some(base_url);
            }
        }
        if let Ok(api_version) = std::env::var("GENAI_API_VERSION") {
            if !api_version.trim().is_empty() {
                self.http_options.api_version = Some(api_version);
            }
        }
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns an error when the configuration is incomplete or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let Self {
            api_key,
            credentials,
            backend,
            vertex_project,
            vertex_location,
            http_options,
        } = self;

        let backend = backend.unwrap_or_else(|| {
            if vertex_project.is_some() || vertex_location.is_some() {
                Backend::VertexAi
            } else {
                Backend::GeminiApi
            }
        });
        let credentials = Self::resolve_credentials(backend, api_key.as_deref(), credentials)?;
        let headers = Self::build_headers(&http_options, backend, &credentials)?;
        let http = Self::build_http_client(&http_options, headers)?;

        let api_key = match &credentials {
            Credentials::ApiKey(key) => Some(key.clone()),
            Credentials::ApplicationDefault => None,
        };
        let vertex_config = match backend {
            Backend::GeminiApi => None,
            Backend::VertexAi => {
                let project = vertex_project.ok_or_else(|| Error::InvalidConfig {
                    message: "Project and location required for Vertex AI".into(),
                })?;
                let location = vertex_location.ok_or_else(|| Error::InvalidConfig {
                    message: "Project and location required for Vertex AI".into(),
                })?;
                Some(VertexConfig { project, location })
            }
        };

        let config = ClientConfig {
            api_key,
            backend,
            vertex_config,
            http_options,
            credentials: credentials.clone(),
        };
        let auth_provider = match &credentials {
            Credentials::ApiKey(_) => None,
            Credentials::ApplicationDefault => {
                Some(AuthProvider::ApplicationDefault(Arc::new(OnceCell::new())))
            }
        };
        let api_client = ApiClient::new(&config);

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                config,
                api_client,
                auth_provider,
            }),
        })
    }

    fn resolve_credentials(
        backend: Backend,
        api_key: Option<&str>,
        credentials: Option<Credentials>,
    ) -> Result<Credentials> {
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => {
                if let Some(api_key) = api_key {
                    Credentials::ApiKey(api_key.to_string())
                } else if backend == Backend::VertexAi {
                    Credentials::ApplicationDefault
                } else {
                    return Err(Error::InvalidConfig {
                        message: "API key required for the public Gemini API".into(),
                    });
                }
            }
        };

        if backend == Backend::VertexAi && matches!(credentials, Credentials::ApiKey(_)) {
            return Err(Error::InvalidConfig {
                message: "Vertex AI does not support API key authentication".into(),
            });
        }

        Ok(credentials)
    }

    fn build_headers(
        http_options: &HttpOptions,
        backend: Backend,
        credentials: &Credentials,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (key, value) in &http_options.headers {
            let name =
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| Error::InvalidConfig {
                    message: format!("Invalid header name: {key}"),
                })?;
            let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidConfig {
                message: format!("Invalid header value for {key}"),
            })?;
            headers.insert(name, value);
        }

        if backend == Backend::GeminiApi {
            let api_key = match credentials {
                Credentials::ApiKey(key) => key.as_str(),
                Credentials::ApplicationDefault => "",
            };
            let header_name = HeaderName::from_static("x-goog-api-key");
            if !api_key.is_empty() && !headers.contains_key(&header_name) {
                let mut header_value =
                    HeaderValue::from_str(api_key).map_err(|_| Error::InvalidConfig {
                        message: "Invalid API key value".into(),
                    })?;
                header_value.set_sensitive(true);
                headers.insert(header_name, header_value);
            }
        }

        Ok(headers)
    }

    fn build_http_client(http_options: &HttpOptions, headers: HeaderMap) -> Result<HttpClient> {
        let mut http_builder = HttpClient::builder();
        if let Some(timeout) = http_options.timeout {
            http_builder = http_builder.timeout(Duration::from_secs(timeout));
        }
        if !headers.is_empty() {
            http_builder = http_builder.default_headers(headers);
        }
        Ok(http_builder.build()?)
    }
}

const VERTEX_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Clone)]
pub(crate) enum AuthProvider {
    ApplicationDefault(Arc<OnceCell<Arc<GoogleCredentials>>>),
}

impl AuthProvider {
    async fn headers(&self) -> Result<HeaderMap> {
        match self {
            Self::ApplicationDefault(cell) => {
                let credentials = cell
                    .get_or_try_init(|| async {
                        AuthBuilder::default()
                            .with_scopes([VERTEX_SCOPE])
                            .build()
                            .map(Arc::new)
                            .map_err(|err| Error::Auth {
                                message: format!("ADC init failed: {err}"),
                            })
                    })
                    .await?;
                let headers = credentials
                    .headers(Extensions::new())
                    .await
                    .map_err(|err| Error::Auth {
                        message: format!("ADC header fetch failed: {err}"),
                    })?;
                match headers {
                    CacheableResource::New { data, .. } => Ok(data),
                    CacheableResource::NotModified => Err(Error::Auth {
                        message: "ADC header fetch returned NotModified without cached headers"
                            .into(),
                    }),
                }
            }
        }
    }
}

impl ClientInner {
    /// Send a request with auth headers injected.
    ///
    /// # Errors
    /// Returns an error when building the request, fetching auth headers, or
    /// executing the call fails.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let mut request = request.build()?;
        if let Some(provider) = &self.auth_provider {
            let headers = provider.headers().await?;
            for (name, value) in &headers {
                if request.headers().contains_key(name) {
                    continue;
                }
                let mut value = value.clone();
                if name == AUTHORIZATION {
                    value.set_sensitive(true);
                }
                request.headers_mut().insert(name.clone(), value);
            }
        }
        Ok(self.http.execute(request).await?)
    }
}

pub(crate) struct ApiClient {
    pub base_url: String,
    pub api_version: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        let base_url = config.http_options.base_url.as_deref().map_or_else(
            || match config.backend {
                Backend::VertexAi => {
                    let location = config
                        .vertex_config
                        .as_ref()
                        .map_or("", |cfg| cfg.location.as_str());
                    if location.is_empty() {
                        "https://aiplatform.googleapis.com/".to_string()
                    } else {
                        format!("https://{location}-aiplatform.googleapis.com/")
                    }
                }
                Backend::GeminiApi => "https://generativelanguage.googleapis.com/".to_string(),
            },
            normalize_base_url,
        );

        let api_version =
            config
                .http_options
                .api_version
                .clone()
                .unwrap_or_else(|| match config.backend {
                    Backend::VertexAi => "v1beta1".to_string(),
                    Backend::GeminiApi => "v1beta".to_string(),
                });

        Self {
            base_url,
            api_version,
        }
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let mut value = base_url.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_api_key() {
        let client = Client::new("test-api-key").unwrap();
        assert_eq!(client.inner.config.backend, Backend::GeminiApi);
        assert!(client.inner.auth_provider.is_none());
    }

    #[test]
    fn vertex_config_base_url() {
        let client = Client::new_vertex("my-project", "us-central1").unwrap();
        assert_eq!(client.inner.config.backend, Backend::VertexAi);
        assert_eq!(
            client.inner.api_client.base_url,
            "https://us-central1-aiplatform.googleapis.com/"
        );
        assert!(matches!(
            client.inner.config.credentials,
            Credentials::ApplicationDefault
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = Client::builder()
            .api_key("test-key")
            .base_url("https://example.com")
            .build()
            .unwrap();
        assert_eq!(client.inner.api_client.base_url, "https://example.com/");
    }

    #[test]
    fn builder_defaults_to_vertex_when_project_set() {
        let client = Client::builder()
            .vertex_project("proj")
            .vertex_location("loc")
            .build()
            .unwrap();
        assert_eq!(client.inner.config.backend, Backend::VertexAi);
    }

    #[test]
    fn vertex_rejects_api_key() {
        let result = Client::builder()
            .backend(Backend::VertexAi)
            .vertex_project("proj")
            .vertex_location("loc")
            .credentials(Credentials::ApiKey("key".into()))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn gemini_requires_api_key() {
        let result = Client::builder().backend(Backend::GeminiApi).build();
        assert!(result.is_err());
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let result = Client::builder()
            .api_key("test-key")
            .header("bad header", "value")
            .build();
        assert!(result.is_err());
    }
}
