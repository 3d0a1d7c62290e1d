//! Operations API surface.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{Backend, ClientInner};
use crate::error::{Error, Result};
use crate::types::operations::Operation;

/// Polling knobs for [`Operations::wait_with_config`].
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Seconds between polls.
    pub interval_secs: u64,
    /// Give up after this many polls. `None` polls forever.
    pub max_polls: Option<u32>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            max_polls: Some(120),
        }
    }
}

#[derive(Clone)]
pub struct Operations {
    pub(crate) inner: Arc<ClientInner>,
}

impl Operations {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Fetch the current state of an operation.
    pub async fn get(&self, name: impl AsRef<str>) -> Result<Operation> {
        let name = normalize_operation_name(&self.inner, name.as_ref())?;
        let url = build_operation_url(&self.inner, &name);
        let request = self.inner.http.get(url);

        let response = self.inner.send(request).await?;
        if !response.status().is_success() {
            return Err(Error::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<Operation>().await?)
    }

    /// Poll until the operation is done, with default intervals.
    pub async fn wait(&self, operation: Operation) -> Result<Operation> {
        self.wait_with_config(operation, WaitConfig::default())
            .await
    }

    /// Poll until the operation is done or the poll budget runs out.
    pub async fn wait_with_config(
        &self,
        mut operation: Operation,
        config: WaitConfig,
    ) -> Result<Operation> {
        let name = operation.name.clone().ok_or_else(|| Error::InvalidConfig {
            message: "Operation name is empty".into(),
        })?;
        let mut polls = 0u32;
        while !operation.is_done() {
            if let Some(max_polls) = config.max_polls {
                if polls >= max_polls {
                    return Err(Error::Timeout {
                        message: format!("Operation {name} still running after {polls} polls"),
                    });
                }
            }
            tokio::time::sleep(Duration::from_secs(config.interval_secs)).await;
            operation = self.get(&name).await?;
            polls += 1;
        }
        Ok(operation)
    }
}

fn normalize_operation_name(inner: &ClientInner, name: &str) -> Result<String> {
    match inner.config.backend {
        Backend::GeminiApi => {
            if name.starts_with("operations/") || name.starts_with("models/") {
                Ok(name.to_string())
            } else {
                Ok(format!("operations/{name}"))
            }
        }
        Backend::VertexAi => {
            let vertex =
                inner
                    .config
                    .vertex_config
                    .as_ref()
                    .ok_or_else(|| Error::InvalidConfig {
                        message: "Vertex config missing".into(),
                    })?;
            if name.starts_with("projects/") {
                Ok(name.to_string())
            } else if name.starts_with("operations/") {
                Ok(format!(
                    "projects/{}/locations/{}/{}",
                    vertex.project, vertex.location, name
                ))
            } else {
                Ok(format!(
                    "projects/{}/locations/{}/operations/{}",
                    vertex.project, vertex.location, name
                ))
            }
        }
    }
}

fn build_operation_url(inner: &ClientInner, name: &str) -> String {
    let base = &inner.api_client.base_url;
    let version = &inner.api_client.api_version;
    format!("{base}{version}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;

    #[test]
    fn gemini_operation_name_keeps_model_scoped_names() {
        let client = Client::new("test-key").unwrap();
        let name =
            normalize_operation_name(&client.inner, "models/veo-3.0/operations/abc").unwrap();
        assert_eq!(name, "models/veo-3.0/operations/abc");

        let bare = normalize_operation_name(&client.inner, "abc").unwrap();
        assert_eq!(bare, "operations/abc");
    }

    #[test]
    fn vertex_operation_name_gets_project_prefix() {
        let client = Client::new_vertex("proj", "us-central1").unwrap();
        let name = normalize_operation_name(&client.inner, "operations/abc").unwrap();
        assert_eq!(name, "projects/proj/locations/us-central1/operations/abc");

        let full = normalize_operation_name(&client.inner, "projects/p/locations/l/operations/x")
            .unwrap();
        assert_eq!(full, "projects/p/locations/l/operations/x");
    }

    #[test]
    fn wait_defaults_are_bounded() {
        let config = WaitConfig::default();
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.max_polls, Some(120));
    }
}
