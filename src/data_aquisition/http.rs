use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::network::{defaults::DefaultsConfig, link::Tunable};
use crate::topology::source::{BackendError, BackendResult};
use crate::topology::{MeshBackend, Snapshot};

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct Position {
    x: f32,
    y: f32,
}

/// `MeshBackend` over the simulator's REST API.
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(&self, method: &'static str, path: String, request: RequestBuilder) -> BackendResult<Response> {
        debug!(method, path = %path, "Sending request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                method,
                path,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn position_path(name: u32) -> String {
    format!("/server/{name}/position")
}

fn link_path(source: u32, target: u32, tunable: Tunable) -> String {
    format!("/link/{source}/{target}/{tunable}")
}

/// `{"<tunable>": value}`, the shape the simulator expects for a pinned override.
fn override_body(tunable: Tunable, value: f64) -> Value {
    let mut body = Map::new();
    body.insert(tunable.as_str().to_string(), Value::from(value));
    Value::Object(body)
}

#[async_trait]
impl MeshBackend for HttpBackend {
    async fn fetch_snapshot(&self) -> BackendResult<Snapshot> {
        let path = "/data".to_string();
        let request = self.client.get(self.url(&path));
        let body = self.send("GET", path, request).await?.text().await?;
        Snapshot::from_json(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn create_node(&self, x: f32, y: f32) -> BackendResult<()> {
        let path = "/server".to_string();
        let request = self.client.post(self.url(&path)).json(&Position { x, y });
        self.send("POST", path, request).await?;
        Ok(())
    }

    async fn move_node(&self, name: u32, x: f32, y: f32) -> BackendResult<()> {
        let path = position_path(name);
        let request = self.client.put(self.url(&path)).json(&Position { x, y });
        self.send("PUT", path, request).await?;
        Ok(())
    }

    async fn set_override(&self, source: u32, target: u32, tunable: Tunable, value: f64) -> BackendResult<()> {
        let path = link_path(source, target, tunable);
        let request = self.client.put(self.url(&path)).json(&override_body(tunable, value));
        self.send("PUT", path, request).await?;
        Ok(())
    }

    async fn clear_override(&self, source: u32, target: u32, tunable: Tunable) -> BackendResult<()> {
        let path = link_path(source, target, tunable);
        let request = self.client.delete(self.url(&path));
        self.send("DELETE", path, request).await?;
        Ok(())
    }

    async fn fetch_defaults(&self) -> BackendResult<DefaultsConfig> {
        let path = "/defaults".to_string();
        let request = self.client.get(self.url(&path));
        Ok(self.send("GET", path, request).await?.json().await?)
    }

    async fn put_defaults(&self, defaults: &DefaultsConfig) -> BackendResult<()> {
        let path = "/defaults".to_string();
        let request = self.client.put(self.url(&path)).json(defaults);
        self.send("PUT", path, request).await?;
        Ok(())
    }
}
