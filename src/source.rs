//! ==============================================================================
//! source.rs - the controller's http api as a data source
//! ==============================================================================
//!
//! purpose:
//!     everything the dashboard reads or writes goes through `DataSource`.
//!     the refresh cycle only sees this trait, so tests swap in fakes and the
//!     http details (paths, verbs, json bodies) stay in one place.
//!
//! relationships:
//!     - used by: cycle.rs (every operation of the refresh cycle)
//!     - reads: config.rs (base url, endpoint templates, optional timeout)
//!     - returns: domain.rs types
//!
//! error policy:
//!     this layer only reports. it never retries and never alerts; the
//!     refresh cycle decides how loudly each failure is surfaced.
//!
//! ==============================================================================

use crate::config::{EndpointsConfig, ServerConfig};
use crate::domain::{
    ComStatusResponse, ConnectionStatus, ControlRequest, Envelope, LampId, LampState, LampSwitch, Snapshot,
};
use crate::error::{DashboardError, Result};

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// everything but the rfc 3986 unreserved characters
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// the three endpoints that return a single snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotEndpoint {
    /// `/hardware/sensor/current`
    Current,
    /// `/hardware/sensor/sensor-data`
    Live,
    /// `/api/sensor/current`
    ApiCurrent,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn snapshot(&self, endpoint: SnapshotEndpoint) -> Result<Envelope<Snapshot>>;

    /// full history for a range, oldest first
    async fn history(&self, range: &str) -> Result<Envelope<Vec<Snapshot>>>;

    /// fails with `HttpStatus` on a non-2xx answer
    async fn control(&self, request: &ControlRequest) -> Result<Envelope<Value>>;

    /// fails with `UnexpectedShape` unless `data` is an array
    async fn lamps(&self) -> Result<Vec<LampState>>;

    async fn set_lamp(&self, id: &LampId, status: LampSwitch) -> Result<Envelope<Value>>;

    /// fails with `HttpStatus` on a non-2xx answer
    async fn connection(&self) -> Result<ConnectionStatus>;
}

// ==============================================================================
// http implementation
// ==============================================================================

#[derive(Clone)]
pub struct HttpDataSource {
    client: Client,
    base_url: String,
    endpoints: EndpointsConfig,
}

impl HttpDataSource {
    pub fn new(server: &ServerConfig, endpoints: EndpointsConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ms) = server.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder.build()?;

        Ok(Self { client, base_url: server.base_url.trim_end_matches('/').to_string(), endpoints })
    }

    /// expand `{name}` placeholders and join the result onto the base url
    ///
    /// values are percent-encoded, so an id or range can never add a path
    /// segment, a query pair or a fragment.
    fn url(&self, template: &str, vars: &[(&str, &str)]) -> Result<Url> {
        let mut path = template.to_string();
        for (name, value) in vars {
            let encoded = utf8_percent_encode(value, COMPONENT).to_string();
            path = path.replace(&format!("{{{}}}", name), &encoded);
        }

        let full = if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        Url::parse(&full).map_err(|e| DashboardError::Config(format!("bad endpoint url '{}': {}", full, e)))
    }

    fn snapshot_template(&self, endpoint: SnapshotEndpoint) -> &str {
        match endpoint {
            SnapshotEndpoint::Current => &self.endpoints.current,
            SnapshotEndpoint::Live => &self.endpoints.live,
            SnapshotEndpoint::ApiCurrent => &self.endpoints.api_current,
        }
    }
}

/// read the body as json, then map it onto `T`
///
/// decoding in two steps keeps "not json at all" (Transport) apart from
/// "json, but the wrong shape" (UnexpectedShape).
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body: Value = response.json().await?;
    serde_json::from_value(body).map_err(|e| DashboardError::UnexpectedShape(e.to_string()))
}

fn ensure_success_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DashboardError::HttpStatus { status: status.as_u16(), url: response.url().to_string() })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn snapshot(&self, endpoint: SnapshotEndpoint) -> Result<Envelope<Snapshot>> {
        let url = self.url(self.snapshot_template(endpoint), &[])?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn history(&self, range: &str) -> Result<Envelope<Vec<Snapshot>>> {
        let url = self.url(&self.endpoints.history, &[("range", range)])?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn control(&self, request: &ControlRequest) -> Result<Envelope<Value>> {
        let url = self.url(&self.endpoints.lamp_control, &[])?;
        let response = self.client.post(url).json(request).send().await?;
        decode(ensure_success_status(response)?).await
    }

    async fn lamps(&self) -> Result<Vec<LampState>> {
        let url = self.url(&self.endpoints.lamp_status, &[])?;
        let response = self.client.get(url).send().await?;
        let envelope: Envelope<Value> = decode(response).await?;

        match envelope.data {
            Some(Value::Array(items)) => serde_json::from_value(Value::Array(items))
                .map_err(|e| DashboardError::UnexpectedShape(e.to_string())),
            Some(other) => Err(DashboardError::UnexpectedShape(format!("lamp data is not a list: {}", other))),
            None => Err(DashboardError::UnexpectedShape(format!(
                "no lamp data (status: {}, message: {})",
                envelope.status.as_deref().unwrap_or("-"),
                envelope.message.as_deref().unwrap_or("-")
            ))),
        }
    }

    async fn set_lamp(&self, id: &LampId, status: LampSwitch) -> Result<Envelope<Value>> {
        let url = self.url(&self.endpoints.lamp_update, &[("id", id.0.as_str())])?;
        let body = serde_json::json!({ "status": status.as_str() });
        let response = self.client.put(url).json(&body).send().await?;
        decode(response).await
    }

    async fn connection(&self) -> Result<ConnectionStatus> {
        let url = self.url(&self.endpoints.com_status, &[])?;
        let response = self.client.get(url).send().await?;
        let body: ComStatusResponse = decode(ensure_success_status(response)?).await?;
        Ok(body.connected.into())
    }
}
