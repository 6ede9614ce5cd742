//! Async client for the feeder firmware's HTTP API.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::DeviceError;
use super::types::{
    Ack, Calibration, CalibrationUpdate, FeedResponse, Increment, NewSchedule, QuantityUpdate,
    ServerStatus,
};

const USER_AGENT: &str = concat!("feedpack/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One client per device. Calls are not retried.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    base: Url,
    http: reqwest::Client,
}

impl DeviceClient {
    pub fn new(base_url: &str) -> Result<Self, DeviceError> {
        let mut base = Url::parse(base_url).map_err(|e| DeviceError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(DeviceError::InvalidUrl {
                url: base_url.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| DeviceError::Transport {
                endpoint: base.to_string(),
                source,
            })?;

        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an API path such as `api/status` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, DeviceError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| DeviceError::InvalidUrl {
                url: format!("{}{}", self.base, path),
                reason: e.to_string(),
            })
    }

    pub async fn status(&self) -> Result<ServerStatus, DeviceError> {
        self.send(Method::GET, self.endpoint("api/status")?, None).await
    }

    /// Schedules as returned by the firmware; the shape varies between
    /// firmware revisions so it is left untyped.
    pub async fn schedules(&self) -> Result<Value, DeviceError> {
        self.send(Method::GET, self.endpoint("api/schedules")?, None)
            .await
    }

    pub async fn add_schedule(&self, schedule: &NewSchedule) -> Result<Ack, DeviceError> {
        self.send(
            Method::POST,
            self.endpoint("api/schedule")?,
            Some(to_body(schedule)?),
        )
        .await
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<Ack, DeviceError> {
        if id.trim().is_empty() {
            return Err(DeviceError::InvalidRequest(
                "schedule id must not be empty".to_string(),
            ));
        }
        let mut url = self.endpoint("api/schedule")?;
        let display = url.to_string();
        url.path_segments_mut()
            .map_err(|_| DeviceError::InvalidUrl {
                url: display,
                reason: "cannot append path segment".to_string(),
            })?
            .push(id);
        self.send(Method::DELETE, url, None).await
    }

    pub async fn feed(&self) -> Result<FeedResponse, DeviceError> {
        self.send(Method::POST, self.endpoint("api/feed")?, None)
            .await
    }

    pub async fn set_quantity(&self, quantity: u32) -> Result<Ack, DeviceError> {
        if quantity < 1 {
            return Err(DeviceError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.send(
            Method::POST,
            self.endpoint("api/quantity")?,
            Some(to_body(&QuantityUpdate { quantity })?),
        )
        .await
    }

    pub async fn calibration(&self) -> Result<Calibration, DeviceError> {
        self.send(Method::GET, self.endpoint("api/calibration/get")?, None)
            .await
    }

    pub async fn adjust_duty(&self, increment: i32) -> Result<CalibrationUpdate, DeviceError> {
        self.send(
            Method::POST,
            self.endpoint("api/calibration/adjust_duty")?,
            Some(to_body(&Increment { increment })?),
        )
        .await
    }

    pub async fn adjust_duration(
        &self,
        increment: i32,
    ) -> Result<CalibrationUpdate, DeviceError> {
        self.send(
            Method::POST,
            self.endpoint("api/calibration/adjust_duration")?,
            Some(to_body(&Increment { increment })?),
        )
        .await
    }

    /// Run the servo once with the current calibration.
    pub async fn test_calibration(&self) -> Result<Value, DeviceError> {
        self.send(Method::POST, self.endpoint("api/calibration/test")?, None)
            .await
    }

    pub async fn save_calibration(
        &self,
        calibration: Calibration,
    ) -> Result<CalibrationUpdate, DeviceError> {
        self.send(
            Method::POST,
            self.endpoint("api/calibration/save")?,
            Some(to_body(&calibration)?),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T, DeviceError> {
        let endpoint = url.path().to_string();
        tracing::debug!(%method, %url, "device request");

        let mut request = self.http.request(method, url);
        request = match body {
            Some(body) => request.json(&body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let response = request
            .send()
            .await
            .map_err(|source| DeviceError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| DeviceError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(DeviceError::Status {
                endpoint,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| DeviceError::Decode { endpoint, source })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, DeviceError> {
    serde_json::to_value(value).map_err(|e| DeviceError::InvalidRequest(e.to_string()))
}
