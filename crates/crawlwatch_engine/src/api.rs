use async_trait::async_trait;
use crawlwatch_core::{
    FailureKind, HealthReport, JobStatus, ListFilter, Resource, ResourceDetail, ResourceId,
    ResourcePage,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::{AuthState, EngineSettings};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("server rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        details: Option<String>,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text shown to the user: the server's `error`, then the transport
    /// message, then a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout => "Request timed out".to_string(),
            ApiError::Transport(message) if !message.is_empty() => message.clone(),
            ApiError::Transport(_) => "An unknown error occurred".to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Decode(_) => "Unexpected response from server".to_string(),
        }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ApiError::Unauthorized => FailureKind::Unauthorized,
            ApiError::Rejected { .. } => FailureKind::Rejected,
            ApiError::Timeout | ApiError::Transport(_) | ApiError::Decode(_) => {
                FailureKind::Transport
            }
        }
    }
}

/// The URL analyzer REST API.
#[async_trait]
pub trait CrawlApi: Send + Sync {
    async fn list_urls(&self, filter: &ListFilter) -> Result<ResourcePage, ApiError>;
    async fn get_url(&self, id: ResourceId) -> Result<ResourceDetail, ApiError>;
    async fn create_url(&self, locator: &str) -> Result<Resource, ApiError>;
    async fn delete_urls(&self, ids: &[ResourceId]) -> Result<(), ApiError>;
    async fn start_crawl(&self, id: ResourceId) -> Result<(), ApiError>;
    async fn stop_crawl(&self, id: ResourceId) -> Result<(), ApiError>;
    async fn restart_crawl(&self, id: ResourceId) -> Result<(), ApiError>;
    async fn job_status(&self, id: ResourceId) -> Result<JobStatus, ApiError>;
    async fn active_jobs(&self) -> Result<Vec<JobStatus>, ApiError>;
    async fn health(&self) -> Result<HealthReport, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    url: Resource,
}

#[derive(Debug, Deserialize)]
struct JobStatusBody {
    job_status: JobStatus,
}

#[derive(Debug, Deserialize)]
struct ActiveJobsBody {
    #[serde(default)]
    active_jobs: std::collections::BTreeMap<String, JobStatus>,
}

#[derive(Debug, Clone)]
pub struct ReqwestCrawlApi {
    client: reqwest::Client,
    base: Url,
    auth: AuthState,
}

impl ReqwestCrawlApi {
    pub fn new(settings: &EngineSettings, auth: AuthState) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::Transport(format!("invalid base url: {err}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self { client, base, auth })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Performs one request. Transport failures and 401 are mapped here;
    /// other statuses are returned with their decoded body.
    async fn exchange(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        engine_logging::engine_trace!("{method} {url}");
        let mut request = self.client.request(method, url);
        if let Some(key) = self.auth.api_key() {
            request = request.header(AUTHORIZATION, key);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if status == StatusCode::UNAUTHORIZED {
            if self.auth.revoke() {
                engine_logging::engine_warn!("API key rejected; credentials cleared");
            }
            return Err(ApiError::Unauthorized);
        }

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(err) if status.is_success() => return Err(ApiError::Decode(err.to_string())),
                // Error pages from proxies are not JSON.
                Err(_) => Value::Null,
            }
        };
        Ok((status, value))
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, ApiError> {
        let (status, value) = self.exchange(method, url, body).await?;
        if !status.is_success() {
            return Err(rejection(status, value));
        }
        Ok(value)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let value = self.send(Method::GET, url, None).await?;
        decode_body(value)
    }

    async fn put_command(&self, id: ResourceId, action: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["urls", &id.to_string(), action]);
        self.send(Method::PUT, url, None).await.map(|_| ())
    }
}

#[async_trait]
impl CrawlApi for ReqwestCrawlApi {
    async fn list_urls(&self, filter: &ListFilter) -> Result<ResourcePage, ApiError> {
        let mut url = self.endpoint(&["urls"]);
        url.query_pairs_mut().extend_pairs(filter.query_pairs());
        self.get(url).await
    }

    async fn get_url(&self, id: ResourceId) -> Result<ResourceDetail, ApiError> {
        self.get(self.endpoint(&["urls", &id.to_string()])).await
    }

    async fn create_url(&self, locator: &str) -> Result<Resource, ApiError> {
        let url = self.endpoint(&["urls"]);
        let value = self
            .send(Method::POST, url, Some(json!({ "url": locator })))
            .await?;
        decode_body::<CreatedBody>(value).map(|body| body.url)
    }

    async fn delete_urls(&self, ids: &[ResourceId]) -> Result<(), ApiError> {
        let url = self.endpoint(&["urls"]);
        self.send(Method::DELETE, url, Some(json!({ "ids": ids })))
            .await
            .map(|_| ())
    }

    async fn start_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.put_command(id, "start").await
    }

    async fn stop_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.put_command(id, "stop").await
    }

    async fn restart_crawl(&self, id: ResourceId) -> Result<(), ApiError> {
        self.put_command(id, "restart").await
    }

    async fn job_status(&self, id: ResourceId) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["urls", &id.to_string(), "status"]);
        self.get::<JobStatusBody>(url).await.map(|body| body.job_status)
    }

    async fn active_jobs(&self) -> Result<Vec<JobStatus>, ApiError> {
        let body: ActiveJobsBody = self.get(self.endpoint(&["jobs"])).await?;
        Ok(body.active_jobs.into_values().collect())
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        let url = self.endpoint(&["health"]);
        let (status, value) = self.exchange(Method::GET, url, None).await?;
        // A degraded server answers 503 with the report itself.
        if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
            if let Ok(report) = decode_body(value.clone()) {
                return Ok(report);
            }
        }
        if !status.is_success() {
            return Err(rejection(status, value));
        }
        decode_body(value)
    }
}

/// Accepts both a bare body and one wrapped as `{data, message?, error?}`.
pub(crate) fn decode_body<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(bare_err) => match value {
            Value::Object(mut map) if map.contains_key("data") => {
                let data = map.remove("data").unwrap_or(Value::Null);
                serde_json::from_value(data).map_err(|err| ApiError::Decode(err.to_string()))
            }
            _ => Err(ApiError::Decode(bare_err.to_string())),
        },
    }
}

fn rejection(status: StatusCode, value: Value) -> ApiError {
    let code = status.as_u16();
    let body: Option<ErrorBody> = serde_json::from_value(value).ok();
    let (error, message, details) = match body {
        Some(body) => (body.error, body.message, body.details),
        None => (None, None, None),
    };
    ApiError::Rejected {
        status: code,
        message: error
            .or(message)
            .unwrap_or_else(|| format!("Request failed with status code {code}")),
        details,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout;
    }
    ApiError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_and_bare_bodies_decode_alike() {
        let bare = json!({ "job_status": { "id": 3, "status": "parsing", "progress": 40 } });
        let wrapped = json!({ "data": bare.clone(), "message": "ok" });

        let a: JobStatusBody = decode_body(bare).unwrap();
        let b: JobStatusBody = decode_body(wrapped).unwrap();
        assert_eq!(a.job_status, b.job_status);
        assert_eq!(a.job_status.progress, 40);
    }

    #[test]
    fn rejection_prefers_server_error_text() {
        let err = rejection(
            StatusCode::CONFLICT,
            json!({ "error": "Crawl already in progress for this URL" }),
        );
        assert_eq!(err.user_message(), "Crawl already in progress for this URL");
        assert_eq!(err.failure_kind(), FailureKind::Rejected);

        let err = rejection(StatusCode::BAD_GATEWAY, Value::Null);
        assert_eq!(err.user_message(), "Request failed with status code 502");
    }
}
