use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{
    AnomalyResponse, ForecastResponse, HealthResponse, ScalingDecision,
    ScalingExecutionResponse, ScalingOutcome, ScalingStatusResponse, SystemMetrics,
};

const DEFAULT_ERROR_DETAIL: &str = "API request failed";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx reply; `detail` comes from the backend's `{"detail": ...}` body.
    #[error("{detail} (HTTP {status})")]
    Status { status: StatusCode, detail: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Typed client for the prediction backend. Stateless apart from the
/// connection pool; failures are returned to the caller and never retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn health(&self) -> ApiResult<HealthResponse> {
        self.get("/health").await
    }

    pub async fn forecast(
        &self,
        metrics: &SystemMetrics,
        forecast_hours: u32,
    ) -> ApiResult<ForecastResponse> {
        self.post(
            &format!("/predictions/forecast?forecast_hours={forecast_hours}"),
            metrics,
        )
        .await
    }

    pub async fn detect_anomaly(&self, metrics: &SystemMetrics) -> ApiResult<AnomalyResponse> {
        self.post("/predictions/anomaly", metrics).await
    }

    pub async fn scaling_decision(&self, metrics: &SystemMetrics) -> ApiResult<ScalingDecision> {
        self.post("/scaling/decide", metrics).await
    }

    pub async fn execute_scaling(
        &self,
        decision: &ScalingDecision,
    ) -> ApiResult<ScalingExecutionResponse> {
        self.post("/scaling/execute", decision).await
    }

    pub async fn scaling_status(&self) -> ApiResult<ScalingStatusResponse> {
        self.get("/scaling/status").await
    }

    /// Ask for a decision and execute it unless it is `maintain`.
    pub async fn run_scaling_workflow(&self, metrics: &SystemMetrics) -> ApiResult<ScalingOutcome> {
        let decision = self.scaling_decision(metrics).await.inspect_err(|err| {
            warn!(error = %err, "scaling workflow failed at decision");
        })?;

        if !decision.requires_action() {
            debug!(confidence = decision.confidence, "scaling decision is maintain");
            return Ok(ScalingOutcome {
                decision,
                execution: None,
            });
        }

        let execution = self.execute_scaling(&decision).await.inspect_err(|err| {
            warn!(action = %decision.action, error = %err, "scaling workflow failed at execution");
        })?;
        info!(
            action = %decision.action,
            target_instances = decision.target_instances,
            success = execution.success,
            "scaling executed"
        );

        Ok(ScalingOutcome {
            decision,
            execution: Some(execution),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            detail: error_detail(&body),
        });
    }

    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

fn error_detail(body: &[u8]) -> String {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);
    match detail {
        Some(serde_json::Value::String(text)) if !text.is_empty() => text,
        // Validation failures carry structured detail.
        Some(value @ (serde_json::Value::Array(_) | serde_json::Value::Object(_))) => {
            value.to_string()
        }
        _ => DEFAULT_ERROR_DETAIL.to_string(),
    }
}
