//! Remote render service engine.

use adforge_models::{JobId, RenderPlan};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::{EngineJob, EngineStatus, OutputReference, RenderEngine};
use crate::error::EngineError;

/// Client for a render service speaking the JSON render API.
///
/// `POST {base}/renders` submits a plan; `GET {base}/renders/{id}` polls it.
pub struct HttpEngine {
    id: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

/// Render submission.
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    job_id: &'a JobId,
    plan: &'a RenderPlan,
}

/// Render service job document.
#[derive(Debug, Deserialize)]
struct RenderResponse {
    id: String,
    status: RemoteStatus,
    #[serde(default)]
    output_uri: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum RemoteStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl HttpEngine {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client: Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn read_status(&self, response: Response) -> Result<RenderResponse, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        response
            .json::<RenderResponse>()
            .await
            .map_err(|e| EngineError::invalid_output(format!("malformed response: {}", e)))
    }

    fn to_engine_status(&self, body: RenderResponse) -> Result<EngineStatus, EngineError> {
        match body.status {
            RemoteStatus::Done => {
                let uri = body.output_uri.unwrap_or_default();
                Ok(EngineStatus::Done(OutputReference {
                    uri,
                    duration_ms: body.duration_ms,
                }))
            }
            RemoteStatus::Queued | RemoteStatus::Running => {
                debug!(
                    engine_id = %self.id,
                    "Render {} {:?} ({:.0}%)",
                    body.id,
                    body.status,
                    body.progress.unwrap_or(0.0)
                );
                Ok(EngineStatus::Queued { ticket: body.id })
            }
            RemoteStatus::Failed => Err(EngineError::rejected(
                body.error
                    .unwrap_or_else(|| format!("render {} failed", body.id)),
            )),
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> EngineError {
    let message = format!("HTTP {}: {}", status.as_u16(), body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        EngineError::transient(message)
    } else {
        EngineError::rejected(message)
    }
}

fn request_error(err: reqwest::Error) -> EngineError {
    EngineError::transient(format!("request failed: {}", err))
}

#[async_trait]
impl RenderEngine for HttpEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&self, job: &EngineJob) -> Result<EngineStatus, EngineError> {
        let url = format!("{}/renders", self.base_url);
        info!(job_id = %job.job_id, engine_id = %self.id, "Submitting {} to {}", job.plan.plan_id, url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&RenderRequest {
                job_id: &job.job_id,
                plan: &job.plan,
            })
            .send()
            .await
            .map_err(request_error)?;

        let body = self.read_status(response).await?;
        if let Some(progress) = body.progress {
            job.report(progress, format!("{} {:?}", self.id, body.status));
        }
        self.to_engine_status(body)
    }

    async fn poll(&self, ticket: &str) -> Result<EngineStatus, EngineError> {
        let url = format!("{}/renders/{}", self.base_url, ticket);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(request_error)?;
        let body = self.read_status(response).await?;
        self.to_engine_status(body)
    }
}
