//! Labor service client (spec §6.3, §4.4.4).

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RetryPolicyConfig;
use crate::domain::ids::{StationId, WorkerId};

#[derive(Debug, Error)]
pub enum LaborError {
    #[error("labor request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("labor service returned {status}: {body}")]
    Response { status: u16, body: String },
    #[error("no available worker matches {0:?}")]
    NoneAvailable(WorkerQuery),
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerQuery {
    pub task_type: String,
    pub zone: String,
    pub required_certifications: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub worker_id: WorkerId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignTaskRequest {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindCapableStationsRequest {
    pub station_type: String,
    pub zone: String,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindCapableStationsResponse {
    pub station_ids: Vec<StationId>,
}

#[async_trait]
pub trait LaborClient: Send + Sync {
    async fn find_available(&self, query: WorkerQuery) -> Result<Worker, LaborError>;
    async fn assign_task(&self, worker_id: WorkerId, req: AssignTaskRequest) -> Result<(), LaborError>;
    async fn find_capable_stations(
        &self,
        req: FindCapableStationsRequest,
    ) -> Result<FindCapableStationsResponse, LaborError>;
}

pub struct HttpLaborClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicyConfig,
}

impl HttpLaborClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicyConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
            base_url: base_url.into(),
            retry,
        })
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(self.retry.initial_secs))
            .with_max_delay(Duration::from_secs(self.retry.max_secs))
            .with_max_times(self.retry.max_attempts as usize)
            .with_jitter()
    }
}

#[async_trait]
impl LaborClient for HttpLaborClient {
    async fn find_available(&self, query: WorkerQuery) -> Result<Worker, LaborError> {
        let url = format!("{}/workers", self.base_url);
        let fetch = || async {
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("status", "available"),
                    ("zone", &query.zone),
                    ("skill", &query.task_type),
                ])
                .send()
                .await?;
            let status = resp.status();
            if status.is_success() {
                let workers: Vec<Worker> = resp.json().await?;
                Ok(workers)
            } else {
                let body = resp.text().await.unwrap_or_default();
                Err(LaborError::Response {
                    status: status.as_u16(),
                    body,
                })
            }
        };
        let workers = fetch
            .retry(self.backoff())
            .when(|e| !matches!(e, LaborError::Response { status, .. } if (400..500).contains(status)))
            .await?;
        workers
            .into_iter()
            .next()
            .ok_or(LaborError::NoneAvailable(query))
    }

    async fn assign_task(&self, worker_id: WorkerId, req: AssignTaskRequest) -> Result<(), LaborError> {
        let url = format!("{}/workers/{}/tasks/assign", self.base_url, worker_id);
        let resp = self.client.post(&url).json(&req).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LaborError::Response {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }

    async fn find_capable_stations(
        &self,
        req: FindCapableStationsRequest,
    ) -> Result<FindCapableStationsResponse, LaborError> {
        let url = format!("{}/stations/find-capable", self.base_url);
        let resp = self.client.post(&url).json(&req).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            Err(LaborError::Response {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn retry() -> RetryPolicyConfig {
        RetryPolicyConfig {
            initial_secs: 0,
            backoff_multiplier: 1.0,
            max_secs: 1,
            max_attempts: 2,
            heartbeat_secs: 30,
        }
    }

    #[tokio::test]
    async fn finds_available_worker() {
        let server = MockServer::start().await;
        let worker_id = WorkerId::new();
        Mock::given(method("GET"))
            .and(path("/workers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "workerId": worker_id.0, "name": "Alice" }
            ])))
            .mount(&server)
            .await;

        let client = HttpLaborClient::new(server.uri(), Duration::from_secs(5), retry()).unwrap();
        let worker = client
            .find_available(WorkerQuery {
                task_type: "pick".into(),
                zone: "A".into(),
                required_certifications: vec![],
            })
            .await
            .unwrap();
        assert_eq!(worker.worker_id, worker_id);
    }

    #[tokio::test]
    async fn none_available_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/workers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = HttpLaborClient::new(server.uri(), Duration::from_secs(5), retry()).unwrap();
        let err = client
            .find_available(WorkerQuery {
                task_type: "pick".into(),
                zone: "A".into(),
                required_certifications: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LaborError::NoneAvailable(_)));
    }
}
