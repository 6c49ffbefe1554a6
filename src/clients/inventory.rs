//! Inventory service client (spec §6.3, §3.7).

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RetryPolicyConfig;
use crate::domain::ids::AllocationId;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("inventory service returned {status}: {body}")]
    Response { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PickRequest {
    pub sku: String,
    pub quantity: u32,
    pub location_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickResponse {
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRequest {
    pub order_id: String,
    pub skus: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub allocation_ids: Vec<AllocationId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipRequest {
    pub allocation_ids: Vec<AllocationId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnToShelfRequest {
    pub allocation_ids: Vec<AllocationId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReservationRequest {
    pub allocation_ids: Vec<AllocationId>,
}

/// The boundary to the external inventory service (spec §3.7: this core
/// treats `allocationIds` as opaque tokens and never interprets inventory
/// state directly).
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn confirm_pick(&self, req: PickRequest) -> Result<PickResponse, InventoryError>;
    async fn stage(&self, req: StageRequest) -> Result<StageResponse, InventoryError>;
    async fn ship(&self, req: ShipRequest) -> Result<(), InventoryError>;
    async fn return_to_shelf(&self, req: ReturnToShelfRequest) -> Result<(), InventoryError>;
    async fn release_reservation(&self, req: ReleaseReservationRequest) -> Result<(), InventoryError>;
}

pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicyConfig,
}

impl HttpInventoryClient {
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

    async fn post_json<Req: Serialize + Sync, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, InventoryError> {
        let url = format!("{}{}", self.base_url, path);
        let send = || async {
            let resp = self.client.post(&url).json(body).send().await?;
            let status = resp.status();
            if status.is_success() {
                resp.json::<Resp>().await.map_err(InventoryError::from)
            } else {
                let text = resp.text().await.unwrap_or_default();
                Err(InventoryError::Response {
                    status: status.as_u16(),
                    body: text,
                })
            }
        };
        send.retry(self.backoff())
            .when(|e| !matches!(e, InventoryError::Response { status, .. } if (400..500).contains(status)))
            .await
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn confirm_pick(&self, req: PickRequest) -> Result<PickResponse, InventoryError> {
        let path = format!("/inventory/{}/pick", req.sku);
        self.post_json(&path, &req).await
    }

    async fn stage(&self, req: StageRequest) -> Result<StageResponse, InventoryError> {
        self.post_json("/inventory/stage", &req).await
    }

    async fn ship(&self, req: ShipRequest) -> Result<(), InventoryError> {
        let _: serde_json::Value = self.post_json("/inventory/ship", &req).await?;
        Ok(())
    }

    async fn return_to_shelf(&self, req: ReturnToShelfRequest) -> Result<(), InventoryError> {
        let _: serde_json::Value = self.post_json("/inventory/return-to-shelf", &req).await?;
        Ok(())
    }

    async fn release_reservation(&self, req: ReleaseReservationRequest) -> Result<(), InventoryError> {
        let _: serde_json::Value = self.post_json("/inventory/reservations/release", &req).await?;
        Ok(())
    }
}
