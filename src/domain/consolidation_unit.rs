//! ConsolidationUnit aggregate (spec §3.5) — manual tote-to-bin combine.

use serde::{Deserialize, Serialize};

use super::ids::{ConsolidationId, OrderId, StationId, WaveId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationStatus {
    Pending,
    InProgress,
    Short,
    Verified,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationUnit {
    pub consolidation_id: ConsolidationId,
    pub order_id: OrderId,
    pub wave_id: Option<WaveId>,
    pub station: Option<StationId>,
    pub expected_items: u32,
    pub received_items: u32,
    pub status: ConsolidationStatus,
}

impl ConsolidationUnit {
    pub fn new(order_id: OrderId, wave_id: Option<WaveId>, expected_items: u32) -> Self {
        Self {
            consolidation_id: ConsolidationId::new(),
            order_id,
            wave_id,
            station: None,
            expected_items,
            received_items: 0,
            status: ConsolidationStatus::Pending,
        }
    }

    pub fn assign_station(&mut self, station: StationId) {
        self.station = Some(station);
        self.status = ConsolidationStatus::InProgress;
    }

    /// Handles one `itemScanned` signal (spec §4.5.3). Saturates at
    /// `expected_items` — extra scans beyond the expected count are ignored
    /// rather than overshooting, since the signal is itself idempotent.
    pub fn record_item_scanned(&mut self) {
        if self.received_items < self.expected_items {
            self.received_items += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.received_items >= self.expected_items
    }

    /// Elapsed the `shortTimeout` with items still missing.
    pub fn mark_short(&mut self) {
        self.status = ConsolidationStatus::Short;
    }

    pub fn verify(&mut self) {
        self.status = ConsolidationStatus::Verified;
    }

    pub fn complete(&mut self) {
        self.status = ConsolidationStatus::Completed;
    }

    pub fn cancel(&mut self) {
        self.status = ConsolidationStatus::Cancelled;
    }
}
