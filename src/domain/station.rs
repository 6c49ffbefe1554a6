//! Station — physical workstation with typed capabilities and bounded
//! task capacity (spec §3.6).

use serde::{Deserialize, Serialize};

use super::ids::{StationId, WorkerId};
use super::process_path::Requirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationType {
    Packing,
    Consolidation,
    Shipping,
    Receiving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Active,
    Inactive,
    Maintenance,
}

/// A station's capabilities reuse the `Requirement` vocabulary (spec §3.6
/// lists the same set: single_item, multi_item, gift_wrap, hazmat,
/// oversized, fragile, cold_chain, high_value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub station_id: StationId,
    pub station_type: StationType,
    pub zone: String,
    pub status: StationStatus,
    pub capabilities: Vec<Requirement>,
    pub max_concurrent_tasks: u32,
    pub current_tasks: u32,
    pub assigned_worker_id: Option<WorkerId>,
    pub equipment: Vec<String>,
    /// Optimistic-concurrency version. Incremented on every
    /// `increment_tasks`/`decrement_tasks`; storage layers use it as the CAS
    /// filter for concurrent updates (spec §5 "Shared resources").
    pub version: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StationError {
    #[error("station {0} is not active")]
    NotActive(StationId),
    #[error("station {0} is at capacity ({current}/{max})", current = .1, max = .2)]
    AtCapacity(StationId, u32, u32),
    #[error("station {0} lacks required capabilities")]
    MissingCapabilities(StationId),
}

impl Station {
    pub fn has_all_capabilities(&self, required: &[Requirement]) -> bool {
        required.iter().all(|r| self.capabilities.contains(r))
    }

    /// `CanAcceptTask() ≡ status=active ∧ currentTasks < maxConcurrentTasks` (spec §3.6).
    pub fn can_accept_task(&self) -> bool {
        self.status == StationStatus::Active && self.current_tasks < self.max_concurrent_tasks
    }

    /// Admission control: station must have every required capability and
    /// be able to accept a task (spec §4.4.4).
    pub fn can_serve(&self, required: &[Requirement]) -> bool {
        self.has_all_capabilities(required) && self.can_accept_task()
    }

    /// `IncrementTasks()`. Fails when at capacity or not active (spec P8).
    pub fn increment_tasks(&mut self) -> Result<(), StationError> {
        if self.status != StationStatus::Active {
            return Err(StationError::NotActive(self.station_id));
        }
        if self.current_tasks >= self.max_concurrent_tasks {
            return Err(StationError::AtCapacity(
                self.station_id,
                self.current_tasks,
                self.max_concurrent_tasks,
            ));
        }
        self.current_tasks += 1;
        self.version += 1;
        Ok(())
    }

    /// `DecrementTasks()`. Floors at 0 (spec P8) — never panics on underflow.
    pub fn decrement_tasks(&mut self) {
        self.current_tasks = self.current_tasks.saturating_sub(1);
        self.version += 1;
    }

    /// Worker assignment requires active status (spec §3.6).
    pub fn assign_worker(&mut self, worker_id: WorkerId) -> Result<(), StationError> {
        if self.status != StationStatus::Active {
            return Err(StationError::NotActive(self.station_id));
        }
        self.assigned_worker_id = Some(worker_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(max: u32, current: u32, status: StationStatus) -> Station {
        Station {
            station_id: StationId::new(),
            station_type: StationType::Packing,
            zone: "A".into(),
            status,
            capabilities: vec![Requirement::SingleItem],
            max_concurrent_tasks: max,
            current_tasks: current,
            assigned_worker_id: None,
            equipment: vec![],
            version: 0,
        }
    }

    #[test]
    fn increment_fails_at_capacity() {
        let mut s = station(2, 2, StationStatus::Active);
        assert_eq!(
            s.increment_tasks(),
            Err(StationError::AtCapacity(s.station_id, 2, 2))
        );
    }

    #[test]
    fn increment_fails_when_inactive() {
        let mut s = station(2, 0, StationStatus::Maintenance);
        assert_eq!(
            s.increment_tasks(),
            Err(StationError::NotActive(s.station_id))
        );
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut s = station(2, 0, StationStatus::Active);
        s.decrement_tasks();
        assert_eq!(s.current_tasks, 0);
    }

    #[test]
    fn increment_then_decrement_round_trips_version() {
        let mut s = station(2, 0, StationStatus::Active);
        s.increment_tasks().unwrap();
        assert_eq!(s.current_tasks, 1);
        s.decrement_tasks();
        assert_eq!(s.current_tasks, 0);
        assert_eq!(s.version, 2);
    }
}
