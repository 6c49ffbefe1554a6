//! Worker and station assignment rules (spec §4.4.4).

use thiserror::Error;

use crate::clients::labor::{LaborClient, LaborError, WorkerQuery};
use crate::domain::process_path::Requirement;
use crate::domain::station::{Station, StationType};
use crate::domain::ids::WorkerId;

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("labor service error: {0}")]
    Labor(#[from] LaborError),
    #[error("no capable station available for zone {zone} requirements {requirements:?}")]
    NoCapableStation {
        zone: String,
        requirements: Vec<Requirement>,
    },
}

/// Delegate worker selection to Labor (spec §4.4.4): `{taskType, zone,
/// requiredCertifications}`.
pub async fn assign_worker(
    labor: &dyn LaborClient,
    task_type: &str,
    zone: &str,
    required_certifications: &[String],
) -> Result<WorkerId, AssignmentError> {
    let worker = labor
        .find_available(WorkerQuery {
            task_type: task_type.to_string(),
            zone: zone.to_string(),
            required_certifications: required_certifications.to_vec(),
        })
        .await?;
    Ok(worker.worker_id)
}

/// Pick the first station satisfying `HasAllCapabilities(requirements) ∧
/// CanAcceptTask()` (spec §4.4.4) from a pre-fetched candidate set for the
/// requested zone/type. The candidate list itself is produced by
/// `FindCapableStations` on the caller side (an external/station-repository
/// concern); this function is the pure admission check.
pub fn pick_capable_station<'a>(
    candidates: &'a [Station],
    station_type: StationType,
    zone: &str,
    requirements: &[Requirement],
) -> Result<&'a Station, AssignmentError> {
    candidates
        .iter()
        .find(|s| s.station_type == station_type && s.zone == zone && s.can_serve(requirements))
        .ok_or_else(|| AssignmentError::NoCapableStation {
            zone: zone.to_string(),
            requirements: requirements.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::StationStatus;
    use crate::domain::ids::StationId;

    fn station(zone: &str, caps: Vec<Requirement>, current: u32, max: u32) -> Station {
        Station {
            station_id: StationId::new(),
            station_type: StationType::Packing,
            zone: zone.into(),
            status: StationStatus::Active,
            capabilities: caps,
            max_concurrent_tasks: max,
            current_tasks: current,
            assigned_worker_id: None,
            equipment: vec![],
            version: 0,
        }
    }

    #[test]
    fn picks_capable_station_in_zone() {
        let s1 = station("A", vec![Requirement::Hazmat], 0, 2);
        let s2 = station("B", vec![Requirement::Hazmat], 0, 2);
        let picked = pick_capable_station(
            &[s1.clone(), s2.clone()],
            StationType::Packing,
            "B",
            &[Requirement::Hazmat],
        )
        .unwrap();
        assert_eq!(picked.station_id, s2.station_id);
    }

    #[test]
    fn rejects_station_missing_capability() {
        let s1 = station("A", vec![Requirement::Fragile], 0, 2);
        let err = pick_capable_station(&[s1], StationType::Packing, "A", &[Requirement::Hazmat])
            .unwrap_err();
        assert!(matches!(err, AssignmentError::NoCapableStation { .. }));
    }

    #[test]
    fn rejects_station_at_capacity() {
        let s1 = station("A", vec![Requirement::Hazmat], 2, 2);
        let err =
            pick_capable_station(&[s1], StationType::Packing, "A", &[Requirement::Hazmat]).unwrap_err();
        assert!(matches!(err, AssignmentError::NoCapableStation { .. }));
    }
}
