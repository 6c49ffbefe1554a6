//! Inventory reservation lifecycle (spec §3.7). State lives on the external
//! inventory service; this core only tracks which cancellation action
//! applies given the reservation's current phase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Available,
    SoftReserved,
    HardAllocated,
    Packed,
    Shipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationAction {
    Release,
    ReturnToShelf,
    Refuse,
}

impl ReservationState {
    /// Cancellation semantics are a function of current state (spec §3.7):
    /// soft -> release; hard/packed -> physical return-to-shelf;
    /// shipped -> not cancellable.
    pub fn cancellation_action(self) -> CancellationAction {
        match self {
            ReservationState::Available | ReservationState::SoftReserved => {
                CancellationAction::Release
            }
            ReservationState::HardAllocated | ReservationState::Packed => {
                CancellationAction::ReturnToShelf
            }
            ReservationState::Shipped => CancellationAction::Refuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_reserved_releases() {
        assert_eq!(
            ReservationState::SoftReserved.cancellation_action(),
            CancellationAction::Release
        );
    }

    #[test]
    fn hard_allocated_returns_to_shelf() {
        assert_eq!(
            ReservationState::HardAllocated.cancellation_action(),
            CancellationAction::ReturnToShelf
        );
    }

    #[test]
    fn shipped_refuses() {
        assert_eq!(
            ReservationState::Shipped.cancellation_action(),
            CancellationAction::Refuse
        );
    }
}
