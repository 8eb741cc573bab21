use thiserror::Error;

use super::{Position, VehicleId};

/// Invariant violations. Any of these invalidates the mutual-exclusion or
/// capacity guarantees, so the simulation stops instead of continuing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("cell {position} is not held by vehicle {vehicle}")]
    LockNotHeld {
        position: Position,
        vehicle: VehicleId,
    },

    #[error("vehicle {vehicle} tried to acquire cell {position} it already holds")]
    CellAlreadyHeld {
        position: Position,
        vehicle: VehicleId,
    },

    #[error("lock operation on off-grid position {0}")]
    OffGrid(Position),

    #[error("vehicle {0} entered the critical area twice")]
    GateDoubleEntry(VehicleId),

    #[error("vehicle {0} left the critical area without entering it")]
    GateNotEntered(VehicleId),

    #[error("critical area capacity {capacity} outside 1..={max}")]
    CapacityOutOfRange { capacity: usize, max: usize },

    #[error("{reported} vehicles reported in a round with only {live} live")]
    BarrierOverrun { reported: usize, live: usize },

    #[error("simulation aborted by another vehicle")]
    Aborted,

    #[error("vehicle {0} panicked")]
    VehiclePanicked(VehicleId),

    #[error("roster has {got} vehicles but the intersection was set up for {expected}")]
    RosterMismatch { expected: usize, got: usize },

    #[error("vehicle at roster index {index} has id {id}")]
    RosterOrder { index: usize, id: VehicleId },

    #[error("intersection already ran to step {0}; build a fresh one per run")]
    ContextReused(u64),

    #[error("no vehicle moved or left for {rounds} rounds up to step {step}")]
    Stalled { step: u64, rounds: u64 },

    #[error("failed to spawn vehicle thread: {0}")]
    Spawn(String),
}

impl SimError {
    /// `Aborted` is a consequence of another failure, never the cause.
    pub fn is_root_cause(&self) -> bool {
        !matches!(self, SimError::Aborted)
    }
}

pub type SimResult<T> = Result<T, SimError>;
