use parking_lot::Mutex;
use std::collections::HashSet;

use super::{SimError, SimResult, VehicleId};

/// Default number of vehicles allowed inside the critical area at once.
pub const DEFAULT_CAPACITY: usize = 4;

/// The critical area is a one-way ring of 8 cells. Once all 8 are held
/// every occupant waits on the next one and the ring never drains.
pub const MAX_CAPACITY: usize = 7;

/// Counting admission control for the critical area. Independent of the
/// per-cell locks; the mutex is never held across a blocking wait.
pub struct AdmissionGate {
    capacity: usize,
    state: Mutex<GateState>,
}

struct GateState {
    inside: HashSet<VehicleId>,
    peak: usize,
}

impl AdmissionGate {
    /// Fails unless `capacity` is in `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> SimResult<Self> {
        if !(1..=MAX_CAPACITY).contains(&capacity) {
            return Err(SimError::CapacityOutOfRange { capacity, max: MAX_CAPACITY });
        }
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(GateState {
                inside: HashSet::with_capacity(capacity),
                peak: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admit `vehicle` if there is room. `Ok(false)` means saturated and
    /// nothing changed.
    pub fn try_enter(&self, vehicle: VehicleId) -> SimResult<bool> {
        let mut state = self.state.lock();
        if state.inside.contains(&vehicle) {
            return Err(SimError::GateDoubleEntry(vehicle));
        }
        if state.inside.len() >= self.capacity {
            return Ok(false);
        }
        state.inside.insert(vehicle);
        state.peak = state.peak.max(state.inside.len());
        Ok(true)
    }

    pub fn leave(&self, vehicle: VehicleId) -> SimResult<()> {
        let mut state = self.state.lock();
        if state.inside.remove(&vehicle) {
            Ok(())
        } else {
            Err(SimError::GateNotEntered(vehicle))
        }
    }

    pub fn count(&self) -> usize {
        self.state.lock().inside.len()
    }

    /// Highest occupancy observed since construction.
    pub fn peak(&self) -> usize {
        self.state.lock().peak
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
