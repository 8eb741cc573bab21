use parking_lot::Mutex;

use super::{Position, VehicleId, VehicleState};

/// What the renderer gets to see of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub label: char,
    pub position: Position,
    pub state: VehicleState,
    pub in_critical_area: bool,
}

impl VehicleSnapshot {
    fn vacant(id: VehicleId) -> Self {
        Self {
            id,
            label: '?',
            position: Position::OUTSIDE,
            state: VehicleState::Ready,
            in_critical_area: false,
        }
    }
}

/// Display-only view of every vehicle, one slot per vehicle. Each slot is
/// written by its own vehicle; reads may be a round stale unless taken from
/// inside a step notification, where all writers are parked on the barrier.
pub struct Board {
    slots: Vec<Mutex<VehicleSnapshot>>,
}

impl Board {
    pub fn new(vehicle_count: usize) -> Self {
        Self {
            slots: (0..vehicle_count)
                .map(|index| Mutex::new(VehicleSnapshot::vacant(VehicleId(index))))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Overwrite the slot of `snapshot.id`. Ids outside the board are ignored.
    pub fn publish(&self, snapshot: VehicleSnapshot) {
        if let Some(slot) = self.slots.get(snapshot.id.0) {
            *slot.lock() = snapshot;
        }
    }

    pub fn get(&self, id: VehicleId) -> Option<VehicleSnapshot> {
        self.slots.get(id.0).map(|slot| *slot.lock())
    }

    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        self.slots.iter().map(|slot| *slot.lock()).collect()
    }

    /// Vehicles currently flagged as inside the critical area.
    pub fn critical_occupancy(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.lock().in_critical_area)
            .count()
    }
}
