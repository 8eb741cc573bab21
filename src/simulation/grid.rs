use parking_lot::Mutex;
use std::fmt;

use super::{SimError, SimResult, VehicleId};

/// Side length of the square map.
pub const GRID_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Sentinel for "not on the map": before entering and after leaving.
    pub const OUTSIDE: Position = Position { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn is_outside(&self) -> bool {
        self.row == -1 || self.col == -1
    }

    /// Row-major cell index, `None` for the sentinel or anything off the map.
    pub fn cell_index(&self) -> Option<usize> {
        let size = GRID_SIZE as i32;
        if (0..size).contains(&self.row) && (0..size).contains(&self.col) {
            Some(self.row as usize * GRID_SIZE + self.col as usize)
        } else {
            None
        }
    }

    /// Whether this cell belongs to the admission-controlled intersection:
    /// rows 2-4 and cols 2-4, minus the exact center.
    pub fn in_critical_area(&self) -> bool {
        (2..=4).contains(&self.row)
            && (2..=4).contains(&self.col)
            && !(self.row == 3 && self.col == 3)
    }

    /// Manhattan-adjacent, sharing an edge.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        (self.row - other.row).abs() + (self.col - other.col).abs() == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// One lock per map cell. A vehicle may only stand on a cell whose lock it
/// holds. Acquisition never blocks; contention is retried next round.
pub struct CellLockGrid {
    cells: Vec<Mutex<Option<VehicleId>>>,
}

impl CellLockGrid {
    pub fn new() -> Self {
        Self {
            cells: (0..GRID_SIZE * GRID_SIZE).map(|_| Mutex::new(None)).collect(),
        }
    }

    fn cell(&self, position: Position) -> SimResult<&Mutex<Option<VehicleId>>> {
        position
            .cell_index()
            .map(|index| &self.cells[index])
            .ok_or(SimError::OffGrid(position))
    }

    /// Take the cell if it is free. Returns `Ok(false)` when another vehicle
    /// holds it.
    pub fn try_acquire(&self, position: Position, vehicle: VehicleId) -> SimResult<bool> {
        let mut owner = self.cell(position)?.lock();
        match *owner {
            None => {
                *owner = Some(vehicle);
                Ok(true)
            }
            Some(holder) if holder == vehicle => {
                Err(SimError::CellAlreadyHeld { position, vehicle })
            }
            Some(_) => Ok(false),
        }
    }

    pub fn release(&self, position: Position, vehicle: VehicleId) -> SimResult<()> {
        let mut owner = self.cell(position)?.lock();
        match *owner {
            Some(holder) if holder == vehicle => {
                *owner = None;
                Ok(())
            }
            _ => Err(SimError::LockNotHeld { position, vehicle }),
        }
    }

    pub fn holder(&self, position: Position) -> Option<VehicleId> {
        position
            .cell_index()
            .and_then(|index| *self.cells[index].lock())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.lock().is_some()).count()
    }
}

impl Default for CellLockGrid {
    fn default() -> Self {
        Self::new()
    }
}
