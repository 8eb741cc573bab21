use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod barrier;
pub mod board;
pub mod error;
pub mod gate;
pub mod grid;
pub mod paths;
pub mod vehicle;

pub use barrier::*;
pub use board::*;
pub use error::*;
pub use gate::*;
pub use grid::*;
pub use paths::*;
pub use vehicle::*;

/// Index of a vehicle in the roster; doubles as its board slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Ready,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The target cell is held by another vehicle.
    Cell,
    /// The target cell was free but the critical area is full.
    Gate,
}

/// What a vehicle did with its one attempt in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked(BlockReason),
    Terminated,
}

/// Receives one call per closed round.
///
/// Runs on whichever vehicle thread closed the round, while every other
/// vehicle is parked on the barrier, so `board` is a consistent view of the
/// positions at the end of round `step`.
pub trait StepObserver: Send + Sync {
    fn step_changed(&self, step: u64, summary: &RoundSummary, board: &Board);

    /// Called once by the backend after every vehicle has finished.
    fn simulation_finished(&self, _report: &SimulationReport) {}
}

impl<T: StepObserver + ?Sized> StepObserver for Arc<T> {
    fn step_changed(&self, step: u64, summary: &RoundSummary, board: &Board) {
        (**self).step_changed(step, summary, board)
    }

    fn simulation_finished(&self, report: &SimulationReport) {
        (**self).simulation_finished(report)
    }
}

pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn step_changed(&self, _step: u64, _summary: &RoundSummary, _board: &Board) {}
}

/// Shared coordination state for one simulation run. Built once before any
/// vehicle starts and handed to every vehicle by reference.
pub struct Crossroads {
    paths: PathTable,
    cells: CellLockGrid,
    gate: AdmissionGate,
    barrier: StepBarrier,
    board: Board,
    observer: Box<dyn StepObserver>,
}

impl Crossroads {
    /// Fails if `capacity` could let the critical area fill up; see
    /// [`MAX_CAPACITY`].
    pub fn new(vehicle_count: usize, capacity: usize) -> SimResult<Self> {
        Ok(Self {
            paths: PathTable,
            cells: CellLockGrid::new(),
            gate: AdmissionGate::new(capacity)?,
            barrier: StepBarrier::new(vehicle_count),
            board: Board::new(vehicle_count),
            observer: Box::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: impl StepObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn cells(&self) -> &CellLockGrid {
        &self.cells
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn observer(&self) -> &dyn StepObserver {
        self.observer.as_ref()
    }

    pub fn vehicle_count(&self) -> usize {
        self.board.len()
    }

    pub fn step(&self) -> u64 {
        self.barrier.step()
    }

    pub fn live_vehicles(&self) -> usize {
        self.barrier.live()
    }

    /// Report a round outcome and block until the round closes.
    pub fn report(&self, outcome: MoveOutcome) -> SimResult<u64> {
        self.barrier.arrive(outcome, |step, summary| self.round_closed(step, summary))
    }

    /// Report without waiting; used when one thread drives every vehicle.
    pub fn try_report(&self, outcome: MoveOutcome) -> SimResult<Arrival> {
        self.barrier.try_arrive(outcome, |step, summary| self.round_closed(step, summary))
    }

    pub fn abort(&self) {
        self.barrier.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.barrier.is_aborted()
    }

    fn round_closed(&self, step: u64, summary: &RoundSummary) {
        log::debug!(
            "step {step}: {} moved, {} blocked, {} finished, {} in critical area",
            summary.moved,
            summary.blocked,
            summary.terminated,
            self.gate.count()
        );
        self.observer.step_changed(step, summary, &self.board);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleReport {
    pub id: VehicleId,
    pub label: char,
    pub origin: Entry,
    pub destination: Entry,
    pub moves: usize,
    pub cell_blocked: usize,
    pub gate_blocked: usize,
    /// Step at which the vehicle's termination round closed.
    pub finished_step: u64,
}

impl VehicleReport {
    pub fn blocked(&self) -> usize {
        self.cell_blocked + self.gate_blocked
    }
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub steps: u64,
    /// Sorted by vehicle id.
    pub vehicles: Vec<VehicleReport>,
    pub peak_critical_occupancy: usize,
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn total_gate_blocked(&self) -> usize {
        self.vehicles.iter().map(|v| v.gate_blocked).sum()
    }

    pub fn total_cell_blocked(&self) -> usize {
        self.vehicles.iter().map(|v| v.cell_blocked).sum()
    }

    pub fn vehicle(&self, label: char) -> Option<&VehicleReport> {
        self.vehicles.iter().find(|v| v.label == label)
    }
}
