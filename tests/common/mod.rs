//! Shared helpers for the integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crossroads_sim::{
    compute::{ComputeBackend, SimulationBackend},
    config::{build_vehicles, parse_roster, VehicleSpec},
    simulation::{Board, Crossroads, Position, RoundSummary, SimResult, SimulationReport, StepObserver},
};

/// Observer that checks the safety properties at every round boundary,
/// when every vehicle is parked on the barrier.
pub struct SafetyChecker {
    capacity: usize,
    state: Mutex<CheckerState>,
}

#[derive(Default)]
struct CheckerState {
    last_step: u64,
    previous: Vec<Position>,
    violations: Vec<String>,
    max_critical: usize,
}

impl SafetyChecker {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            state: Mutex::new(CheckerState::default()),
        })
    }

    pub fn violations(&self) -> Vec<String> {
        self.state.lock().violations.clone()
    }

    pub fn last_step(&self) -> u64 {
        self.state.lock().last_step
    }

    pub fn max_critical(&self) -> usize {
        self.state.lock().max_critical
    }

    pub fn assert_clean(&self) {
        let violations = self.violations();
        assert!(violations.is_empty(), "safety violations:\n{}", violations.join("\n"));
    }
}

impl StepObserver for SafetyChecker {
    fn step_changed(&self, step: u64, summary: &RoundSummary, board: &Board) {
        let mut state = self.state.lock();
        if step != state.last_step + 1 {
            let last_step = state.last_step;
            state.violations.push(format!("step jumped from {} to {step}", last_step));
        }
        state.last_step = step;
        if summary.reported() == 0 {
            state.violations.push(format!("step {step}: closed with no reports"));
        }

        let snapshot = board.snapshot();
        let mut occupied = HashSet::new();
        for vehicle in &snapshot {
            if !vehicle.position.is_outside() && !occupied.insert(vehicle.position) {
                state.violations.push(format!(
                    "step {step}: two vehicles on {}",
                    vehicle.position
                ));
            }
            if vehicle.in_critical_area != vehicle.position.in_critical_area() {
                state.violations.push(format!(
                    "step {step}: vehicle {} flag disagrees with position {}",
                    vehicle.label, vehicle.position
                ));
            }
        }

        let critical = board.critical_occupancy();
        state.max_critical = state.max_critical.max(critical);
        if critical > self.capacity {
            state.violations.push(format!(
                "step {step}: {critical} vehicles in the critical area (capacity {})",
                self.capacity
            ));
        }

        // Lock step: between two boundaries nobody covers more than one cell.
        let previous = std::mem::take(&mut state.previous);
        if previous.len() == snapshot.len() {
            for (before, vehicle) in previous.iter().zip(&snapshot) {
                let after = vehicle.position;
                let one_move = *before == after
                    || before.is_outside()
                    || after.is_outside()
                    || before.is_adjacent(&after);
                if !one_move {
                    state.violations.push(format!(
                        "step {step}: vehicle {} jumped {before} -> {after}",
                        vehicle.label
                    ));
                }
            }
        }
        state.previous = snapshot.iter().map(|v| v.position).collect();
    }
}

pub fn specs(roster: &str) -> Vec<VehicleSpec> {
    parse_roster(roster).expect("bad test roster")
}

/// Run `roster` on `backend` with a fresh intersection and a checker attached.
pub fn run_checked(
    mut backend: ComputeBackend,
    roster: &[VehicleSpec],
    capacity: usize,
) -> (SimResult<SimulationReport>, Arc<SafetyChecker>) {
    let checker = SafetyChecker::new(capacity);
    let result = Crossroads::new(roster.len(), capacity).and_then(|ctx| {
        let ctx = ctx.with_observer(Arc::clone(&checker));
        backend.run(&ctx, build_vehicles(roster))
    });
    (result, checker)
}
