use crate::simulation::{Crossroads, SimError, SimResult, SimulationReport, Vehicle, VehicleReport};
use std::time::Duration;

pub mod sequential;
pub mod threaded;

pub use sequential::*;
pub use threaded::*;

pub trait SimulationBackend {
    /// Drive every vehicle to completion against `ctx`. `ctx` must have
    /// been built for exactly `vehicles.len()` vehicles.
    fn run(&mut self, ctx: &Crossroads, vehicles: Vec<Vehicle>) -> SimResult<SimulationReport>;
    fn get_name(&self) -> &'static str;
    fn is_parallel(&self) -> bool;
}

pub enum ComputeBackend {
    Threaded(ThreadedBackend),
    Sequential(SequentialBackend),
}

impl ComputeBackend {
    pub fn new_threaded() -> Self {
        ComputeBackend::Threaded(ThreadedBackend::new())
    }

    pub fn new_sequential() -> Self {
        ComputeBackend::Sequential(SequentialBackend::new())
    }
}

impl SimulationBackend for ComputeBackend {
    fn run(&mut self, ctx: &Crossroads, vehicles: Vec<Vehicle>) -> SimResult<SimulationReport> {
        match self {
            ComputeBackend::Threaded(backend) => backend.run(ctx, vehicles),
            ComputeBackend::Sequential(backend) => backend.run(ctx, vehicles),
        }
    }

    fn get_name(&self) -> &'static str {
        match self {
            ComputeBackend::Threaded(backend) => backend.get_name(),
            ComputeBackend::Sequential(backend) => backend.get_name(),
        }
    }

    fn is_parallel(&self) -> bool {
        match self {
            ComputeBackend::Threaded(backend) => backend.is_parallel(),
            ComputeBackend::Sequential(backend) => backend.is_parallel(),
        }
    }
}

fn check_roster(ctx: &Crossroads, vehicles: &[Vehicle]) -> SimResult<()> {
    let expected = ctx.vehicle_count();
    if vehicles.len() != expected {
        return Err(SimError::RosterMismatch { expected, got: vehicles.len() });
    }
    if ctx.step() != 0 {
        return Err(SimError::ContextReused(ctx.step()));
    }
    if let Some((index, vehicle)) = vehicles.iter().enumerate().find(|(index, v)| v.id().0 != *index) {
        return Err(SimError::RosterOrder { index, id: vehicle.id() });
    }
    Ok(())
}

fn finish_report(
    ctx: &Crossroads,
    mut vehicles: Vec<VehicleReport>,
    elapsed: Duration,
) -> SimulationReport {
    vehicles.sort_by_key(|v| v.id);
    let report = SimulationReport {
        steps: ctx.step(),
        vehicles,
        peak_critical_occupancy: ctx.gate().peak(),
        elapsed,
    };
    log::info!(
        "all {} vehicles finished after {} steps ({} cell waits, {} gate waits, peak {} in critical area)",
        report.vehicles.len(),
        report.steps,
        report.total_cell_blocked(),
        report.total_gate_blocked(),
        report.peak_critical_occupancy
    );
    ctx.observer().simulation_finished(&report);
    report
}
