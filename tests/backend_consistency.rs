mod common;

use anyhow::Result;
use common::{run_checked, specs};
use crossroads_sim::{compute::ComputeBackend, simulation::DEFAULT_CAPACITY};

/// Rosters without contention have exactly one schedule, so both backends
/// must agree on every per-vehicle count.
#[test]
fn test_threaded_sequential_consistency() -> Result<()> {
    for roster in ["aAB:bBC:cCD:dDA", "aAC", "aAD:bCB", "aAA"] {
        let roster = specs(roster);
        let (threaded, checker) = run_checked(ComputeBackend::new_threaded(), &roster, DEFAULT_CAPACITY);
        checker.assert_clean();
        let (sequential, checker) = run_checked(ComputeBackend::new_sequential(), &roster, DEFAULT_CAPACITY);
        checker.assert_clean();

        let (threaded, sequential) = (threaded?, sequential?);
        assert_eq!(threaded.steps, sequential.steps);
        assert_eq!(threaded.vehicles, sequential.vehicles);
        assert_eq!(threaded.peak_critical_occupancy, sequential.peak_critical_occupancy);
    }
    Ok(())
}

#[test]
fn test_right_turns_run_in_parallel() -> Result<()> {
    let (report, checker) = run_checked(ComputeBackend::new_threaded(), &specs("aAB:bBC:cCD:dDA"), DEFAULT_CAPACITY);
    checker.assert_clean();
    let report = report?;

    assert_eq!(report.total_cell_blocked() + report.total_gate_blocked(), 0);
    for vehicle in &report.vehicles {
        assert_eq!(vehicle.finished_step, report.steps);
    }
    Ok(())
}
