//! End-to-end runs of the reference scenarios on both backends.

mod common;

use common::{run_checked, specs};
use crossroads_sim::{
    compute::ComputeBackend,
    simulation::{Entry, PathTable, DEFAULT_CAPACITY},
};

fn backends() -> [ComputeBackend; 2] {
    [ComputeBackend::new_threaded(), ComputeBackend::new_sequential()]
}

#[test]
fn lone_vehicle_never_waits() {
    for backend in backends() {
        let (result, checker) = run_checked(backend, &specs("aAC"), DEFAULT_CAPACITY);
        let report = result.expect("simulation failed");
        checker.assert_clean();

        // Seven cells, then one round to leave the map.
        let vehicle = report.vehicle('a').unwrap();
        assert_eq!(vehicle.moves, PathTable.cell_count(Entry::A, Entry::C));
        assert_eq!(vehicle.moves, 7);
        assert_eq!(vehicle.blocked(), 0);
        assert_eq!(vehicle.finished_step, 8);
        assert_eq!(report.steps, 8);
        assert_eq!(checker.last_step(), 8);
    }
}

#[test]
fn four_entries_at_once_are_never_gated() {
    // Capacity equals the vehicle count, so only cells can hold anyone up.
    for backend in backends() {
        let (result, checker) = run_checked(backend, &specs("aAC:bBD:cCA:dDB"), DEFAULT_CAPACITY);
        let report = result.expect("simulation failed");
        checker.assert_clean();

        assert_eq!(report.total_gate_blocked(), 0);
        assert!(report.peak_critical_occupancy <= DEFAULT_CAPACITY);
        assert!(checker.max_critical() <= DEFAULT_CAPACITY);
        for vehicle in &report.vehicles {
            assert_eq!(vehicle.moves, 7, "vehicle {} took a detour", vehicle.label);
        }
    }
}

#[test]
fn fifth_vehicle_is_held_at_the_gate() {
    let roster = specs("aAA:bBB:cCC:dDD:eAA");
    let (result, checker) = run_checked(ComputeBackend::new_sequential(), &roster, DEFAULT_CAPACITY);
    let report = result.expect("simulation failed");
    checker.assert_clean();

    assert!(report.total_gate_blocked() >= 1);
    assert_eq!(report.peak_critical_occupancy, 4);
    assert!(report.vehicles.iter().all(|v| v.moves == 11));
}

#[test]
fn gate_saturation_on_threads_still_finishes_everyone() {
    let roster = specs("aAA:bBB:cCC:dDD:eAA");
    let (result, checker) = run_checked(ComputeBackend::new_threaded(), &roster, DEFAULT_CAPACITY);
    let report = result.expect("simulation failed");
    checker.assert_clean();

    assert_eq!(report.vehicles.len(), 5);
    assert!(report.peak_critical_occupancy <= DEFAULT_CAPACITY);
    assert!(report.vehicles.iter().all(|v| v.moves == 11));
}

#[test]
fn simultaneous_arrivals_beyond_capacity_are_refused() {
    // Both reach the critical area in round 3 on separate cells; a capacity
    // of one lets only the first through.
    let (result, checker) = run_checked(ComputeBackend::new_threaded(), &specs("aAC:bBD"), 1);
    let report = result.expect("simulation failed");
    checker.assert_clean();

    assert!(report.total_gate_blocked() >= 1);
    assert_eq!(report.peak_critical_occupancy, 1);
    assert_eq!(checker.max_critical(), 1);
}

#[test]
fn same_origin_and_destination_loops_and_terminates() {
    for backend in backends() {
        let (result, checker) = run_checked(backend, &specs("aAA"), DEFAULT_CAPACITY);
        let report = result.expect("simulation failed");
        checker.assert_clean();

        let vehicle = report.vehicle('a').unwrap();
        assert_eq!(vehicle.moves, 11);
        assert_eq!(vehicle.finished_step, 12);
    }
}
