use crate::simulation::{Arrival, Crossroads, SimError, SimResult, SimulationReport, Vehicle};
use std::time::Instant;

use super::{check_roster, finish_report, SimulationBackend};

/// Drives every vehicle from the calling thread, in roster order within each
/// round. Same protocol and barrier as the threaded backend, but the
/// interleaving is fixed, so runs are reproducible.
#[derive(Debug, Default)]
pub struct SequentialBackend {
    rounds_run: u64,
}

impl SequentialBackend {
    pub fn new() -> Self {
        Self { rounds_run: 0 }
    }

    /// Rounds driven across every `run` call on this backend.
    pub fn rounds_run(&self) -> u64 {
        self.rounds_run
    }

    fn run_round(ctx: &Crossroads, active: &mut [Vehicle]) -> SimResult<u64> {
        let mut closed = None;
        for vehicle in active.iter_mut() {
            let outcome = vehicle.attempt_move(ctx)?;
            if let Arrival::Closed(step) = ctx.try_report(outcome)? {
                closed = Some(step);
            }
        }
        // Every live vehicle reported, so the last report must have closed it.
        closed.ok_or(SimError::BarrierOverrun {
            reported: active.len(),
            live: ctx.live_vehicles(),
        })
    }
}

impl SimulationBackend for SequentialBackend {
    fn run(&mut self, ctx: &Crossroads, vehicles: Vec<Vehicle>) -> SimResult<SimulationReport> {
        check_roster(ctx, &vehicles)?;
        let started = Instant::now();
        for vehicle in &vehicles {
            ctx.board().publish(vehicle.snapshot());
        }

        let mut active = vehicles;
        let mut reports = Vec::with_capacity(active.len());
        while !active.is_empty() {
            let step = match Self::run_round(ctx, &mut active) {
                Ok(step) => step,
                Err(err) => {
                    log::error!("sequential run aborted at step {}: {err}", ctx.step());
                    ctx.abort();
                    return Err(err);
                }
            };
            self.rounds_run += 1;

            let (finished, still_running): (Vec<_>, Vec<_>) =
                active.into_iter().partition(Vehicle::is_finished);
            reports.extend(finished.into_iter().map(|v| v.into_report(step)));
            active = still_running;
        }

        Ok(finish_report(ctx, reports, started.elapsed()))
    }

    fn get_name(&self) -> &'static str {
        "sequential"
    }

    fn is_parallel(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{Entry, VehicleId, STALL_ROUNDS};

    fn roster(routes: &[(Entry, Entry)]) -> Vec<Vehicle> {
        routes
            .iter()
            .enumerate()
            .map(|(i, &(origin, destination))| {
                Vehicle::new(VehicleId(i), (b'a' + i as u8) as char, origin, destination)
            })
            .collect()
    }

    #[test]
    fn same_entry_queues_one_cell_behind() {
        let ctx = Crossroads::new(2, 4).unwrap();
        let mut backend = SequentialBackend::new();
        let report = backend
            .run(&ctx, roster(&[(Entry::A, Entry::C), (Entry::A, Entry::C)]))
            .unwrap();

        // The leader frees (4,0) in round 2 before the follower tries it.
        let leader = report.vehicle('a').unwrap();
        let follower = report.vehicle('b').unwrap();
        assert_eq!(leader.finished_step, 8);
        assert_eq!(follower.cell_blocked, 1);
        assert_eq!(follower.finished_step, 9);
        assert_eq!(report.steps, 9);
        assert_eq!(backend.rounds_run(), 9);
    }

    #[test]
    fn roster_size_must_match_the_context() {
        let ctx = Crossroads::new(3, 4).unwrap();
        let mut backend = SequentialBackend::new();
        assert_eq!(
            backend.run(&ctx, roster(&[(Entry::A, Entry::B)])).unwrap_err(),
            SimError::RosterMismatch { expected: 3, got: 1 }
        );
    }

    #[test]
    fn roster_must_be_in_id_order_on_a_fresh_context() {
        let ctx = Crossroads::new(2, 4).unwrap();
        let mut backend = SequentialBackend::new();
        let mut swapped = roster(&[(Entry::A, Entry::B), (Entry::C, Entry::D)]);
        swapped.swap(0, 1);
        assert_eq!(
            backend.run(&ctx, swapped).unwrap_err(),
            SimError::RosterOrder { index: 0, id: VehicleId(1) }
        );

        let ctx = Crossroads::new(1, 4).unwrap();
        backend.run(&ctx, roster(&[(Entry::A, Entry::B)])).unwrap();
        assert_eq!(
            backend.run(&ctx, roster(&[(Entry::A, Entry::B)])).unwrap_err(),
            SimError::ContextReused(6)
        );
    }

    #[test]
    fn vehicle_that_can_never_enter_stalls_instead_of_spinning() {
        let ctx = Crossroads::new(1, 1).unwrap();
        // A slot nobody will ever give back.
        ctx.gate().try_enter(VehicleId(9)).unwrap();
        let mut backend = SequentialBackend::new();

        let err = backend.run(&ctx, roster(&[(Entry::A, Entry::C)])).unwrap_err();
        // Two moves to reach (4,1), then gate refusals only.
        assert_eq!(err, SimError::Stalled { step: 2 + STALL_ROUNDS, rounds: STALL_ROUNDS });
        assert!(ctx.is_aborted());
        assert_eq!(backend.rounds_run(), 2 + STALL_ROUNDS - 1);
    }

    #[test]
    fn fifth_vehicle_waits_for_the_ring_to_clear() {
        // Four U-turns fill the critical area in round 3; the second A vehicle
        // reaches (4,2) in rounds 4, 6 and 8 while it is still full.
        let ctx = Crossroads::new(5, 4).unwrap();
        let mut backend = SequentialBackend::new();
        let report = backend
            .run(
                &ctx,
                roster(&[
                    (Entry::A, Entry::A),
                    (Entry::B, Entry::B),
                    (Entry::C, Entry::C),
                    (Entry::D, Entry::D),
                    (Entry::A, Entry::A),
                ]),
            )
            .unwrap();

        let last = report.vehicle('e').unwrap();
        assert_eq!(last.gate_blocked, 3);
        assert_eq!(last.cell_blocked, 4);
        assert_eq!(last.finished_step, 19);
        for label in ['a', 'b', 'c', 'd'] {
            let vehicle = report.vehicle(label).unwrap();
            assert_eq!(vehicle.blocked(), 0, "{label} should never wait");
            assert_eq!(vehicle.finished_step, 12);
        }
        assert_eq!(report.peak_critical_occupancy, 4);
        assert_eq!(report.steps, 19);
    }
}
