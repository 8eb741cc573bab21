use crate::simulation::{
    vehicle_loop, Crossroads, SimError, SimResult, SimulationReport, Vehicle, VehicleId, VehicleReport,
};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use super::{check_roster, finish_report, SimulationBackend};

/// One OS thread per vehicle, all sharing the same [`Crossroads`].
#[derive(Debug, Default)]
pub struct ThreadedBackend {
    stack_size: Option<usize>,
}

impl ThreadedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack size for each vehicle thread; the platform default otherwise.
    pub fn with_stack_size(stack_size: usize) -> Self {
        Self {
            stack_size: Some(stack_size),
        }
    }
}

/// Poisons the barrier if a vehicle thread unwinds, so the others wake up
/// instead of waiting for a report that will never come.
struct AbortOnPanic<'a>(&'a Crossroads);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// Join explicitly so a panicked thread becomes an error rather than a
/// panic out of `thread::scope`.
fn join_all(
    handles: Vec<(VehicleId, ScopedJoinHandle<'_, SimResult<VehicleReport>>)>,
) -> Vec<SimResult<VehicleReport>> {
    handles
        .into_iter()
        .map(|(id, handle)| handle.join().unwrap_or(Err(SimError::VehiclePanicked(id))))
        .collect()
}

impl SimulationBackend for ThreadedBackend {
    fn run(&mut self, ctx: &Crossroads, vehicles: Vec<Vehicle>) -> SimResult<SimulationReport> {
        check_roster(ctx, &vehicles)?;
        log::info!("starting {} vehicle threads", vehicles.len());
        let started = Instant::now();

        let results = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(vehicles.len());
            for vehicle in vehicles {
                let id = vehicle.id();
                let mut builder = thread::Builder::new().name(format!("vehicle-{}", vehicle.label()));
                if let Some(stack_size) = self.stack_size {
                    builder = builder.stack_size(stack_size);
                }
                let spawned = builder.spawn_scoped(scope, move || {
                    let _guard = AbortOnPanic(ctx);
                    vehicle_loop(ctx, vehicle)
                });
                match spawned {
                    Ok(handle) => handles.push((id, handle)),
                    Err(err) => {
                        log::error!("could not start thread for vehicle {id}: {err}");
                        // The barrier counts this vehicle; nobody else can finish.
                        ctx.abort();
                        let mut results = join_all(handles);
                        results.push(Err(SimError::Spawn(err.to_string())));
                        return results;
                    }
                }
            }

            join_all(handles)
        });

        let mut reports = Vec::with_capacity(results.len());
        let mut failure: Option<SimError> = None;
        for result in results {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    let replace = match &failure {
                        None => true,
                        Some(current) => !current.is_root_cause() && err.is_root_cause(),
                    };
                    if replace {
                        failure = Some(err);
                    }
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(finish_report(ctx, reports, started.elapsed()))
    }

    fn get_name(&self) -> &'static str {
        "threaded"
    }

    fn is_parallel(&self) -> bool {
        true
    }
}
