use super::{
    BlockReason, Crossroads, Entry, MoveOutcome, Position, SimResult, VehicleId, VehicleReport,
    VehicleSnapshot, VehicleState,
};

/// One vehicle's private state. Owned by the task that drives it; the rest
/// of the world sees it only through [`super::Board`].
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    label: char,
    origin: Entry,
    destination: Entry,
    position: Position,
    state: VehicleState,
    path_step: usize,
    in_critical_area: bool,
    moves: usize,
    cell_blocked: usize,
    gate_blocked: usize,
}

impl Vehicle {
    pub fn new(id: VehicleId, label: char, origin: Entry, destination: Entry) -> Self {
        Self {
            id,
            label,
            origin,
            destination,
            position: Position::OUTSIDE,
            state: VehicleState::Ready,
            path_step: 0,
            in_critical_area: false,
            moves: 0,
            cell_blocked: 0,
            gate_blocked: 0,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn label(&self) -> char {
        self.label
    }

    pub fn origin(&self) -> Entry {
        self.origin
    }

    pub fn destination(&self) -> Entry {
        self.destination
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn path_step(&self) -> usize {
        self.path_step
    }

    pub fn in_critical_area(&self) -> bool {
        self.in_critical_area
    }

    pub fn is_finished(&self) -> bool {
        self.state == VehicleState::Finished
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id,
            label: self.label,
            position: self.position,
            state: self.state,
            in_critical_area: self.in_critical_area,
        }
    }

    /// Make exactly one attempt for the current round.
    ///
    /// Never blocks: a held target cell or a full critical area yields
    /// [`MoveOutcome::Blocked`] and the same target is retried next round.
    /// The previous cell stays locked until the next one is secured, so the
    /// vehicle always holds at least one cell while on the map.
    pub fn attempt_move(&mut self, ctx: &Crossroads) -> SimResult<MoveOutcome> {
        debug_assert!(!self.is_finished(), "finished vehicle {} asked to move", self.id);

        let target = ctx.paths().step(self.origin, self.destination, self.path_step);

        if self.state == VehicleState::Running && target.is_outside() {
            return self.leave_map(ctx);
        }

        if !ctx.cells().try_acquire(target, self.id)? {
            self.cell_blocked += 1;
            log::debug!("vehicle {} waits for cell {target}", self.label);
            return Ok(MoveOutcome::Blocked(BlockReason::Cell));
        }

        let target_critical = target.in_critical_area();
        if target_critical && !self.in_critical_area && !ctx.gate().try_enter(self.id)? {
            // Still holding the current cell, so only the target goes back.
            ctx.cells().release(target, self.id)?;
            self.gate_blocked += 1;
            log::warn!(
                "vehicle {} held at {}: critical area full ({}/{})",
                self.label,
                self.position,
                ctx.gate().count(),
                ctx.gate().capacity()
            );
            return Ok(MoveOutcome::Blocked(BlockReason::Gate));
        }

        if self.state == VehicleState::Running {
            ctx.cells().release(self.position, self.id)?;
        }
        if self.in_critical_area && !target_critical {
            ctx.gate().leave(self.id)?;
        }

        log::debug!("vehicle {} {} -> {target}", self.label, self.position);
        self.in_critical_area = target_critical;
        self.position = target;
        self.path_step += 1;
        self.moves += 1;
        if self.state == VehicleState::Ready {
            self.state = VehicleState::Running;
            log::info!(
                "vehicle {} entered at {} heading for {}",
                self.label,
                self.origin,
                self.destination
            );
        }
        ctx.board().publish(self.snapshot());
        Ok(MoveOutcome::Moved)
    }

    fn leave_map(&mut self, ctx: &Crossroads) -> SimResult<MoveOutcome> {
        ctx.cells().release(self.position, self.id)?;
        if self.in_critical_area {
            ctx.gate().leave(self.id)?;
            self.in_critical_area = false;
        }
        self.position = Position::OUTSIDE;
        self.state = VehicleState::Finished;
        ctx.board().publish(self.snapshot());
        log::info!(
            "vehicle {} left at {} after {} moves",
            self.label,
            self.destination,
            self.moves
        );
        Ok(MoveOutcome::Terminated)
    }

    pub fn into_report(self, finished_step: u64) -> VehicleReport {
        VehicleReport {
            id: self.id,
            label: self.label,
            origin: self.origin,
            destination: self.destination,
            moves: self.moves,
            cell_blocked: self.cell_blocked,
            gate_blocked: self.gate_blocked,
            finished_step,
        }
    }
}

/// Body of one vehicle task: attempt, report, repeat until finished.
///
/// An invariant violation aborts the shared barrier so no other vehicle is
/// left waiting on a round that can never close.
pub fn vehicle_loop(ctx: &Crossroads, mut vehicle: Vehicle) -> SimResult<VehicleReport> {
    ctx.board().publish(vehicle.snapshot());
    loop {
        let round = vehicle
            .attempt_move(ctx)
            .and_then(|outcome| ctx.report(outcome).map(|step| (outcome, step)));
        match round {
            Ok((MoveOutcome::Terminated, step)) => return Ok(vehicle.into_report(step)),
            Ok(_) => {}
            Err(err) => {
                if err.is_root_cause() {
                    log::error!("vehicle {} aborting simulation: {err}", vehicle.label);
                    ctx.abort();
                }
                return Err(err);
            }
        }
    }
}
