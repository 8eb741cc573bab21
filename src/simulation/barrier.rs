use parking_lot::{Condvar, Mutex};
use std::mem;

use super::{MoveOutcome, SimError, SimResult};

/// Per-round outcome tally handed to the round-close hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub moved: usize,
    pub blocked: usize,
    pub terminated: usize,
}

impl RoundSummary {
    fn record(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Moved => self.moved += 1,
            MoveOutcome::Blocked(_) => self.blocked += 1,
            MoveOutcome::Terminated => self.terminated += 1,
        }
    }

    pub fn reported(&self) -> usize {
        self.moved + self.blocked + self.terminated
    }

    /// Someone moved or left the map this round.
    pub fn made_progress(&self) -> bool {
        self.moved + self.terminated > 0
    }
}

/// Consecutive rounds without progress before the barrier gives up. One idle
/// round alone is not proof of a stall: a gate rollback can briefly hold the
/// cell another vehicle wanted.
pub const STALL_ROUNDS: u64 = 16;

/// Result of reporting to the barrier without waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// This report was the last of the round; carries the new step.
    Closed(u64),
    /// Other participants are still outstanding; pass to [`StepBarrier::wait`].
    Pending(Ticket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    step: u64,
}

struct BarrierState {
    live: usize,
    reported: usize,
    departing: usize,
    step: u64,
    round: RoundSummary,
    idle_rounds: u64,
    aborted: bool,
}

/// Lock-step round barrier over a shrinking set of participants.
///
/// Every live participant reports exactly once per round. The last reporter
/// bumps the step counter, runs the round-close hook and wakes everyone else.
/// A participant that reports [`MoveOutcome::Terminated`] still counts for
/// the current round but is dropped from the live count of the next one.
///
/// [`STALL_ROUNDS`] closing rounds in a row without a move or a departure
/// poison the barrier: the closer gets [`SimError::Stalled`], everyone else
/// [`SimError::Aborted`].
pub struct StepBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
    stall_limit: u64,
}

impl StepBarrier {
    pub fn new(live: usize) -> Self {
        Self::with_stall_limit(live, STALL_ROUNDS)
    }

    pub fn with_stall_limit(live: usize, stall_limit: u64) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                live,
                reported: 0,
                departing: 0,
                step: 0,
                round: RoundSummary::default(),
                idle_rounds: 0,
                aborted: false,
            }),
            released: Condvar::new(),
            stall_limit: stall_limit.max(1),
        }
    }

    /// Report without blocking. `on_close` runs only if this report closes
    /// the round, under the barrier mutex, so it must not call back into
    /// the barrier.
    pub fn try_arrive<F>(&self, outcome: MoveOutcome, on_close: F) -> SimResult<Arrival>
    where
        F: FnOnce(u64, &RoundSummary),
    {
        let mut state = self.state.lock();
        if state.aborted {
            return Err(SimError::Aborted);
        }
        if state.reported >= state.live {
            return Err(SimError::BarrierOverrun {
                reported: state.reported + 1,
                live: state.live,
            });
        }

        state.reported += 1;
        state.round.record(outcome);
        if outcome == MoveOutcome::Terminated {
            state.departing += 1;
        }

        if state.reported < state.live {
            return Ok(Arrival::Pending(Ticket { step: state.step }));
        }

        if state.round.made_progress() {
            state.idle_rounds = 0;
        } else {
            state.idle_rounds += 1;
            if state.idle_rounds >= self.stall_limit {
                // Leave the step where it is so waiters see the abort.
                state.aborted = true;
                self.released.notify_all();
                return Err(SimError::Stalled {
                    step: state.step + 1,
                    rounds: state.idle_rounds,
                });
            }
        }

        state.step += 1;
        state.reported = 0;
        state.live -= mem::take(&mut state.departing);
        let summary = mem::take(&mut state.round);
        on_close(state.step, &summary);
        self.released.notify_all();
        Ok(Arrival::Closed(state.step))
    }

    /// Block until the round the ticket was issued in has closed.
    pub fn wait(&self, ticket: Ticket) -> SimResult<u64> {
        let mut state = self.state.lock();
        while state.step == ticket.step && !state.aborted {
            self.released.wait(&mut state);
        }
        if state.step > ticket.step {
            Ok(ticket.step + 1)
        } else {
            Err(SimError::Aborted)
        }
    }

    /// Report and block until the round closes. Returns the step that the
    /// closed round produced.
    pub fn arrive<F>(&self, outcome: MoveOutcome, on_close: F) -> SimResult<u64>
    where
        F: FnOnce(u64, &RoundSummary),
    {
        match self.try_arrive(outcome, on_close)? {
            Arrival::Closed(step) => Ok(step),
            Arrival::Pending(ticket) => self.wait(ticket),
        }
    }

    /// Poison the barrier and wake all waiters with [`SimError::Aborted`].
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.released.notify_all();
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    pub fn live(&self) -> usize {
        self.state.lock().live
    }

    pub fn step(&self) -> u64 {
        self.state.lock().step
    }
}
