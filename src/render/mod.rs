use parking_lot::Mutex;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crate::simulation::{Board, RoundSummary, SimulationReport, StepObserver, GRID_SIZE};

const CLEAR: &str = "\x1b[H\x1b[J";

/// Background of the map: `X` is off-road, `-` marks lane dividers.
const MAP: [[char; GRID_SIZE]; GRID_SIZE] = [
    ['X', 'X', ' ', '-', ' ', 'X', 'X'],
    ['X', 'X', ' ', '-', ' ', 'X', 'X'],
    [' ', ' ', ' ', '-', ' ', ' ', ' '],
    ['-', '-', '-', 'X', '-', '-', '-'],
    [' ', ' ', ' ', '-', ' ', ' ', ' '],
    ['X', 'X', ' ', '-', ' ', 'X', 'X'],
    ['X', 'X', ' ', '-', ' ', 'X', 'X'],
];

/// Compose one frame: the map with every on-map vehicle's label drawn over
/// its cell, followed by the step line.
pub fn draw_frame(step: u64, board: &Board) -> String {
    let mut cells = MAP;
    for vehicle in board.snapshot() {
        if let Some(index) = vehicle.position.cell_index() {
            cells[index / GRID_SIZE][index % GRID_SIZE] = vehicle.label;
        }
    }

    let mut frame = String::with_capacity(GRID_SIZE * (GRID_SIZE * 2 + 1) + 24);
    for row in cells.iter() {
        for cell in row {
            frame.push(*cell);
            frame.push(' ');
        }
        frame.push('\n');
    }
    frame.push_str(&format!("unit step: {step}\n"));
    frame
}

/// Redraws the map on every step. Write failures are logged and otherwise
/// ignored; the simulation never depends on the display.
pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
    ansi: bool,
    delay: Duration,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(delay: Duration) -> Self {
        Self::new(io::stdout(), true, delay)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, ansi: bool, delay: Duration) -> Self {
        Self {
            out: Mutex::new(out),
            ansi,
            delay,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_frame(&self, step: u64, board: &Board) -> io::Result<()> {
        let mut out = self.out.lock();
        if self.ansi {
            out.write_all(CLEAR.as_bytes())?;
        }
        out.write_all(draw_frame(step, board).as_bytes())?;
        out.flush()
    }
}

impl<W: Write + Send> StepObserver for TerminalRenderer<W> {
    fn step_changed(&self, step: u64, _summary: &RoundSummary, board: &Board) {
        if let Err(err) = self.write_frame(step, board) {
            log::warn!("failed to draw step {step}: {err}");
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    fn simulation_finished(&self, report: &SimulationReport) {
        let mut out = self.out.lock();
        let mut summary = format!("finished in {} unit steps\n", report.steps);
        for vehicle in &report.vehicles {
            summary.push_str(&format!(
                "  {} {}->{}: {} moves, {} waits, done at step {}\n",
                vehicle.label,
                vehicle.origin,
                vehicle.destination,
                vehicle.moves,
                vehicle.blocked(),
                vehicle.finished_step
            ));
        }
        if let Err(err) = out.write_all(summary.as_bytes()).and_then(|_| out.flush()) {
            log::warn!("failed to write summary: {err}");
        }
    }
}
