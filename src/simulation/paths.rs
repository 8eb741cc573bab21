use serde::{Deserialize, Serialize};
use std::fmt;

use super::Position;

/// Named entry/exit points on the edge of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Entry {
    A,
    B,
    C,
    D,
}

impl Entry {
    pub const ALL: [Entry; 4] = [Entry::A, Entry::B, Entry::C, Entry::D];

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Entry::A),
            'B' => Some(Entry::B),
            'C' => Some(Entry::C),
            'D' => Some(Entry::D),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Entry::A => 'A',
            Entry::B => 'B',
            Entry::C => 'C',
            Entry::D => 'D',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

const fn p(row: i32, col: i32) -> Position {
    Position::new(row, col)
}

const X: Position = Position::OUTSIDE;

// A enters at (4,0) heading east, B at (6,4) north, C at (2,6) west and
// D at (0,2) south. Every route ends with the off-grid sentinel.
static ROUTES: [[&[Position]; 4]; 4] = [
    [
        &[p(4, 0), p(4, 1), p(4, 2), p(4, 3), p(4, 4), p(3, 4), p(2, 4), p(2, 3), p(2, 2), p(2, 1), p(2, 0), X],
        &[p(4, 0), p(4, 1), p(4, 2), p(5, 2), p(6, 2), X],
        &[p(4, 0), p(4, 1), p(4, 2), p(4, 3), p(4, 4), p(4, 5), p(4, 6), X],
        &[p(4, 0), p(4, 1), p(4, 2), p(4, 3), p(4, 4), p(3, 4), p(2, 4), p(1, 4), p(0, 4), X],
    ],
    [
        &[p(6, 4), p(5, 4), p(4, 4), p(3, 4), p(2, 4), p(2, 3), p(2, 2), p(2, 1), p(2, 0), X],
        &[p(6, 4), p(5, 4), p(4, 4), p(3, 4), p(2, 4), p(2, 3), p(2, 2), p(3, 2), p(4, 2), p(5, 2), p(6, 2), X],
        &[p(6, 4), p(5, 4), p(4, 4), p(4, 5), p(4, 6), X],
        &[p(6, 4), p(5, 4), p(4, 4), p(3, 4), p(2, 4), p(1, 4), p(0, 4), X],
    ],
    [
        &[p(2, 6), p(2, 5), p(2, 4), p(2, 3), p(2, 2), p(2, 1), p(2, 0), X],
        &[p(2, 6), p(2, 5), p(2, 4), p(2, 3), p(2, 2), p(3, 2), p(4, 2), p(5, 2), p(6, 2), X],
        &[p(2, 6), p(2, 5), p(2, 4), p(2, 3), p(2, 2), p(3, 2), p(4, 2), p(4, 3), p(4, 4), p(4, 5), p(4, 6), X],
        &[p(2, 6), p(2, 5), p(2, 4), p(1, 4), p(0, 4), X],
    ],
    [
        &[p(0, 2), p(1, 2), p(2, 2), p(2, 1), p(2, 0), X],
        &[p(0, 2), p(1, 2), p(2, 2), p(3, 2), p(4, 2), p(5, 2), p(6, 2), X],
        &[p(0, 2), p(1, 2), p(2, 2), p(3, 2), p(4, 2), p(4, 3), p(4, 4), p(4, 5), p(4, 6), X],
        &[p(0, 2), p(1, 2), p(2, 2), p(3, 2), p(4, 2), p(4, 3), p(4, 4), p(3, 4), p(2, 4), p(1, 4), p(0, 4), X],
    ],
];

/// Longest route, sentinel included.
pub const MAX_PATH_LEN: usize = 12;

/// Read-only table of the fixed route for every (origin, destination) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathTable;

impl PathTable {
    /// Full route including the trailing sentinel.
    pub fn route(&self, origin: Entry, destination: Entry) -> &'static [Position] {
        ROUTES[origin.index()][destination.index()]
    }

    /// Cell at `step`; anything past the last real cell is the sentinel.
    pub fn step(&self, origin: Entry, destination: Entry, step: usize) -> Position {
        self.route(origin, destination)
            .get(step)
            .copied()
            .unwrap_or(Position::OUTSIDE)
    }

    /// Number of real cells, excluding the sentinel.
    pub fn cell_count(&self, origin: Entry, destination: Entry) -> usize {
        self.route(origin, destination).len() - 1
    }

    /// Whether the route crosses the admission-controlled area at all.
    pub fn crosses_critical_area(&self, origin: Entry, destination: Entry) -> bool {
        self.route(origin, destination)
            .iter()
            .any(|cell| cell.in_critical_area())
    }
}
