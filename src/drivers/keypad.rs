//! 4×4 matrix keypad: key map, key classification and the row scanner.
//!
//! ## Hardware
//!
//! Rows are push-pull outputs, columns are pulled-down inputs with edge
//! interrupts.  Exactly one row is energized at a time; a pressed key
//! connects its row to its column, so the column reads high only while
//! the scanner sits on that key's row.
//!
//! ```text
//!          col0 col1 col2 col3
//!   row0 │  1    2    3    A
//!   row1 │  4    5    6    B
//!   row2 │  7    8    9    C
//!   row3 │  *    0    #    D
//! ```
//!
//! The column ISRs only flip flags (see [`crate::isr`]); the character is
//! resolved later, at dispatch time, from the current row and the live
//! column levels.

use crate::app::ports::DigitalIo;
use crate::pins::{COLUMN_PINS, ROW_PINS};

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 4;

pub const KEYPAD: [[char; COLUMNS]; ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Function key that opens passcode entry outside Setup.
pub const BEGIN_ENTRY_KEY: char = 'A';

/// Column carrying the function keys `A`–`D`.
const FUNCTION_COLUMN: usize = 3;

/// Character at `(row, col)`.  Out-of-range indices clamp to the last
/// row/column.
pub fn key_at(row: usize, col: usize) -> char {
    KEYPAD[row.min(ROWS - 1)][col.min(COLUMNS - 1)]
}

/// A key resolved from the energized row and the asserted columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `0`–`9`, eligible for passcode entry.
    Digit(char),
    /// `A`–`D` from the last column.
    Function(char),
    /// `*` or `#`: on the digit columns but never part of a passcode.
    Excluded(char),
}

impl Key {
    /// Resolve the pressed key for `row` given the column levels.
    ///
    /// With `digits_first` (Setup, or passcode entry open) an asserted digit
    /// column beats the function column; otherwise the function column
    /// wins, so `A` still opens entry when a digit is held with it.  The
    /// lowest asserted digit column wins when several are high.
    pub fn from_columns(
        row: usize,
        columns: [bool; COLUMNS],
        digits_first: bool,
    ) -> Option<Self> {
        let function = columns[FUNCTION_COLUMN]
            .then(|| Self::Function(key_at(row, FUNCTION_COLUMN)));
        if !digits_first && function.is_some() {
            return function;
        }
        let mut excluded = None;
        for col in 0..FUNCTION_COLUMN {
            if !columns[col] {
                continue;
            }
            let c = key_at(row, col);
            if c.is_ascii_digit() {
                return Some(Self::Digit(c));
            }
            excluded.get_or_insert(Self::Excluded(c));
        }
        function.or(excluded)
    }
}

/// Read the four column inputs.
pub fn read_columns(io: &impl DigitalIo) -> [bool; COLUMNS] {
    COLUMN_PINS.map(|pin| io.read(pin))
}

// ---------------------------------------------------------------------------
// Row scanner
// ---------------------------------------------------------------------------

/// Index of the currently energized row.  Always in `0..ROWS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCursor(usize);

impl RowCursor {
    /// Build a cursor, clamping out-of-range rows to the last one.
    pub fn new(row: usize) -> Self {
        Self(row.min(ROWS - 1))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Self((self.0 + 1) % ROWS)
    }
}

/// Energizes one keypad row at a time.
///
/// Not thread-safe by itself; the owner holds it under the system lock so
/// the dispatcher always sees the row that produced the column edge.
#[derive(Debug, Default)]
pub struct RowScanner {
    cursor: RowCursor,
}

impl RowScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self) -> usize {
        self.cursor.get()
    }

    /// Move to the next row: every other row low first, then the new one high.
    pub fn advance(&mut self, io: &impl DigitalIo) {
        self.cursor = self.cursor.next();
        self.energize(io);
    }

    /// Drive the current row high and all others low.
    pub fn energize(&self, io: &impl DigitalIo) {
        let target = self.cursor.get();
        for (i, &pin) in ROW_PINS.iter().enumerate() {
            if i != target {
                io.write(pin, false);
            }
        }
        io.write(ROW_PINS[target], true);
    }
}
