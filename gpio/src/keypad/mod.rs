mod gpio;
mod keyboard;
mod queue;
mod scanner;
mod sim;

use std::fmt::Debug;
use std::time::Duration;
use crate::{GpioError, GpioResult};
pub use gpio::*;
pub use keyboard::*;
pub use queue::*;
pub use scanner::*;
pub use sim::*;

/// Time elapsed since the keyboard driver was started.
pub type Timestamp = Duration;

/// Represents the keys on a 4x4 keypad.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum KeypadKey {
    /// The `1` key.
    Key1,
    /// The `2` key.
    Key2,
    /// The `3` key.
    Key3,
    /// The `4` key.
    Key4,
    /// The `5` key.
    Key5,
    /// The `6` key.
    Key6,
    /// The `7` key.
    Key7,
    /// The `8` key.
    Key8,
    /// The `9` key.
    Key9,
    /// The `0` key.
    Key0,
    /// The `*` key.
    KeyAsterisk,
    /// The `#` key.
    KeyHash,
    /// The `A` key.
    KeyA,
    /// The `B` key.
    KeyB,
    /// The `C` key.
    KeyC,
    /// The `D` key.
    KeyD,
}

impl KeypadKey {
    /// Converts a key map character to a [KeypadKey].
    ///
    /// Returns `None` for characters that aren't printed on a 4x4 keypad.
    pub fn from_char(c: char) -> Option<KeypadKey> {
        use KeypadKey::*;

        let key = match c {
            '1' => Key1,
            '2' => Key2,
            '3' => Key3,
            '4' => Key4,
            '5' => Key5,
            '6' => Key6,
            '7' => Key7,
            '8' => Key8,
            '9' => Key9,
            '0' => Key0,
            '*' => KeyAsterisk,
            '#' => KeyHash,
            'A' => KeyA,
            'B' => KeyB,
            'C' => KeyC,
            'D' => KeyD,
            _ => return None,
        };
        Some(key)
    }

    /// Converts the [KeypadKey] to its corresponding character.
    pub fn to_char(self) -> char {
        use KeypadKey::*;

        match self {
            Key1 => '1',
            Key2 => '2',
            Key3 => '3',
            Key4 => '4',
            Key5 => '5',
            Key6 => '6',
            Key7 => '7',
            Key8 => '8',
            Key9 => '9',
            Key0 => '0',
            KeyAsterisk => '*',
            KeyHash => '#',
            KeyA => 'A',
            KeyB => 'B',
            KeyC => 'C',
            KeyD => 'D',
        }
    }

    /// Gets the decimal digit of a number key.
    pub fn digit(self) -> Option<u8> {
        self.to_char().to_digit(10).map(|d| d as u8)
    }

    /// Whether the key is one of the letter keys, which have no function assigned yet.
    pub fn is_reserved(self) -> bool {
        matches!(self, KeypadKey::KeyA | KeypadKey::KeyB | KeypadKey::KeyC | KeypadKey::KeyD)
    }
}

/// Row-by-column table of the characters printed on the keypad.
///
/// Fixed once the keyboard is created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyMap {
    symbols: Vec<Vec<char>>,
}

impl KeyMap {
    /// Creates a key map from its rows.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the map is empty, ragged, or has more than 255 rows or columns.
    pub fn new(symbols: Vec<Vec<char>>) -> GpioResult<Self> {
        let cols = symbols.first().map(Vec::len).unwrap_or(0);
        if cols == 0 || symbols.len() > u8::MAX as usize || cols > u8::MAX as usize {
            return Err(GpioError::InvalidArgument);
        }
        if symbols.iter().any(|row| row.len() != cols) {
            return Err(GpioError::InvalidArgument);
        }
        Ok(KeyMap { symbols })
    }

    pub fn rows(&self) -> usize {
        self.symbols.len()
    }

    pub fn cols(&self) -> usize {
        self.symbols[0].len()
    }

    /// Gets the character at the given position.
    pub fn symbol(&self, row: u8, col: u8) -> Option<char> {
        self.symbols.get(row as usize)?.get(col as usize).copied()
    }
}

impl Default for KeyMap {
    /// The usual 4x4 membrane keypad layout.
    fn default() -> Self {
        KeyMap {
            symbols: vec![
                vec!['1', '2', '3', 'A'],
                vec!['4', '5', '6', 'B'],
                vec!['7', '8', '9', 'C'],
                vec!['*', '0', '#', 'D'],
            ],
        }
    }
}

/// A key press or release accepted by the debouncer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    pub row: u8,
    pub col: u8,
    /// The key map character at `(row, col)`.
    pub symbol: char,
    /// `true` when the key went down, `false` when it was released.
    pub pressed: bool,
    pub timestamp: Timestamp,
}

impl KeyEvent {
    /// The keypad key this event refers to, if the symbol is a known key.
    pub fn key(&self) -> Option<KeypadKey> {
        KeypadKey::from_char(self.symbol)
    }
}

/// The row and column lines of a key matrix.
///
/// Rows are outputs, columns are inputs with pull-ups. Column levels are electrical levels:
/// `true` while no key connects the column to an active row.
pub trait MatrixIo: Debug {
    /// Number of row lines.
    fn rows(&self) -> usize;

    /// Number of column lines.
    fn cols(&self) -> usize;

    /// Drives the row to its active (`true`) or inactive (`false`) level.
    fn set_row_level(&mut self, row: usize, active: bool) -> GpioResult<()>;

    /// Reads the electrical level of the column.
    fn read_column_level(&self, col: usize) -> GpioResult<bool>;
}
