mod gpio;

use crate::{GpioError, GpioResult};
pub use gpio::*;
use std::fmt::Debug;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// The instructions of the HD44780 used by this crate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    /// Clears the display and sets the cursor to the home position.
    ClearDisplay,
    EntryMode { direction: CursorDirection, shift: bool },
    DisplayControl { display_on: bool, cursor_on: bool, blink_on: bool },
    /// The data length is always 4 bits.
    FunctionSet { two_lines: bool, large_font: bool },
    SetDdramAddress(u8),
}

impl Command {
    /// Encodes the instruction byte.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if a DDRAM address doesn't fit in 7 bits.
    pub fn encode(self) -> GpioResult<u8> {
        let flag = |on: bool, bit: u8| if on { bit } else { 0 };
        let byte = match self {
            Command::ClearDisplay => 0b0000_0001,
            Command::EntryMode { direction, shift } => {
                0b0000_0100 | flag(direction == CursorDirection::Right, 0b10) | flag(shift, 0b01)
            }
            Command::DisplayControl { display_on, cursor_on, blink_on } => {
                0b0000_1000 | flag(display_on, 0b100) | flag(cursor_on, 0b010) | flag(blink_on, 0b001)
            }
            Command::FunctionSet { two_lines, large_font } => {
                0b0010_0000 | flag(two_lines, 0b1000) | flag(large_font, 0b0100)
            }
            Command::SetDdramAddress(address) => {
                if address > 0b0111_1111 {
                    return Err(GpioError::InvalidArgument);
                }
                0b1000_0000 | address
            }
        };
        Ok(byte)
    }
}

pub trait HD44780Driver: Debug {
    /// Initializes the HD44780 controller: display on, cursor off, cleared, writing left to right.
    fn init(&mut self, multiline: bool) -> GpioResult<()>;

    /// Sends an instruction.
    fn execute(&mut self, command: Command) -> GpioResult<()> {
        self.send_command(command.encode()?)
    }

    /// Sends a raw instruction byte with RS low.
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends a data byte with RS high.
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}
