//! Character LCDs.
pub mod hd44780;

use std::fmt::Debug;
use crate::GpioResult;

/// Visible columns of the 16x2 character display.
pub const LCD_COLUMNS: usize = 16;
/// Visible rows of the 16x2 character display.
pub const LCD_ROWS: usize = 2;

/// A fixed-size text surface, addressed by column and row.
pub trait TextDisplay: Debug {
    /// Clears the display and moves the cursor home.
    fn clear(&mut self) -> GpioResult<()>;

    /// Moves the cursor to the given column and row.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the position is outside the display.
    fn goto(&mut self, col: usize, row: usize) -> GpioResult<()>;

    /// Writes text at the cursor.
    fn write(&mut self, text: &str) -> GpioResult<()>;
}
