use crate::keypad::MatrixIo;
use crate::{GpioError, GpioResult};

/// An in-memory key matrix, used instead of real pins when no hardware is attached.
///
/// Keys are pressed and released with [SimulatedMatrix::press] and [SimulatedMatrix::release].
/// A column reads low only while its row is driven active and a key connects the two,
/// just like the real pull-up wiring.
#[derive(Debug)]
pub struct SimulatedMatrix {
    pressed: Vec<Vec<bool>>,
    active_rows: Vec<bool>,
    faulty: bool,
}

impl SimulatedMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        SimulatedMatrix {
            pressed: vec![vec![false; cols]; rows],
            active_rows: vec![false; rows],
            faulty: false,
        }
    }

    pub fn press(&mut self, row: usize, col: usize) {
        self.pressed[row][col] = true;
    }

    pub fn release(&mut self, row: usize, col: usize) {
        self.pressed[row][col] = false;
    }

    /// Makes every following pin access fail with an IO error until cleared.
    pub fn set_faulty(&mut self, faulty: bool) {
        self.faulty = faulty;
    }

    /// Whether the row is currently driven active.
    pub fn is_row_active(&self, row: usize) -> bool {
        self.active_rows[row]
    }

    fn check(&self) -> GpioResult<()> {
        if self.faulty {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        Ok(())
    }
}

impl MatrixIo for SimulatedMatrix {
    fn rows(&self) -> usize {
        self.pressed.len()
    }

    fn cols(&self) -> usize {
        self.pressed.first().map(Vec::len).unwrap_or(0)
    }

    fn set_row_level(&mut self, row: usize, active: bool) -> GpioResult<()> {
        self.check()?;
        let level = self.active_rows.get_mut(row).ok_or(GpioError::InvalidArgument)?;
        *level = active;
        Ok(())
    }

    fn read_column_level(&self, col: usize) -> GpioResult<bool> {
        self.check()?;
        if col >= self.cols() {
            return Err(GpioError::InvalidArgument);
        }
        let connected = self
            .pressed
            .iter()
            .zip(&self.active_rows)
            .any(|(row, &active)| active && row[col]);
        Ok(!connected)
    }
}
