use std::fmt::{Debug, Formatter};
use crate::{GpioError, GpioInput, GpioOutput, GpioResult};
use crate::keypad::MatrixIo;

/// The `GpioMatrixIo` struct connects a key matrix to GPIO pins.
///
/// Row outputs are expected to be configured active-low, so writing `true` pulls the row down.
/// Column inputs are expected to be pulled up and read with the default (active-high) level,
/// so they report the electrical level of the line.
pub struct GpioMatrixIo<'a> {
    rows: Vec<Box<dyn GpioOutput + 'a>>,
    cols: Vec<Box<dyn GpioInput + 'a>>,
}

impl Debug for GpioMatrixIo<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpioMatrixIo({:?}, {:?})", self.rows, self.cols)
    }
}

impl<'a> GpioMatrixIo<'a> {
    /// Creates a new `GpioMatrixIo` from the row outputs and column inputs.
    pub fn new(rows: Vec<Box<dyn GpioOutput + 'a>>, cols: Vec<Box<dyn GpioInput + 'a>>) -> Self {
        GpioMatrixIo { rows, cols }
    }
}

impl MatrixIo for GpioMatrixIo<'_> {
    fn rows(&self) -> usize {
        self.rows.len()
    }

    fn cols(&self) -> usize {
        self.cols.len()
    }

    fn set_row_level(&mut self, row: usize, active: bool) -> GpioResult<()> {
        self.rows.get(row).ok_or(GpioError::InvalidArgument)?.write(active)
    }

    fn read_column_level(&self, col: usize) -> GpioResult<bool> {
        self.cols.get(col).ok_or(GpioError::InvalidArgument)?.read()
    }
}
