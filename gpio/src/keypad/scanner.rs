use std::thread::sleep;
use std::time::Duration;
use log::trace;
use crate::GpioResult;
use crate::keypad::MatrixIo;

/// Drives the rows of a key matrix one at a time and samples every column.
#[derive(Debug)]
pub struct MatrixScanner<M: MatrixIo> {
    io: M,
    /// How long a row is held active before its columns are sampled.
    pub settle_delay: Duration,
}

impl<M: MatrixIo> MatrixScanner<M> {
    pub fn new(io: M) -> Self {
        MatrixScanner {
            io,
            settle_delay: Duration::from_millis(1),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn io(&self) -> &M {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut M {
        &mut self.io
    }

    /// Drives every row to its inactive level.
    pub fn release_all(&mut self) -> GpioResult<()> {
        for row in 0..self.io.rows() {
            self.io.set_row_level(row, false)?;
        }
        Ok(())
    }

    /// Runs one full scan cycle.
    ///
    /// Rows are visited in ascending order. For each row, `sink` receives `(row, col, pressed)`
    /// for every column, where `pressed` is the inverted column level.
    ///
    /// The first pin failure aborts the cycle. The row being scanned is still put back to its
    /// inactive level when possible.
    pub fn scan_cycle(&mut self, mut sink: impl FnMut(u8, u8, bool)) -> GpioResult<()> {
        for row in 0..self.io.rows() {
            self.io.set_row_level(row, true)?;
            if !self.settle_delay.is_zero() {
                sleep(self.settle_delay);
            }

            let sampled = self.sample_row(row, &mut sink);
            let restored = self.io.set_row_level(row, false);
            sampled?;
            restored?;
        }
        trace!("Scan cycle over {} rows done.", self.io.rows());
        Ok(())
    }

    fn sample_row(&self, row: usize, sink: &mut impl FnMut(u8, u8, bool)) -> GpioResult<()> {
        for col in 0..self.io.cols() {
            // Pulled up: low means a key connects the column to the active row.
            let pressed = !self.io.read_column_level(col)?;
            sink(row as u8, col as u8, pressed);
        }
        Ok(())
    }
}
