//! Analog inputs.
mod iio;

use std::fmt::Debug;
use crate::GpioResult;
pub use iio::*;

/// A single analog input channel.
pub trait AdcChannel: Debug + Send {
    /// Reads the raw conversion result.
    fn read_raw(&mut self) -> GpioResult<u32>;

    /// Resolution of the converter in bits.
    fn resolution_bits(&self) -> u8;

    /// Largest raw value the converter can return.
    fn full_scale(&self) -> u32 {
        (1u32 << self.resolution_bits()) - 1
    }
}
