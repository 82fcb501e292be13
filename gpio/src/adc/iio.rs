use crate::adc::AdcChannel;
use crate::{GpioError, GpioResult};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

/// ADC channel exposed by the Linux industrial I/O subsystem,
/// e.g. `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`.
pub struct IioAdcChannel {
    raw_path: PathBuf,
    resolution_bits: u8,
}

impl IioAdcChannel {
    /// Opens the channel whose raw value is exposed at `raw_path`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the file doesn't exist or the resolution is not 1..=31 bits.
    pub fn new(raw_path: impl AsRef<Path>, resolution_bits: u8) -> GpioResult<Self> {
        let raw_path = raw_path.as_ref();
        if !raw_path.exists() || !(1..=31).contains(&resolution_bits) {
            return Err(GpioError::InvalidArgument);
        }
        Ok(IioAdcChannel {
            raw_path: raw_path.to_path_buf(),
            resolution_bits,
        })
    }
}

impl Debug for IioAdcChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "IioAdcChannel({:?})", self.raw_path)
    }
}

impl AdcChannel for IioAdcChannel {
    fn read_raw(&mut self) -> GpioResult<u32> {
        let content = std::fs::read_to_string(&self.raw_path)?;
        content
            .trim()
            .parse()
            .map_err(|_| GpioError::Other("parsing ADC raw value failed".to_string()))
    }

    fn resolution_bits(&self) -> u8 {
        self.resolution_bits
    }
}
