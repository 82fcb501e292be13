//! The temperature sensor, an analog voltage read through an ADC.

use std::sync::atomic::{AtomicU32, Ordering};
use log::{debug, warn};
use grill_gpio::GpioResult;
use grill_gpio::adc::AdcChannel;
use crate::config::SensorConfig;

/// Something that reports a temperature in degrees Celsius.
pub trait TemperatureSensor {
    /// Reads the temperature.
    ///
    /// Never fails: if the hardware can't be read, a default temperature is returned instead.
    fn read_temperature(&mut self) -> f32;
}

/// A sensor whose output voltage is linear in temperature: `V = 0.046 * T - 0.40`.
#[derive(Debug)]
pub struct AdcTemperatureSensor<A: AdcChannel> {
    channel: A,
    /// Voltage at the top of the converter's range, in millivolts.
    reference_mv: u32,
    fallback: f32,
}

impl<A: AdcChannel> AdcTemperatureSensor<A> {
    const VOLTS_PER_DEGREE: f32 = 0.046;
    const OFFSET_VOLTS: f32 = 0.40;

    pub fn new(channel: A, config: &SensorConfig) -> Self {
        AdcTemperatureSensor {
            channel,
            reference_mv: config.reference_mv,
            fallback: config.fallback_temperature,
        }
    }

    /// Converts a raw reading to millivolts, rounding down.
    pub fn to_millivolts(&self, raw: u32) -> u32 {
        let full_scale = self.channel.full_scale().max(1);
        (raw as u64 * self.reference_mv as u64 / full_scale as u64) as u32
    }

    /// Converts millivolts to degrees Celsius.
    pub fn to_celsius(millivolts: u32) -> f32 {
        let volts = millivolts as f32 / 1000.0;
        (volts + Self::OFFSET_VOLTS) / Self::VOLTS_PER_DEGREE
    }

    fn try_read(&mut self) -> GpioResult<f32> {
        let raw = self.channel.read_raw()?;
        let mv = self.to_millivolts(raw);
        let temperature = Self::to_celsius(mv);
        debug!("Sensor: raw {}, {} mV, {:.1} C", raw, mv, temperature);
        Ok(temperature)
    }
}

impl<A: AdcChannel> TemperatureSensor for AdcTemperatureSensor<A> {
    fn read_temperature(&mut self) -> f32 {
        self.try_read().unwrap_or_else(|e| {
            warn!("Failed to read the temperature sensor, assuming {:.1} C: {}", self.fallback, e);
            self.fallback
        })
    }
}

/// The latest sensor temperature, written by the sensor loop and read by the controller.
#[derive(Debug)]
pub struct SharedTemperature(AtomicU32);

impl SharedTemperature {
    pub fn new(temperature: f32) -> Self {
        SharedTemperature(AtomicU32::new(temperature.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, temperature: f32) {
        self.0.store(temperature.to_bits(), Ordering::Relaxed);
    }
}

impl Default for SharedTemperature {
    fn default() -> Self {
        SharedTemperature::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grill_gpio::GpioError;

    #[derive(Debug)]
    struct FakeAdc(Option<u32>);

    impl AdcChannel for FakeAdc {
        fn read_raw(&mut self) -> GpioResult<u32> {
            self.0.ok_or(GpioError::Io(std::io::ErrorKind::TimedOut))
        }

        fn resolution_bits(&self) -> u8 {
            12
        }
    }

    fn sensor(raw: Option<u32>) -> AdcTemperatureSensor<FakeAdc> {
        AdcTemperatureSensor::new(FakeAdc(raw), &SensorConfig::default())
    }

    #[test]
    fn raw_values_follow_the_calibration_curve() {
        let mut zero = sensor(Some(0));
        assert!((zero.read_temperature() - 0.40 / 0.046).abs() < 0.01);

        // 1241 counts of 4095 at 3.3 V is 1000 mV, which is (1.0 + 0.4) / 0.046 degrees.
        let mut one_volt = sensor(Some(1241));
        assert_eq!(one_volt.to_millivolts(1241), 1000);
        assert!((one_volt.read_temperature() - 30.43).abs() < 0.01);

        assert_eq!(sensor(None).to_millivolts(4095), 3300);
    }

    #[test]
    fn read_failure_falls_back_to_the_default() {
        let mut broken = sensor(None);
        assert_eq!(broken.read_temperature(), 25.0);
    }

    #[test]
    fn shared_temperature_keeps_the_exact_value() {
        let shared = SharedTemperature::default();
        assert_eq!(shared.load(), 0.0);
        shared.store(31.25);
        assert_eq!(shared.load(), 31.25);
    }
}
