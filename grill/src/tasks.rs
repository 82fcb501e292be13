//! The loops run by the background activities.

use std::time::Duration;
use log::{debug, error};
use grill_gpio::keypad::{MatrixIo, MatrixKeyboard};
use crate::schedule::PeriodicSchedule;
use crate::sensor::{SharedTemperature, TemperatureSensor};

/// How often the scanner logs the keyboard statistics.
const STATS_PERIOD: Duration = Duration::from_secs(60);

/// Runs one scan cycle. A hardware failure is logged, and the next cycle tries again.
pub fn scan_step<M: MatrixIo>(keyboard: &mut MatrixKeyboard<'_, M>) -> bool {
    match keyboard.poll() {
        Ok(_) => true,
        Err(e) => {
            error!("Scan cycle failed: {}", e);
            false
        }
    }
}

/// Scans the keyboard at its scan interval, forever.
pub fn run_scanner<M: MatrixIo>(keyboard: &mut MatrixKeyboard<'_, M>) -> ! {
    let mut schedule = PeriodicSchedule::new(keyboard.scan_interval());
    let cycles_per_report = (STATS_PERIOD.as_millis() / keyboard.scan_interval().as_millis().max(1)).max(1) as u64;
    let mut cycle = 0u64;
    loop {
        scan_step(keyboard);

        cycle += 1;
        if cycle % cycles_per_report == 0 {
            debug!("{:?}", keyboard.stats());
        }
        schedule.wait();
    }
}

/// Reads the sensor once and publishes the temperature.
pub fn sensor_step(sensor: &mut impl TemperatureSensor, shared: &SharedTemperature) -> f32 {
    let temperature = sensor.read_temperature();
    shared.store(temperature);
    temperature
}

/// Reads the sensor every `period`, forever.
pub fn run_sensor(sensor: &mut impl TemperatureSensor, shared: &SharedTemperature, period: Duration) -> ! {
    let mut schedule = PeriodicSchedule::new(period);
    loop {
        sensor_step(sensor, shared);
        schedule.wait();
    }
}
