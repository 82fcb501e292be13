//! Grill controller: reads a temperature from a 4x4 keypad, tells how well the meat is done and
//! warns when the temperature is outside the safe range.

pub mod app;
pub mod config;
pub mod cooking;
pub mod error;
pub mod grill;
pub mod schedule;
pub mod sensor;
pub mod tasks;
pub mod utils;
