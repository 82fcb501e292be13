//! Errors of the grill controller.
//!
//! All of these are startup errors. At runtime, hardware failures are logged and retried by the
//! activity that hit them, and nothing reaches the controller.

use grill_gpio::GpioError;
use grill_gpio::keypad::QueueError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration, detected before any activity starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("band {name} has min {min} above max {max}")]
    InvalidInterval { name: &'static str, min: i32, max: i32 },
    #[error("band {lower} must end below the start of {upper}")]
    OverlappingBands { lower: &'static str, upper: &'static str },
    #[error("safe range has min {min} above max {max}")]
    InvalidSafeRange { min: i32, max: i32 },
    #[error("debounce interval {0:?} is outside 10..=200 ms")]
    DebounceInterval(Duration),
    #[error("scan interval {0:?} is outside 5..=50 ms")]
    ScanInterval(Duration),
    #[error("scanning {rows} rows with {settle:?} settle time doesn't fit in a {interval:?} scan period")]
    ScanTooSlow { rows: usize, settle: Duration, interval: Duration },
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,
    #[error("dequeue timeout must be at least 1 ms")]
    ZeroDequeueTimeout,
    #[error("key map must be a non-empty rectangle of at most 255x255 keys")]
    InvalidKeyMap,
    #[error("key map is {map_rows}x{map_cols} but the keypad has {rows} rows and {cols} columns")]
    KeyMapShape { map_rows: usize, map_cols: usize, rows: usize, cols: usize },
    #[error("pin {0} is assigned more than once")]
    DuplicatePin(usize),
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),
    #[error("environment variable {name} is malformed: {reason}")]
    MalformedVariable { name: &'static str, reason: String },
}

/// Any error that aborts startup.
#[derive(Debug, Error)]
pub enum GrillError {
    #[error("config file error: {0}")]
    ConfigFile(#[from] io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("resource exhaustion: {0}")]
    Queue(#[from] QueueError),
    #[error("hardware error: {0}")]
    Gpio(#[from] GpioError),
}

pub type GrillResult<T> = Result<T, GrillError>;
