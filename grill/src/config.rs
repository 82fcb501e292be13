//! Configuration: tuning values from a JSON file and pin assignments from the environment.

use std::collections::HashSet;
use std::env::var_os;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::{info, warn};
use serde::{Serialize, Deserialize};
use grill_gpio::keypad::{DEBOUNCE_INTERVAL_RANGE, EventQueue, KeyMap, SCAN_INTERVAL_RANGE};
use crate::cooking::{BandTable, DEFAULT_SAFE_RANGE, TemperatureRange};
use crate::error::{ConfigError, GrillResult};
use crate::utils::{WithinExt, parse_pin_list};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub keypad: KeypadConfig,
    pub grill: GrillConfig,
    pub sensor: SensorConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct KeypadConfig {
    /// Characters printed on the keypad, row by row.
    pub key_map: Vec<Vec<char>>,
    pub debounce_ms: u64,
    pub scan_interval_ms: u64,
    /// Time given to the column lines after a row is driven.
    pub settle_ms: u64,
    pub queue_capacity: usize,
    /// How long the controller waits for a key before checking its timers again.
    pub dequeue_timeout_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct GrillConfig {
    pub bands: BandTable,
    pub safe_range: TemperatureRange,
    pub status_hold_ms: u64,
    /// How long the "not available" notice of a letter key stays on screen.
    pub notice_hold_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    pub interval_ms: u64,
    /// Temperature reported when the sensor can't be read.
    pub fallback_temperature: f32,
    pub reference_mv: u32,
    pub resolution_bits: u8,
}

impl Config {
    fn path() -> PathBuf {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        PathBuf::from(config_str)
    }

    /// Loads the config file, if there is one.
    ///
    /// # Errors
    /// Fails if the file exists but can't be read or parsed.
    pub fn load_from(config_path: &Path) -> io::Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)?;
        let reader = io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    pub fn save_to(&self, config_path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(config_path)?;
        let writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Loads the config file, saving the defaults when there is none, and validates it.
    ///
    /// Bands that leave part of the safe range unclassified are only warned about.
    pub fn load_or_default() -> GrillResult<Self> {
        Self::load_or_default_from(&Self::path())
    }

    pub fn load_or_default_from(config_path: &Path) -> GrillResult<Self> {
        let config = if let Some(config) = Self::load_from(config_path)? {
            info!("Config loaded.");
            config
        } else {
            info!("Config not found. Using default");
            let config = Config::default();
            config.save_to(config_path)?;
            info!("Default config saved.");
            config
        };
        config.validate()?;

        let gaps = config.grill.unclassified_safe_temperatures();
        if !gaps.is_empty() {
            warn!("No cooking band covers {:?}, though they are in the safe range.", gaps);
        }
        Ok(config)
    }

    /// Checks every value that can be checked without knowing the pins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.keypad.validate()?;
        self.grill.validate()
    }
}

impl KeypadConfig {
    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn key_map(&self) -> Result<KeyMap, ConfigError> {
        KeyMap::new(self.key_map.clone()).map_err(|_| ConfigError::InvalidKeyMap)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let key_map = self.key_map()?;

        let debounce = self.debounce_interval();
        if !debounce.within(DEBOUNCE_INTERVAL_RANGE) {
            return Err(ConfigError::DebounceInterval(debounce));
        }

        let interval = self.scan_interval();
        if !interval.within(SCAN_INTERVAL_RANGE) {
            return Err(ConfigError::ScanInterval(interval));
        }

        // Every row is held for the settle delay, and the whole cycle has to fit in one period.
        let rows = key_map.rows();
        let settle = self.settle_delay();
        if settle * rows as u32 >= interval {
            return Err(ConfigError::ScanTooSlow { rows, settle, interval });
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.dequeue_timeout_ms == 0 {
            return Err(ConfigError::ZeroDequeueTimeout);
        }
        Ok(())
    }
}

impl Default for KeypadConfig {
    fn default() -> Self {
        KeypadConfig {
            key_map: vec![
                vec!['1', '2', '3', 'A'],
                vec!['4', '5', '6', 'B'],
                vec!['7', '8', '9', 'C'],
                vec!['*', '0', '#', 'D'],
            ],
            debounce_ms: 50,
            scan_interval_ms: 10,
            settle_ms: 1,
            queue_capacity: EventQueue::DEFAULT_CAPACITY,
            dequeue_timeout_ms: 100,
        }
    }
}

impl GrillConfig {
    pub fn status_hold(&self) -> Duration {
        Duration::from_millis(self.status_hold_ms)
    }

    pub fn notice_hold(&self) -> Duration {
        Duration::from_millis(self.notice_hold_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bands.validate()?;
        if self.safe_range.min > self.safe_range.max {
            return Err(ConfigError::InvalidSafeRange {
                min: self.safe_range.min,
                max: self.safe_range.max,
            });
        }
        Ok(())
    }

    /// Temperatures of the safe range that no band covers.
    ///
    /// They classify as undetermined while still being safe, which is allowed but most likely a
    /// mistake in the band table.
    pub fn unclassified_safe_temperatures(&self) -> Vec<i32> {
        self.bands.uncovered(self.safe_range)
    }
}

impl Default for GrillConfig {
    fn default() -> Self {
        GrillConfig {
            bands: BandTable::default(),
            safe_range: DEFAULT_SAFE_RANGE,
            status_hold_ms: 2000,
            notice_hold_ms: 1500,
        }
    }
}

impl SensorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            interval_ms: 500,
            fallback_temperature: 25.0,
            reference_mv: 3300,
            resolution_bits: 12,
        }
    }
}

/// Pin assignments, read from `GRILL_*` environment variables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PinConfig {
    pub gpio_chip: PathBuf,
    pub keypad_rows: Vec<usize>,
    pub keypad_cols: Vec<usize>,
    pub lcd_rs: usize,
    pub lcd_e: usize,
    /// D4, D5, D6, D7.
    pub lcd_data: [usize; 4],
    pub sensor_adc: PathBuf,
}

impl PinConfig {
    pub const DEFAULT_GPIO_CHIP: &'static str = "/dev/gpiochip0";
    pub const DEFAULT_SENSOR_ADC: &'static str = "/sys/bus/iio/devices/iio:device0/in_voltage0_raw";

    /// Reads the pin assignments from the environment (including a `.env` file).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| dotenv::var(name).ok())
    }

    /// Reads the pin assignments through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVariable(name));
        let pins = |name: &'static str| -> Result<Vec<usize>, ConfigError> {
            parse_pin_list(&required(name)?).map_err(|e| ConfigError::MalformedVariable {
                name,
                reason: e.to_string(),
            })
        };
        let pin = |name: &'static str| -> Result<usize, ConfigError> {
            match pins(name)?[..] {
                [pin] => Ok(pin),
                _ => Err(ConfigError::MalformedVariable { name, reason: "expected a single pin".into() }),
            }
        };

        let lcd_data = pins("GRILL_LCD_PINS_DATA")?
            .try_into()
            .map_err(|_| ConfigError::MalformedVariable {
                name: "GRILL_LCD_PINS_DATA",
                reason: "expected exactly 4 data pins".into(),
            })?;

        Ok(PinConfig {
            gpio_chip: lookup("GRILL_GPIO_CHIP")
                .unwrap_or_else(|| Self::DEFAULT_GPIO_CHIP.to_string())
                .into(),
            keypad_rows: pins("GRILL_KEYPAD_PINS_ROWS")?,
            keypad_cols: pins("GRILL_KEYPAD_PINS_COLS")?,
            lcd_rs: pin("GRILL_LCD_PIN_RS")?,
            lcd_e: pin("GRILL_LCD_PIN_E")?,
            lcd_data,
            sensor_adc: lookup("GRILL_SENSOR_ADC")
                .unwrap_or_else(|| Self::DEFAULT_SENSOR_ADC.to_string())
                .into(),
        })
    }

    /// Checks the pins against the key map they will scan.
    pub fn validate(&self, key_map: &KeyMap) -> Result<(), ConfigError> {
        if key_map.rows() != self.keypad_rows.len() || key_map.cols() != self.keypad_cols.len() {
            return Err(ConfigError::KeyMapShape {
                map_rows: key_map.rows(),
                map_cols: key_map.cols(),
                rows: self.keypad_rows.len(),
                cols: self.keypad_cols.len(),
            });
        }

        let mut seen = HashSet::new();
        let all_pins = self.keypad_rows.iter()
            .chain(&self.keypad_cols)
            .chain([&self.lcd_rs, &self.lcd_e])
            .chain(&self.lcd_data);
        for &pin in all_pins {
            if !seen.insert(pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
        }
        Ok(())
    }
}
