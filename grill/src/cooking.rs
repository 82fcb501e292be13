//! Cooking bands and the safe temperature range.

use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// A closed interval of whole degrees Celsius.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct TemperatureRange {
    pub min: i32,
    pub max: i32,
}

impl TemperatureRange {
    pub const fn new(min: i32, max: i32) -> Self {
        TemperatureRange { min, max }
    }

    pub fn contains(&self, temperature: i32) -> bool {
        (self.min..=self.max).contains(&temperature)
    }
}

/// How well the meat is done, decided from the entered temperature.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum CookingBand {
    BlueRare,
    MediumRare,
    WellDone,
    SoleRare,
    /// The temperature falls in none of the bands.
    #[default]
    Undetermined,
}

impl CookingBand {
    /// Display name of the band.
    pub fn name(self) -> &'static str {
        match self {
            CookingBand::BlueRare => "BLUE RARE",
            CookingBand::MediumRare => "MEDIUM RARE",
            CookingBand::WellDone => "WELL DONE",
            CookingBand::SoleRare => "SOLE RARE",
            CookingBand::Undetermined => "UNDETERMINED",
        }
    }
}

/// Temperature interval of every named cooking band.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq)]
pub struct BandTable {
    pub blue_rare: TemperatureRange,
    pub medium_rare: TemperatureRange,
    pub well_done: TemperatureRange,
    pub sole_rare: TemperatureRange,
}

impl Default for BandTable {
    fn default() -> Self {
        BandTable {
            blue_rare: TemperatureRange::new(20, 25),
            medium_rare: TemperatureRange::new(26, 30),
            well_done: TemperatureRange::new(31, 35),
            sole_rare: TemperatureRange::new(36, 40),
        }
    }
}

impl BandTable {
    /// Every named band with its interval, in increasing order.
    pub fn entries(&self) -> [(CookingBand, TemperatureRange); 4] {
        [
            (CookingBand::BlueRare, self.blue_rare),
            (CookingBand::MediumRare, self.medium_rare),
            (CookingBand::WellDone, self.well_done),
            (CookingBand::SoleRare, self.sole_rare),
        ]
    }

    /// Checks that every interval is well-formed and that the bands are disjoint and increasing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = self.entries();
        for (band, range) in entries {
            if range.min > range.max {
                return Err(ConfigError::InvalidInterval { name: band.name(), min: range.min, max: range.max });
            }
        }
        for pair in entries.windows(2) {
            let ((lower, lower_range), (upper, upper_range)) = (pair[0], pair[1]);
            if lower_range.max >= upper_range.min {
                return Err(ConfigError::OverlappingBands { lower: lower.name(), upper: upper.name() });
            }
        }
        Ok(())
    }

    /// Finds the band of a temperature.
    pub fn classify(&self, temperature: i32) -> CookingBand {
        self.entries()
            .into_iter()
            .find(|(_, range)| range.contains(temperature))
            .map_or(CookingBand::Undetermined, |(band, _)| band)
    }

    /// Temperatures inside `range` that no band covers.
    pub fn uncovered(&self, range: TemperatureRange) -> Vec<i32> {
        (range.min..=range.max)
            .filter(|&t| self.classify(t) == CookingBand::Undetermined)
            .collect()
    }
}

/// The outcome of confirming an entered temperature.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    pub temperature: i32,
    pub band: CookingBand,
    /// Whether the temperature is inside the safe range, regardless of its band.
    pub safe: bool,
}

impl Classification {
    pub fn new(temperature: i32, bands: &BandTable, safe_range: &TemperatureRange) -> Self {
        Classification {
            temperature,
            band: bands.classify(temperature),
            safe: safe_range.contains(temperature),
        }
    }
}

/// The default safe range, 20 to 40 degrees.
pub const DEFAULT_SAFE_RANGE: TemperatureRange = TemperatureRange::new(20, 40);
