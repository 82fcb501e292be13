//! The grill controller: temperature entry, classification and the status check.

use std::time::{Duration, Instant};
use log::{debug, info, warn};
use grill_gpio::keypad::{KeyEvent, KeypadKey};
use grill_gpio::lcd::LCD_ROWS;
use crate::config::GrillConfig;
use crate::cooking::{BandTable, Classification, CookingBand, TemperatureRange};
use crate::sensor::SharedTemperature;

/// Most digits a temperature can have.
pub const MAX_ENTRY_DIGITS: usize = 3;

/// What the controller is doing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GrillMode {
    /// Waiting for the first digit.
    #[default]
    AskTemperature,
    /// At least one digit was entered.
    InputtingTemperature,
    /// Showing the band of the confirmed temperature.
    ShowingTerm,
    /// Showing whether the temperature is safe, until `until`. Goes back to
    /// [GrillMode::ShowingTerm] on its own.
    ShowingStatus { until: Instant },
}

/// What a key did to the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyOutcome {
    /// The state changed and the screen should be redrawn.
    Changed,
    /// The key was accepted but had no effect, like a fourth digit or `#` with nothing entered.
    Unchanged,
    /// The key means nothing in the current mode.
    Rejected,
    /// One of the letter keys, which have no function yet.
    Reserved(KeypadKey),
}

/// The data the controller works on.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GrillState {
    pub mode: GrillMode,
    /// Digits entered so far, at most [MAX_ENTRY_DIGITS].
    pub entry_buffer: String,
    pub input_temperature: Option<i32>,
    pub band: CookingBand,
    pub safe: bool,
}

/// The grill controller.
///
/// Owned by the controller activity. The only thing it shares is the sensor temperature, which
/// it reads for diagnostics.
#[derive(Debug)]
pub struct Grill<'a> {
    state: GrillState,
    bands: BandTable,
    safe_range: TemperatureRange,
    status_hold: Duration,
    sensor: &'a SharedTemperature,
}

impl<'a> Grill<'a> {
    pub fn new(config: &GrillConfig, sensor: &'a SharedTemperature) -> Self {
        Grill {
            state: GrillState::default(),
            bands: config.bands,
            safe_range: config.safe_range,
            status_hold: config.status_hold(),
            sensor,
        }
    }

    pub fn state(&self) -> &GrillState {
        &self.state
    }

    pub fn mode(&self) -> GrillMode {
        self.state.mode
    }

    /// The latest sensor temperature.
    pub fn sensor_temperature(&self) -> f32 {
        self.sensor.load()
    }

    /// Clears the entry and the result and goes back to asking for a temperature.
    pub fn reset(&mut self) {
        self.state = GrillState::default();
        info!("Grill reset.");
    }

    /// Applies a key event. Only presses do anything.
    pub fn handle_event(&mut self, event: &KeyEvent, now: Instant) -> KeyOutcome {
        if !event.pressed {
            return KeyOutcome::Unchanged;
        }
        match event.key() {
            Some(key) => self.handle_key(key, now),
            None => {
                warn!("Unknown key '{}' at [{},{}]", event.symbol, event.row, event.col);
                KeyOutcome::Rejected
            }
        }
    }

    /// Applies a key press.
    pub fn handle_key(&mut self, key: KeypadKey, now: Instant) -> KeyOutcome {
        self.poll(now);

        // Only '#' and '*' act on a shown term, so letters there are plain invalid keys.
        if key.is_reserved() && self.state.mode != GrillMode::ShowingTerm {
            info!("Key '{}' has no function.", key.to_char());
            return KeyOutcome::Reserved(key);
        }
        if key == KeypadKey::KeyAsterisk {
            self.reset();
            return KeyOutcome::Changed;
        }

        let outcome = match self.state.mode {
            GrillMode::AskTemperature | GrillMode::InputtingTemperature => self.handle_entry_key(key),
            GrillMode::ShowingTerm if key == KeypadKey::KeyHash => {
                self.state.mode = GrillMode::ShowingStatus { until: now + self.status_hold };
                KeyOutcome::Changed
            }
            GrillMode::ShowingTerm | GrillMode::ShowingStatus { .. } => KeyOutcome::Rejected,
        };

        match outcome {
            KeyOutcome::Rejected => {
                warn!("Key '{}' is not valid in {:?}.", key.to_char(), self.state.mode);
            }
            KeyOutcome::Changed => {
                debug!(
                    "Now {:?}, entered {:?}, sensor at {:.1} C.",
                    self.state.mode, self.state.input_temperature, self.sensor_temperature()
                );
            }
            _ => {}
        }
        outcome
    }

    fn handle_entry_key(&mut self, key: KeypadKey) -> KeyOutcome {
        if let Some(digit) = key.digit() {
            if self.state.entry_buffer.len() >= MAX_ENTRY_DIGITS {
                debug!("Entry is full, ignoring '{}'.", digit);
                return KeyOutcome::Unchanged;
            }
            self.state.entry_buffer.push(key.to_char());
            self.state.mode = GrillMode::InputtingTemperature;
            return KeyOutcome::Changed;
        }

        if key != KeypadKey::KeyHash {
            return KeyOutcome::Rejected;
        }
        let Ok(temperature) = self.state.entry_buffer.parse::<i32>() else {
            debug!("Nothing entered, ignoring '#'.");
            return KeyOutcome::Unchanged;
        };

        let Classification { band, safe, .. } = Classification::new(temperature, &self.bands, &self.safe_range);
        self.state.input_temperature = Some(temperature);
        self.state.band = band;
        self.state.safe = safe;
        self.state.mode = GrillMode::ShowingTerm;
        if safe {
            info!("{} C is {}.", temperature, band.name());
        } else {
            warn!("{} C is {} and outside the safe range.", temperature, band.name());
        }
        KeyOutcome::Changed
    }

    /// Ends the status check once its time is up. Returns `true` if the mode changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state.mode {
            GrillMode::ShowingStatus { until } if now >= until => {
                self.state.mode = GrillMode::ShowingTerm;
                debug!("Status check over.");
                true
            }
            _ => false,
        }
    }

    /// Time left of the status check, if one is on.
    pub fn hold_remaining(&self, now: Instant) -> Option<Duration> {
        match self.state.mode {
            GrillMode::ShowingStatus { until } => Some(until.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// The text for each row of the display.
    pub fn screen(&self) -> [String; LCD_ROWS] {
        let state = &self.state;
        match state.mode {
            GrillMode::AskTemperature => ["Enter Temp (C):".into(), "Use 0-9, # OK".into()],
            GrillMode::InputtingTemperature => {
                let digits = if state.entry_buffer.is_empty() { "__" } else { &state.entry_buffer };
                ["Temperature:".into(), format!("{} C (# to OK)", digits)]
            }
            GrillMode::ShowingTerm => {
                let term = match (state.band, state.safe) {
                    (CookingBand::Undetermined, true) => "Unknown Term",
                    (CookingBand::Undetermined, false) => "Out of Range",
                    (band, _) => band.name(),
                };
                let warning = if state.safe { "" } else { "OH! BE CAREFUL" };
                [term.into(), warning.into()]
            }
            GrillMode::ShowingStatus { .. } => {
                let status = match state.input_temperature {
                    Some(t) => format!("{}C {}", t, if state.safe { "SAFE" } else { "UNSAFE" }),
                    None => "No temperature".into(),
                };
                ["Status Check:".into(), status]
            }
        }
    }

    /// The notice shown for a letter key.
    pub fn reserved_notice(key: KeypadKey) -> [String; LCD_ROWS] {
        [format!("Function {}", key.to_char()), "Not Available".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use KeypadKey::*;

    fn press(grill: &mut Grill, keys: &[KeypadKey], now: Instant) -> Vec<KeyOutcome> {
        keys.iter().map(|&key| grill.handle_key(key, now)).collect()
    }

    #[test]
    fn classifies_a_safe_temperature() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();

        press(&mut grill, &[Key2, Key5, KeyHash], now);

        let state = grill.state();
        assert_eq!(state.mode, GrillMode::ShowingTerm);
        assert_eq!(state.input_temperature, Some(25));
        assert_eq!(state.band, CookingBand::BlueRare);
        assert!(state.safe);
        assert_eq!(grill.screen(), ["BLUE RARE".to_string(), String::new()]);
    }

    #[test]
    fn classifies_an_unsafe_temperature() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);

        press(&mut grill, &[Key4, Key5, KeyHash], Instant::now());

        let state = grill.state();
        assert_eq!(state.mode, GrillMode::ShowingTerm);
        assert_eq!(state.band, CookingBand::Undetermined);
        assert!(!state.safe);
        assert_eq!(grill.screen(), ["Out of Range".to_string(), "OH! BE CAREFUL".to_string()]);
    }

    #[test]
    fn confirming_nothing_does_nothing() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);

        assert_eq!(grill.handle_key(KeyHash, Instant::now()), KeyOutcome::Unchanged);
        assert_eq!(grill.state(), &GrillState::default());
    }

    #[test]
    fn fourth_digit_is_ignored() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();

        let outcomes = press(&mut grill, &[Key1, Key2, Key3, Key4], now);

        assert_eq!(outcomes.last(), Some(&KeyOutcome::Unchanged));
        assert_eq!(grill.state().entry_buffer, "123");
        assert_eq!(grill.screen()[1], "123 C (# to OK)");
        press(&mut grill, &[KeyHash], now);
        assert_eq!(grill.state().input_temperature, Some(123));
    }

    #[test]
    fn leading_zeros_are_allowed() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);

        press(&mut grill, &[Key0, Key3, Key3, KeyHash], Instant::now());

        assert_eq!(grill.state().input_temperature, Some(33));
        assert_eq!(grill.state().band, CookingBand::WellDone);
    }

    #[test]
    fn status_check_reverts_on_its_own() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        press(&mut grill, &[Key3, Key8, KeyHash], now);

        assert_eq!(grill.handle_key(KeyHash, now), KeyOutcome::Changed);
        assert!(matches!(grill.mode(), GrillMode::ShowingStatus { .. }));
        assert_eq!(grill.screen(), ["Status Check:".to_string(), "38C SAFE".to_string()]);
        assert_eq!(grill.hold_remaining(now), Some(Duration::from_millis(2000)));

        assert!(!grill.poll(now + Duration::from_millis(1999)));
        assert!(grill.poll(now + Duration::from_millis(2000)));
        assert_eq!(grill.mode(), GrillMode::ShowingTerm);
        assert_eq!(grill.hold_remaining(now + Duration::from_millis(2000)), None);
        assert_eq!(grill.state().band, CookingBand::SoleRare);
    }

    #[test]
    fn digits_are_rejected_while_showing_the_term() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        press(&mut grill, &[Key3, Key0, KeyHash], now);
        let before = grill.state().clone();

        assert_eq!(grill.handle_key(Key7, now), KeyOutcome::Rejected);
        assert_eq!(grill.state(), &before);
    }

    #[test]
    fn status_check_only_yields_to_reset() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        press(&mut grill, &[Key3, Key0, KeyHash, KeyHash], now);

        assert_eq!(grill.handle_key(KeyHash, now), KeyOutcome::Rejected);
        assert_eq!(grill.handle_key(Key1, now), KeyOutcome::Rejected);
        assert!(matches!(grill.mode(), GrillMode::ShowingStatus { .. }));

        // A key arriving after the hold lands in the term screen.
        let later = now + Duration::from_secs(3);
        assert_eq!(grill.handle_key(KeyHash, later), KeyOutcome::Changed);
        assert!(matches!(grill.mode(), GrillMode::ShowingStatus { .. }));
    }

    #[test]
    fn reset_works_from_every_mode() {
        let sensor = SharedTemperature::default();
        let now = Instant::now();
        let paths: [&[KeypadKey]; 5] = [
            &[],
            &[Key2],
            &[Key2, Key7, KeyHash],
            &[Key9, Key9, KeyHash, KeyHash],
            &[KeyAsterisk],
        ];

        for path in paths {
            let mut grill = Grill::new(&GrillConfig::default(), &sensor);
            press(&mut grill, path, now);
            assert_eq!(grill.handle_key(KeyAsterisk, now), KeyOutcome::Changed);
            assert_eq!(grill.state(), &GrillState::default(), "after {:?}", path);
            assert_eq!(grill.state().band, CookingBand::Undetermined);
        }
    }

    #[test]
    fn letter_keys_are_reserved_while_entering() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        press(&mut grill, &[Key2], now);

        assert_eq!(grill.handle_key(KeyB, now), KeyOutcome::Reserved(KeyB));
        assert_eq!(grill.state().entry_buffer, "2");
        assert_eq!(
            Grill::reserved_notice(KeyB),
            ["Function B".to_string(), "Not Available".to_string()]
        );
    }

    #[test]
    fn letter_keys_are_rejected_on_a_shown_term() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        press(&mut grill, &[Key2, Key7, KeyHash], now);
        let before = grill.state().clone();

        assert_eq!(grill.handle_key(KeyA, now), KeyOutcome::Rejected);
        assert_eq!(grill.handle_key(KeyD, now), KeyOutcome::Rejected);
        assert_eq!(grill.state(), &before);
    }

    #[test]
    fn releases_and_unknown_symbols_are_ignored() {
        let sensor = SharedTemperature::default();
        let mut grill = Grill::new(&GrillConfig::default(), &sensor);
        let now = Instant::now();
        let event = |symbol, pressed| KeyEvent { row: 0, col: 0, symbol, pressed, timestamp: Duration::ZERO };

        assert_eq!(grill.handle_event(&event('5', false), now), KeyOutcome::Unchanged);
        assert_eq!(grill.handle_event(&event('?', true), now), KeyOutcome::Rejected);
        assert_eq!(grill.handle_event(&event('5', true), now), KeyOutcome::Changed);
        assert_eq!(grill.state().entry_buffer, "5");
    }

    #[test]
    fn inside_safe_range_without_a_band_is_unknown() {
        let sensor = SharedTemperature::new(22.5);
        let config = GrillConfig {
            bands: BandTable {
                medium_rare: TemperatureRange::new(27, 30),
                ..BandTable::default()
            },
            ..GrillConfig::default()
        };
        let mut grill = Grill::new(&config, &sensor);

        press(&mut grill, &[Key2, Key6, KeyHash], Instant::now());

        assert_eq!(grill.state().band, CookingBand::Undetermined);
        assert!(grill.state().safe);
        assert_eq!(grill.screen(), ["Unknown Term".to_string(), String::new()]);
        assert_eq!(grill.sensor_temperature(), 22.5);
    }
}
