use std::fmt::{Debug, Formatter};
use std::time::Duration;
use crate::keypad::{KeyEvent, KeyMap, Timestamp};

/// Debounce state of a single key of the matrix.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MatrixCell {
    pub last_accepted_level: bool,
    pub last_change_time: Timestamp,
}

/// A per-key timer gate that turns raw matrix samples into key events.
///
/// A sample is accepted only if it differs from the last accepted level of its key and at least
/// [TimedDebouncer::interval] has passed since that key last changed. Samples arriving inside the
/// window are dropped, not delayed: the key has to still be in the new state on a later scan.
pub struct TimedDebouncer {
    key_map: KeyMap,
    cells: Vec<MatrixCell>,
    interval: Duration,
    rejections: u32,
}

impl TimedDebouncer {
    pub fn new(key_map: KeyMap) -> Self {
        let cells = vec![MatrixCell::default(); key_map.rows() * key_map.cols()];
        Self {
            key_map,
            cells,
            interval: Duration::from_millis(50),
            rejections: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Gets the debounce state of a key.
    pub fn cell(&self, row: u8, col: u8) -> Option<&MatrixCell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// How many level changes were dropped for arriving inside the debounce window.
    pub fn rejections(&self) -> u32 {
        self.rejections
    }

    pub fn reset_rejections(&mut self) {
        self.rejections = 0;
    }

    /// Feeds one raw sample of the key at `(row, col)` taken at `now`.
    ///
    /// Returns the resulting event if the sample is accepted as a press or release.
    /// Samples for positions outside the key map are ignored.
    pub fn accept(&mut self, row: u8, col: u8, raw_level: bool, now: Timestamp) -> Option<KeyEvent> {
        let index = self.index(row, col)?;
        let cell = &mut self.cells[index];

        if raw_level == cell.last_accepted_level {
            return None;
        }

        // Inclusive, so a key that is stable for exactly the interval still counts.
        if now.saturating_sub(cell.last_change_time) < self.interval {
            self.rejections = self.rejections.saturating_add(1);
            return None;
        }

        cell.last_accepted_level = raw_level;
        cell.last_change_time = now;

        Some(KeyEvent {
            row,
            col,
            symbol: self.key_map.symbol(row, col)?,
            pressed: raw_level,
            timestamp: now,
        })
    }

    fn index(&self, row: u8, col: u8) -> Option<usize> {
        let (row, col) = (row as usize, col as usize);
        if row < self.key_map.rows() && col < self.key_map.cols() {
            Some(row * self.key_map.cols() + col)
        } else {
            None
        }
    }
}

impl Debug for TimedDebouncer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimedDebouncer({}x{}, {:?})", self.key_map.rows(), self.key_map.cols(), self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Timestamp {
        Duration::from_millis(ms)
    }

    #[test]
    fn first_press_after_interval_is_accepted() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        let event = debouncer.accept(1, 1, true, ms(60)).expect("press accepted");

        assert_eq!(event.symbol, '5');
        assert!(event.pressed);
        assert_eq!(event.timestamp, ms(60));
        assert_eq!(debouncer.cell(1, 1).unwrap().last_change_time, ms(60));
    }

    #[test]
    fn unchanged_level_produces_nothing() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        assert_eq!(debouncer.accept(0, 0, false, ms(500)), None);
        assert_eq!(debouncer.rejections(), 0);
    }

    #[test]
    fn bounces_inside_the_window_are_rejected_not_delayed() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        assert!(debouncer.accept(0, 0, true, ms(100)).is_some());

        // Contact bounce right after the press.
        assert_eq!(debouncer.accept(0, 0, false, ms(102)), None);
        assert_eq!(debouncer.accept(0, 0, true, ms(104)), None);
        assert_eq!(debouncer.accept(0, 0, false, ms(110)), None);
        assert_eq!(debouncer.rejections(), 2);

        // Key is back to pressed by the time the window is over: nothing to report.
        assert_eq!(debouncer.accept(0, 0, true, ms(160)), None);
        assert!(debouncer.cell(0, 0).unwrap().last_accepted_level);
    }

    #[test]
    fn change_exactly_at_the_boundary_is_accepted() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        debouncer.accept(3, 2, true, ms(50)).expect("press");
        let release = debouncer.accept(3, 2, false, ms(100)).expect("release at boundary");

        assert_eq!(release.symbol, '#');
        assert!(!release.pressed);
    }

    #[test]
    fn press_during_startup_window_is_rejected() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        assert_eq!(debouncer.accept(0, 1, true, ms(10)), None);
        assert!(debouncer.accept(0, 1, true, ms(50)).is_some());
    }

    #[test]
    fn cells_are_independent() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default()).with_interval(ms(20));
        assert!(debouncer.accept(0, 0, true, ms(20)).is_some());
        assert!(debouncer.accept(0, 1, true, ms(21)).is_some());
        assert_eq!(debouncer.accept(0, 0, false, ms(30)), None);
        assert!(debouncer.accept(0, 1, false, ms(41)).is_some());
    }

    #[test]
    fn accepted_transitions_are_spaced_by_the_interval() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        let mut accepted = Vec::new();
        // Toggle the raw level every 7 ms for a second.
        for step in 0..150u64 {
            let level = step % 2 == 0;
            if let Some(event) = debouncer.accept(2, 2, level, ms(step * 7)) {
                accepted.push(event.timestamp);
            }
        }

        assert!(!accepted.is_empty());
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= debouncer.interval());
        }
    }

    #[test]
    fn positions_outside_the_map_are_ignored() {
        let mut debouncer = TimedDebouncer::new(KeyMap::default());
        assert_eq!(debouncer.accept(4, 0, true, ms(100)), None);
        assert_eq!(debouncer.accept(0, 9, true, ms(100)), None);
    }
}
