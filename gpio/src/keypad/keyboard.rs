use std::fmt::{Debug, Formatter};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use crate::debounce::TimedDebouncer;
use crate::keypad::{EventQueue, KeyMap, MatrixIo, MatrixScanner, Timestamp};
use crate::{GpioError, GpioResult};

/// Allowed debounce intervals.
pub const DEBOUNCE_INTERVAL_RANGE: RangeInclusive<Duration> =
    Duration::from_millis(10)..=Duration::from_millis(200);

/// Allowed scan periods.
pub const SCAN_INTERVAL_RANGE: RangeInclusive<Duration> =
    Duration::from_millis(5)..=Duration::from_millis(50);

/// Counters kept by [MatrixKeyboard] for diagnostics.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyboardStats {
    pub total_key_presses: u32,
    pub total_key_releases: u32,
    pub queue_overflows: u32,
    pub debounce_rejections: u32,
    pub uptime: Duration,
}

/// A scanned and debounced key matrix feeding an [EventQueue].
///
/// Owns the matrix lines and the per-key debounce state. It is meant to be driven from a
/// single thread by calling [MatrixKeyboard::poll] (or [MatrixKeyboard::scan_once]) once per
/// [MatrixKeyboard::scan_interval].
pub struct MatrixKeyboard<'q, M: MatrixIo> {
    scanner: MatrixScanner<M>,
    debouncer: TimedDebouncer,
    queue: &'q EventQueue,
    scan_interval: Duration,
    started: Instant,
    presses: u32,
    releases: u32,
}

impl<'q, M: MatrixIo> MatrixKeyboard<'q, M> {
    /// Creates the keyboard and drives every row inactive.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the key map doesn't have the shape of the matrix.
    /// - Any error from driving the rows.
    pub fn new(io: M, key_map: KeyMap, queue: &'q EventQueue) -> GpioResult<Self> {
        if io.rows() != key_map.rows() || io.cols() != key_map.cols() {
            return Err(GpioError::InvalidArgument);
        }

        let mut scanner = MatrixScanner::new(io);
        scanner.release_all()?;
        debug!("Keyboard matrix {}x{} initialized.", key_map.rows(), key_map.cols());

        Ok(MatrixKeyboard {
            scanner,
            debouncer: TimedDebouncer::new(key_map),
            queue,
            scan_interval: Duration::from_millis(10),
            started: Instant::now(),
            presses: 0,
            releases: 0,
        })
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.scanner.settle_delay = settle_delay;
        self
    }

    pub fn with_debounce_interval(mut self, interval: Duration) -> GpioResult<Self> {
        self.set_debounce_interval(interval)?;
        Ok(self)
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> GpioResult<Self> {
        self.set_scan_interval(interval)?;
        Ok(self)
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debouncer.interval()
    }

    /// Changes the debounce interval.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if outside [DEBOUNCE_INTERVAL_RANGE].
    pub fn set_debounce_interval(&mut self, interval: Duration) -> GpioResult<()> {
        if !DEBOUNCE_INTERVAL_RANGE.contains(&interval) {
            return Err(GpioError::InvalidArgument);
        }
        self.debouncer.set_interval(interval);
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Changes the scan period.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if outside [SCAN_INTERVAL_RANGE].
    pub fn set_scan_interval(&mut self, interval: Duration) -> GpioResult<()> {
        if !SCAN_INTERVAL_RANGE.contains(&interval) {
            return Err(GpioError::InvalidArgument);
        }
        self.scan_interval = interval;
        Ok(())
    }

    /// Time since the keyboard was created.
    pub fn uptime(&self) -> Timestamp {
        self.started.elapsed()
    }

    pub fn io(&self) -> &M {
        self.scanner.io()
    }

    pub fn io_mut(&mut self) -> &mut M {
        self.scanner.io_mut()
    }

    /// Scans the matrix once, timestamping samples with the current uptime.
    pub fn poll(&mut self) -> GpioResult<usize> {
        let now = self.uptime();
        self.scan_once(now)
    }

    /// Scans the matrix once with all samples taken at `now` and queues the accepted events.
    ///
    /// Returns how many events were accepted by the debouncer, including any dropped because the
    /// queue was full. On a pin failure, events accepted before it are still queued.
    pub fn scan_once(&mut self, now: Timestamp) -> GpioResult<usize> {
        let debouncer = &mut self.debouncer;
        let queue = self.queue;
        let presses = &mut self.presses;
        let releases = &mut self.releases;
        let mut accepted = 0;

        self.scanner.scan_cycle(|row, col, level| {
            let Some(event) = debouncer.accept(row, col, level, now) else {
                return;
            };
            accepted += 1;
            if event.pressed {
                *presses = presses.saturating_add(1);
            } else {
                *releases = releases.saturating_add(1);
            }

            if queue.try_enqueue(event) {
                info!("Key '{}' {} at position [{},{}]",
                    event.symbol, if event.pressed { "PRESSED" } else { "RELEASED" }, row, col);
            } else {
                warn!("Key event queue full, dropping event for key '{}'", event.symbol);
            }
        })?;

        Ok(accepted)
    }

    /// Gets a snapshot of the diagnostic counters.
    pub fn stats(&self) -> KeyboardStats {
        KeyboardStats {
            total_key_presses: self.presses,
            total_key_releases: self.releases,
            queue_overflows: self.queue.overflow_count(),
            debounce_rejections: self.debouncer.rejections(),
            uptime: self.uptime(),
        }
    }

    /// Zeroes all counters. The uptime keeps running.
    pub fn reset_stats(&mut self) {
        self.presses = 0;
        self.releases = 0;
        self.debouncer.reset_rejections();
        self.queue.reset_overflow_count();
    }
}

impl<M: MatrixIo> Debug for MatrixKeyboard<'_, M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatrixKeyboard({:?}, {:?})", self.scanner.io(), self.debouncer)
    }
}
