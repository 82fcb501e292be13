//! The module for the controller activity: keys in, screens out.

use std::thread;
use std::time::{Duration, Instant};
use log::{debug, warn};
use grill_gpio::keypad::EventQueue;
use grill_gpio::lcd::{LCD_ROWS, TextDisplay};
use crate::config::Config;
use crate::grill::{Grill, KeyOutcome};
use crate::sensor::SharedTemperature;
use crate::utils::DisplayExt;

/// The main app state struct.
pub struct App<'a> {
    /// The grill controller.
    grill: Grill<'a>,
    /// Where key events come from.
    queue: &'a EventQueue,
    /// The display the screens are drawn on.
    display: &'a mut dyn TextDisplay,
    /// How long to wait for a key before looking at the timers again.
    dequeue_timeout: Duration,
    notice_hold: Duration,
    /// A letter key notice on screen, and when it goes away.
    notice: Option<([String; LCD_ROWS], Instant)>,
}

impl<'a> App<'a> {
    /// Creates a new instance of the App.
    pub fn new(
        config: &Config,
        queue: &'a EventQueue,
        display: &'a mut dyn TextDisplay,
        sensor: &'a SharedTemperature,
    ) -> App<'a> {
        App {
            grill: Grill::new(&config.grill, sensor),
            queue,
            display,
            dequeue_timeout: config.keypad.dequeue_timeout(),
            notice_hold: config.grill.notice_hold(),
            notice: None,
        }
    }

    pub fn grill(&self) -> &Grill<'a> {
        &self.grill
    }

    /// Whether a letter key notice is on screen.
    pub fn showing_notice(&self) -> bool {
        self.notice.is_some()
    }

    /// Draws the current screen. Display failures are logged and otherwise ignored.
    pub fn draw(&mut self) {
        let lines = match &self.notice {
            Some((lines, _)) => lines.clone(),
            None => self.grill.screen(),
        };
        debug!("Drawing {:?}", lines);
        if let Err(e) = self.display.show(&lines) {
            warn!("Failed to draw the screen: {}", e);
        }
    }

    /// Runs one step of the controller activity.
    ///
    /// Sits out the status check if one is on, then waits for one key event, at most until the
    /// dequeue timeout or the end of the letter key notice. Redraws when anything changed.
    pub fn update(&mut self) {
        // The status check holds the screen. Keys pressed meanwhile wait in the queue.
        if let Some(remaining) = self.grill.hold_remaining(Instant::now()) {
            thread::sleep(remaining);
        }

        let now = Instant::now();
        let mut dirty = self.grill.poll(now);
        if let Some((_, until)) = self.notice {
            if now >= until {
                self.notice = None;
                dirty = true;
            }
        }
        if dirty {
            self.draw();
        }

        let timeout = match self.notice {
            Some((_, until)) => self.dequeue_timeout.min(until.saturating_duration_since(now)),
            None => self.dequeue_timeout,
        };
        let Some(event) = self.queue.dequeue(timeout) else {
            return;
        };

        let now = Instant::now();
        match self.grill.handle_event(&event, now) {
            KeyOutcome::Changed => {
                self.notice = None;
                self.draw();
            }
            KeyOutcome::Reserved(key) => {
                self.notice = Some((Grill::reserved_notice(key), now + self.notice_hold));
                self.draw();
            }
            KeyOutcome::Unchanged | KeyOutcome::Rejected => {}
        }
    }

    /// Draws the first screen and handles keys forever.
    pub fn run(&mut self) -> ! {
        self.draw();
        loop {
            self.update();
        }
    }
}
