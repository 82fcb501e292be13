use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use grill::app::App;
use grill::config::Config;
use grill::cooking::CookingBand;
use grill::grill::GrillMode;
use grill::sensor::SharedTemperature;
use grill_gpio::GpioResult;
use grill_gpio::keypad::{EventQueue, KeyMap, MatrixKeyboard, SimulatedMatrix, Timestamp};
use grill_gpio::lcd::{LCD_ROWS, TextDisplay};

/// A display that remembers what is on it.
#[derive(Debug, Default)]
struct RecordingDisplay {
    rows: Rc<RefCell<[String; LCD_ROWS]>>,
    cursor: (usize, usize),
}

impl TextDisplay for RecordingDisplay {
    fn clear(&mut self) -> GpioResult<()> {
        *self.rows.borrow_mut() = Default::default();
        self.cursor = (0, 0);
        Ok(())
    }

    fn goto(&mut self, col: usize, row: usize) -> GpioResult<()> {
        self.cursor = (col, row);
        Ok(())
    }

    fn write(&mut self, text: &str) -> GpioResult<()> {
        let (col, row) = self.cursor;
        let mut rows = self.rows.borrow_mut();
        let line = &mut rows[row];
        while line.len() < col {
            line.push(' ');
        }
        line.truncate(col);
        line.push_str(text);
        self.cursor.0 += text.len();
        Ok(())
    }
}

fn position(symbol: char) -> (usize, usize) {
    let map = KeyMap::default();
    for row in 0..map.rows() {
        for col in 0..map.cols() {
            if map.symbol(row as u8, col as u8) == Some(symbol) {
                return (row, col);
            }
        }
    }
    panic!("no key '{symbol}' on the keypad");
}

/// Presses and releases each key, scanning the matrix the way the scanner would, and returns the
/// time after the last release.
fn type_keys(keyboard: &mut MatrixKeyboard<'_, SimulatedMatrix>, keys: &str, mut now: Timestamp) -> Timestamp {
    for symbol in keys.chars() {
        let (row, col) = position(symbol);
        keyboard.io_mut().press(row, col);
        keyboard.scan_once(now).unwrap();
        now += Duration::from_millis(60);
        keyboard.io_mut().release(row, col);
        keyboard.scan_once(now).unwrap();
        now += Duration::from_millis(60);
    }
    now
}

fn drain(app: &mut App, queue: &EventQueue) {
    while !queue.is_empty() {
        app.update();
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.keypad.dequeue_timeout_ms = 1;
    config.grill.status_hold_ms = 30;
    config.grill.notice_hold_ms = 20;
    config
}

fn keyboard(queue: &EventQueue) -> MatrixKeyboard<'_, SimulatedMatrix> {
    MatrixKeyboard::new(SimulatedMatrix::new(4, 4), KeyMap::default(), queue)
        .unwrap()
        .with_settle_delay(Duration::ZERO)
}

fn screen(rows: &Rc<RefCell<[String; LCD_ROWS]>>) -> [String; LCD_ROWS] {
    rows.borrow().clone()
}

#[test]
fn typed_temperature_is_classified_and_shown() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::new(24.0);
    let mut display = RecordingDisplay::default();
    let rows = display.rows.clone();
    let mut app = App::new(&config, &queue, &mut display, &sensor);
    app.draw();
    assert_eq!(screen(&rows), ["Enter Temp (C):".to_string(), "Use 0-9, # OK".to_string()]);

    let now = type_keys(&mut keyboard, "2", Duration::from_millis(100));
    drain(&mut app, &queue);
    assert_eq!(app.grill().mode(), GrillMode::InputtingTemperature);
    assert_eq!(screen(&rows), ["Temperature:".to_string(), "2 C (# to OK)".to_string()]);

    type_keys(&mut keyboard, "5#", now);
    drain(&mut app, &queue);

    let state = app.grill().state();
    assert_eq!(state.mode, GrillMode::ShowingTerm);
    assert_eq!(state.input_temperature, Some(25));
    assert_eq!(state.band, CookingBand::BlueRare);
    assert!(state.safe);
    assert_eq!(screen(&rows), ["BLUE RARE".to_string(), String::new()]);
}

#[test]
fn medium_rare_after_a_reset() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let rows = display.rows.clone();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    type_keys(&mut keyboard, "9*27#", Duration::from_millis(100));
    drain(&mut app, &queue);

    assert_eq!(app.grill().state().input_temperature, Some(27));
    assert_eq!(app.grill().state().band, CookingBand::MediumRare);
    assert_eq!(screen(&rows)[0], "MEDIUM RARE");
}

#[test]
fn unsafe_temperature_shows_the_warning() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let rows = display.rows.clone();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    type_keys(&mut keyboard, "45#", Duration::from_millis(100));
    drain(&mut app, &queue);

    let state = app.grill().state();
    assert_eq!(state.mode, GrillMode::ShowingTerm);
    assert_eq!(state.band, CookingBand::Undetermined);
    assert!(!state.safe);
    assert_eq!(screen(&rows), ["Out of Range".to_string(), "OH! BE CAREFUL".to_string()]);
}

#[test]
fn confirming_an_empty_entry_changes_nothing() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    type_keys(&mut keyboard, "#", Duration::from_millis(100));
    drain(&mut app, &queue);

    assert_eq!(app.grill().mode(), GrillMode::AskTemperature);
    assert!(app.grill().state().entry_buffer.is_empty());
}

#[test]
fn status_check_times_out_back_to_the_term() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let rows = display.rows.clone();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    let now = type_keys(&mut keyboard, "30#", Duration::from_millis(100));
    drain(&mut app, &queue);
    type_keys(&mut keyboard, "#", now);
    // Only the press: it starts the status check.
    app.update();
    assert!(matches!(app.grill().mode(), GrillMode::ShowingStatus { .. }));
    assert_eq!(screen(&rows), ["Status Check:".to_string(), "30C SAFE".to_string()]);

    // Sits out the hold, then takes the release, which changes nothing.
    app.update();
    assert!(queue.is_empty());
    assert_eq!(app.grill().mode(), GrillMode::ShowingTerm);
    assert_eq!(screen(&rows), ["MEDIUM RARE".to_string(), String::new()]);
}

#[test]
fn keys_pressed_during_the_status_check_wait_for_it() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    type_keys(&mut keyboard, "33##*", Duration::from_millis(100));
    drain(&mut app, &queue);

    assert_eq!(app.grill().mode(), GrillMode::AskTemperature);
    assert_eq!(app.grill().state().input_temperature, None);
}

#[test]
fn letter_keys_show_a_notice_then_the_screen_comes_back() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let rows = display.rows.clone();
    let mut app = App::new(&config, &queue, &mut display, &sensor);

    let now = type_keys(&mut keyboard, "4", Duration::from_millis(100));
    drain(&mut app, &queue);
    type_keys(&mut keyboard, "C", now);
    app.update();
    assert!(app.showing_notice());
    assert_eq!(screen(&rows), ["Function C".to_string(), "Not Available".to_string()]);
    assert_eq!(app.grill().state().entry_buffer, "4");

    // The release, then the end of the notice.
    app.update();
    std::thread::sleep(Duration::from_millis(25));
    app.update();
    assert!(!app.showing_notice());
    assert_eq!(screen(&rows), ["Temperature:".to_string(), "4 C (# to OK)".to_string()]);
}

#[test]
fn bouncing_contacts_make_a_single_press() {
    let config = test_config();
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);
    let sensor = SharedTemperature::default();
    let mut display = RecordingDisplay::default();
    let mut app = App::new(&config, &queue, &mut display, &sensor);
    let (row, col) = position('7');
    let ms = Duration::from_millis;

    // The contact chatters for 30 ms after going down and after coming up.
    for (t, down) in [(100, true), (110, false), (120, true), (130, false), (140, true), (300, false), (310, true), (320, false)] {
        if down {
            keyboard.io_mut().press(row, col);
        } else {
            keyboard.io_mut().release(row, col);
        }
        keyboard.scan_once(ms(t)).unwrap();
    }

    assert_eq!(queue.len(), 2);
    let stats = keyboard.stats();
    assert_eq!(stats.total_key_presses, 1);
    assert_eq!(stats.total_key_releases, 1);
    assert!(stats.debounce_rejections >= 3);

    drain(&mut app, &queue);
    assert_eq!(app.grill().state().entry_buffer, "7");
}

#[test]
fn flood_of_keys_overflows_the_queue() {
    let mut config = test_config();
    config.keypad.queue_capacity = 4;
    let queue = EventQueue::new(config.keypad.queue_capacity).unwrap();
    let mut keyboard = keyboard(&queue);

    // Three presses and three releases into room for four.
    type_keys(&mut keyboard, "123", Duration::from_millis(100));

    assert_eq!(queue.len(), 4);
    assert_eq!(keyboard.stats().queue_overflows, 2);
}
