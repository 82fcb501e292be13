use std::thread;
use std::time::Duration;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use sysinfo::System;
use grill::app::App;
use grill::config::{Config, PinConfig};
use grill::error::GrillError;
use grill::sensor::{AdcTemperatureSensor, SharedTemperature, TemperatureSensor};
use grill::tasks;
use grill::utils::DisplayExt;
use grill_gpio::{GpioDriver, GpioResult};
use grill_gpio::GpioActiveLevel::Low;
use grill_gpio::GpioBias::PullUp;
use grill_gpio::adc::IioAdcChannel;
use grill_gpio::gpiod::GpiodDriver;
use grill_gpio::keypad::{EventQueue, GpioMatrixIo, MatrixKeyboard};
use grill_gpio::lcd::TextDisplay;
use grill_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Driver};

fn log_banner() {
    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());
}

/// Puts the failed startup stage on the display and turns the error into a report.
fn show_init_error(lcd: &mut dyn TextDisplay, stage: &str, error: impl Into<GrillError>) -> eyre::Report {
    let error = error.into();
    error!("{} failed: {}", stage, error);
    if let Err(e) = lcd.show(&["ERROR:".to_string(), stage.to_string()]) {
        warn!("Failed to show the error: {}", e);
    }
    eyre::Report::new(error).wrap_err(format!("{} failed", stage))
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    log_banner();
    info!("Grill starting...");

    // Get pin numbers from env
    let pins = PinConfig::from_env()?;

    info!("LCD @ E: {}, RS: {}, Data: {:?}", pins.lcd_e, pins.lcd_rs, pins.lcd_data);
    info!("Keypad @ Rows: {:?}, Cols: {:?}", pins.keypad_rows, pins.keypad_cols);
    info!("Sensor @ {}", pins.sensor_adc.display());

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&pins.gpio_chip)?;
    debug!("{:?} initialized with {} lines.", gpio, gpio.count()?);

    debug!("Initializing LCD driver...");
    let mut lcd_e_pin = gpio.get_pin(pins.lcd_e)?;
    let lcd_e_out = lcd_e_pin.as_output()?;
    let mut lcd_rs_pin = gpio.get_pin(pins.lcd_rs)?;
    let lcd_rs_out = lcd_rs_pin.as_output()?;
    let mut lcd_data_pins = pins.lcd_data
        .iter()
        .map(|&pin| gpio.get_pin(pin))
        .collect::<GpioResult<Vec<_>>>()?;
    let lcd_data_outs = lcd_data_pins
        .iter_mut()
        .map(|pin| pin.as_output())
        .collect::<GpioResult<Vec<_>>>()?;
    let mut lcd = GpioHD44780Driver::new_4bit(
        &*lcd_e_out,
        &*lcd_rs_out,
        [&*lcd_data_outs[0], &*lcd_data_outs[1], &*lcd_data_outs[2], &*lcd_data_outs[3]],
    );

    lcd.init(true)?;

    const LAST_LINE: &str = concat!("v.", env!("CARGO_PKG_VERSION"), "...");
    lcd.show(&["Grill Controller".to_string(), LAST_LINE.to_string()])?;

    debug!("{:?} initialized.", lcd);

    debug!("Trying to load config...");
    let config = Config::load_or_default()
        .map_err(|e| show_init_error(&mut lcd, "Config", e))?;
    debug!("{:?}", config);

    let key_map = config.keypad.key_map()
        .and_then(|key_map| pins.validate(&key_map).map(|_| key_map))
        .map_err(|e| show_init_error(&mut lcd, "Config", e))?;

    debug!("Initializing keypad driver...");
    let mut keypad_row_pins = pins.keypad_rows
        .iter()
        .map(|&pin| gpio.get_pin(pin))
        .collect::<GpioResult<Vec<_>>>()
        .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;
    let mut keypad_col_pins = pins.keypad_cols
        .iter()
        .map(|&pin| gpio.get_pin(pin))
        .collect::<GpioResult<Vec<_>>>()
        .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;
    for pin in &mut keypad_row_pins {
        pin.set_active_level(Low)
            .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;
    }
    for pin in &mut keypad_col_pins {
        pin.set_bias(PullUp)
            .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;
    }
    let keypad_row_outs = keypad_row_pins
        .iter_mut()
        .map(|pin| pin.as_output())
        .collect::<GpioResult<Vec<_>>>()
        .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;
    let keypad_col_ins = keypad_col_pins
        .iter_mut()
        .map(|pin| pin.as_input())
        .collect::<GpioResult<Vec<_>>>()
        .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?;

    let queue = EventQueue::new(config.keypad.queue_capacity)
        .map_err(|e| show_init_error(&mut lcd, "Queue Init", e))?;
    let mut keyboard = MatrixKeyboard::new(GpioMatrixIo::new(keypad_row_outs, keypad_col_ins), key_map, &queue)
        .and_then(|keyboard| keyboard.with_debounce_interval(config.keypad.debounce_interval()))
        .and_then(|keyboard| keyboard.with_scan_interval(config.keypad.scan_interval()))
        .map_err(|e| show_init_error(&mut lcd, "Keyboard Init", e))?
        .with_settle_delay(config.keypad.settle_delay());

    debug!("{:?} initialized.", keyboard);

    debug!("Initializing temperature sensor...");
    let adc = IioAdcChannel::new(&pins.sensor_adc, config.sensor.resolution_bits)
        .map_err(|e| show_init_error(&mut lcd, "Sensor Init", e))?;
    let mut sensor = AdcTemperatureSensor::new(adc, &config.sensor);
    let sensor_temp = SharedTemperature::new(sensor.read_temperature());
    let sensor_period = config.sensor.interval();

    debug!("{:?} initialized, reading {:.1} C.", sensor, sensor_temp.load());

    info!("Grill initialized.");

    thread::sleep(Duration::from_secs(1));

    info!("Starting main loop...");

    let mut app = App::new(&config, &queue, &mut lcd, &sensor_temp);

    thread::scope(|s| {
        s.spawn(|| tasks::run_scanner(&mut keyboard));
        s.spawn(|| tasks::run_sensor(&mut sensor, &sensor_temp, sensor_period));
        app.run();
    });

    Ok(())
}
