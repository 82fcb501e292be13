use crate::lcd::hd44780::driver::{Command, CursorDirection, HD44780Driver};
use crate::lcd::{LCD_COLUMNS, LCD_ROWS, TextDisplay};
use crate::{GpioError, GpioOutput, GpioResult};
use log::{trace, warn};
use std::thread::sleep;
use std::time::Duration;

/// DDRAM address of the first character of each row.
const ROW_OFFSETS: [u8; LCD_ROWS] = [0x00, 0x40];

/// HD44780 driver using GPIO pins and a 4-bit data bus (D4..D7), write-only.
///
/// The E pin is pulsed for 1 us and then the display gets 1 ms to process each nibble, which is
/// enough for every command except clear, which gets an extra wait.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    pin_e: &'a dyn GpioOutput,
    pin_rs: &'a dyn GpioOutput,
    /// D4, D5, D6, D7.
    data_pins: [&'a dyn GpioOutput; 4],
}

impl<'a> GpioHD44780Driver<'a> {
    pub fn new_4bit(
        pin_e: &'a dyn GpioOutput,
        pin_rs: &'a dyn GpioOutput,
        data_pins: [&'a dyn GpioOutput; 4],
    ) -> Self {
        GpioHD44780Driver {
            pin_e,
            pin_rs,
            data_pins,
        }
    }

    fn pulse_e(&self) -> GpioResult<()> {
        self.pin_e.write(true)?;
        sleep(Duration::from_micros(1));
        self.pin_e.write(false)?;
        sleep(Duration::from_millis(1));
        Ok(())
    }

    fn write_nibble(&self, nibble: u8) -> GpioResult<()> {
        trace!("Writing nibble: {:04b}", nibble);
        for (bit, pin) in self.data_pins.iter().enumerate() {
            pin.write(nibble & (1 << bit) != 0)?;
        }
        self.pulse_e()
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);
        self.pin_rs.write(rs)?;
        self.write_nibble(data >> 4)?;
        self.write_nibble(data & 0x0F)?;
        Ok(())
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    fn init(&mut self, multiline: bool) -> GpioResult<()> {
        // Synchronize into 4-bit mode, whatever state the controller woke up in.
        self.pin_rs.write(false)?;
        self.write_nibble(0b0011)?;
        sleep(Duration::from_millis(5));
        self.write_nibble(0b0011)?;
        self.write_nibble(0b0011)?;
        self.write_nibble(0b0010)?;

        self.execute(Command::FunctionSet { two_lines: multiline, large_font: false })?;
        self.execute(Command::DisplayControl { display_on: true, cursor_on: false, blink_on: false })?;
        self.execute(Command::ClearDisplay)?;
        self.execute(Command::EntryMode { direction: CursorDirection::Right, shift: false })?;
        Ok(())
    }

    fn execute(&mut self, command: Command) -> GpioResult<()> {
        self.send_command(command.encode()?)?;
        if command == Command::ClearDisplay {
            sleep(Duration::from_millis(2));
        }
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}

impl TextDisplay for GpioHD44780Driver<'_> {
    fn clear(&mut self) -> GpioResult<()> {
        self.execute(Command::ClearDisplay)
    }

    fn goto(&mut self, col: usize, row: usize) -> GpioResult<()> {
        if col >= LCD_COLUMNS || row >= LCD_ROWS {
            return Err(GpioError::InvalidArgument);
        }
        self.execute(Command::SetDdramAddress(ROW_OFFSETS[row] + col as u8))
    }

    fn write(&mut self, text: &str) -> GpioResult<()> {
        for c in text.chars() {
            if c.is_ascii() {
                self.send_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.send_data(b'?')?;
            }
        }
        Ok(())
    }
}
