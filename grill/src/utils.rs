use std::num::ParseIntError;
use std::ops::RangeBounds;
use grill_gpio::GpioResult;
use grill_gpio::lcd::{LCD_ROWS, TextDisplay};

/// Parses a list of pin numbers separated by commas, semicolons or spaces.
pub fn parse_pin_list(pin_str: &str) -> Result<Vec<usize>, ParseIntError> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect()
}

pub trait WithinExt {
    fn within(&self, range: impl RangeBounds<Self>) -> bool;
}

impl <T: PartialOrd<T>> WithinExt for T {
    fn within(&self, range: impl RangeBounds<Self>) -> bool {
        range.contains(self)
    }
}

pub trait DisplayExt {
    /// Clears the display and writes one line of text per row.
    fn show(&mut self, lines: &[String; LCD_ROWS]) -> GpioResult<()>;
}

impl <T: ?Sized + TextDisplay> DisplayExt for T {
    fn show(&mut self, lines: &[String; LCD_ROWS]) -> GpioResult<()> {
        self.clear()?;
        for (row, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            self.goto(0, row)?;
            self.write(line)?;
        }
        Ok(())
    }
}
