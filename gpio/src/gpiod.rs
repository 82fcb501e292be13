//! GPIO backend on top of the Linux GPIO character device, using the gpiod library.
use crate::{GpioActiveLevel, GpioBias, GpioDriver, GpioError, GpioInput, GpioOutput, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU8;

/// Hands out the lines of one GPIO chip, such as `/dev/gpiochip0`.
///
/// A line can be held by a single pin at a time. Dropping the pin gives the line back.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    path: PathBuf,
    claimed: BitVec<AtomicU8>,
}

impl GpiodDriver {
    /// Opens the GPIO chip at the given device path.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        let path = path.as_ref();
        let chip = gpiod::Chip::new(path)?;
        let lines = chip.num_lines() as usize;
        debug!("Opened GPIO chip {} ({}) with {} lines.", chip.name(), path.display(), lines);
        Ok(GpiodDriver {
            chip,
            path: path.to_path_buf(),
            claimed: BitVec::repeat(false, lines),
        })
    }

    fn claim(&self, line: usize) -> GpioResult<()> {
        if line >= self.claimed.len() {
            return Err(GpioError::InvalidArgument);
        }
        if self.claimed[line] {
            return Err(GpioError::AlreadyInUse);
        }
        self.claimed.set_aliased(line, true);
        trace!("Claimed line {} of {}.", line, self.path.display());
        Ok(())
    }

    fn release(&self, line: usize) {
        self.claimed.set_aliased(line, false);
        trace!("Released line {} of {}.", line, self.path.display());
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.path.display())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.claimed.len())
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        self.claim(index)?;
        Ok(Box::new(GpiodPin {
            driver: self,
            line: index as u32,
            active_level: GpioActiveLevel::High,
            bias: GpioBias::None,
        }))
    }
}

impl From<GpioActiveLevel> for gpiod::Active {
    fn from(level: GpioActiveLevel) -> Self {
        match level {
            GpioActiveLevel::High => gpiod::Active::High,
            GpioActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

/// A claimed line whose direction isn't decided yet.
///
/// The active level and bias are applied when the line is requested as an input or output.
struct GpiodPin<'a> {
    driver: &'a GpiodDriver,
    line: u32,
    active_level: GpioActiveLevel,
    bias: GpioBias,
}

impl Debug for GpiodPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.driver.path.display(), self.line)
    }
}

impl GpioPin for GpiodPin<'_> {
    fn as_input(&mut self) -> GpioResult<Box<dyn GpioInput + '_>> {
        let lines = self.driver.chip.request_lines(
            gpiod::Options::input([self.line])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(self.active_level.into())
                .bias(self.bias.into()),
        )?;
        debug!("{:?} requested as input ({:?}, {:?}).", self, self.active_level, self.bias);
        Ok(Box::new(GpiodInput { pin: self, lines }))
    }

    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        let lines = self.driver.chip.request_lines(
            gpiod::Options::output([self.line])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(self.active_level.into())
                .bias(self.bias.into()),
        )?;
        debug!("{:?} requested as output ({:?}).", self, self.active_level);
        Ok(Box::new(GpiodOutput { pin: self, lines }))
    }

    fn set_active_level(&mut self, level: GpioActiveLevel) -> GpioResult<()> {
        self.active_level = level;
        Ok(())
    }

    fn set_bias(&mut self, bias: GpioBias) -> GpioResult<()> {
        self.bias = bias;
        Ok(())
    }
}

impl Drop for GpiodPin<'_> {
    fn drop(&mut self) {
        self.driver.release(self.line as usize);
    }
}

struct GpiodInput<'a> {
    pin: &'a GpiodPin<'a>,
    lines: gpiod::Lines<gpiod::Input>,
}

impl Debug for GpiodInput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[in]", self.pin)
    }
}

impl GpioInput for GpiodInput<'_> {
    fn read(&self) -> GpioResult<bool> {
        let [value] = self.lines.get_values([false])?;
        Ok(value)
    }
}

struct GpiodOutput<'a> {
    pin: &'a GpiodPin<'a>,
    lines: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[out]", self.pin)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.lines.set_values([value])?;
        Ok(())
    }
}
