//! HD44780 LCD module.
//!
//! Only the write path of the controller is implemented; the R/W pin is expected to be tied
//! to ground.
pub mod driver;
