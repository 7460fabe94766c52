//! Driver for I2C character LCD modules with an RGB backlight, like the DFRobot / Waveshare
//! "LCD1602 RGB" family.
//!
//! The module carries two chips on one I2C bus:
//! - an HD44780-compatible LCD controller behind an I2C co-processor (see [hd44780]),
//! - a PCA9633-style PWM LED driver for the backlight (see [rgb]).
//!
//! [RgbLcd] owns both and exposes the high-level API. The bus and the delay provider are
//! `embedded-hal` traits, so any HAL works; [raw::RawI2cDriver] and [delay::StdDelay] are
//! provided for running directly on a Raspberry Pi.

pub mod delay;
pub mod hd44780;
pub mod raw;
pub mod rgb;
pub mod rgb_lcd;

#[cfg(test)]
mod testing;

use thiserror::Error;

pub use rgb_lcd::*;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("bus error: {0:?}")]
    Bus(embedded_hal::i2c::ErrorKind),
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for LcdError {
    fn from(err: std::io::Error) -> Self {
        LcdError::Io(err.kind())
    }
}

impl LcdError {
    /// Wraps any `embedded-hal` I2C error, keeping only its kind.
    pub fn bus<E: embedded_hal::i2c::Error>(err: E) -> Self {
        LcdError::Bus(err.kind())
    }
}

pub type LcdResult<T> = Result<T, LcdError>;
