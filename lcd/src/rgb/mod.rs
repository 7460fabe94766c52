//! RGB backlight controller (PCA9633-style 4-channel PWM LED driver).
//!
//! Channels 0..2 drive the blue, green and red LEDs. The registers are write-only from the
//! driver's point of view, so nothing here keeps shadow state.

use crate::{LcdError, LcdResult};
use std::fmt::Debug;

/// Register addresses of the LED driver.
pub mod register {
    pub const MODE1: u8 = 0x00;
    pub const MODE2: u8 = 0x01;
    /// PWM0
    pub const BLUE: u8 = 0x02;
    /// PWM1
    pub const GREEN: u8 = 0x03;
    /// PWM2
    pub const RED: u8 = 0x04;
    /// Group duty cycle, used as the blink duty cycle in group blinking mode.
    pub const GRPPWM: u8 = 0x06;
    /// Group frequency, the blink period in group blinking mode.
    pub const GRPFREQ: u8 = 0x07;
    /// LED output state, two bits per channel.
    pub const LEDOUT: u8 = 0x08;
}

/// `MODE1`: normal mode, oscillator on, no sub-addresses.
pub const MODE1_NORMAL: u8 = 0x00;
/// `MODE2`: DMBLNK set, group control is blinking instead of dimming.
pub const MODE2_GROUP_BLINK: u8 = 0x20;
/// `LEDOUT`: every channel driven by its own PWM register and the group register.
pub const LEDOUT_ALL_PWM: u8 = 0xFF;

/// Blink period register value, `(GRPFREQ + 1) / 24` seconds, about one second.
pub const BLINK_FREQUENCY: u8 = 0x17;
/// 50 % duty cycle: half of the period on.
pub const BLINK_DUTY: u8 = 0x7F;

/// One PWM output of the LED driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PwmChannel {
    Red,
    Green,
    Blue,
}

impl PwmChannel {
    /// Gets the duty cycle register of the channel.
    pub fn register(&self) -> u8 {
        match self {
            PwmChannel::Red => register::RED,
            PwmChannel::Green => register::GREEN,
            PwmChannel::Blue => register::BLUE,
        }
    }
}

/// The predefined backlight colors.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Color {
    #[default]
    White,
    Red,
    Green,
    Blue,
}

impl Color {
    /// Gets the `(r, g, b)` duty cycles for the color.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::White => (255, 255, 255),
            Color::Red => (255, 0, 0),
            Color::Green => (0, 255, 0),
            Color::Blue => (0, 0, 255),
        }
    }
}

/// Legacy numeric color codes: `0` white, `1` red, `2` green, `3` blue.
impl TryFrom<u8> for Color {
    type Error = LcdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Color::White),
            1 => Ok(Color::Red),
            2 => Ok(Color::Green),
            3 => Ok(Color::Blue),
            _ => Err(LcdError::InvalidArgument),
        }
    }
}

/// Interface to the backlight LED driver.
///
/// Everything is built on [RgbBacklightDriver::set_register], a single register write.
pub trait RgbBacklightDriver: Debug {
    /// Puts the LED driver in normal mode with all channels under PWM control and lights the
    /// backlight white.
    fn init_backlight(&mut self) -> LcdResult<()> {
        self.set_register(register::MODE1, MODE1_NORMAL)?;
        self.set_register(register::LEDOUT, LEDOUT_ALL_PWM)?;
        self.set_register(register::MODE2, MODE2_GROUP_BLINK)?;
        self.set_color_white()
    }

    /// Sets the duty cycle of one channel.
    fn set_pwm(&mut self, channel: PwmChannel, value: u8) -> LcdResult<()> {
        self.set_register(channel.register(), value)
    }

    /// Sets all three duty cycles. Values are passed through unchanged.
    fn set_rgb(&mut self, r: u8, g: u8, b: u8) -> LcdResult<()> {
        self.set_pwm(PwmChannel::Red, r)?;
        self.set_pwm(PwmChannel::Green, g)?;
        self.set_pwm(PwmChannel::Blue, b)
    }

    fn set_color(&mut self, color: Color) -> LcdResult<()> {
        let (r, g, b) = color.rgb();
        self.set_rgb(r, g, b)
    }

    /// Turns all channels off.
    fn set_color_all(&mut self) -> LcdResult<()> {
        self.set_rgb(0, 0, 0)
    }

    fn set_color_white(&mut self) -> LcdResult<()> {
        self.set_rgb(255, 255, 255)
    }

    /// Blinks the whole backlight, about once a second.
    fn blink_led(&mut self) -> LcdResult<()> {
        self.set_register(register::GRPFREQ, BLINK_FREQUENCY)?;
        self.set_register(register::GRPPWM, BLINK_DUTY)
    }

    /// Stops blinking; the backlight stays on.
    fn no_blink_led(&mut self) -> LcdResult<()> {
        self.set_register(register::GRPFREQ, 0x00)?;
        self.set_register(register::GRPPWM, 0xFF)
    }

    /// Writes one register of the LED driver.
    fn set_register(&mut self, register: u8, value: u8) -> LcdResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Registers(Vec<(u8, u8)>);

    impl RgbBacklightDriver for Registers {
        fn set_register(&mut self, register: u8, value: u8) -> LcdResult<()> {
            self.0.push((register, value));
            Ok(())
        }
    }

    #[test]
    fn set_rgb_targets_three_registers() {
        let mut rgb = Registers::default();
        rgb.set_rgb(0, 128, 255).unwrap();
        assert_eq!(rgb.0, vec![(register::RED, 0), (register::GREEN, 128), (register::BLUE, 255)]);
    }

    #[test]
    fn colors_map_to_rgb() {
        let mut by_color = Registers::default();
        let mut by_rgb = Registers::default();

        by_color.set_color(Color::Red).unwrap();
        by_rgb.set_rgb(255, 0, 0).unwrap();
        by_color.set_color(Color::White).unwrap();
        by_rgb.set_rgb(255, 255, 255).unwrap();

        assert_eq!(by_color.0, by_rgb.0);
    }

    #[test]
    fn legacy_color_codes() {
        assert_eq!(Color::try_from(0), Ok(Color::White));
        assert_eq!(Color::try_from(3), Ok(Color::Blue));
        assert_eq!(Color::try_from(4), Err(LcdError::InvalidArgument));
    }

    #[test]
    fn blink_registers() {
        let mut rgb = Registers::default();
        rgb.blink_led().unwrap();
        rgb.no_blink_led().unwrap();
        assert_eq!(rgb.0, vec![(0x07, 0x17), (0x06, 0x7F), (0x07, 0x00), (0x06, 0xFF)]);
    }

    #[test]
    fn init_order() {
        let mut rgb = Registers::default();
        rgb.init_backlight().unwrap();
        assert_eq!(
            rgb.0,
            vec![(0x00, 0x00), (0x08, 0xFF), (0x01, 0x20), (0x04, 255), (0x03, 255), (0x02, 255)]
        );
    }
}
