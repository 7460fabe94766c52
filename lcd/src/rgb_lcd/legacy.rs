//! Operations of the LCD API 1.0 that this display can't do.
//!
//! Sketches written for other character displays call these, so they exist, but they never
//! touch the bus and never fail.

use super::RgbLcd;
use log::debug;

/// Returned by every unsupported operation that reports a value.
pub const UNSUPPORTED: u8 = 0;

/// The closed set of operations the display doesn't support.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnsupportedOperation {
    Status,
    SetContrast,
    Keypad,
    SetDelay,
    On,
    Off,
    InitBargraph,
    DrawHorizontalGraph,
    DrawVerticalGraph,
}

impl UnsupportedOperation {
    pub const ALL: [UnsupportedOperation; 9] = [
        UnsupportedOperation::Status,
        UnsupportedOperation::SetContrast,
        UnsupportedOperation::Keypad,
        UnsupportedOperation::SetDelay,
        UnsupportedOperation::On,
        UnsupportedOperation::Off,
        UnsupportedOperation::InitBargraph,
        UnsupportedOperation::DrawHorizontalGraph,
        UnsupportedOperation::DrawVerticalGraph,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UnsupportedOperation::Status => "status",
            UnsupportedOperation::SetContrast => "set_contrast",
            UnsupportedOperation::Keypad => "keypad",
            UnsupportedOperation::SetDelay => "set_delay",
            UnsupportedOperation::On => "on",
            UnsupportedOperation::Off => "off",
            UnsupportedOperation::InitBargraph => "init_bargraph",
            UnsupportedOperation::DrawHorizontalGraph => "draw_horizontal_graph",
            UnsupportedOperation::DrawVerticalGraph => "draw_vertical_graph",
        }
    }
}

/// The unsupported part of the LCD API, as no-ops.
pub trait LegacyLcd {
    /// Called by every operation of this trait.
    fn unsupported(&self, operation: UnsupportedOperation) {
        debug!("{} is not supported by this display", operation.name());
    }

    fn status(&self) -> u8 {
        self.unsupported(UnsupportedOperation::Status);
        UNSUPPORTED
    }

    /// Contrast is fixed in hardware.
    fn set_contrast(&mut self, _value: u8) {
        self.unsupported(UnsupportedOperation::SetContrast);
    }

    fn keypad(&self) -> u8 {
        self.unsupported(UnsupportedOperation::Keypad);
        UNSUPPORTED
    }

    fn set_delay(&mut self, _command_delay: i32, _char_delay: i32) {
        self.unsupported(UnsupportedOperation::SetDelay);
    }

    fn on(&mut self) {
        self.unsupported(UnsupportedOperation::On);
    }

    fn off(&mut self) {
        self.unsupported(UnsupportedOperation::Off);
    }

    fn init_bargraph(&mut self, _graph_type: u8) -> u8 {
        self.unsupported(UnsupportedOperation::InitBargraph);
        UNSUPPORTED
    }

    fn draw_horizontal_graph(&mut self, _row: u8, _column: u8, _len: u8, _pixel_col_end: u8) {
        self.unsupported(UnsupportedOperation::DrawHorizontalGraph);
    }

    fn draw_vertical_graph(&mut self, _row: u8, _column: u8, _len: u8, _pixel_row_end: u8) {
        self.unsupported(UnsupportedOperation::DrawVerticalGraph);
    }
}

impl<I2C, D> LegacyLcd for RgbLcd<I2C, D> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::initialized_lcd;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Calls(RefCell<Vec<UnsupportedOperation>>);

    impl LegacyLcd for Calls {
        fn unsupported(&self, operation: UnsupportedOperation) {
            self.0.borrow_mut().push(operation);
        }
    }

    #[test]
    fn unsupported_operations_touch_nothing() {
        let (mut lcd, log) = initialized_lcd(16, 2);

        assert_eq!(lcd.status(), UNSUPPORTED);
        lcd.set_contrast(40);
        assert_eq!(lcd.keypad(), UNSUPPORTED);
        lcd.set_delay(10, 10);
        lcd.on();
        lcd.off();
        assert_eq!(lcd.init_bargraph(1), UNSUPPORTED);
        lcd.draw_horizontal_graph(0, 0, 10, 30);
        lcd.draw_vertical_graph(0, 0, 2, 8);

        assert!(log.take().is_empty());
        assert!(lcd.display_control().display_on);
    }

    #[test]
    fn every_operation_is_reported() {
        let mut calls = Calls::default();
        calls.status();
        calls.set_contrast(0);
        calls.keypad();
        calls.set_delay(0, 0);
        calls.on();
        calls.off();
        calls.init_bargraph(0);
        calls.draw_horizontal_graph(0, 0, 0, 0);
        calls.draw_vertical_graph(0, 0, 0, 0);
        assert_eq!(calls.0.into_inner(), UnsupportedOperation::ALL.to_vec());
    }
}
