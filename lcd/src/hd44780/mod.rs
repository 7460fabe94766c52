//! HD44780 command set.
//!
//! The controller is write-only from our side, so the configuration commands are modelled as
//! small flag groups ([FunctionSet], [DisplayControl], [EntryMode]) that the driver keeps as
//! shadow state and converts into a full command byte with `to_mask`.

use crate::{LcdError, LcdResult};
use std::fmt::Debug;

/// Command opcodes. Each occupies the highest set bit of the command byte.
pub mod command {
    pub const CLEAR_DISPLAY: u8 = 0b00000001;
    pub const RETURN_HOME: u8 = 0b00000010;
    pub const ENTRY_MODE_SET: u8 = 0b00000100;
    pub const DISPLAY_CONTROL: u8 = 0b00001000;
    pub const CURSOR_SHIFT: u8 = 0b00010000;
    pub const FUNCTION_SET: u8 = 0b00100000;
    pub const SET_CGRAM_ADDR: u8 = 0b01000000;
    pub const SET_DDRAM_ADDR: u8 = 0b10000000;
}

/// Flag bits OR'd into the command opcodes.
pub mod flag {
    // Entry mode set
    pub const ENTRY_LEFT: u8 = 0b00000010;
    pub const ENTRY_RIGHT: u8 = 0b00000000;
    pub const ENTRY_SHIFT_INCREMENT: u8 = 0b00000001;
    pub const ENTRY_SHIFT_DECREMENT: u8 = 0b00000000;

    // Display control
    pub const DISPLAY_ON: u8 = 0b00000100;
    pub const CURSOR_ON: u8 = 0b00000010;
    pub const BLINK_ON: u8 = 0b00000001;

    // Cursor / display shift
    pub const DISPLAY_MOVE: u8 = 0b00001000;
    pub const CURSOR_MOVE: u8 = 0b00000000;
    pub const MOVE_RIGHT: u8 = 0b00000100;
    pub const MOVE_LEFT: u8 = 0b00000000;

    // Function set
    pub const EIGHT_BIT_MODE: u8 = 0b00010000;
    pub const FOUR_BIT_MODE: u8 = 0b00000000;
    pub const TWO_LINE: u8 = 0b00001000;
    pub const ONE_LINE: u8 = 0b00000000;
    pub const DOTS_5X10: u8 = 0b00000100;
    pub const DOTS_5X8: u8 = 0b00000000;
}

/// Execution time of clear display and return home, the two slow commands.
pub const CLEAR_HOME_DELAY_US: u32 = 2000;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data (right-to-left text).
    Left,
    /// Moves the cursor to the right after writing data (left-to-right text).
    #[default]
    Right,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DataLength {
    #[default]
    FourBit,
    EightBit,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    /// Only available on one-line displays.
    Dots5x10,
}

/// Function set flags: interface width, number of lines and font.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FunctionSet {
    pub data_length: DataLength,
    pub two_lines: bool,
    pub font: Font,
}

impl FunctionSet {
    /// Converts the flags to a mask byte for the function set command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.data_length == DataLength::EightBit {
            mask |= flag::EIGHT_BIT_MODE;
        }
        if self.two_lines {
            mask |= flag::TWO_LINE;
        }
        if self.font == Font::Dots5x10 {
            mask |= flag::DOTS_5X10;
        }
        mask
    }
}

/// Display on/off control flags.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DisplayControl {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
}

impl DisplayControl {
    /// Converts the flags to a mask byte for the display control command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.display_on {
            mask |= flag::DISPLAY_ON;
        }
        if self.cursor_on {
            mask |= flag::CURSOR_ON;
        }
        if self.blink_on {
            mask |= flag::BLINK_ON;
        }
        mask
    }
}

/// Entry mode flags: text direction and autoscroll (display shift on write).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct EntryMode {
    pub direction: CursorDirection,
    pub shift: bool,
}

impl EntryMode {
    /// Converts the flags to a mask byte for the entry mode set command.
    pub fn to_mask(&self) -> u8 {
        let mut mask = 0;
        if self.direction == CursorDirection::Right {
            mask |= flag::ENTRY_LEFT;
        }
        if self.shift {
            mask |= flag::ENTRY_SHIFT_INCREMENT;
        }
        mask
    }
}

/// Gets the DDRAM address the controller's address counter moves to from `address`.
///
/// In two-line mode the rows are `0x00..=0x27` and `0x40..=0x67`, and the counter jumps from
/// the end of one to the start of the other. In one-line mode it wraps within `0x00..=0x4F`.
pub fn next_ddram_address(address: u8, direction: CursorDirection, two_lines: bool) -> u8 {
    match (two_lines, direction) {
        (true, CursorDirection::Right) => match address {
            0x27 => 0x40,
            0x67 => 0x00,
            _ => address.wrapping_add(1) & 0b01111111,
        },
        (true, CursorDirection::Left) => match address {
            0x40 => 0x27,
            0x00 => 0x67,
            _ => address.wrapping_sub(1) & 0b01111111,
        },
        (false, CursorDirection::Right) => {
            if address >= 0x4F { 0x00 } else { address + 1 }
        }
        (false, CursorDirection::Left) => {
            if address == 0x00 { 0x4F } else { address - 1 }
        }
    }
}

/// Low-level interface to an HD44780-compatible controller.
///
/// The provided methods encode the commands; implementations only have to move bytes to the
/// controller and wait.
pub trait HD44780Driver: Debug {
    /// Clears the display and sets the cursor to the home position.
    ///
    /// Blocks for [CLEAR_HOME_DELAY_US], as the controller accepts nothing else meanwhile.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(command::CLEAR_DISPLAY)?;
        self.wait_us(CLEAR_HOME_DELAY_US);
        Ok(())
    }

    /// Sets the cursor to the home position and undoes any display shift.
    ///
    /// Blocks for [CLEAR_HOME_DELAY_US].
    fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(command::RETURN_HOME)?;
        self.wait_us(CLEAR_HOME_DELAY_US);
        Ok(())
    }

    fn set_entry_mode(&mut self, mode: EntryMode) -> LcdResult<()> {
        self.send_command(command::ENTRY_MODE_SET | mode.to_mask())
    }

    fn set_display_control(&mut self, control: DisplayControl) -> LcdResult<()> {
        self.send_command(command::DISPLAY_CONTROL | control.to_mask())
    }

    /// Moves the cursor or shifts the display by one position.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        let mut command = command::CURSOR_SHIFT;
        if display_shift {
            command |= flag::DISPLAY_MOVE;
        }
        if direction == CursorDirection::Right {
            command |= flag::MOVE_RIGHT;
        }
        self.send_command(command)
    }

    fn function_set(&mut self, function: FunctionSet) -> LcdResult<()> {
        self.send_command(command::FUNCTION_SET | function.to_mask())
    }

    /// Sets the CGRAM address. The address is a 6-bit value.
    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b00111111 {
            return Err(LcdError::InvalidArgument);
        }
        self.send_command(command::SET_CGRAM_ADDR | address)
    }

    /// Sets the DDRAM address. The address is a 7-bit value.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b01111111 {
            return Err(LcdError::InvalidArgument);
        }
        self.send_command(command::SET_DDRAM_ADDR | address)
    }

    // Low-level commands, implemented by the transport.

    /// Sends a command byte to the controller.
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends data bytes (characters or CGRAM rows) to the controller in one transaction.
    fn send_data(&mut self, data: &[u8]) -> LcdResult<()>;

    /// Blocks for at least `us` microseconds.
    fn wait_us(&mut self, us: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        commands: Vec<u8>,
        data: Vec<Vec<u8>>,
        waited_us: Vec<u32>,
    }

    impl HD44780Driver for Recorder {
        fn send_command(&mut self, command: u8) -> LcdResult<()> {
            self.commands.push(command);
            Ok(())
        }

        fn send_data(&mut self, data: &[u8]) -> LcdResult<()> {
            self.data.push(data.to_vec());
            Ok(())
        }

        fn wait_us(&mut self, us: u32) {
            self.waited_us.push(us);
        }
    }

    #[test]
    fn function_set_masks() {
        let function = FunctionSet {
            data_length: DataLength::FourBit,
            two_lines: true,
            font: Font::Dots5x8,
        };
        assert_eq!(function.to_mask(), flag::TWO_LINE);

        let function = FunctionSet {
            data_length: DataLength::EightBit,
            two_lines: false,
            font: Font::Dots5x10,
        };
        assert_eq!(function.to_mask(), flag::EIGHT_BIT_MODE | flag::DOTS_5X10);
    }

    #[test]
    fn display_control_sets_only_requested_bits() {
        let mut lcd = Recorder::default();
        lcd.set_display_control(DisplayControl { display_on: true, cursor_on: false, blink_on: false })
            .unwrap();
        lcd.set_display_control(DisplayControl { display_on: false, cursor_on: true, blink_on: true })
            .unwrap();
        assert_eq!(lcd.commands, vec![0b00001100, 0b00001011]);
    }

    #[test]
    fn entry_mode_direction_and_shift() {
        let mut lcd = Recorder::default();
        lcd.set_entry_mode(EntryMode::default()).unwrap();
        lcd.set_entry_mode(EntryMode { direction: CursorDirection::Left, shift: true }).unwrap();
        assert_eq!(lcd.commands, vec![0b00000110, 0b00000101]);
    }

    #[test]
    fn cursor_shift_encoding() {
        let mut lcd = Recorder::default();
        lcd.cursor_shift(true, CursorDirection::Left).unwrap();
        lcd.cursor_shift(true, CursorDirection::Right).unwrap();
        lcd.cursor_shift(false, CursorDirection::Right).unwrap();
        assert_eq!(lcd.commands, vec![0x18, 0x1C, 0x14]);
    }

    #[test]
    fn clear_and_home_wait_after_command() {
        let mut lcd = Recorder::default();
        lcd.clear_display().unwrap();
        lcd.return_home().unwrap();
        assert_eq!(lcd.commands, vec![0x01, 0x02]);
        assert_eq!(lcd.waited_us, vec![CLEAR_HOME_DELAY_US, CLEAR_HOME_DELAY_US]);
    }

    #[test]
    fn address_range_checks() {
        let mut lcd = Recorder::default();
        assert_eq!(lcd.set_cgram_address(0x40), Err(LcdError::InvalidArgument));
        assert_eq!(lcd.set_ddram_address(0x80), Err(LcdError::InvalidArgument));
        lcd.set_cgram_address(0x38).unwrap();
        lcd.set_ddram_address(0x4F).unwrap();
        assert_eq!(lcd.commands, vec![0x78, 0xCF]);
    }

    #[test]
    fn ddram_address_jumps_between_rows() {
        use CursorDirection::{Left, Right};

        assert_eq!(next_ddram_address(0x05, Right, true), 0x06);
        assert_eq!(next_ddram_address(0x27, Right, true), 0x40);
        assert_eq!(next_ddram_address(0x67, Right, true), 0x00);
        assert_eq!(next_ddram_address(0x40, Left, true), 0x27);
        assert_eq!(next_ddram_address(0x00, Left, true), 0x67);
        assert_eq!(next_ddram_address(0x45, Left, true), 0x44);
    }

    #[test]
    fn ddram_address_wraps_single_line() {
        use CursorDirection::{Left, Right};

        assert_eq!(next_ddram_address(0x27, Right, false), 0x28);
        assert_eq!(next_ddram_address(0x4F, Right, false), 0x00);
        assert_eq!(next_ddram_address(0x00, Left, false), 0x4F);
        assert_eq!(next_ddram_address(0x30, Left, false), 0x2F);
    }
}
