//! The [RgbLcd] driver: an HD44780 LCD behind an I2C co-processor plus an RGB backlight, on
//! one bus.

mod legacy;

pub use legacy::*;

use crate::hd44780::{
    command, flag, next_ddram_address, CursorDirection, DataLength, DisplayControl, EntryMode,
    Font, FunctionSet, HD44780Driver,
};
use crate::rgb::{Color, RgbBacklightDriver};
use crate::{LcdError, LcdResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, trace, warn};
use std::fmt::{self, Debug, Formatter};

/// Default 7-bit address of the LCD controller.
pub const LCD_ADDRESS: u8 = 0x7C >> 1;
/// Default 7-bit address of the RGB backlight controller.
pub const RGB_ADDRESS: u8 = 0xC0 >> 1;

/// Control byte preceding a command: Co = 1, RS = 0.
pub const CONTROL_COMMAND: u8 = 0x80;
/// Control byte preceding data: Co = 0, RS = 1.
pub const CONTROL_DATA: u8 = 0x40;

/// DDRAM address of the first column of each row.
pub const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Wait after power-on before the first command, datasheet minimum is 40 ms.
const POWER_ON_DELAY_US: u32 = 50_000;
/// Wait after the first 8-bit mode command, datasheet minimum is 4.1 ms.
const SYNC_FIRST_DELAY_US: u32 = 4500;
/// Wait after the following 8-bit mode commands, datasheet minimum is 100 us.
const SYNC_DELAY_US: u32 = 150;

/// Driver for an RGB backlit character LCD.
///
/// The controllers can't be read back, so the driver keeps a copy of everything it configured
/// and always rewrites a whole command byte. `init` has to be called before using the display.
///
/// Every command that reaches the controller, raw ones included, is decoded into that copy, and
/// the DDRAM address counter is followed across writes.
///
/// Every bus-touching method returns the transport error, if any. Shadow state is only updated
/// once the write went through.
pub struct RgbLcd<I2C, D> {
    i2c: I2C,
    delay: D,
    lcd_address: u8,
    rgb_address: u8,

    columns: u8,
    lines: u8,
    current_line: u8,
    address_counter: u8,
    in_cgram: bool,

    function: FunctionSet,
    control: DisplayControl,
    entry: EntryMode,
    backlight: bool,
    initialized: bool,
}

impl<I2C: I2c, D: DelayNs> RgbLcd<I2C, D> {
    /// Creates a driver using the default bus addresses.
    pub fn new(i2c: I2C, delay: D, columns: u8, rows: u8) -> Self {
        Self::with_addresses(i2c, delay, columns, rows, LCD_ADDRESS, RGB_ADDRESS)
    }

    /// Creates a driver for a module with non-default bus addresses.
    ///
    /// `rows` is limited to `1..=4`, the layouts the row offset table covers.
    pub fn with_addresses(
        i2c: I2C,
        delay: D,
        columns: u8,
        rows: u8,
        lcd_address: u8,
        rgb_address: u8,
    ) -> Self {
        RgbLcd {
            i2c,
            delay,
            lcd_address,
            rgb_address,
            columns,
            lines: rows.clamp(1, ROW_OFFSETS.len() as u8),
            current_line: 0,
            address_counter: 0,
            in_cgram: false,
            function: FunctionSet::default(),
            control: DisplayControl::default(),
            entry: EntryMode::default(),
            backlight: false,
            initialized: false,
        }
    }

    /// Gives back the bus and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    /// Gets the row of the last [RgbLcd::set_cursor] call.
    pub fn current_line(&self) -> u8 {
        self.current_line
    }

    /// Gets the DDRAM address the controller's address counter should be at.
    pub fn address(&self) -> u8 {
        self.address_counter
    }

    pub fn lcd_address(&self) -> u8 {
        self.lcd_address
    }

    pub fn rgb_address(&self) -> u8 {
        self.rgb_address
    }

    pub fn function(&self) -> FunctionSet {
        self.function
    }

    pub fn display_control(&self) -> DisplayControl {
        self.control
    }

    pub fn entry_mode(&self) -> EntryMode {
        self.entry
    }

    pub fn backlight(&self) -> bool {
        self.backlight
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initializes both controllers with the 5x8 font.
    ///
    /// The LCD gets the power-on sequence, is switched on with the cursor hidden, set to
    /// left-to-right text and cleared. The backlight is set up and lit white.
    pub fn init(&mut self) -> LcdResult<()> {
        self.begin(Font::Dots5x8)
    }

    /// Like [RgbLcd::init], with a font choice. The 5x10 font is only used on one-line displays.
    pub fn init_with_font(&mut self, font: Font) -> LcdResult<()> {
        self.begin(font)
    }

    fn begin(&mut self, font: Font) -> LcdResult<()> {
        debug!("Initializing {:?}...", self);
        self.initialized = false;
        self.current_line = 0;

        let function = FunctionSet {
            data_length: DataLength::FourBit,
            two_lines: self.lines > 1,
            font: if self.lines == 1 { font } else { Font::Dots5x8 },
        };

        // Synchronize
        let sync = FunctionSet {
            data_length: DataLength::EightBit,
            two_lines: false,
            font: Font::Dots5x8,
        };
        self.wait_us(POWER_ON_DELAY_US);
        self.function_set(sync)?;
        self.wait_us(SYNC_FIRST_DELAY_US);
        self.function_set(sync)?;
        self.wait_us(SYNC_DELAY_US);
        self.function_set(sync)?;
        self.wait_us(SYNC_DELAY_US);

        self.function_set(function)?;

        self.set_display_control(DisplayControl {
            display_on: true,
            cursor_on: false,
            blink_on: false,
        })?;
        self.set_entry_mode(EntryMode {
            direction: CursorDirection::Right,
            shift: false,
        })?;
        self.clear()?;

        debug!("Initializing backlight...");
        self.init_backlight()?;
        self.backlight = true;

        self.initialized = true;
        debug!("{:?} initialized.", self);
        Ok(())
    }

    /// Clears the display and moves the cursor home. Blocks for the command's execution time.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.clear_display()?;
        self.current_line = 0;
        Ok(())
    }

    /// Moves the cursor home and undoes display shifts. Blocks for the command's execution time.
    pub fn home(&mut self) -> LcdResult<()> {
        self.return_home()
    }

    /// Moves the cursor to `col` on `row`. Positions past the last row or column are clamped to
    /// it.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> LcdResult<()> {
        let row = row.min(self.lines - 1);
        let col = col.min(self.columns.saturating_sub(1));
        let address = ROW_OFFSETS[row as usize].wrapping_add(col) & 0b01111111;
        self.set_ddram_address(address)?;
        self.current_line = row;
        Ok(())
    }

    /// Sends a raw command byte. The shadow state follows it like any other command.
    pub fn command(&mut self, value: u8) -> LcdResult<()> {
        self.check_initialized("command");
        self.send_command(value)
    }

    /// Writes one character code at the cursor. Returns the number of bytes written.
    pub fn write(&mut self, value: u8) -> LcdResult<usize> {
        self.check_initialized("write");
        self.send_data(&[value])?;
        if !self.in_cgram {
            self.address_counter = next_ddram_address(
                self.address_counter,
                self.entry.direction,
                self.function.two_lines,
            );
        }
        Ok(1)
    }

    /// Writes a string at the cursor, character by character.
    ///
    /// The character ROM is only ASCII compatible, other characters are printed as `?`.
    pub fn print(&mut self, s: &str) -> LcdResult<usize> {
        let mut written = 0;
        for c in s.chars() {
            let byte = if c.is_ascii() {
                c as u8
            } else {
                warn!("Non-ASCII character: {}", c);
                b'?'
            };
            written += self.write(byte)?;
        }
        Ok(written)
    }

    /// Defines custom character `index` (`0..=7`, higher values wrap around) from 8 rows of
    /// 5 pixels, lowest bits being the rightmost pixels.
    ///
    /// The cursor is moved back to where it was afterwards, also when sending the pattern fails.
    pub fn custom_symbol(&mut self, index: u8, pattern: &[u8; 8]) -> LcdResult<()> {
        let location = index & 0b00000111;
        let restore = self.address_counter;
        self.set_cgram_address(location << 3)?;
        let written = self.send_data(pattern);
        let restored = self.set_ddram_address(restore);
        written.and(restored)
    }

    // Display control

    pub fn display(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { display_on: true, ..self.control })
    }

    /// Turns the display off without losing its content.
    pub fn no_display(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { display_on: false, ..self.control })
    }

    /// Shows the underline cursor.
    pub fn cursor(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { cursor_on: true, ..self.control })
    }

    pub fn no_cursor(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { cursor_on: false, ..self.control })
    }

    /// Blinks the block cursor.
    pub fn blink(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { blink_on: true, ..self.control })
    }

    pub fn stop_blink(&mut self) -> LcdResult<()> {
        self.set_display_control(DisplayControl { blink_on: false, ..self.control })
    }

    // Scrolling, without changing the RAM

    pub fn scroll_display_left(&mut self) -> LcdResult<()> {
        self.cursor_shift(true, CursorDirection::Left)
    }

    pub fn scroll_display_right(&mut self) -> LcdResult<()> {
        self.cursor_shift(true, CursorDirection::Right)
    }

    // Entry mode

    pub fn left_to_right(&mut self) -> LcdResult<()> {
        self.set_entry_mode(EntryMode { direction: CursorDirection::Right, ..self.entry })
    }

    pub fn right_to_left(&mut self) -> LcdResult<()> {
        self.set_entry_mode(EntryMode { direction: CursorDirection::Left, ..self.entry })
    }

    /// Shifts the display on every write, "right justifying" text from the cursor.
    pub fn autoscroll(&mut self) -> LcdResult<()> {
        self.set_entry_mode(EntryMode { shift: true, ..self.entry })
    }

    pub fn no_autoscroll(&mut self) -> LcdResult<()> {
        self.set_entry_mode(EntryMode { shift: false, ..self.entry })
    }

    // Aliases of the LiquidCrystal_I2C API

    pub fn blink_on(&mut self) -> LcdResult<()> {
        self.blink()
    }

    pub fn blink_off(&mut self) -> LcdResult<()> {
        self.stop_blink()
    }

    pub fn cursor_on(&mut self) -> LcdResult<()> {
        self.cursor()
    }

    pub fn cursor_off(&mut self) -> LcdResult<()> {
        self.no_cursor()
    }

    /// Lights the backlight white, or turns it off.
    pub fn set_backlight(&mut self, on: bool) -> LcdResult<()> {
        if on {
            self.set_color(Color::White)?;
        } else {
            self.set_color_all()?;
        }
        self.backlight = on;
        Ok(())
    }

    pub fn load_custom_character(&mut self, index: u8, rows: &[u8; 8]) -> LcdResult<()> {
        self.custom_symbol(index, rows)
    }

    pub fn printstr(&mut self, s: &str) -> LcdResult<usize> {
        self.print(s)
    }

    /// Updates the shadow state after `value` was sent.
    fn track_command(&mut self, value: u8) {
        if value & command::SET_DDRAM_ADDR != 0 {
            self.address_counter = value & 0b01111111;
            self.in_cgram = false;
        } else if value & command::SET_CGRAM_ADDR != 0 {
            self.in_cgram = true;
        } else if value & command::FUNCTION_SET != 0 {
            self.function = FunctionSet {
                data_length: if value & flag::EIGHT_BIT_MODE != 0 {
                    DataLength::EightBit
                } else {
                    DataLength::FourBit
                },
                two_lines: value & flag::TWO_LINE != 0,
                font: if value & flag::DOTS_5X10 != 0 { Font::Dots5x10 } else { Font::Dots5x8 },
            };
        } else if value & command::CURSOR_SHIFT != 0 {
            if value & flag::DISPLAY_MOVE == 0 {
                let direction = if value & flag::MOVE_RIGHT != 0 {
                    CursorDirection::Right
                } else {
                    CursorDirection::Left
                };
                self.address_counter =
                    next_ddram_address(self.address_counter, direction, self.function.two_lines);
            }
        } else if value & command::DISPLAY_CONTROL != 0 {
            self.control = DisplayControl {
                display_on: value & flag::DISPLAY_ON != 0,
                cursor_on: value & flag::CURSOR_ON != 0,
                blink_on: value & flag::BLINK_ON != 0,
            };
        } else if value & command::ENTRY_MODE_SET != 0 {
            self.entry = EntryMode {
                direction: if value & flag::ENTRY_LEFT != 0 {
                    CursorDirection::Right
                } else {
                    CursorDirection::Left
                },
                shift: value & flag::ENTRY_SHIFT_INCREMENT != 0,
            };
        } else if value & command::RETURN_HOME != 0 {
            self.address_counter = 0;
            self.in_cgram = false;
        } else if value == command::CLEAR_DISPLAY {
            // Clearing also sets the entry mode to increment
            self.address_counter = 0;
            self.in_cgram = false;
            self.entry.direction = CursorDirection::Right;
        }
    }

    fn check_initialized(&self, operation: &str) {
        if !self.initialized {
            warn!("{} called before init, the display might ignore it", operation);
        }
    }

    fn transmit(&mut self, address: u8, bytes: &[u8]) -> LcdResult<()> {
        trace!("Writing to {:#04x}: {:02x?}", address, bytes);
        self.i2c.write(address, bytes).map_err(LcdError::bus)
    }
}

impl<I2C, D> Debug for RgbLcd<I2C, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RgbLcd({}x{}, LCD @ {:#04x}, RGB @ {:#04x})",
            self.columns, self.lines, self.lcd_address, self.rgb_address
        )
    }
}

impl<I2C: I2c, D: DelayNs> HD44780Driver for RgbLcd<I2C, D> {
    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        trace!("Sending command: {:08b}", command);
        self.transmit(self.lcd_address, &[CONTROL_COMMAND, command])?;
        self.track_command(command);
        Ok(())
    }

    fn send_data(&mut self, data: &[u8]) -> LcdResult<()> {
        let mut buffer = Vec::with_capacity(data.len() + 1);
        buffer.push(CONTROL_DATA);
        buffer.extend_from_slice(data);
        self.transmit(self.lcd_address, &buffer)
    }

    fn wait_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

impl<I2C: I2c, D: DelayNs> RgbBacklightDriver for RgbLcd<I2C, D> {
    fn set_register(&mut self, register: u8, value: u8) -> LcdResult<()> {
        trace!("Setting RGB register {:#04x} to {}", register, value);
        self.transmit(self.rgb_address, &[register, value])
    }
}

impl<I2C: I2c, D: DelayNs> fmt::Write for RgbLcd<I2C, D> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s).map(|_| ()).map_err(|_| fmt::Error)
    }
}
