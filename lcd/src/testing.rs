//! Test doubles recording bus writes and delays into one shared, ordered log.

use crate::{RgbLcd, CONTROL_COMMAND, CONTROL_DATA, LCD_ADDRESS, RGB_ADDRESS};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    Write(u8, Vec<u8>),
    DelayNs(u64),
}

pub fn command(command: u8) -> Event {
    Event::Write(LCD_ADDRESS, vec![CONTROL_COMMAND, command])
}

pub fn data(bytes: &[u8]) -> Event {
    let mut payload = vec![CONTROL_DATA];
    payload.extend_from_slice(bytes);
    Event::Write(LCD_ADDRESS, payload)
}

pub fn register(register: u8, value: u8) -> Event {
    Event::Write(RGB_ADDRESS, vec![register, value])
}

pub fn delay_us(us: u32) -> Event {
    Event::DelayNs(us as u64 * 1_000)
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Returns everything recorded so far and empties the log.
    pub fn take(&self) -> Vec<Event> {
        self.0.borrow_mut().drain(..).collect()
    }
}

#[derive(Debug)]
pub struct RecordingBus(EventLog);

impl RecordingBus {
    pub fn new(log: &EventLog) -> Self {
        RecordingBus(log.clone())
    }
}

impl ErrorType for RecordingBus {
    type Error = Infallible;
}

impl I2c for RecordingBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.0.push(Event::Write(address, bytes.to_vec())),
                Operation::Read(buffer) => buffer.fill(0),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingDelay(EventLog);

impl RecordingDelay {
    pub fn new(log: &EventLog) -> Self {
        RecordingDelay(log.clone())
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(Event::DelayNs(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.push(Event::DelayNs(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::DelayNs(ms as u64 * 1_000_000));
    }
}

pub fn recording_lcd(columns: u8, rows: u8) -> (RgbLcd<RecordingBus, RecordingDelay>, EventLog) {
    let log = EventLog::default();
    let lcd = RgbLcd::new(RecordingBus::new(&log), RecordingDelay::new(&log), columns, rows);
    (lcd, log)
}

/// A driver that already went through `init`, with the init traffic dropped from the log.
pub fn initialized_lcd(columns: u8, rows: u8) -> (RgbLcd<RecordingBus, RecordingDelay>, EventLog) {
    let (mut lcd, log) = recording_lcd(columns, rows);
    lcd.init().unwrap();
    log.take();
    (lcd, log)
}
