//! Raw I2C driver for the Raspberry Pi, talking to the BSC (Broadcom Serial Controller)
//! registers directly.
//!
//! **⚠️ Needs `/dev/mem` access, so root privileges.**

use crate::{LcdError, LcdResult};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use log::{debug, trace};
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum RawI2cError {
    #[error("device did not acknowledge")]
    NoAcknowledge,
    #[error("device held the clock low for too long")]
    ClockStretchTimeout,
    #[error("transfer did not finish in time")]
    Timeout,
    #[error("address is not a 7-bit address")]
    InvalidAddress,
    #[error("transfer longer than 65535 bytes")]
    TooLong,
}

impl embedded_hal::i2c::Error for RawI2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            RawI2cError::NoAcknowledge => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            RawI2cError::ClockStretchTimeout => ErrorKind::Bus,
            RawI2cError::Timeout | RawI2cError::InvalidAddress | RawI2cError::TooLong => {
                ErrorKind::Other
            }
        }
    }
}

/// Raw I2C master driver for the Raspberry Pi (BCM2836/BCM2837 memory map).
///
/// Creating it switches the controller's SDA and SCL pins to their I2C function (ALT0): GPIO0
/// and GPIO1 for BSC0, GPIO2 and GPIO3 for BSC1, which is the one on the header.
///
/// Transfers are polled. The controller can't do repeated starts without racing it, so each
/// operation of a transaction is a separate transfer with its own stop condition. Both
/// controllers in the display module are fine with that.
///
/// Registers used:
/// - `C` (control): `I2CEN` enables the controller, `ST` starts a transfer, `CLEAR` flushes the
///   FIFO, `READ` selects the direction.
/// - `S` (status): `DONE`, `ERR` (no ACK) and `CLKT` (clock stretch timeout) are cleared by
///   writing `1`; `TXD` and `RXD` tell whether the FIFO can take or give data.
/// - `DLEN`, `A`, `FIFO`, `DIV`: transfer length, slave address, data, clock divider.
pub struct RawI2cDriver {
    mmap: MmapRaw,
    bus_index: u8,
    timeout: Duration,
}

impl RawI2cDriver {
    /// The base address for the GPIO registers in the Raspberry Pi memory map.
    pub const GPIO_BASE: u32 = 0x3F200000;
    /// The base addresses of the BSC0 and BSC1 controllers.
    pub const BSC_BASES: [u32; 2] = [0x3F205000, 0x3F804000];
    /// SDA and SCL pins of each controller.
    const BSC_PINS: [[usize; 2]; 2] = [[0, 1], [2, 3]];
    const ALT0: u32 = 0b100;

    /// The clock feeding the controllers.
    const CORE_CLOCK_HZ: u32 = 250_000_000;
    /// Standard mode, what the display module is specified for.
    pub const DEFAULT_FREQUENCY_HZ: u32 = 100_000;

    const REG_C: usize = 0x00;
    const REG_S: usize = 0x04;
    const REG_DLEN: usize = 0x08;
    const REG_A: usize = 0x0C;
    const REG_FIFO: usize = 0x10;
    const REG_DIV: usize = 0x14;

    const C_I2CEN: u32 = 1 << 15;
    const C_ST: u32 = 1 << 7;
    const C_CLEAR: u32 = 0b11 << 4;
    const C_READ: u32 = 1;

    const S_CLKT: u32 = 1 << 9;
    const S_ERR: u32 = 1 << 8;
    const S_RXD: u32 = 1 << 5;
    const S_TXD: u32 = 1 << 4;
    const S_DONE: u32 = 1 << 1;

    /// Opens BSC `bus_index` through the memory device at `path`, clocked at `frequency_hz`.
    pub fn open(path: &str, bus_index: usize, frequency_hz: u32) -> LcdResult<Self> {
        if bus_index >= Self::BSC_BASES.len() || frequency_hz == 0 {
            return Err(LcdError::InvalidArgument);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let gpio = MmapOptions::new()
            .offset(Self::GPIO_BASE as u64)
            .len(4096)
            .map_raw(&file)?;
        for pin in Self::BSC_PINS[bus_index] {
            Self::set_pin_function(&gpio, pin, Self::ALT0);
        }

        let mmap = MmapOptions::new()
            .offset(Self::BSC_BASES[bus_index] as u64)
            .len(0x20)
            .map_raw(&file)?;

        let driver = RawI2cDriver {
            mmap,
            bus_index: bus_index as u8,
            timeout: Duration::from_millis(100),
        };
        driver.write_register(Self::REG_DIV, Self::divisor(frequency_hz));
        driver.write_register(Self::REG_C, Self::C_I2CEN | Self::C_CLEAR);

        debug!("{:?} opened at {} Hz.", driver, frequency_hz);

        Ok(driver)
    }

    /// Opens BSC `bus_index` through `/dev/mem` at the default frequency.
    pub fn new_mem(bus_index: usize) -> LcdResult<Self> {
        Self::open("/dev/mem", bus_index, Self::DEFAULT_FREQUENCY_HZ)
    }

    /// Sets how long a single transfer may take before it's abandoned.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn divisor(frequency_hz: u32) -> u32 {
        (Self::CORE_CLOCK_HZ / frequency_hz).clamp(2, 0xFFFE)
    }

    fn set_pin_function(gpio: &MmapRaw, pin_index: usize, function: u32) {
        let mmap = gpio.as_mut_ptr() as *mut u32;
        // GPFSELn register
        let register_ptr = unsafe { mmap.add(pin_index / 10) };
        let shift = (pin_index % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift);
        register_value |= function << shift;
        unsafe { register_ptr.write_volatile(register_value) };
    }

    fn read_register(&self, offset: usize) -> u32 {
        let mmap = self.mmap.as_ptr() as *const u32;
        unsafe { mmap.add(offset / 4).read_volatile() }
    }

    fn write_register(&self, offset: usize, value: u32) {
        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        unsafe { mmap.add(offset / 4).write_volatile(value) };
    }

    fn start(&self, address: u8, len: usize, read: bool) -> Result<(), RawI2cError> {
        if address > 0x7F {
            return Err(RawI2cError::InvalidAddress);
        }
        if len > 0xFFFF {
            return Err(RawI2cError::TooLong);
        }

        self.write_register(Self::REG_C, Self::C_I2CEN | Self::C_CLEAR);
        self.write_register(Self::REG_S, Self::S_CLKT | Self::S_ERR | Self::S_DONE);
        self.write_register(Self::REG_A, address as u32);
        self.write_register(Self::REG_DLEN, len as u32);

        let mut control = Self::C_I2CEN | Self::C_ST;
        if read {
            control |= Self::C_READ;
        }
        self.write_register(Self::REG_C, control);
        Ok(())
    }

    /// Checks the status for errors. Returns whether the transfer is done.
    fn poll(&self, started: Instant) -> Result<bool, RawI2cError> {
        let status = self.read_register(Self::REG_S);

        let error = if status & Self::S_ERR != 0 {
            Some(RawI2cError::NoAcknowledge)
        } else if status & Self::S_CLKT != 0 {
            Some(RawI2cError::ClockStretchTimeout)
        } else if status & Self::S_DONE == 0 && started.elapsed() > self.timeout {
            Some(RawI2cError::Timeout)
        } else {
            None
        };

        if let Some(error) = error {
            self.write_register(Self::REG_C, Self::C_I2CEN | Self::C_CLEAR);
            self.write_register(Self::REG_S, Self::S_CLKT | Self::S_ERR | Self::S_DONE);
            return Err(error);
        }

        Ok(status & Self::S_DONE != 0)
    }

    fn write_bytes(&self, address: u8, bytes: &[u8]) -> Result<(), RawI2cError> {
        trace!("BSC{} write {:#04x}: {:02x?}", self.bus_index, address, bytes);
        self.start(address, bytes.len(), false)?;

        let started = Instant::now();
        let mut sent = 0;
        loop {
            while sent < bytes.len() && self.read_register(Self::REG_S) & Self::S_TXD != 0 {
                self.write_register(Self::REG_FIFO, bytes[sent] as u32);
                sent += 1;
            }
            if self.poll(started)? {
                break;
            }
        }

        self.write_register(Self::REG_S, Self::S_DONE);
        Ok(())
    }

    fn read_bytes(&self, address: u8, buffer: &mut [u8]) -> Result<(), RawI2cError> {
        self.start(address, buffer.len(), true)?;

        let started = Instant::now();
        let mut received = 0;
        loop {
            while received < buffer.len() && self.read_register(Self::REG_S) & Self::S_RXD != 0 {
                buffer[received] = self.read_register(Self::REG_FIFO) as u8;
                received += 1;
            }
            if self.poll(started)? {
                break;
            }
        }
        // Whatever is left in the FIFO after DONE
        while received < buffer.len() && self.read_register(Self::REG_S) & Self::S_RXD != 0 {
            buffer[received] = self.read_register(Self::REG_FIFO) as u8;
            received += 1;
        }

        self.write_register(Self::REG_S, Self::S_DONE);
        trace!("BSC{} read {:#04x}: {:02x?}", self.bus_index, address, buffer);
        Ok(())
    }
}

impl Debug for RawI2cDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawI2cDriver({:?}, BSC{})", self.mmap.as_ptr().addr(), self.bus_index)
    }
}

impl ErrorType for RawI2cDriver {
    type Error = RawI2cError;
}

impl I2c for RawI2cDriver {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write_bytes(address, bytes)?,
                Operation::Read(buffer) => self.read_bytes(address, buffer)?,
            }
        }
        Ok(())
    }
}

impl Drop for RawI2cDriver {
    fn drop(&mut self) {
        self.write_register(Self::REG_C, 0);
    }
}
