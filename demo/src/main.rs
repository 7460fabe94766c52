mod config;

use std::env::var;
use std::fmt::Write;
use std::thread;
use std::time::Duration;
use dotenv::dotenv;
use log::{debug, info};
use rgb_lcd::RgbLcd;
use rgb_lcd::delay::StdDelay;
use rgb_lcd::raw::RawI2cDriver;
use rgb_lcd::rgb::RgbBacklightDriver;
use time::OffsetDateTime;
use crate::config::Config;

/// A small clock face, shown before the time.
const CLOCK_GLYPH: [u8; 8] = [
    0b00000,
    0b01110,
    0b10101,
    0b10111,
    0b10001,
    0b01110,
    0b00000,
    0b00000,
];

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("RGB LCD demo starting...");

    let bus_index: usize = match var("RGBLCD_I2C_BUS") {
        Ok(value) => value.parse()?,
        Err(_) => 1,
    };
    let mem_path = var("RGBLCD_MEM").unwrap_or_else(|_| "/dev/mem".to_string());

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    info!("LCD {}x{} @ {:#04x}, RGB @ {:#04x}, BSC{} via {}",
        config.columns, config.rows, config.lcd_address, config.rgb_address, bus_index, mem_path);

    debug!("Initializing I2C driver...");
    let i2c = RawI2cDriver::open(&mem_path, bus_index, RawI2cDriver::DEFAULT_FREQUENCY_HZ)?;
    debug!("{:?} initialized.", i2c);

    debug!("Initializing LCD driver...");
    let mut lcd = RgbLcd::with_addresses(
        i2c,
        StdDelay,
        config.columns,
        config.rows,
        config.lcd_address,
        config.rgb_address,
    );
    lcd.init()?;

    let [r, g, b] = config.color;
    lcd.set_rgb(r, g, b)?;
    lcd.custom_symbol(0, &CLOCK_GLYPH)?;
    lcd.print(&config.greeting)?;

    debug!("{:?} initialized.", lcd);

    info!("Starting main loop...");

    loop {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

        lcd.set_cursor(0, 1)?;
        lcd.write(0)?;
        write!(lcd, " {:02}:{:02}:{:02}", now.hour(), now.minute(), now.second())?;

        // Sleep for 1/5th of a second
        thread::sleep(Duration::from_millis(200));
    }
}
