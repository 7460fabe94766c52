use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use dotenv::var;
use rgb_lcd::{LCD_ADDRESS, RGB_ADDRESS};
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub columns: u8,
    pub rows: u8,
    pub lcd_address: u8,
    pub rgb_address: u8,
    /// Backlight color as `[r, g, b]`.
    pub color: [u8; 3],
    /// Shown on the first line.
    pub greeting: String,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        Self::try_load_from(Path::new(config_str))
    }

    fn try_load_from(config_path: &Path) -> Option<Self> {
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        self.save_to(Path::new(&config_str))
    }

    fn save_to(&self, config_path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            columns: 16,
            rows: 2,
            lcd_address: LCD_ADDRESS,
            rgb_address: RGB_ADDRESS,
            color: [255, 255, 255],
            greeting: "Hello, world!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{ "rows": 4, "color": [0, 0, 255] }"#).unwrap();
        assert_eq!(config.rows, 4);
        assert_eq!(config.columns, 16);
        assert_eq!(config.color, [0, 0, 255]);
        assert_eq!(config.lcd_address, 0x3E);
        assert_eq!(config.rgb_address, 0x60);
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("rgb_lcd_demo_{}.json", std::process::id()));
        let config = Config {
            greeting: "Saved".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::try_load_from(&path), Some(config));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_loads_nothing() {
        assert_eq!(Config::try_load_from(Path::new("/nonexistent/config.json")), None);
    }
}
