//! Records exchanged with callers of the bridge.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Device as reported by `MLAPI_GetDeviceInfo`.
///
/// The device type identifies the device in all other SDK calls.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct DeviceInfo {
    pub device_type: String,
    pub led_count: u32,
}

/// LED area of a device as reported by `MLAPI_GetLedInfo`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct LedInfo {
    pub device_type: String,
    pub index: u32,
    pub name: String,
    /// Supported styles in SDK order.
    pub styles: Vec<String>,
}

/// LED color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Color, ()> {
        let chars = if s.starts_with("0x") && s.len() == 8 {
            &s[2..]
        } else {
            return Err(());
        };

        match u32::from_str_radix(chars, 16) {
            Ok(color) => {
                let blue = (color & 0xff) as u8;
                let green = ((color >> 8) & 0xff) as u8;
                let red = (color >> 16) as u8;
                Ok(Color { red, green, blue })
            },
            Err(_) => Err(()),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        assert_eq!(Color::from_str("0xff8001"), Ok(Color::new(0xff, 0x80, 0x01)));
        assert_eq!(Color::from_str("ff8001"), Err(()));
        assert_eq!(Color::from_str("0xff80"), Err(()));
        assert_eq!(Color::from_str("0xgg8001"), Err(()));
    }

    #[test]
    fn color_display_matches_cli_format() {
        assert_eq!(Color::new(0x0a, 0xb0, 0xff).to_string(), "0x0ab0ff");
    }
}
