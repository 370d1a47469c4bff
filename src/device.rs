//! Device and LED handles on top of the bridge.

use std::path::PathBuf;

use tracing::debug;

use crate::bridge::Bridge;
use crate::elevation::is_process_elevated;
use crate::error::{Error, Result};
use crate::loader::FunctionTable;
use crate::types::{Color, DeviceInfo, LedInfo};

/// SDK session settings.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// SDK library file or directory containing it; system search path if unset.
    pub library_path: Option<PathBuf>,

    /// Refuse to initialize unless the process is elevated.
    pub require_elevation: bool,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self { library_path: None, require_elevation: true }
    }
}

/// Initialized Mystic Light SDK.
#[derive(Debug)]
pub struct MysticLight {
    bridge: Bridge,
}

impl MysticLight {
    /// Load and initialize the SDK.
    pub fn new(config: &SdkConfig) -> Result<Self> {
        let table = match &config.library_path {
            Some(path) => FunctionTable::load_from(path)?,
            None => FunctionTable::load()?,
        };

        if config.require_elevation && !is_process_elevated() {
            return Err(Error::NotElevated);
        }

        Self::with_bridge(Bridge::new(table))
    }

    /// Initialize the SDK through an existing bridge.
    pub fn with_bridge(bridge: Bridge) -> Result<Self> {
        bridge.initialize()?;
        debug!("SDK initialized");
        Ok(Self { bridge })
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// All accessible devices.
    pub fn devices(&self) -> Result<Vec<Device<'_>>> {
        let infos = self.bridge.device_info()?;
        infos.into_iter().map(|info| Device::new(&self.bridge, info)).collect()
    }

    /// Device with the given identifier.
    pub fn device(&self, identifier: &str) -> Result<Device<'_>> {
        self.devices()?
            .into_iter()
            .find(|device| device.identifier() == identifier)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown device {identifier:?}")))
    }
}

/// Mystic Light device.
#[derive(Debug)]
pub struct Device<'a> {
    bridge: &'a Bridge,
    info: DeviceInfo,
    leds: Vec<Led<'a>>,
}

impl<'a> Device<'a> {
    fn new(bridge: &'a Bridge, info: DeviceInfo) -> Result<Self> {
        if info.device_type.trim().is_empty() {
            return Err(Error::InvalidData("device identifier is blank".into()));
        }

        let leds = (0..info.led_count)
            .map(|index| Ok(Led { bridge, info: bridge.led_info(&info.device_type, index)? }))
            .collect::<Result<_>>()?;

        Ok(Self { bridge, info, leds })
    }

    pub fn identifier(&self) -> &str {
        &self.info.device_type
    }

    pub fn led_count(&self) -> u32 {
        self.info.led_count
    }

    /// Human readable device name.
    pub fn name(&self) -> Result<String> {
        self.bridge.device_name_ex(self.identifier(), 0)
    }

    pub fn leds(&self) -> &[Led<'a>] {
        &self.leds
    }

    /// LED by index.
    pub fn led(&self, index: u32) -> Option<&Led<'a>> {
        self.leds.get(index as usize)
    }

    /// LED by its human readable name.
    pub fn led_by_name(&self, name: &str) -> Option<&Led<'a>> {
        self.leds.iter().find(|led| led.name() == name)
    }
}

/// LED area of a device.
///
/// This is either a single physical LED or a group of LEDs, like an LED
/// header on a mainboard.
#[derive(Debug)]
pub struct Led<'a> {
    bridge: &'a Bridge,
    info: LedInfo,
}

impl<'a> Led<'a> {
    pub fn device(&self) -> &str {
        &self.info.device_type
    }

    pub fn index(&self) -> u32 {
        self.info.index
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Styles accepted by [`Led::set_style`].
    pub fn styles(&self) -> &[String] {
        &self.info.styles
    }

    pub fn color(&self) -> Result<Color> {
        self.bridge.led_color(self.device(), self.index())
    }

    pub fn style(&self) -> Result<String> {
        self.bridge.led_style(self.device(), self.index())
    }

    pub fn max_brightness(&self) -> Result<u32> {
        self.bridge.led_max_brightness(self.device(), self.index())
    }

    pub fn brightness(&self) -> Result<u32> {
        self.bridge.led_brightness(self.device(), self.index())
    }

    pub fn max_speed(&self) -> Result<u32> {
        self.bridge.led_max_speed(self.device(), self.index())
    }

    pub fn speed(&self) -> Result<u32> {
        self.bridge.led_speed(self.device(), self.index())
    }

    pub fn set_color(&self, color: Color) -> Result<()> {
        self.bridge.set_led_color(self.device(), self.index(), color)
    }

    /// Activate one of the LED's [styles](Led::styles).
    pub fn set_style(&self, style: &str) -> Result<()> {
        if !self.styles().iter().any(|available| available == style) {
            return Err(Error::InvalidArgument(format!(
                "style {style:?} is not available for {}",
                self.name()
            )));
        }

        self.bridge.set_led_style(self.device(), self.index(), style)
    }

    /// Set brightness in `0..=max_brightness`.
    pub fn set_brightness(&self, level: u32) -> Result<()> {
        let max = self.max_brightness()?;
        if level > max {
            return Err(Error::InvalidArgument(format!("brightness {level} exceeds {max}")));
        }

        self.bridge.set_led_brightness(self.device(), self.index(), level)
    }

    /// Set animation speed in `0..=max_speed`.
    pub fn set_speed(&self, level: u32) -> Result<()> {
        let max = self.max_speed()?;
        if level > max {
            return Err(Error::InvalidArgument(format!("speed {level} exceeds {max}")));
        }

        self.bridge.set_led_speed(self.device(), self.index(), level)
    }
}
