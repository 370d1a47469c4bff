//! Typed access to the Mystic Light SDK functions.
//!
//! Every call marshals its arguments into `BSTR`s and `DWORD`s, invokes the
//! resolved export once and translates the returned status. All SDK-owned
//! strings and arrays are released before returning, on success and failure.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::loader::{FunctionTable, GetLedValueFn};
use crate::ole::{ArrayOut, BString, BStringArray, StringOut};
use crate::status::Status;
use crate::types::{Color, DeviceInfo, LedInfo};

/// Fetch a resolved export or fail with [`Error::NotInitialized`].
macro_rules! export {
    ($self:ident . $slot:ident, $symbol:literal) => {
        $self.table.$slot.ok_or(Error::NotInitialized($symbol))?
    };
}

/// Mystic Light SDK bridge.
#[derive(Debug, Default)]
pub struct Bridge {
    table: FunctionTable,
}

impl Bridge {
    pub fn new(table: FunctionTable) -> Self {
        Self { table }
    }

    /// Load the SDK library for the current process architecture.
    pub fn load() -> Result<Self> {
        FunctionTable::load().map(Self::new)
    }

    pub fn table(&self) -> &FunctionTable {
        &self.table
    }

    /// Initialize the SDK, required before any other SDK call.
    pub fn initialize(&self) -> Result<()> {
        let initialize = export!(self.initialize, "MLAPI_Initialize");
        debug!("initializing SDK");
        self.check(unsafe { initialize() })
    }

    /// All Mystic Light devices with their LED count.
    pub fn device_info(&self) -> Result<Vec<DeviceInfo>> {
        let get_device_info = export!(self.get_device_info, "MLAPI_GetDeviceInfo");

        let mut types = ArrayOut::new();
        let mut counts = ArrayOut::new();
        self.check(unsafe { get_device_info(types.as_mut_ptr(), counts.as_mut_ptr()) })?;

        let types = strings(types.take())?;
        let counts = strings(counts.take())?;
        if types.len() != counts.len() {
            warn!("SDK returned {} device types but {} LED counts", types.len(), counts.len());
        }

        types
            .into_iter()
            .zip(counts)
            .map(|(device_type, count)| {
                let led_count = count.trim().parse().map_err(|_| {
                    Error::InvalidData(format!("LED count {count:?} of {device_type} is not a number"))
                })?;
                Ok(DeviceInfo { device_type, led_count })
            })
            .collect()
    }

    /// Names of all instances of a device type.
    pub fn device_name(&self, device: &str) -> Result<Vec<String>> {
        let get_device_name = export!(self.get_device_name, "MLAPI_GetDeviceName");
        let device = BString::new(device)?;

        let mut names = ArrayOut::new();
        self.check(unsafe { get_device_name(device.as_ptr(), names.as_mut_ptr()) })?;

        strings(names.take())
    }

    /// Qualified name of a device instance.
    pub fn device_name_ex(&self, device: &str, index: u32) -> Result<String> {
        let get_device_name_ex = export!(self.get_device_name_ex, "MLAPI_GetDeviceNameEx");
        let device = BString::new(device)?;

        let mut name = StringOut::new();
        self.check(unsafe { get_device_name_ex(device.as_ptr(), index, name.as_mut_ptr()) })?;

        Ok(string(name.take()))
    }

    /// Name and supported styles of an LED area.
    pub fn led_info(&self, device: &str, index: u32) -> Result<LedInfo> {
        let get_led_info = export!(self.get_led_info, "MLAPI_GetLedInfo");
        let device_type = BString::new(device)?;

        let mut name = StringOut::new();
        let mut styles = ArrayOut::new();
        self.check(unsafe {
            get_led_info(device_type.as_ptr(), index, name.as_mut_ptr(), styles.as_mut_ptr())
        })?;

        Ok(LedInfo {
            device_type: device.into(),
            index,
            name: string(name.take()),
            styles: strings(styles.take())?,
        })
    }

    /// Names of all LEDs of a device.
    pub fn led_name(&self, device: &str) -> Result<Vec<String>> {
        let get_led_name = export!(self.get_led_name, "MLAPI_GetLedName");
        let device = BString::new(device)?;

        let mut names = ArrayOut::new();
        self.check(unsafe { get_led_name(device.as_ptr(), names.as_mut_ptr()) })?;

        strings(names.take())
    }

    pub fn led_color(&self, device: &str, index: u32) -> Result<Color> {
        let get_led_color = export!(self.get_led_color, "MLAPI_GetLedColor");
        let device = BString::new(device)?;

        let (mut red, mut green, mut blue) = (0u32, 0u32, 0u32);
        self.check(unsafe { get_led_color(device.as_ptr(), index, &mut red, &mut green, &mut blue) })?;

        Ok(Color { red: channel(red)?, green: channel(green)?, blue: channel(blue)? })
    }

    pub fn led_style(&self, device: &str, index: u32) -> Result<String> {
        let get_led_style = export!(self.get_led_style, "MLAPI_GetLedStyle");
        let device = BString::new(device)?;

        let mut style = StringOut::new();
        self.check(unsafe { get_led_style(device.as_ptr(), index, style.as_mut_ptr()) })?;

        Ok(string(style.take()))
    }

    pub fn led_max_brightness(&self, device: &str, index: u32) -> Result<u32> {
        let get_led_max_bright = export!(self.get_led_max_bright, "MLAPI_GetLedMaxBright");
        self.led_value(get_led_max_bright, device, index)
    }

    pub fn led_brightness(&self, device: &str, index: u32) -> Result<u32> {
        let get_led_bright = export!(self.get_led_bright, "MLAPI_GetLedBright");
        self.led_value(get_led_bright, device, index)
    }

    pub fn led_max_speed(&self, device: &str, index: u32) -> Result<u32> {
        let get_led_max_speed = export!(self.get_led_max_speed, "MLAPI_GetLedMaxSpeed");
        self.led_value(get_led_max_speed, device, index)
    }

    pub fn led_speed(&self, device: &str, index: u32) -> Result<u32> {
        let get_led_speed = export!(self.get_led_speed, "MLAPI_GetLedSpeed");
        self.led_value(get_led_speed, device, index)
    }

    pub fn set_led_color(&self, device: &str, index: u32, color: Color) -> Result<()> {
        let set_led_color = export!(self.set_led_color, "MLAPI_SetLedColor");
        let device = BString::new(device)?;

        let Color { red, green, blue } = color;
        self.check(unsafe {
            set_led_color(device.as_ptr(), index, red.into(), green.into(), blue.into())
        })
    }

    /// Set the color of multiple named LEDs.
    ///
    /// Not bridged; always fails without calling into the SDK.
    pub fn set_led_colors(
        &self,
        _device: &str,
        _index: u32,
        _led_names: &[&str],
        _color: Color,
    ) -> Result<()> {
        Err(Error::Unsupported("MLAPI_SetLedColors"))
    }

    /// Set the color of a named LED.
    ///
    /// Not bridged; always fails without calling into the SDK.
    pub fn set_led_color_ex(
        &self,
        _device: &str,
        _index: u32,
        _led_name: &str,
        _color: Color,
        _sync: bool,
    ) -> Result<()> {
        Err(Error::Unsupported("MLAPI_SetLedColorEx"))
    }

    /// Set the color of a named LED with synchronization.
    ///
    /// Not bridged; always fails without calling into the SDK.
    pub fn set_led_color_sync(
        &self,
        _device: &str,
        _index: u32,
        _led_name: &str,
        _color: Color,
        _sync: bool,
    ) -> Result<()> {
        Err(Error::Unsupported("MLAPI_SetLedColorSync"))
    }

    pub fn set_led_style(&self, device: &str, index: u32, style: &str) -> Result<()> {
        let set_led_style = export!(self.set_led_style, "MLAPI_SetLedStyle");
        let device = BString::new(device)?;
        let style = BString::new(style)?;

        self.check(unsafe { set_led_style(device.as_ptr(), index, style.as_ptr()) })
    }

    pub fn set_led_brightness(&self, device: &str, index: u32, level: u32) -> Result<()> {
        let set_led_bright = export!(self.set_led_bright, "MLAPI_SetLedBright");
        let device = BString::new(device)?;

        self.check(unsafe { set_led_bright(device.as_ptr(), index, level) })
    }

    pub fn set_led_speed(&self, device: &str, index: u32, level: u32) -> Result<()> {
        let set_led_speed = export!(self.set_led_speed, "MLAPI_SetLedSpeed");
        let device = BString::new(device)?;

        self.check(unsafe { set_led_speed(device.as_ptr(), index, level) })
    }

    fn led_value(
        &self,
        get_value: GetLedValueFn,
        device: &str,
        index: u32,
    ) -> Result<u32> {
        let device = BString::new(device)?;

        let mut value = 0u32;
        self.check(unsafe { get_value(device.as_ptr(), index, &mut value) })?;

        Ok(value)
    }

    /// Translate an SDK status into a result.
    fn check(&self, code: i32) -> Result<()> {
        if Status::from(code).is_ok() {
            return Ok(());
        }

        let message = self.error_message(code);
        debug!("SDK call failed with code {}: {:?}", code, message);

        Err(Error::Api { code, message })
    }

    /// Description of a status code, if the SDK can provide one.
    fn error_message(&self, code: i32) -> Option<String> {
        let get_error_message = self.table.get_error_message?;

        let mut message = StringOut::new();
        let status = unsafe { get_error_message(code, message.as_mut_ptr()) };
        let message = message.take();

        if !Status::from(status).is_ok() {
            warn!("unable to look up description of code {}: status {}", code, status);
            return None;
        }

        message.map(|message| message.to_string_lossy())
    }
}

fn string(string: Option<BString>) -> String {
    string.map(|string| string.to_string_lossy()).unwrap_or_default()
}

fn strings(array: Option<BStringArray>) -> Result<Vec<String>> {
    match array {
        Some(array) => array.to_strings(),
        None => Ok(Vec::new()),
    }
}

fn channel(value: u32) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::InvalidData(format!("color channel {value} exceeds 255")))
}
