//! Mystic Light SDK library loading and symbol resolution.

use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ole::{Bstr, SafeArray};

/// SDK library for 32-bit processes.
pub const SDK_LIBRARY_X86: &str = "MysticLight_SDK.dll";

/// SDK library for all other processes.
pub const SDK_LIBRARY_X64: &str = "MysticLight_SDK_x64.dll";

pub(crate) type InitializeFn = unsafe extern "C" fn() -> i32;
pub(crate) type GetErrorMessageFn = unsafe extern "C" fn(i32, *mut Bstr) -> i32;
pub(crate) type GetDeviceInfoFn = unsafe extern "C" fn(*mut *mut SafeArray, *mut *mut SafeArray) -> i32;
pub(crate) type GetNamesFn = unsafe extern "C" fn(Bstr, *mut *mut SafeArray) -> i32;
pub(crate) type GetLedStringFn = unsafe extern "C" fn(Bstr, u32, *mut Bstr) -> i32;
pub(crate) type GetLedInfoFn = unsafe extern "C" fn(Bstr, u32, *mut Bstr, *mut *mut SafeArray) -> i32;
pub(crate) type GetLedColorFn = unsafe extern "C" fn(Bstr, u32, *mut u32, *mut u32, *mut u32) -> i32;
pub(crate) type GetLedValueFn = unsafe extern "C" fn(Bstr, u32, *mut u32) -> i32;
pub(crate) type SetLedColorFn = unsafe extern "C" fn(Bstr, u32, u32, u32, u32) -> i32;
pub(crate) type SetLedStyleFn = unsafe extern "C" fn(Bstr, u32, Bstr) -> i32;
pub(crate) type SetLedValueFn = unsafe extern "C" fn(Bstr, u32, u32) -> i32;

/// Resolved SDK exports.
///
/// A slot is `None` when its export could not be resolved. The table keeps
/// the library loaded for as long as the function pointers are reachable.
#[derive(Default)]
pub struct FunctionTable {
    pub(crate) initialize: Option<InitializeFn>,
    pub(crate) get_error_message: Option<GetErrorMessageFn>,
    pub(crate) get_device_info: Option<GetDeviceInfoFn>,
    pub(crate) get_led_info: Option<GetLedInfoFn>,
    pub(crate) get_led_name: Option<GetNamesFn>,
    pub(crate) get_led_color: Option<GetLedColorFn>,
    pub(crate) get_led_style: Option<GetLedStringFn>,
    pub(crate) get_led_max_bright: Option<GetLedValueFn>,
    pub(crate) get_led_bright: Option<GetLedValueFn>,
    pub(crate) get_led_max_speed: Option<GetLedValueFn>,
    pub(crate) get_led_speed: Option<GetLedValueFn>,
    pub(crate) set_led_color: Option<SetLedColorFn>,
    pub(crate) set_led_style: Option<SetLedStyleFn>,
    pub(crate) set_led_bright: Option<SetLedValueFn>,
    pub(crate) set_led_speed: Option<SetLedValueFn>,
    pub(crate) get_device_name: Option<GetNamesFn>,
    pub(crate) get_device_name_ex: Option<GetLedStringFn>,
    library: Option<Library>,
}

/// Resolve an export, leaving the slot empty if it is missing.
macro_rules! resolve {
    ($library:expr, $symbol:literal, $ty:ty) => {
        match unsafe { $library.get::<$ty>(concat!($symbol, "\0").as_bytes()) } {
            Ok(symbol) => Some(*symbol),
            Err(err) => {
                warn!("unable to resolve {}: {}", $symbol, err);
                None
            },
        }
    };
}

impl FunctionTable {
    /// Load the SDK library for the current process architecture from the system search path.
    pub fn load() -> Result<Self> {
        Self::open(library_name())
    }

    /// Load the SDK library from a file, or from a directory containing the
    /// library for the current process architecture.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_library_path(path.as_ref())?;
        Self::open(path)
    }

    fn open(path: impl AsRef<std::ffi::OsStr>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();

        debug!("loading SDK library {}", name);
        let library =
            unsafe { Library::new(path) }.map_err(|source| Error::Load { library: name, source })?;

        let mut table = Self {
            initialize: resolve!(library, "MLAPI_Initialize", InitializeFn),
            get_error_message: resolve!(library, "MLAPI_GetErrorMessage", GetErrorMessageFn),
            get_device_info: resolve!(library, "MLAPI_GetDeviceInfo", GetDeviceInfoFn),
            get_led_info: resolve!(library, "MLAPI_GetLedInfo", GetLedInfoFn),
            get_led_name: resolve!(library, "MLAPI_GetLedName", GetNamesFn),
            get_led_color: resolve!(library, "MLAPI_GetLedColor", GetLedColorFn),
            get_led_style: resolve!(library, "MLAPI_GetLedStyle", GetLedStringFn),
            get_led_max_bright: resolve!(library, "MLAPI_GetLedMaxBright", GetLedValueFn),
            get_led_bright: resolve!(library, "MLAPI_GetLedBright", GetLedValueFn),
            get_led_max_speed: resolve!(library, "MLAPI_GetLedMaxSpeed", GetLedValueFn),
            get_led_speed: resolve!(library, "MLAPI_GetLedSpeed", GetLedValueFn),
            set_led_color: resolve!(library, "MLAPI_SetLedColor", SetLedColorFn),
            set_led_style: resolve!(library, "MLAPI_SetLedStyle", SetLedStyleFn),
            set_led_bright: resolve!(library, "MLAPI_SetLedBright", SetLedValueFn),
            set_led_speed: resolve!(library, "MLAPI_SetLedSpeed", SetLedValueFn),
            get_device_name: resolve!(library, "MLAPI_GetDeviceName", GetNamesFn),
            get_device_name_ex: resolve!(library, "MLAPI_GetDeviceNameEx", GetLedStringFn),
            library: None,
        };
        table.library = Some(library);

        debug!("resolved {} of {} SDK exports", table.resolved(), EXPORT_COUNT);

        Ok(table)
    }

    /// Check if the SDK library is loaded.
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// Number of resolved exports.
    pub fn resolved(&self) -> usize {
        [
            self.initialize.is_some(),
            self.get_error_message.is_some(),
            self.get_device_info.is_some(),
            self.get_led_info.is_some(),
            self.get_led_name.is_some(),
            self.get_led_color.is_some(),
            self.get_led_style.is_some(),
            self.get_led_max_bright.is_some(),
            self.get_led_bright.is_some(),
            self.get_led_max_speed.is_some(),
            self.get_led_speed.is_some(),
            self.set_led_color.is_some(),
            self.set_led_style.is_some(),
            self.set_led_bright.is_some(),
            self.set_led_speed.is_some(),
            self.get_device_name.is_some(),
            self.get_device_name_ex.is_some(),
        ]
        .iter()
        .filter(|resolved| **resolved)
        .count()
    }
}

impl Debug for FunctionTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("loaded", &self.is_loaded())
            .field("resolved", &self.resolved())
            .finish()
    }
}

/// Number of SDK exports bound by the table.
const EXPORT_COUNT: usize = 17;

/// SDK library file name for the current process architecture.
pub fn library_name() -> &'static str {
    library_name_for(std::env::consts::ARCH)
}

fn library_name_for(arch: &str) -> &'static str {
    match arch {
        "x86" => SDK_LIBRARY_X86,
        _ => SDK_LIBRARY_X64,
    }
}

fn resolve_library_path(path: &Path) -> Result<PathBuf> {
    let path = if path.is_dir() { path.join(library_name()) } else { path.to_path_buf() };

    if !path.is_file() {
        return Err(Error::LibraryNotFound(path));
    }

    Ok(path)
}
