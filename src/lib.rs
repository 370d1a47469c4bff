//! MSI Mystic Light SDK bindings.
//!
//! The SDK ships as a closed-source DLL (`MysticLight_SDK.dll` for 32-bit
//! processes, `MysticLight_SDK_x64.dll` otherwise). [`FunctionTable`] loads it
//! and resolves its exports, [`Bridge`] converts between Rust values and the
//! SDK's OLE automation strings and arrays, and [`MysticLight`] offers device
//! and LED handles on top of that.
//!
//! The SDK only talks to the hardware from an elevated process, see
//! [`is_process_elevated`].

mod bridge;
mod device;
mod elevation;
mod error;
mod loader;
mod ole;
mod status;
mod types;

#[cfg(test)]
mod testing;

pub use crate::bridge::Bridge;
pub use crate::device::{Device, Led, MysticLight, SdkConfig};
pub use crate::elevation::is_process_elevated;
pub use crate::error::{Error, Result};
pub use crate::loader::{library_name, FunctionTable, SDK_LIBRARY_X64, SDK_LIBRARY_X86};
pub use crate::status::Status;
pub use crate::types::{Color, DeviceInfo, LedInfo};
