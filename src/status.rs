//! Mystic Light SDK status codes.

use std::fmt::{self, Display, Formatter};

/// Outcome of a Mystic Light SDK call.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Status {
    Ok,
    Error,
    Timeout,
    NotImplemented,
    NotInitialized,
    InvalidArgument,
    DeviceNotFound,
    NotSupported,
    /// Code outside of the documented set.
    Unknown(i32),
}

impl Status {
    /// Raw SDK status code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Error => -1,
            Self::Timeout => -2,
            Self::NotImplemented => -3,
            Self::NotInitialized => -4,
            Self::InvalidArgument => -101,
            Self::DeviceNotFound => -102,
            Self::NotSupported => -103,
            Self::Unknown(code) => code,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            -1 => Self::Error,
            -2 => Self::Timeout,
            -3 => Self::NotImplemented,
            -4 => Self::NotInitialized,
            -101 => Self::InvalidArgument,
            -102 => Self::DeviceNotFound,
            -103 => Self::NotSupported,
            code => Self::Unknown(code),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "MLAPI_OK"),
            Self::Error => write!(f, "MLAPI_ERROR"),
            Self::Timeout => write!(f, "MLAPI_TIMEOUT"),
            Self::NotImplemented => write!(f, "MLAPI_NO_IMPLEMENTED"),
            Self::NotInitialized => write!(f, "MLAPI_NOT_INITIALIZED"),
            Self::InvalidArgument => write!(f, "MLAPI_INVALID_ARGUMENT"),
            Self::DeviceNotFound => write!(f, "MLAPI_DEVICE_NOT_FOUND"),
            Self::NotSupported => write!(f, "MLAPI_NOT_SUPPORTED"),
            Self::Unknown(code) => write!(f, "unknown status {code}"),
        }
    }
}
