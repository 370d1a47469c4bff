//! Process privilege check.
//!
//! The SDK refuses to talk to the hardware unless the process is elevated.

/// Check if the current process token is elevated.
#[cfg(windows)]
pub fn is_process_elevated() -> bool {
    use std::ffi::c_void;
    use std::{mem, ptr};

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    /// Token handle closed on drop.
    struct Token(HANDLE);

    impl Drop for Token {
        fn drop(&mut self) {
            unsafe { CloseHandle(self.0) };
        }
    }

    let mut handle: HANDLE = ptr::null_mut();
    if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle) } == 0 {
        return false;
    }
    let token = Token(handle);

    let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
    let mut size = 0u32;
    let success = unsafe {
        GetTokenInformation(
            token.0,
            TokenElevation,
            &mut elevation as *mut TOKEN_ELEVATION as *mut c_void,
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut size,
        )
    };

    success != 0 && elevation.TokenIsElevated != 0
}

/// Check if the current process runs as root.
#[cfg(unix)]
pub fn is_process_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(any(windows, unix)))]
pub fn is_process_elevated() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_is_stable() {
        assert_eq!(is_process_elevated(), is_process_elevated());
    }
}
