//! OLE automation strings and arrays as exchanged with the SDK.
//!
//! Strings are `BSTR`s: UTF-16 code units preceded by a 32-bit byte length.
//! Arrays are one-dimensional `SAFEARRAY`s of `BSTR`s with an explicit lower
//! bound. Both are released on drop.

use std::ffi::c_void;
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};

/// Raw `BSTR` pointer.
pub(crate) type Bstr = *mut u16;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub(crate) struct SafeArrayBound {
    pub elements: u32,
    pub lower_bound: i32,
}

/// Memory layout of a `SAFEARRAY` descriptor.
#[repr(C)]
#[allow(dead_code)]
pub(crate) struct SafeArray {
    pub dims: u16,
    pub features: u16,
    pub element_size: u32,
    pub locks: u32,
    pub data: *mut c_void,
    pub bounds: [SafeArrayBound; 1],
}

/// Owned `BSTR`.
pub(crate) struct BString(NonNull<u16>);

impl BString {
    /// Allocate a `BSTR` holding `text`.
    pub fn new(text: &str) -> Result<Self> {
        if text.contains('\0') {
            return Err(Error::InvalidArgument(format!("{text:?} contains a NUL character")));
        }

        let wide: Vec<u16> = text.encode_utf16().collect();
        let ptr = unsafe { sys::alloc_string(&wide) };
        NonNull::new(ptr)
            .map(Self)
            .ok_or_else(|| Error::InvalidArgument(format!("unable to allocate {text:?}")))
    }

    /// Take ownership of a `BSTR` returned by the SDK.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a `BSTR` that nothing else frees.
    pub unsafe fn from_raw(ptr: Bstr) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[cfg(test)]
    pub fn into_raw(self) -> Bstr {
        let ptr = self.0.as_ptr();
        std::mem::forget(self);
        ptr
    }

    pub fn as_ptr(&self) -> Bstr {
        self.0.as_ptr()
    }

    pub fn to_string_lossy(&self) -> String {
        unsafe { wide_to_string(self.as_ptr()) }
    }
}

impl Drop for BString {
    fn drop(&mut self) {
        unsafe { sys::free_string(self.0.as_ptr()) };
    }
}

/// Convert a borrowed `BSTR` using its length prefix.
///
/// # Safety
///
/// `ptr` must be null or a valid `BSTR`.
pub(crate) unsafe fn wide_to_string(ptr: Bstr) -> String {
    if ptr.is_null() {
        return String::new();
    }

    let len = sys::string_len(ptr);
    String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
}

/// Owned one-dimensional `SAFEARRAY` of `BSTR`s.
pub(crate) struct BStringArray(NonNull<SafeArray>);

impl BStringArray {
    /// Take ownership of an array returned by the SDK.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a `SAFEARRAY` of `BSTR`s that nothing else destroys.
    pub unsafe fn from_raw(ptr: *mut SafeArray) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Build an array with the given lower bound.
    #[cfg(test)]
    pub fn from_strings(lower_bound: i32, items: &[&str]) -> Self {
        let items: Vec<BString> = items.iter().map(|item| BString::new(item).unwrap()).collect();
        let ptr = unsafe { sys::create_array(lower_bound, &items) };
        Self(NonNull::new(ptr).unwrap())
    }

    #[cfg(test)]
    pub fn into_raw(self) -> *mut SafeArray {
        let ptr = self.0.as_ptr();
        std::mem::forget(self);
        ptr
    }

    /// Inclusive lower and upper index bounds.
    ///
    /// An empty array has an upper bound one below its lower bound.
    pub fn bounds(&self) -> Result<(i64, i64)> {
        let array = unsafe { self.0.as_ref() };
        if array.dims != 1 {
            return Err(Error::InvalidData(format!("expected 1-D array, got {} dimensions", array.dims)));
        }

        let bound = array.bounds[0];
        let lower = i64::from(bound.lower_bound);
        Ok((lower, lower + i64::from(bound.elements) - 1))
    }

    /// Copy all elements into a zero-based vector, preserving order.
    pub fn to_strings(&self) -> Result<Vec<String>> {
        let (lower, upper) = self.bounds()?;
        let data = unsafe { self.0.as_ref().data } as *const Bstr;

        let mut strings = Vec::with_capacity((upper - lower + 1).max(0) as usize);
        for index in lower..=upper {
            let element = unsafe { *data.add((index - lower) as usize) };
            strings.push(unsafe { wide_to_string(element) });
        }

        Ok(strings)
    }
}

impl Drop for BStringArray {
    fn drop(&mut self) {
        unsafe { sys::destroy_array(self.0.as_ptr()) };
    }
}

/// Array out-parameter; the array is owned once the call returns.
pub(crate) struct ArrayOut(*mut SafeArray);

impl ArrayOut {
    pub fn new() -> Self {
        Self(ptr::null_mut())
    }

    pub fn as_mut_ptr(&mut self) -> *mut *mut SafeArray {
        &mut self.0
    }

    /// Take ownership of the written array, or an empty result if nothing was written.
    pub fn take(mut self) -> Option<BStringArray> {
        let ptr = std::mem::replace(&mut self.0, ptr::null_mut());
        unsafe { BStringArray::from_raw(ptr) }
    }
}

impl Drop for ArrayOut {
    fn drop(&mut self) {
        drop(unsafe { BStringArray::from_raw(self.0) });
    }
}

/// String out-parameter; the string is owned once the call returns.
pub(crate) struct StringOut(Bstr);

impl StringOut {
    pub fn new() -> Self {
        Self(ptr::null_mut())
    }

    pub fn as_mut_ptr(&mut self) -> *mut Bstr {
        &mut self.0
    }

    pub fn take(mut self) -> Option<BString> {
        let ptr = std::mem::replace(&mut self.0, ptr::null_mut());
        unsafe { BString::from_raw(ptr) }
    }
}

impl Drop for StringOut {
    fn drop(&mut self) {
        drop(unsafe { BString::from_raw(self.0) });
    }
}

#[cfg(windows)]
mod sys {
    use windows_sys::Win32::Foundation::{SysAllocStringLen, SysFreeString, SysStringLen};
    use windows_sys::Win32::System::Ole::SafeArrayDestroy;

    use super::{Bstr, SafeArray};

    pub(super) unsafe fn alloc_string(wide: &[u16]) -> Bstr {
        SysAllocStringLen(wide.as_ptr(), wide.len() as u32) as Bstr
    }

    pub(super) unsafe fn free_string(string: Bstr) {
        SysFreeString(string);
    }

    pub(super) unsafe fn string_len(string: Bstr) -> usize {
        SysStringLen(string) as usize
    }

    pub(super) unsafe fn destroy_array(array: *mut SafeArray) {
        SafeArrayDestroy(array as *const _);
    }

    #[cfg(test)]
    pub(super) unsafe fn create_array(lower_bound: i32, items: &[super::BString]) -> *mut SafeArray {
        use windows_sys::Win32::System::Ole::{SafeArrayCreateVector, SafeArrayPutElement};
        use windows_sys::Win32::System::Variant::VT_BSTR;

        let array = SafeArrayCreateVector(VT_BSTR, lower_bound, items.len() as u32);
        for (offset, item) in items.iter().enumerate() {
            let index = lower_bound + offset as i32;
            SafeArrayPutElement(array, &index, item.as_ptr() as *const _);
        }
        array as *mut SafeArray
    }
}

/// In-process allocator with the OLE automation memory layout.
///
/// The SDK only exists on Windows, elsewhere this backs the bridge's own
/// argument strings and stub SDK functions.
#[cfg(not(windows))]
mod sys {
    use std::alloc::{self, Layout};
    use std::mem;
    use std::ptr;

    use super::{Bstr, SafeArray};

    const PREFIX: usize = mem::size_of::<u32>();

    fn string_layout(len: usize) -> Option<Layout> {
        Layout::from_size_align(PREFIX + (len + 1) * 2, mem::align_of::<u32>()).ok()
    }

    pub(super) unsafe fn alloc_string(wide: &[u16]) -> Bstr {
        let layout = match string_layout(wide.len()) {
            Some(layout) => layout,
            None => return ptr::null_mut(),
        };

        let base = alloc::alloc(layout);
        if base.is_null() {
            return ptr::null_mut();
        }

        (base as *mut u32).write((wide.len() * 2) as u32);
        let string = base.add(PREFIX) as Bstr;
        ptr::copy_nonoverlapping(wide.as_ptr(), string, wide.len());
        string.add(wide.len()).write(0);
        string
    }

    pub(super) unsafe fn free_string(string: Bstr) {
        if string.is_null() {
            return;
        }

        let len = string_len(string);
        if let Some(layout) = string_layout(len) {
            alloc::dealloc((string as *mut u8).sub(PREFIX), layout);
        }
    }

    pub(super) unsafe fn string_len(string: Bstr) -> usize {
        (string as *const u32).sub(1).read() as usize / 2
    }

    pub(super) unsafe fn destroy_array(array: *mut SafeArray) {
        if array.is_null() {
            return;
        }

        let array = Box::from_raw(array);
        let len = array.bounds[0].elements as usize;
        let data = Box::from_raw(ptr::slice_from_raw_parts_mut(array.data as *mut Bstr, len));
        for &string in data.iter() {
            free_string(string);
        }
    }

    #[cfg(test)]
    pub(super) unsafe fn create_array(lower_bound: i32, items: &[super::BString]) -> *mut SafeArray {
        let data: Box<[Bstr]> = items
            .iter()
            .map(|item| {
                let len = string_len(item.as_ptr());
                alloc_string(std::slice::from_raw_parts(item.as_ptr(), len))
            })
            .collect();
        let elements = data.len() as u32;

        Box::into_raw(Box::new(SafeArray {
            dims: 1,
            features: 0,
            element_size: mem::size_of::<Bstr>() as u32,
            locks: 0,
            data: Box::into_raw(data) as *mut Bstr as *mut std::ffi::c_void,
            bounds: [super::SafeArrayBound { elements, lower_bound }],
        }))
    }
}
