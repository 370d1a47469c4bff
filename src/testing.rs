//! Stub Mystic Light SDK for tests.
//!
//! State is thread-local and reset whenever a stub table is created.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::bridge::Bridge;
use crate::loader::FunctionTable;
use crate::ole::{wide_to_string, BString, BStringArray, Bstr, SafeArray};

pub(crate) const MAX_BRIGHTNESS: u32 = 10;
pub(crate) const MAX_SPEED: u32 = 3;

const OK: i32 = 0;

#[derive(Default)]
struct LedState {
    color: (u32, u32, u32),
    style: String,
    brightness: u32,
    speed: u32,
}

#[derive(Default)]
struct State {
    calls: usize,
    fail_next: Option<i32>,
    fail_error_message: bool,
    devices: (i32, Vec<(String, String)>),
    styles: (i32, Vec<String>),
    leds: HashMap<(String, u32), LedState>,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

pub(crate) struct StubSdk;

impl StubSdk {
    pub fn table() -> FunctionTable {
        reset();

        let mut table = FunctionTable::default();
        table.initialize = Some(initialize);
        table.get_error_message = Some(get_error_message);
        table.get_device_info = Some(get_device_info);
        table.get_led_info = Some(get_led_info);
        table.get_led_name = Some(get_led_name);
        table.get_led_color = Some(get_led_color);
        table.get_led_style = Some(get_led_style);
        table.get_led_max_bright = Some(get_led_max_bright);
        table.get_led_bright = Some(get_led_bright);
        table.get_led_max_speed = Some(get_led_max_speed);
        table.get_led_speed = Some(get_led_speed);
        table.set_led_color = Some(set_led_color);
        table.set_led_style = Some(set_led_style);
        table.set_led_bright = Some(set_led_bright);
        table.set_led_speed = Some(set_led_speed);
        table.get_device_name = Some(get_device_name);
        table.get_device_name_ex = Some(get_device_name_ex);
        table
    }

    pub fn bridge() -> Bridge {
        Bridge::new(Self::table())
    }
}

fn reset() {
    STATE.with(|state| {
        *state.borrow_mut() = State {
            devices: (0, vec![("MSI_MB".into(), "5".into())]),
            styles: (0, vec!["Steady".into()]),
            ..State::default()
        }
    });
}

/// Replace the devices reported by `MLAPI_GetDeviceInfo`.
pub(crate) fn set_devices(lower_bound: i32, devices: &[(&str, &str)]) {
    let devices = devices.iter().map(|(kind, count)| (kind.to_string(), count.to_string())).collect();
    STATE.with(|state| state.borrow_mut().devices = (lower_bound, devices));
}

/// Replace the styles reported by `MLAPI_GetLedInfo`.
pub(crate) fn set_styles(lower_bound: i32, styles: &[&str]) {
    let styles = styles.iter().map(|style| style.to_string()).collect();
    STATE.with(|state| state.borrow_mut().styles = (lower_bound, styles));
}

/// Store a color without range checks.
pub(crate) fn set_raw_color(device: &str, index: u32, color: (u32, u32, u32)) {
    STATE.with(|state| {
        state.borrow_mut().leds.entry((device.into(), index)).or_default().color = color;
    });
}

/// Make the next SDK call fail with `code`.
pub(crate) fn fail_next(code: i32) {
    STATE.with(|state| state.borrow_mut().fail_next = Some(code));
}

/// Make `MLAPI_GetErrorMessage` fail.
pub(crate) fn fail_error_message() {
    STATE.with(|state| state.borrow_mut().fail_error_message = true);
}

/// Number of SDK calls since the stub table was created.
pub(crate) fn calls() -> usize {
    STATE.with(|state| state.borrow().calls)
}

pub(crate) fn error_description(code: i32) -> String {
    format!("stub error {code}")
}

/// Record a call, returning the injected failure if there is one.
fn enter() -> Option<i32> {
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.calls += 1;
        state.fail_next.take()
    })
}

fn with_led<T>(device: Bstr, index: u32, f: impl FnOnce(&mut LedState) -> T) -> T {
    let device = unsafe { wide_to_string(device) };
    STATE.with(|state| f(state.borrow_mut().leds.entry((device, index)).or_default()))
}

unsafe fn write_string(out: *mut Bstr, value: &str) {
    *out = BString::new(value).unwrap().into_raw();
}

unsafe fn write_array(out: *mut *mut SafeArray, lower_bound: i32, items: &[String]) {
    let items: Vec<&str> = items.iter().map(String::as_str).collect();
    *out = BStringArray::from_strings(lower_bound, &items).into_raw();
}

unsafe extern "C" fn initialize() -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    OK
}

unsafe extern "C" fn get_error_message(code: i32, out: *mut Bstr) -> i32 {
    let fail = STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.calls += 1;
        state.fail_error_message
    });
    if fail {
        return -1;
    }

    write_string(out, &error_description(code));
    OK
}

unsafe extern "C" fn get_device_info(types: *mut *mut SafeArray, counts: *mut *mut SafeArray) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    let (lower_bound, devices) = STATE.with(|state| state.borrow().devices.clone());
    let (kinds, led_counts): (Vec<String>, Vec<String>) = devices.into_iter().unzip();
    write_array(types, lower_bound, &kinds);
    write_array(counts, lower_bound, &led_counts);
    OK
}

unsafe extern "C" fn get_device_name(device: Bstr, out: *mut *mut SafeArray) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    write_array(out, 0, &[format!("{} #0", wide_to_string(device))]);
    OK
}

unsafe extern "C" fn get_device_name_ex(device: Bstr, index: u32, out: *mut Bstr) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    write_string(out, &format!("{} #{}", wide_to_string(device), index));
    OK
}

unsafe extern "C" fn get_led_info(
    device: Bstr,
    index: u32,
    name: *mut Bstr,
    styles: *mut *mut SafeArray,
) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    let (lower_bound, led_styles) = STATE.with(|state| state.borrow().styles.clone());
    write_string(name, &format!("{} LED {}", wide_to_string(device), index));
    write_array(styles, lower_bound, &led_styles);
    OK
}

unsafe extern "C" fn get_led_name(_device: Bstr, out: *mut *mut SafeArray) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    write_array(out, 0, &["JRGB1".to_string(), "JRAINBOW1".to_string()]);
    OK
}

unsafe extern "C" fn get_led_color(
    device: Bstr,
    index: u32,
    red: *mut u32,
    green: *mut u32,
    blue: *mut u32,
) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    let color = with_led(device, index, |led| led.color);
    *red = color.0;
    *green = color.1;
    *blue = color.2;
    OK
}

unsafe extern "C" fn get_led_style(device: Bstr, index: u32, out: *mut Bstr) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    let style = with_led(device, index, |led| led.style.clone());
    write_string(out, &style);
    OK
}

unsafe extern "C" fn get_led_max_bright(_device: Bstr, _index: u32, out: *mut u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    *out = MAX_BRIGHTNESS;
    OK
}

unsafe extern "C" fn get_led_bright(device: Bstr, index: u32, out: *mut u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    *out = with_led(device, index, |led| led.brightness);
    OK
}

unsafe extern "C" fn get_led_max_speed(_device: Bstr, _index: u32, out: *mut u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    *out = MAX_SPEED;
    OK
}

unsafe extern "C" fn get_led_speed(device: Bstr, index: u32, out: *mut u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    *out = with_led(device, index, |led| led.speed);
    OK
}

unsafe extern "C" fn set_led_color(device: Bstr, index: u32, red: u32, green: u32, blue: u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    with_led(device, index, |led| led.color = (red, green, blue));
    OK
}

unsafe extern "C" fn set_led_style(device: Bstr, index: u32, style: Bstr) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    let style = wide_to_string(style);
    with_led(device, index, |led| led.style = style);
    OK
}

unsafe extern "C" fn set_led_bright(device: Bstr, index: u32, level: u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    with_led(device, index, |led| led.brightness = level);
    OK
}

unsafe extern "C" fn set_led_speed(device: Bstr, index: u32, level: u32) -> i32 {
    if let Some(code) = enter() {
        return code;
    }

    with_led(device, index, |led| led.speed = level);
    OK
}
