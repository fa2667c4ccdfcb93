//! FFI bindings for the Emwatch engine
//!
//! This module provides C-compatible functions for calling the engine from
//! the platform UI layers. All functions use C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `emwatch_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Deserialize;

use crate::ambient::{estimate, Environment, ExposureProfile, SourceCounts};
use crate::averaging::time_weighted_average;
use crate::quality::SignalMeasure;
use crate::types::{Reading, WindowAverages};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

#[derive(Deserialize)]
struct AmbientRequest {
    #[serde(default)]
    counts: SourceCounts,
    #[serde(default)]
    environment: Environment,
    #[serde(default)]
    profile: ExposureProfile,
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute per-channel time-weighted averages over a window.
///
/// `readings_json` is a JSON array of readings; `max_gap_ms <= 0` disables
/// the gap cap. Returns a `WindowAverages` JSON object.
///
/// # Safety
/// - `readings_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `emwatch_free_string`.
/// - Returns NULL on error; call `emwatch_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn emwatch_window_average(
    readings_json: *const c_char,
    start_ms: i64,
    end_ms: i64,
    max_gap_ms: i64,
) -> *mut c_char {
    clear_last_error();

    let json = match cstr_to_string(readings_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid readings JSON pointer");
            return ptr::null_mut();
        }
    };

    let readings: Vec<Reading> = match serde_json::from_str(&json) {
        Ok(readings) => readings,
        Err(e) => {
            set_last_error(&format!("Failed to parse readings: {}", e));
            return ptr::null_mut();
        }
    };

    let cap = if max_gap_ms > 0 { Some(max_gap_ms) } else { None };
    let averages = WindowAverages {
        wifi: time_weighted_average(&readings, start_ms, end_ms, |r| r.wifi_level, cap),
        sar: time_weighted_average(&readings, start_ms, end_ms, |r| r.sar_level, cap),
        bluetooth: time_weighted_average(&readings, start_ms, end_ms, |r| r.bluetooth_level, cap),
    };

    match serde_json::to_string(&averages) {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Classify a raw measurement against a built-in signal measure.
///
/// `has_value` set to false classifies an absent measurement (always
/// `"none"`). Returns the quality category name.
///
/// # Safety
/// - `measure` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `emwatch_free_string`.
/// - Returns NULL on error; call `emwatch_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn emwatch_classify(
    measure: *const c_char,
    value: f64,
    has_value: bool,
) -> *mut c_char {
    clear_last_error();

    let name = match cstr_to_string(measure) {
        Some(s) => s,
        None => {
            set_last_error("Invalid measure name pointer");
            return ptr::null_mut();
        }
    };

    let descriptor = match SignalMeasure::by_name(&name) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let quality = descriptor.classify(has_value.then_some(value));
    string_to_cstr(quality.as_str())
}

/// Estimate ambient broadcast exposure.
///
/// `request_json` is a JSON object with optional `counts`, `environment`,
/// and `profile` fields; omitted fields fall back to zero counts, suburban,
/// and the average profile. Returns an `AmbientEstimate` JSON object.
///
/// # Safety
/// - `request_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `emwatch_free_string`.
/// - Returns NULL on error; call `emwatch_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn emwatch_ambient_estimate(request_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid request JSON pointer");
            return ptr::null_mut();
        }
    };

    let request: AmbientRequest = match serde_json::from_str(&json) {
        Ok(request) => request,
        Err(e) => {
            set_last_error(&format!("Failed to parse request: {}", e));
            return ptr::null_mut();
        }
    };

    let result = estimate(&request.counts, request.environment, request.profile);

    match serde_json::to_string(&result) {
        Ok(out) => string_to_cstr(&out),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Error handling and memory management
// ============================================================================

/// Get the last error message, or NULL if the last call succeeded.
///
/// # Safety
/// The returned pointer is owned by thread-local storage and must NOT be
/// freed; it is valid until the next engine call on this thread.
#[no_mangle]
pub unsafe extern "C" fn emwatch_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(msg) => msg.as_ptr(),
        None => ptr::null(),
    })
}

/// Free a string returned by an engine function.
///
/// # Safety
/// `ptr` must have been returned by an `emwatch_*` function and not freed
/// before. Passing NULL is a no-op.
#[no_mangle]
pub unsafe extern "C" fn emwatch_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
