//! FFI bindings for motor-flux
//!
//! This module provides C-compatible functions for driving Flux from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `flux_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::engine::MetricEngine;
use crate::error::FluxError;
use crate::pipeline::session_to_report;

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

/// Return a JSON result as a C string, or NULL with the error recorded
fn json_result(result: Result<String, FluxError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay an NDJSON session and return the JSON assessment report.
///
/// # Safety
/// - `ndjson` and `subject` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `flux_free_string`.
/// - Returns NULL on error; call `flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flux_session_to_report(
    ndjson: *const c_char,
    subject: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(ndjson_str) = cstr_to_string(ndjson) else {
        set_last_error("Invalid NDJSON string pointer");
        return ptr::null_mut();
    };

    let Some(subject_str) = cstr_to_string(subject) else {
        set_last_error("Invalid subject string pointer");
        return ptr::null_mut();
    };

    let config = match parse_config(config_json) {
        Ok(config) => config,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    json_result(session_to_report(config, &ndjson_str, &subject_str))
}

unsafe fn parse_config(config_json: *const c_char) -> Result<EngineConfig, FluxError> {
    if config_json.is_null() {
        return Ok(EngineConfig::default());
    }
    let json = cstr_to_string(config_json)
        .ok_or_else(|| FluxError::ParseError("config is not valid UTF-8".to_string()))?;
    EngineConfig::from_json(&json)
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to a MetricEngine
pub struct FluxEngineHandle {
    engine: MetricEngine,
    encoder: ReportEncoder,
}

/// Create an engine fed by the synthetic sampler.
///
/// # Safety
/// - `config_json` may be NULL to use the default configuration.
/// - A negative `seed` seeds the sampler from OS entropy.
/// - Returns a pointer that must be freed with `flux_engine_free`.
/// - Returns NULL on error; call `flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_new(
    config_json: *const c_char,
    seed: i64,
) -> *mut FluxEngineHandle {
    clear_last_error();

    let seed = u64::try_from(seed).ok();
    let engine = parse_config(config_json).and_then(|config| MetricEngine::synthetic(config, seed));

    match engine {
        Ok(engine) => Box::into_raw(Box::new(FluxEngineHandle {
            engine,
            encoder: ReportEncoder::new(),
        })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_free(engine: *mut FluxEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Run one tick and return the resulting snapshot as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`.
/// - Returns a newly allocated string that must be freed with `flux_free_string`.
/// - Returns NULL on error; call `flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_tick(engine: *mut FluxEngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &mut *engine;
    let snapshot = handle.engine.on_tick();
    json_result(serde_json::to_string(&snapshot).map_err(FluxError::JsonError))
}

/// Record a tap at the engine clock's current time.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`.
/// - Returns 0 when recorded, 1 when rejected as out of order, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_tap(engine: *mut FluxEngineHandle) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    if (*engine).engine.on_tap_event() {
        0
    } else {
        1
    }
}

/// Record a tap at an explicit millisecond timestamp.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`.
/// - Returns 0 when recorded, 1 when rejected as out of order, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_tap_at(engine: *mut FluxEngineHandle, t_ms: u64) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    if (*engine).engine.record_tap_at(t_ms) {
        0
    } else {
        1
    }
}

/// Current snapshot as JSON, without ticking.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`.
/// - Returns a newly allocated string that must be freed with `flux_free_string`.
/// - Returns NULL on error; call `flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_snapshot_json(engine: *const FluxEngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let snapshot = (*engine).engine.snapshot();
    json_result(serde_json::to_string(&snapshot).map_err(FluxError::JsonError))
}

/// Assessment report for the current snapshot.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `flux_engine_new`.
/// - `subject` may be NULL for an unspecified subject.
/// - Returns a newly allocated string that must be freed with `flux_free_string`.
/// - Returns NULL on error; call `flux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn flux_engine_report_json(
    engine: *const FluxEngineHandle,
    subject: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &*engine;
    let subject = cstr_to_string(subject).unwrap_or_default();
    json_result(handle.encoder.encode_to_json(&handle.engine.snapshot(), &subject))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn flux_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Flux function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn flux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Flux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn flux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        flux_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_session_to_report() {
        let ndjson = CString::new(
            "{\"type\":\"tick\",\"angular_rate\":{\"x\":30.0,\"y\":0.0,\"z\":0.0},\"force\":85.0}\n",
        )
        .unwrap();
        let subject = CString::new("Subject A").unwrap();

        unsafe {
            let result = flux_session_to_report(ndjson.as_ptr(), subject.as_ptr(), ptr::null());
            let report: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(report["subject"], "Subject A");
            assert_eq!(report["metrics"][1]["zone"], "alert");
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = flux_engine_new(ptr::null(), 7);
            assert!(!engine.is_null());

            assert_eq!(flux_engine_tap_at(engine, 0), 0);
            assert_eq!(flux_engine_tap_at(engine, 200), 0);
            assert_eq!(flux_engine_tap_at(engine, 100), 1);

            let tick: serde_json::Value =
                serde_json::from_str(&take_string(flux_engine_tick(engine))).unwrap();
            assert_eq!(tick["tap_count"], 2);
            assert_eq!(tick["scores"]["tapping"], 0.0);
            assert_eq!(tick["ticks_applied"], 1);

            let snapshot: serde_json::Value =
                serde_json::from_str(&take_string(flux_engine_snapshot_json(engine))).unwrap();
            assert_eq!(snapshot, tick);

            let report: serde_json::Value =
                serde_json::from_str(&take_string(flux_engine_report_json(engine, ptr::null())))
                    .unwrap();
            assert_eq!(report["subject"], "Not Specified");

            flux_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        let config = CString::new(r#"{"tick_period_ms": 0}"#).unwrap();
        unsafe {
            let engine = flux_engine_new(config.as_ptr(), -1);
            assert!(engine.is_null());

            let error = flux_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("tick_period_ms"));
        }
    }

    #[test]
    fn test_ffi_null_engine() {
        unsafe {
            assert!(flux_engine_tick(ptr::null_mut()).is_null());
            assert_eq!(flux_engine_tap(ptr::null_mut()), -1);
            assert!(!flux_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = flux_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
