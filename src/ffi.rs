//! FFI Layer
//!
//! All C-ABI exports are defined here. Every function follows the same pattern:
//! - Input: JSON string (null-terminated C string)
//! - Output: JSON string (must be freed with `wallet_history_free_string`)
//!
//! Error handling: All functions return JSON with a `success` field.
//! On error, `success: false` and the `error` object is populated.

use serde::Deserialize;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::config::HistoryConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::history::{self, HistoryContext};
use crate::types::*;

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any wallet_history_* function
///
/// # Safety
/// The pointer must have been returned by a wallet_history_* function
#[unsafe(no_mangle)]
pub extern "C" fn wallet_history_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_input(input: *const c_char) -> HistoryResult<String> {
    if input.is_null() {
        return Err(HistoryError::invalid_input("Null input pointer"));
    }

    let c_str = unsafe { CStr::from_ptr(input) };
    c_str
        .to_str()
        .map(str::to_owned)
        .map_err(|_| HistoryError::invalid_input("Invalid UTF-8 string"))
}

fn parse_request<T: serde::de::DeserializeOwned>(input: *const c_char) -> HistoryResult<T> {
    let json = parse_input(input)?;
    serde_json::from_str(&json).map_err(|e| HistoryError::parse_error(format!("Invalid JSON: {}", e)))
}

fn respond<T: serde::Serialize>(result: HistoryResult<T>) -> *mut c_char {
    let json = match result {
        Ok(data) => ApiResponse::ok(data).to_json(),
        Err(e) => ApiResponse::<()>::err(e).to_json(),
    };
    string_to_ptr(json)
}

fn string_to_ptr(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => CString::new(
            r#"{"success":false,"error":{"code":"internal","message":"String conversion failed"}}"#,
        )
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut()),
    }
}

// =============================================================================
// History Operations
// =============================================================================

#[derive(Deserialize)]
struct NextPageRequest {
    #[serde(default)]
    config: HistoryConfig,
    address: String,
    context: Option<HistoryContext>,
    /// History filter for a new session; ignored when resuming
    sources: Option<Vec<SourceLabel>>,
}

#[derive(Deserialize)]
struct NewContextRequest {
    default_row: Option<u32>,
    sources: Option<Vec<SourceLabel>>,
}

fn new_context(default_row: u32, sources: Option<&[SourceLabel]>) -> HistoryContext {
    match sources {
        Some(sources) => HistoryContext::for_sources(default_row, sources),
        None => HistoryContext::new(default_row),
    }
}

fn next_page(request: NextPageRequest) -> HistoryResult<HistoryPage> {
    let context = request.context.unwrap_or_else(|| {
        new_context(request.config.default_row, request.sources.as_deref())
    });

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| HistoryError::internal(format!("Failed to create runtime: {}", e)))?;

    runtime.block_on(history::fetch_next_page(&request.config, &context, &request.address))
}

/// Fetch the next merged history page
///
/// # Input
/// ```json
/// {
///   "config": { "base_url": "https://polkadot.api.subscan.io", "default_row": 100 },
///   "address": "15oF4u...",
///   "context": null
/// }
/// ```
/// A missing `context` starts a new session, optionally restricted to
/// `"sources": ["transfers", "rewards", "extrinsics"]`.
///
/// # Output
/// ```json
/// { "success": true, "data": { "items": [...], "context": {...} } }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn wallet_history_next_page(input: *const c_char) -> *mut c_char {
    respond(parse_request::<NextPageRequest>(input).and_then(next_page))
}

/// Create a fresh history context
///
/// # Input
/// ```json
/// { "default_row": 100, "sources": ["transfers", "rewards"] }
/// ```
/// Sources left out of `sources` start complete and are never fetched.
#[unsafe(no_mangle)]
pub extern "C" fn wallet_history_new_context(input: *const c_char) -> *mut c_char {
    respond(parse_request::<NewContextRequest>(input).and_then(|request| {
        let context = new_context(
            request.default_row.unwrap_or(crate::config::DEFAULT_ROW),
            request.sources.as_deref(),
        );
        context.validate()?;
        Ok(context)
    }))
}
