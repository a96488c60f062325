//! Short code and link id generation, plus custom code validation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes behind a generated short code (12 base64 characters).
const CODE_LENGTH_BYTES: usize = 9;

/// Random bytes behind a link id.
const LINK_ID_BYTES: usize = 16;

/// Codes that collide with routes of the service or the front-end it redirects to.
pub const RESERVED_CODES: &[&str] = &[
    "api",
    "health",
    "auth",
    "editor",
    "link-expired",
    "template-library",
];

fn random_bytes<const N: usize>() -> Result<[u8; N], AppError> {
    let mut buffer = [0u8; N];
    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;
    Ok(buffer)
}

/// Generates a URL-safe short code of 12 characters.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_code() -> Result<String, AppError> {
    let buffer = random_bytes::<CODE_LENGTH_BYTES>()?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Generates an opaque link id such as `lnk_3f9a...` (32 hex digits).
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_link_id() -> Result<String, AppError> {
    let buffer = random_bytes::<LINK_ID_BYTES>()?;
    Ok(format!("lnk_{}", hex::encode(buffer)))
}

/// Checks the rules a custom code must satisfy beyond its character set.
///
/// Length and the `[a-z0-9-]` alphabet are enforced by request validation;
/// this rejects edge hyphens and reserved codes.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_code(code: &str) -> Result<(), AppError> {
    if code.starts_with('-') || code.ends_with('-') {
        return Err(AppError::bad_request(
            "Custom code cannot start or end with a hyphen",
            json!({ "code": code }),
        ));
    }

    if RESERVED_CODES.contains(&code) {
        return Err(AppError::bad_request(
            "This code is reserved",
            json!({ "code": code }),
        ));
    }

    Ok(())
}
