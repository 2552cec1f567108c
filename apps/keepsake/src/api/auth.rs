//! # Admin Key Guard
//!
//! Protects the `/debug/*` routes. The gate's own secrets are advisory
//! cleartext by design; the debug override is the one surface that can
//! skip them entirely, so it gets a real check.
//!
//! ## Configuration
//!
//! - `KEEPSAKE_ADMIN_KEY`: If set, `/debug/*` requests require this key
//!   as `Authorization: Bearer <key>`. If unset, the routes are only as
//!   guarded as the config flag that registered them.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// ADMIN KEY
// =============================================================================

/// Get the admin key from the environment.
///
/// Returns `Some(key)` if `KEEPSAKE_ADMIN_KEY` is set and non-empty.
pub fn get_admin_key_from_env() -> Option<String> {
    std::env::var("KEEPSAKE_ADMIN_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

/// Admin key middleware.
///
/// Only `/debug/*` paths are examined; everything else passes through
/// untouched. When a key is configured, the comparison is constant-time
/// with length padding so neither content nor length leaks through
/// timing.
pub async fn admin_key_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if !request.uri().path().starts_with("/debug/") {
        return Ok(next.run(request).await);
    }

    let Some(expected) = get_admin_key_from_env() else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(header_value) => {
            let provided = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

            let provided_bytes = provided.as_bytes();
            let expected_bytes = expected.as_bytes();

            let max_len = provided_bytes.len().max(expected_bytes.len());
            let mut padded_provided = vec![0u8; max_len];
            let mut padded_expected = vec![0u8; max_len];
            padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
            padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

            let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
            let is_valid = bytes_match && provided_bytes.len() == expected_bytes.len();

            if is_valid {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_admin_key",
                    "Debug route rejected: invalid admin key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Debug route rejected: missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
