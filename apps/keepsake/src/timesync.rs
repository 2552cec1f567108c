//! # Startup Time Sync
//!
//! One best-effort fetch of authoritative time from a remote clock
//! endpoint (timeapi.io shape: a JSON body with a `dateTime` field).
//! Every failure — connection, non-2xx status, malformed payload —
//! collapses to a zero offset and the session runs on the local clock.
//! There is exactly one attempt: no retries, no refresh during the
//! session.

use chrono::Utc;
use keepsake_core::ClockOffset;
use serde::Deserialize;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure modes of the time fetch. All of them are expected and
/// recoverable; they only ever surface as a WARN log line.
#[derive(Debug)]
enum SyncError {
    /// Cannot reach the time endpoint.
    Request(String),
    /// Endpoint answered with a non-success status.
    Status(u16),
    /// Body was not the expected JSON, or the timestamp did not parse.
    Parse(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "request failed: {msg}"),
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::Parse(msg) => write!(f, "malformed payload: {msg}"),
        }
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// The slice of the timeapi.io response this component cares about.
#[derive(Debug, Deserialize)]
struct TimePayload {
    #[serde(rename = "dateTime")]
    date_time: String,
}

// =============================================================================
// FETCH
// =============================================================================

/// Fetch the clock offset from a remote time endpoint.
///
/// Returns [`ClockOffset::ZERO`] on any failure — falling back to local
/// time is the designed behavior, not an error path the caller needs to
/// handle.
pub async fn fetch_clock_offset(url: &str) -> ClockOffset {
    match try_fetch(url).await {
        Ok(offset) => {
            tracing::info!(
                offset_ms = offset.millis(),
                "clock synchronized against {}",
                url
            );
            offset
        }
        Err(e) => {
            tracing::warn!("time sync unavailable ({e}), falling back to local clock");
            ClockOffset::ZERO
        }
    }
}

async fn try_fetch(url: &str) -> Result<ClockOffset, SyncError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| SyncError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Status(status.as_u16()));
    }

    let payload: TimePayload = response
        .json()
        .await
        .map_err(|e| SyncError::Parse(e.to_string()))?;

    let authoritative_ms = parse_authoritative_ms(&payload.date_time)?;
    let local_ms = Utc::now().timestamp_millis();
    Ok(ClockOffset::from_sample(authoritative_ms, local_ms))
}

/// Parse the endpoint's timestamp into unix milliseconds.
///
/// timeapi.io answers with a zone-local timestamp and no UTC marker
/// (`2026-02-14T11:59:58.123`); that is interpreted in the host's local
/// zone, exactly what the original page's `new Date(...)` did. RFC 3339
/// timestamps are accepted too for other endpoints.
fn parse_authoritative_ms(raw: &str) -> Result<i64, SyncError> {
    use chrono::{Local, NaiveDateTime, TimeZone};

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| SyncError::Parse(format!("{raw:?}: {e}")))?;

    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt.timestamp_millis()),
        chrono::LocalResult::Ambiguous(dt, _) => Ok(dt.timestamp_millis()),
        chrono::LocalResult::None => Err(SyncError::Parse(format!(
            "{raw:?} does not exist in the local timezone"
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
