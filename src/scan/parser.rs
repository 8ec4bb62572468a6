//! QR payload parser.
//!
//! Scanned codes carry `key=value` pairs, typically inside a URL query
//! string but with no guaranteed ordering or separator set. A structured
//! tokenizer (split on URL/whitespace separators, then on `=`) extracts the
//! fields; it is tolerant of surrounding text the same way the service's
//! printed codes require, without depending on field order.
//!
//! Pure function over the input string — no side effects.

use crate::error::{Result, RollcallError};
use crate::model::{ScanKind, ScanPayload};

/// Field naming a class session to check in against.
const FIELD_SESSION_ID: &str = "sessionId";

/// Field naming a campus event to check in against.
const FIELD_EVENT_ID: &str = "eventId";

/// Field carrying the check-in deadline (Unix seconds).
const FIELD_EXPIRED_AT: &str = "expiredAt";

/// Parse a raw scanned string into an attendance payload.
///
/// Succeeds only if `expiredAt` is present and numeric AND at least one of
/// `sessionId`/`eventId` is present and non-empty. When both ids are
/// present, the session id wins. The first occurrence of each field is
/// taken; later duplicates are ignored.
pub fn parse(raw: &str) -> Result<ScanPayload> {
    let mut session_id: Option<String> = None;
    let mut event_id: Option<String> = None;
    let mut expires_at: Option<u64> = None;

    for token in raw.split(is_separator) {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };

        match key {
            FIELD_SESSION_ID if session_id.is_none() => {
                let id = leading_alphanumeric(value);
                if !id.is_empty() {
                    session_id = Some(id.to_string());
                }
            }
            FIELD_EVENT_ID if event_id.is_none() => {
                let id = leading_alphanumeric(value);
                if !id.is_empty() {
                    event_id = Some(id.to_string());
                }
            }
            FIELD_EXPIRED_AT if expires_at.is_none() => {
                expires_at = leading_digits(value).parse().ok();
            }
            _ => {}
        }
    }

    let Some(expires_at_epoch_secs) = expires_at else {
        return Err(RollcallError::InvalidPayload(
            "missing or non-numeric expiredAt".into(),
        ));
    };

    // Session-kind payload wins when both ids are present
    let (kind, id) = if let Some(id) = session_id {
        (ScanKind::Session, id)
    } else if let Some(id) = event_id {
        (ScanKind::Event, id)
    } else {
        return Err(RollcallError::InvalidPayload(
            "missing sessionId/eventId".into(),
        ));
    };

    Ok(ScanPayload {
        kind,
        id,
        expires_at_epoch_secs,
    })
}

/// Characters that end one `key=value` token and start the next.
fn is_separator(c: char) -> bool {
    matches!(c, '?' | '&' | ';' | '#' | '/' | ',') || c.is_whitespace()
}

/// The leading `[A-Za-z0-9]` run of a value; empty when the value starts
/// with anything else.
fn leading_alphanumeric(value: &str) -> &str {
    let end = value
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(value.len());
    &value[..end]
}

/// The leading `[0-9]` run of a value.
fn leading_digits(value: &str) -> &str {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    &value[..end]
}

// ── Tests ───────────────────────────────────────────────────────────
