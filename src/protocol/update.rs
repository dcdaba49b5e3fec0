//! Decoding of `getUpdates` response bodies.
//!
//! The body format is:
//! ```text
//! { "ok": true,
//!   "result": [ { "update_id": <number>,
//!                 "message": { "chat": { "id": <number> }, "text": <string> } },
//!               ... ] }
//! ```
//!
//! Decoding is lenient per update: an update with a missing or mistyped
//! field is kept with that field absent, so its id can still be acknowledged.

use serde_json::Value;

use crate::error::{Error, Result};

/// Largest integer magnitude a JSON double represents exactly (2^53).
pub const MAX_EXACT_ID: u64 = 1 << 53;

/// One decoded update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Update identifier, if present and numeric.
    pub update_id: Option<i64>,
    /// Text message carried by the update, if any.
    pub message: Option<TextMessage>,
}

/// A text message from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Identifier of the originating chat.
    pub chat_id: i64,
    /// Message text.
    pub text: String,
}

/// Decodes a complete `getUpdates` body.
///
/// A body whose `result` is absent or not an array yields no updates.
///
/// # Errors
///
/// Returns [`Error::Json`] if the body is not JSON and [`Error::Protocol`]
/// if `ok` is missing or not `true`.
pub fn decode_updates(body: &[u8]) -> Result<Vec<Update>> {
    let root: Value = serde_json::from_slice(body)?;

    if root.get("ok").and_then(Value::as_bool) != Some(true) {
        return Err(Error::protocol("API returned not ok"));
    }

    let Some(result) = root.get("result").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(result.iter().map(decode_update).collect())
}

/// Returns the `update_id` of the first update in a `getUpdates` body.
///
/// Used by the startup flush, which only cares about the newest pending id.
/// The `ok` flag is not checked; an unparsable or empty body yields `None`.
#[must_use]
pub fn first_update_id(body: &[u8]) -> Option<i64> {
    let root: Value = serde_json::from_slice(body).ok()?;
    let update = root.get("result")?.as_array()?.first()?;
    decode_id(update.get("update_id")?, "update_id")
}

fn decode_update(update: &Value) -> Update {
    let update_id = update
        .get("update_id")
        .and_then(|id| decode_id(id, "update_id"));

    let message = update.get("message").and_then(|message| {
        let text = message.get("text")?.as_str()?;
        let chat_id = message
            .get("chat")?
            .get("id")
            .and_then(|id| decode_id(id, "chat id"))?;
        Some(TextMessage {
            chat_id,
            text: text.to_owned(),
        })
    });

    Update { update_id, message }
}

/// Reads a numeric identifier.
///
/// Integers are taken exactly. Numbers that arrive in floating-point form
/// are converted with saturation. Either way a magnitude beyond 2^53 is
/// logged, since a peer encoding ids as doubles cannot represent it exactly.
fn decode_id(value: &Value, field: &str) -> Option<i64> {
    let id = if let Some(id) = value.as_i64() {
        id
    } else {
        let float = value.as_f64()?;
        if !float.is_finite() {
            return None;
        }
        float as i64
    };

    if id.unsigned_abs() > MAX_EXACT_ID {
        tracing::warn!("{} {} exceeds 2^53, may have lost precision", field, id);
    }

    Some(id)
}
