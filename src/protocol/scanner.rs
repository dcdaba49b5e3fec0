//! Textual `update_id` recovery for truncated responses.
//!
//! When a `getUpdates` body overflows the response buffer it can no longer
//! be decoded as JSON. The scanner walks the raw bytes looking for the
//! `"update_id"` key and parses the integer after it, wherever it occurs.
//! Digits inside user text that happen to follow the same key are picked up
//! too; callers accept that imprecision in exchange for forward progress.

/// Literal key marker searched for in the raw body.
const UPDATE_ID_MARKER: &[u8] = b"\"update_id\"";

/// Returns the largest `update_id` value found anywhere in `body`.
///
/// Accepts optional whitespace around the colon and an optional leading
/// minus sign. Values that overflow `i64` are skipped.
#[must_use]
pub fn extract_max_update_id(body: &[u8]) -> Option<i64> {
    let mut max: Option<i64> = None;
    let mut pos = 0;

    while let Some(found) = find(&body[pos..], UPDATE_ID_MARKER) {
        let after = pos + found + UPDATE_ID_MARKER.len();
        if let Some(value) = parse_value(&body[after..]) {
            max = Some(max.map_or(value, |m| m.max(value)));
        }
        pos = after;
    }

    max
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parses `<ws>:<ws>[-]<digits>` at the start of `data`.
fn parse_value(data: &[u8]) -> Option<i64> {
    let mut rest = skip_whitespace(data);
    rest = rest.strip_prefix(b":")?;
    rest = skip_whitespace(rest);

    let negative = rest.first() == Some(&b'-');
    if negative {
        rest = &rest[1..];
    }

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for &b in &rest[..digits] {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }

    Some(if negative { -value } else { value })
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let n = data.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &data[n..]
}
