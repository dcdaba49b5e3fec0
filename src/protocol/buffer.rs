//! Fixed-capacity buffers for response bodies and message text.
//!
//! Both types refuse to grow past their capacity. [`ResponseBuffer`] keeps
//! the prefix that fits and raises a sticky `truncated` flag;
//! [`BoundedText`] cuts text at the last UTF-8 boundary that fits.

use bytes::{BufMut, Bytes, BytesMut};

/// Default capacity of a response body buffer.
pub const DEFAULT_RESPONSE_CAPACITY: usize = 4096;

/// Accumulator for a streamed HTTP body with a hard size limit.
///
/// Once a chunk does not fit, the part that does fit is kept and the buffer
/// is marked truncated. The flag is never cleared; a truncated buffer must
/// not be handed to a structured decoder.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    data: BytesMut,
    capacity: usize,
    truncated: bool,
}

impl ResponseBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    /// Appends a chunk.
    ///
    /// Returns `false` if the chunk did not fit entirely, in which case the
    /// fitting prefix was kept and the buffer is now truncated. A truncated
    /// buffer rejects every later chunk, including an empty one.
    pub fn append(&mut self, chunk: &[u8]) -> bool {
        if self.truncated {
            return false;
        }

        let room = self.capacity - self.data.len();
        if chunk.len() <= room {
            self.data.put_slice(chunk);
            return true;
        }

        self.data.put_slice(&chunk[..room]);
        self.truncated = true;
        false
    }

    /// Returns true once any appended data was dropped.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the buffered bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the capacity limit.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the buffered bytes as lossily decoded text, for logging.
    #[must_use]
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Consumes the buffer, returning its bytes.
    #[must_use]
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

/// Owned text limited to a maximum number of bytes.
///
/// Longer input is cut at the last character boundary that fits, so the
/// result is always valid UTF-8 and never exceeds the limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedText {
    text: String,
    truncated: bool,
}

impl BoundedText {
    /// Builds bounded text from `text`, keeping at most `max_len` bytes.
    #[must_use]
    pub fn new(text: &str, max_len: usize) -> Self {
        if text.len() <= max_len {
            return Self {
                text: text.to_owned(),
                truncated: false,
            };
        }

        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            text: text[..end].to_owned(),
            truncated: true,
        }
    }

    /// Returns the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if the input was cut to fit.
    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Consumes the value, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for BoundedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for BoundedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_capacity() {
        let mut buf = ResponseBuffer::with_capacity(8);
        assert!(buf.append(b"abc"));
        assert!(buf.append(b"defgh"));
        assert_eq!(buf.as_bytes(), b"abcdefgh");
        assert!(!buf.is_truncated());
    }

    #[test]
    fn test_append_overflow_keeps_prefix() {
        let mut buf = ResponseBuffer::with_capacity(8);
        assert!(buf.append(b"abcdef"));
        assert!(!buf.append(b"ghij"));
        assert_eq!(buf.as_bytes(), b"abcdefgh");
        assert!(buf.is_truncated());
        assert_eq!(buf.len(), buf.capacity());
    }

    #[test]
    fn test_truncated_flag_is_sticky() {
        let mut buf = ResponseBuffer::with_capacity(2);
        assert!(!buf.append(b"xyz"));
        assert!(!buf.append(b""));
        assert!(!buf.append(b"z"));
        assert!(buf.is_truncated());
        assert_eq!(buf.as_bytes(), b"xy");
    }

    #[test]
    fn test_zero_capacity() {
        let mut buf = ResponseBuffer::with_capacity(0);
        assert!(buf.append(b""));
        assert!(!buf.is_truncated());
        assert!(!buf.append(b"a"));
        assert!(buf.is_empty());
        assert!(buf.is_truncated());
    }

    #[test]
    fn test_bounded_text_boundaries() {
        for max_len in 0..8 {
            let bounded = BoundedText::new("abcdef", max_len);
            assert_eq!(bounded.as_str().len(), max_len.min(6));
            assert_eq!(bounded.was_truncated(), max_len < 6);
        }
    }

    #[test]
    fn test_bounded_text_respects_char_boundary() {
        // 'é' is two bytes; cutting at 2 would split it
        let bounded = BoundedText::new("aé", 2);
        assert_eq!(bounded.as_str(), "a");
        assert!(bounded.was_truncated());

        let bounded = BoundedText::new("日本語", 7);
        assert_eq!(bounded.as_str(), "日本");
    }
}
