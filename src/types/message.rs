//! Message types exchanged with the rest of the device.

use crate::protocol::BoundedText;

/// A message accepted from the authorized peer.
///
/// Text longer than the inbound capacity is cut to fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Message text.
    pub text: BoundedText,
}

impl InboundMessage {
    /// Creates an inbound message, keeping at most `capacity` bytes of text.
    #[must_use]
    pub fn new(text: &str, capacity: usize) -> Self {
        Self {
            text: BoundedText::new(text, capacity),
        }
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

/// A message to deliver to the authorized peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message text.
    pub text: BoundedText,
}

impl OutboundMessage {
    /// Creates an outbound message, keeping at most `capacity` bytes of text.
    #[must_use]
    pub fn new(text: &str, capacity: usize) -> Self {
        Self {
            text: BoundedText::new(text, capacity),
        }
    }

    /// Returns the message text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

impl From<&str> for OutboundMessage {
    fn from(text: &str) -> Self {
        Self::new(text, crate::config::DEFAULT_OUTBOUND_TEXT_CAPACITY)
    }
}

impl From<String> for OutboundMessage {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OUTBOUND_TEXT_CAPACITY;

    #[test]
    fn test_inbound_truncated_to_capacity() {
        let message = InboundMessage::new("ping pong", 4);
        assert_eq!(message.text(), "ping");
        assert!(message.text.was_truncated());
    }

    #[test]
    fn test_outbound_from_string() {
        let long = "a".repeat(DEFAULT_OUTBOUND_TEXT_CAPACITY + 10);
        let message = OutboundMessage::from(long);
        assert_eq!(message.text().len(), DEFAULT_OUTBOUND_TEXT_CAPACITY);

        assert_eq!(OutboundMessage::from("ok").text(), "ok");
    }
}
