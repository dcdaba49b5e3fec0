//! Data types exchanged with the rest of the device.

pub mod message;

pub use message::{InboundMessage, OutboundMessage};
