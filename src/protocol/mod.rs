//! Protocol definitions for bot API communication.
//!
//! This module contains the low-level protocol pieces:
//! - Bounded response and text buffers
//! - Request URL and body construction
//! - `getUpdates` response decoding
//! - Textual `update_id` recovery for truncated responses

pub mod buffer;
pub mod request;
pub mod scanner;
pub mod update;

pub use buffer::{BoundedText, DEFAULT_RESPONSE_CAPACITY, ResponseBuffer};
pub use request::{ApiMethod, GetUpdates, encode_send_message, method_url};
pub use scanner::extract_max_update_id;
pub use update::{MAX_EXACT_ID, TextMessage, Update, decode_updates, first_update_id};
