//! Telephony media stream handling.

pub mod handler;

pub use handler::media_stream_handler;
