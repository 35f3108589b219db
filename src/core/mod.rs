//! Core relay logic: per-call session state, the two duplex links, the frame
//! translator between their wire formats, and post-call processing.

pub mod extract;
pub mod realtime;
pub mod session;
pub mod telephony;
pub mod webhook;
