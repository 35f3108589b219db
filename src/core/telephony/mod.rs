//! Telephony-side wire protocol.
//!
//! The telephony platform (Twilio Media Streams) speaks JSON envelopes tagged
//! by an `event` field over the inbound WebSocket. This module defines those
//! envelopes and the stateless translation between the telephony framing and
//! the realtime provider framing.

pub mod messages;
pub mod translate;

pub use messages::{MediaPayload, StreamStart, TelephonyError, TelephonyInEvent, TelephonyOutEvent};
pub use translate::{to_provider_frame, to_telephony_frame};
