//! Frame translation between the telephony and provider envelopes.
//!
//! Both ends are configured for the same compressed audio encoding
//! (g711_ulaw), so payloads are re-enveloped, never transcoded: the base64
//! text moves between envelopes byte-for-byte.

use crate::core::realtime::openai::messages::ClientEvent;
use crate::core::telephony::messages::{MediaPayload, TelephonyOutEvent};

/// Wrap a telephony audio payload in the provider's append envelope.
pub fn to_provider_frame(payload: &str) -> ClientEvent {
    ClientEvent::InputAudioBufferAppend {
        audio: payload.to_owned(),
    }
}

/// Wrap a provider audio delta in the telephony media envelope.
pub fn to_telephony_frame(delta: &str, stream_sid: &str) -> TelephonyOutEvent {
    TelephonyOutEvent::Media {
        stream_sid: stream_sid.to_owned(),
        media: MediaPayload {
            payload: delta.to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    #[test]
    fn test_to_provider_frame_wraps_payload_unchanged() {
        let event = to_provider_frame("dGVzdA==");
        match event {
            ClientEvent::InputAudioBufferAppend { audio } => assert_eq!(audio, "dGVzdA=="),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_to_telephony_frame_shape() {
        let frame = to_telephony_frame("dGVzdA==", "MZ123");
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&frame).unwrap()).unwrap();
        assert_eq!(json["event"], "media");
        assert_eq!(json["streamSid"], "MZ123");
        assert_eq!(json["media"]["payload"], "dGVzdA==");
    }

    #[test]
    fn test_round_trip_payload_is_byte_identical() {
        let original = vec![0u8, 1, 2, 3, 255, 128, 64];
        let payload = BASE64_STANDARD.encode(&original);

        // telephony -> provider append
        let append = to_provider_frame(&payload);
        let forwarded = match append {
            ClientEvent::InputAudioBufferAppend { audio } => audio,
            _ => panic!("Wrong event type"),
        };

        // provider delta -> telephony media
        let frame = to_telephony_frame(&forwarded, "MZ123");
        let TelephonyOutEvent::Media { media, .. } = frame;

        assert_eq!(media.payload, payload);
        assert_eq!(BASE64_STANDARD.decode(&media.payload).unwrap(), original);
    }
}
