//! Transport seam for the pub/sub ingestion channel
//!
//! The engine never talks to a broker directly. It consumes raw payloads
//! through the [`SensorTransport`] trait, which an adapter for the real
//! transport (e.g. an MQTT client subscribed to the configured topic) feeds
//! from outside. A channel-backed implementation is provided both as the
//! production adapter surface and as the test harness.
//!
//! The transport may silently stop delivering messages; reconnection is
//! the transport's own responsibility. The engine only observes silence
//! and degrades health classification accordingly.

use crate::error::Result;
use crate::types::SensorReading;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Capacity of the channel between a publisher and the engine
const TRANSPORT_QUEUE_DEPTH: usize = 1024;

/// Non-blocking source of raw ingestion payloads
///
/// Implementations must be `Send` so the engine worker thread can own them.
pub trait SensorTransport: Send {
    /// Poll for the next raw payload without blocking
    ///
    /// Returns `None` when no message is currently pending. A transport
    /// that has gone away permanently also returns `None`; the health
    /// monitor handles the resulting silence.
    fn try_recv(&mut self) -> Option<Vec<u8>>;
}

/// Channel-backed transport handed to the engine
///
/// Created in a pair with a [`SensorPublisher`] via [`ChannelTransport::pair`].
pub struct ChannelTransport {
    receiver: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a publisher/transport pair connected by a bounded channel
    pub fn pair() -> (SensorPublisher, ChannelTransport) {
        let (tx, rx) = bounded(TRANSPORT_QUEUE_DEPTH);
        (SensorPublisher { sender: tx }, ChannelTransport { receiver: rx })
    }
}

impl SensorTransport for ChannelTransport {
    fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.try_recv().ok()
    }
}

/// Publishing side of a [`ChannelTransport`]
///
/// Cloneable; a broker adapter holds one and forwards every message
/// received on the subscribed topic.
#[derive(Clone)]
pub struct SensorPublisher {
    sender: Sender<Vec<u8>>,
}

impl SensorPublisher {
    /// Publish a raw payload, returning false if the engine queue is full
    /// or the engine has shut down
    pub fn publish(&self, payload: impl Into<Vec<u8>>) -> bool {
        match self.sender.try_send(payload.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Encode and publish a reading as the JSON wire format
    pub fn publish_reading(&self, reading: &SensorReading) -> bool {
        match serde_json::to_vec(reading) {
            Ok(payload) => self.publish(payload),
            Err(_) => false,
        }
    }
}

/// Decode a raw ingestion payload
///
/// The wire format is `{"temperature": n, "humidity": n}`. Extra fields
/// are ignored; missing or non-numeric fields are a decode error.
pub fn decode_payload(payload: &[u8]) -> Result<SensorReading> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_payload() {
        let reading = decode_payload(br#"{"temperature": 24.1, "humidity": 60.5}"#).unwrap();
        assert_eq!(reading.temperature, 24.1);
        assert_eq!(reading.humidity, 60.5);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let reading =
            decode_payload(br#"{"temperature": 1.0, "humidity": 2.0, "battery": 99}"#).unwrap();
        assert_eq!(reading.temperature, 1.0);
    }

    #[test]
    fn test_decode_malformed_payload() {
        assert!(decode_payload(b"not json").is_err());
        assert!(decode_payload(br#"{"temperature": 1.0}"#).is_err());
        assert!(decode_payload(br#"{"temperature": "hot", "humidity": 2.0}"#).is_err());
    }

    #[test]
    fn test_channel_pair_roundtrip() {
        let (publisher, mut transport) = ChannelTransport::pair();

        assert!(transport.try_recv().is_none());

        let reading = SensorReading {
            temperature: 20.0,
            humidity: 40.0,
        };
        assert!(publisher.publish_reading(&reading));

        let payload = transport.try_recv().unwrap();
        assert_eq!(decode_payload(&payload).unwrap(), reading);
        assert!(transport.try_recv().is_none());
    }

    #[test]
    fn test_publish_after_engine_shutdown() {
        let (publisher, transport) = ChannelTransport::pair();
        drop(transport);
        assert!(!publisher.publish(b"{}".to_vec()));
    }
}
