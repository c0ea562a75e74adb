//! NATS subscriptions that decode inbound requests and live frames

use anyhow::Result;
use async_nats::{Client, Message, Subscriber};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{LiveFrame, PredictRequest};

/// Subscription on one inbound subject, yielding decoded payloads
pub struct LandmarkConsumer {
    subscriber: Subscriber,
}

impl LandmarkConsumer {
    pub async fn subscribe(client: &Client, subject: &str) -> Result<Self> {
        let subscriber = client.subscribe(subject.to_string()).await?;
        info!(subject = %subject, "Subscribed");
        Ok(Self { subscriber })
    }

    /// Next raw message, for requests that carry no body
    pub async fn next_message(&mut self) -> Option<Message> {
        self.subscriber.next().await
    }

    /// Next one-shot request. The message is returned alongside the decode
    /// result so an undecodable request can still be answered.
    pub async fn next_request(&mut self) -> Option<(Message, PipelineResult<PredictRequest>)> {
        let message = self.subscriber.next().await?;
        let request = decode_predict_request(&message.payload);
        Some((message, request))
    }

    /// Decoded live frames in arrival order; ends when the subscription closes
    pub fn live_frames(self) -> impl Stream<Item = PipelineResult<LiveFrame>> {
        self.subscriber.map(|message| decode_live_frame(&message.payload))
    }
}

pub fn decode_predict_request(payload: &[u8]) -> PipelineResult<PredictRequest> {
    decode(payload)
}

pub fn decode_live_frame(payload: &[u8]) -> PipelineResult<LiveFrame> {
    decode(payload)
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> PipelineResult<T> {
    serde_json::from_slice(payload).map_err(|e| PipelineError::invalid_message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_predict_request() {
        let request = decode_predict_request(br#"{"landmarks": [0.1, 0.2, 0.3]}"#).unwrap();
        assert_eq!(request.landmarks, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_undecodable_request_is_invalid_message() {
        let err = decode_predict_request(b"not json").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidMessage(_)));
        assert!(err.to_string().starts_with("Invalid request:"));

        assert!(decode_predict_request(br#"{"points": []}"#).is_err());
    }

    #[test]
    fn test_decode_live_frame_with_hand() {
        let frame = decode_live_frame(br#"{"session_id": "cam", "landmarks": [1.0, 2.0]}"#).unwrap();
        assert_eq!(frame.session_id, "cam");
        assert_eq!(frame.landmarks, Some(vec![1.0, 2.0]));
    }

    #[test]
    fn test_decode_live_frame_without_hand() {
        let null = decode_live_frame(br#"{"session_id": "cam", "landmarks": null}"#).unwrap();
        assert!(null.landmarks.is_none());

        let absent = decode_live_frame(br#"{"session_id": "cam"}"#).unwrap();
        assert!(absent.landmarks.is_none());
    }

    #[test]
    fn test_live_frame_needs_session() {
        assert!(matches!(
            decode_live_frame(br#"{"landmarks": null}"#),
            Err(PipelineError::InvalidMessage(_))
        ));
    }
}
