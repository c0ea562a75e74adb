//! NATS publishers for replies and live letters

use anyhow::{Context, Result};
use async_nats::{Client, Message};
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::LetterEvent;

/// Publisher for stabilized live letters
#[derive(Clone)]
pub struct LetterProducer {
    client: Client,
    subject: String,
}

impl LetterProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish one letter event
    pub async fn publish(&self, event: &LetterEvent) -> Result<()> {
        let payload = encode_payload(event)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            session_id = %event.session_id,
            letter = %event.letter,
            index = event.index,
            "Published letter"
        );

        Ok(())
    }
}

/// JSON body for a reply or published event
pub fn encode_payload<T: Serialize>(body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body).context("Failed to encode payload")
}

/// Send a JSON reply to a request message. Messages without a reply subject
/// (plain publishes) are dropped with a warning.
pub async fn reply<T: Serialize>(client: &Client, request: &Message, body: &T) -> Result<()> {
    let Some(reply_to) = request.reply.clone() else {
        warn!(subject = %request.subject, "Request has no reply subject, dropping response");
        return Ok(());
    };

    let payload = encode_payload(body)?;
    client.publish(reply_to, payload.into()).await?;
    Ok(())
}
