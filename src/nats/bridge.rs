use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::client::NatsClient;
use super::messages::UtteranceMessage;
use crate::error::RelayError;
use crate::pipeline::{RecognitionEvent, SessionEvent, TranslationSession};

/// Feed recognition results from NATS into a session until either ends.
///
/// Partial results are ignored. A cancellation message ends the session
/// with a terminal error.
pub async fn forward_utterances(
    mut subscriber: async_nats::Subscriber,
    session: Arc<TranslationSession>,
) {
    info!("Utterance listener started for {}", session.session_id());

    while let Some(msg) = subscriber.next().await {
        let utterance = match serde_json::from_slice::<UtteranceMessage>(&msg.payload) {
            Ok(utterance) => utterance,
            Err(e) => {
                warn!("Failed to parse utterance message: {}", e);
                continue;
            }
        };

        // Filter by session_id
        if utterance.session_id != session.session_id() {
            continue;
        }

        if let Some(details) = utterance.canceled {
            session.fail(format!("recognition canceled: {}", details)).await;
            break;
        }

        if utterance.partial {
            continue;
        }

        let event = RecognitionEvent {
            source_text: utterance.text,
            translations: utterance.translations,
            confidence: utterance.confidence,
        };

        match session.ingest(event).await {
            Ok(sequence_id) => info!("Utterance {} accepted", sequence_id),
            Err(RelayError::SessionStopped) => break,
            Err(e) => error!("Failed to ingest utterance: {}", e),
        }
    }

    info!("Utterance listener stopped for {}", session.session_id());
}

/// Publish every session event to NATS until the session's sink closes
pub async fn publish_events(
    mut events: mpsc::Receiver<SessionEvent>,
    client: Arc<NatsClient>,
    session_id: String,
) {
    while let Some(event) = events.recv().await {
        if let Err(e) = client.publish_event(&session_id, &event).await {
            error!("Failed to publish event for {}: {:#}", session_id, e);
            // Continue publishing even if one event fails
        }
    }

    info!("Event publisher stopped for {}", session_id);
}
