use anyhow::{bail, Context, Result};
use async_nats::Client;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, info};

use super::messages::{
    PlaybackAudioMessage, SessionErrorMessage, SynthesisReplyMessage, SynthesisRequestMessage,
    TranslationTextMessage,
};
use crate::config::NatsConfig;
use crate::pipeline::SessionEvent;
use crate::synthesis::{SpeechSynthesizer, SynthesisRequest};

pub struct NatsClient {
    client: Client,
    config: NatsConfig,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.url);

        let client = async_nats::connect(config.url.as_str())
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, config })
    }

    /// Synthesizer that sends requests over this connection
    pub fn synthesizer(&self) -> NatsSynthesizer {
        NatsSynthesizer {
            client: self.client.clone(),
            subject: self.config.synthesis_subject.clone(),
        }
    }

    /// Subscribe to recognition results for one session
    pub async fn subscribe_utterances(&self, session_id: &str) -> Result<async_nats::Subscriber> {
        let subject = format!("{}.{}", self.config.utterance_subject_prefix, session_id);

        info!("Subscribing to utterances on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to utterances")?;

        Ok(subscriber)
    }

    /// Publish one session output event
    pub async fn publish_event(&self, session_id: &str, event: &SessionEvent) -> Result<()> {
        let prefix = &self.config.output_subject_prefix;
        let timestamp = Utc::now().to_rfc3339();

        let (subject, payload) = match event {
            SessionEvent::Playback(item) => (
                format!("{}.audio.{}", prefix, session_id),
                serde_json::to_vec(&PlaybackAudioMessage {
                    session_id: session_id.to_string(),
                    sequence: item.sequence_id,
                    audio: base64::engine::general_purpose::STANDARD.encode(&item.audio),
                    duration_secs: item.duration_secs,
                    source_text: item.source_text.clone(),
                    translated_text: item.translated_text.clone(),
                    metrics: item.metrics.clone(),
                    timestamp,
                })?,
            ),
            SessionEvent::Translation(item) => (
                format!("{}.text.{}", prefix, session_id),
                serde_json::to_vec(&TranslationTextMessage {
                    session_id: session_id.to_string(),
                    sequence: item.sequence_id,
                    language: item.metrics.language_code.clone(),
                    source_text: item.source_text.clone(),
                    translated_text: item.translated_text.clone(),
                    metrics: item.metrics.clone(),
                    timestamp,
                })?,
            ),
            SessionEvent::Error { message } => (
                format!("{}.error.{}", prefix, session_id),
                serde_json::to_vec(&SessionErrorMessage {
                    session_id: session_id.to_string(),
                    message: message.clone(),
                    timestamp,
                })?,
            ),
        };

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish session event")?;

        debug!("Published session event to {}", subject);

        Ok(())
    }
}

/// Speech synthesis over NATS request/reply
#[derive(Clone)]
pub struct NatsSynthesizer {
    client: Client,
    subject: String,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for NatsSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(&SynthesisRequestMessage {
            text: request.text.clone(),
            ssml: request.ssml.clone(),
            voice: request.voice.name.clone(),
        })?;

        let reply = self
            .client
            .request(self.subject.clone(), payload.into())
            .await
            .context("Synthesis request failed")?;

        let reply: SynthesisReplyMessage =
            serde_json::from_slice(&reply.payload).context("Malformed synthesis reply")?;

        if let Some(error) = reply.error {
            bail!("Synthesis service error: {}", error);
        }

        base64::engine::general_purpose::STANDARD
            .decode(&reply.audio)
            .context("Synthesis reply audio is not base64")
    }

    fn name(&self) -> &str {
        "nats"
    }
}
