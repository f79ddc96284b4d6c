pub mod bridge;
pub mod client;
pub mod messages;

pub use bridge::{forward_utterances, publish_events};
pub use client::{NatsClient, NatsSynthesizer};
pub use messages::{
    PlaybackAudioMessage, SessionErrorMessage, SynthesisReplyMessage, SynthesisRequestMessage,
    TranslationTextMessage, UtteranceMessage,
};
