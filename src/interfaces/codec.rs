use crate::domains::message::MessageEnvelope;
use crate::error::Result;

/// Converts envelopes to and from their text form.
///
/// Implementations hold no per-call mutable state, so one instance can be
/// shared across threads behind an `Arc<dyn EnvelopeCodec>`.
pub trait EnvelopeCodec: Send + Sync {
    fn encode(&self, envelope: &MessageEnvelope) -> Result<String>;

    fn decode(&self, text: &str) -> Result<MessageEnvelope>;
}
