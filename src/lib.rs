pub mod codecs;
pub mod config;
pub mod domains;
pub mod error;
pub mod interfaces;

pub use crate::codecs::xml::XmlCodec;
pub use crate::config::CodecConfig;
pub use crate::domains::message::MessageEnvelope;
pub use crate::error::{EnvelopeError, Result};
pub use crate::interfaces::codec::EnvelopeCodec;
