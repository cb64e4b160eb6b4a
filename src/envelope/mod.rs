//! Envelope module — the hybrid-encrypted request/response wire unit.
//!
//! This module provides:
//! - Query argument normalization, headers and payload (`request`)
//! - Scene → protected-key negotiation metadata (`scene`)
//! - Outbound envelope assembly (`builder`)
//! - Reply parsing and decryption (`opener`)

pub mod builder;
pub mod opener;
pub mod request;
pub mod scene;

// Re-export the most commonly used items.
pub use builder::{
    CipherBody, Envelope, EnvelopeBuilder, OuterBody, SealedRequest, PROTECTED_KEY_HEADER,
};
pub use opener::{open, DecryptedResponse, ResponseResult};
pub use request::{NormalizedArgs, QueryArgs, RequestPayload, DEFAULT_VERSION_SUFFIX};
pub use scene::{NegotiationMetadata, NegotiationRecord, DEFAULT_SCENE};
