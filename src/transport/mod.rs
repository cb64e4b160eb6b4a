//! Transport — sends a sealed envelope and returns the raw reply bytes.
//!
//! The protocol core only needs "POST this, give me the bytes back".
//! Timeouts and proxies are the transport's business; retries are nobody's.

mod http;

pub use http::HttpTransport;

use crate::envelope::Envelope;
use crate::errors::Result;

/// Something that can deliver an envelope.
///
/// Implementations must map every failure (DNS, TLS, timeout,
/// cancellation) to `OtaError::Transport` and must not retry.
pub trait Transport {
    fn post(&self, envelope: &Envelope) -> Result<Vec<u8>>;
}
