use thiserror::Error;

/// All errors that can occur in otacheck.
#[derive(Debug, Error)]
pub enum OtaError {
    // --- Request-side crypto errors ---
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    #[error("Key protection failed: {0}")]
    KeyProtection(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    // --- Response-side errors ---
    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("Transport error: {0}")]
    Transport(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown region '{0}' (expected one of CN, EU, IN, SG, RU, TR, TH, GL, ID, TW, MY, VN)")]
    InvalidRegion(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Which side of a query an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The request could not be built or sent. Usually a local bug or bad config.
    Request,
    /// The reply could not be parsed or decrypted. Usually a server or network issue.
    Response,
    /// Configuration, filesystem or command-line problem outside the protocol.
    Local,
}

impl OtaError {
    /// Classify the error by the stage of the query that produced it.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Entropy(_) | Self::KeyProtection(_) | Self::Encryption(_) => Stage::Request,
            Self::Decryption(_) | Self::ResponseFormat(_) | Self::Transport(_) => Stage::Response,
            Self::Config(_) | Self::InvalidRegion(_) | Self::Io(_) | Self::Serialization(_) => {
                Stage::Local
            }
        }
    }
}

impl From<serde_json::Error> for OtaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Convenience type alias for otacheck results.
pub type Result<T> = std::result::Result<T, OtaError>;
