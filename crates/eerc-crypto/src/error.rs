//! error types for eerc-crypto

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("undecodable ciphertext: {0}")]
    UndecodableCiphertext(String),

    /// decrypted point is not `i·G` for any `i` up to the ceiling
    #[error("discrete log not found within ceiling {ceiling}")]
    DiscreteLogNotFound { ceiling: u64 },

    #[error("public key mismatch for {address}")]
    KeyMismatch { address: String },

    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("invalid plaintext: {0}")]
    InvalidPlaintext(String),

    #[error("poseidon error: {0}")]
    Poseidon(String),

    #[error("balance overflows 64 bits")]
    BalanceOverflow,

    // === keystore errors ===
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<light_poseidon::PoseidonError> for Error {
    fn from(e: light_poseidon::PoseidonError) -> Self {
        Error::Poseidon(e.to_string())
    }
}
