// fraction_coder/src/error.rs

//! Error types for compression and decompression.

use thiserror::Error;

/// Error type for encoding and decoding operations.
#[derive(Debug, Error)]
pub enum ArithmeticCodingError {
    /// The input holds no symbols, so no model can be built for it.
    #[error("input is empty: there are no symbols to model")]
    EmptyInput,

    /// The container bytes are structurally invalid (truncated, inconsistent
    /// precision fields, bad interval table, trailing data).
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// The message holds a symbol that has no interval in the table.
    #[error("symbol {0:#04x} has no interval in the table")]
    UnknownSymbol(u8),

    /// The fraction does not fall into any interval of the table.
    #[error("decode failed at symbol {position}: {reason}")]
    Decode { position: usize, reason: String },

    /// Stock redistribution found no probability it could double.
    #[error("quantization exhausted with {stock} of probability mass left over")]
    QuantizationExhausted { stock: String },

    /// The message is longer than the configured limit.
    #[error("message length {length} exceeds the configured limit of {limit}")]
    MessageTooLong { length: usize, limit: usize },

    /// The progress observer asked to stop.
    #[error("aborted after {processed} of {total} symbols")]
    Aborted { processed: usize, total: usize },

    /// An I/O error occurred while reading or writing a file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArithmeticCodingError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ArithmeticCodingError::MalformedContainer(msg.into())
    }
}

/// A specialized Result type for arithmetic coding operations.
pub type Result<T> = std::result::Result<T, ArithmeticCodingError>;
