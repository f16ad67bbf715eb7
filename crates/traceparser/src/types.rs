/// Errors that can occur during trace parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Reached end of stream at a clean packet boundary (no more packets).
    #[error("end of stream")]
    EndOfStream,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of packet data")]
    UnexpectedEof,

    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("parse error: {0}")]
    InvalidData(String),
}

/// How packets are delimited in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    LengthPrefixed,
    TraceFile,
}
