/// Errors returned by trace operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid trace config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("trace is closed")]
    TraceClosed,

    #[error("stream {name:?} is closed")]
    StreamClosed { name: String },

    #[error("transaction {name:?} is closed")]
    TransactionClosed { name: String },

    /// The handle was issued by a different trace.
    #[error("handle does not belong to this trace")]
    ForeignHandle,

    #[error("parent transaction {parent:?} belongs to stream {parent_stream:?}, not {stream:?}")]
    ParentStreamMismatch {
        parent: String,
        parent_stream: String,
        stream: String,
    },

    #[error("value of unsigned attribute {name:?} is negative or out of range")]
    UnsignedOutOfRange { name: String },

    #[error("bit vector of {num_bits} bits does not fit in {bytes} bytes")]
    BitWidth { num_bits: usize, bytes: usize },

    #[error("transaction {name:?} cannot be linked to itself")]
    SelfLink { name: String },

    #[error("stream {stream:?} still has {open} open transaction(s)")]
    OpenTransactions { stream: String, open: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
