use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Clock id written into the clock snapshot unless configured otherwise.
pub const DEFAULT_CLOCK_ID: u32 = 64;

/// How packets are delimited in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// `uvarint(len) || packet`.
    #[default]
    LengthPrefixed,
    /// Each packet is written as field 1 of an enclosing `Trace` message,
    /// producing a standard `.perfetto-trace` file.
    TraceFile,
}

/// What closing a stream does with transactions that are still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenTransactionPolicy {
    /// Close them at their own start time, leaving zero-duration slices.
    #[default]
    CloseAtStart,
    /// Fail the close with [`Error::OpenTransactions`](crate::Error::OpenTransactions).
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub clock_id: u32,
    pub sequence_id: u32,
    /// Writes `trusted_packet_sequence_id` on every packet.
    pub emit_sequence_id: bool,
    pub framing: Framing,
    /// Applies to explicit stream closes only. Closing the trace always
    /// closes leftovers at their start time.
    pub open_transactions: OpenTransactionPolicy,
    /// Reject attributes and links on closed transactions instead of
    /// accepting them without effect on the output.
    pub strict_closed_transactions: bool,
    /// Flushes the output after every write, so a crashed process leaves
    /// every emitted packet on disk. Turn off to batch writes.
    pub flush_every_packet: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            clock_id: DEFAULT_CLOCK_ID,
            sequence_id: 1,
            emit_sequence_id: false,
            framing: Framing::LengthPrefixed,
            open_transactions: OpenTransactionPolicy::CloseAtStart,
            strict_closed_transactions: true,
            flush_every_packet: true,
        }
    }
}

impl TraceConfig {
    /// Parses a config from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_open_transactions(mut self, policy: OpenTransactionPolicy) -> Self {
        self.open_transactions = policy;
        self
    }

    pub fn with_strict_closed_transactions(mut self, strict: bool) -> Self {
        self.strict_closed_transactions = strict;
        self
    }

    pub fn with_sequence_id(mut self, sequence_id: u32) -> Self {
        self.sequence_id = sequence_id;
        self.emit_sequence_id = true;
        self
    }

    pub fn with_clock_id(mut self, clock_id: u32) -> Self {
        self.clock_id = clock_id;
        self
    }

    pub fn with_flush_every_packet(mut self, flush: bool) -> Self {
        self.flush_every_packet = flush;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use assert_matches::assert_matches;

    #[test]
    fn empty_json_is_default() {
        let cfg = TraceConfig::from_json("{}").unwrap();
        assert_eq!(cfg, TraceConfig::default());
        assert!(cfg.flush_every_packet);
        assert!(!cfg.emit_sequence_id);
    }

    #[test]
    fn partial_json() {
        let cfg = TraceConfig::from_json(
            r#"{"framing": "trace_file", "open_transactions": "reject", "clock_id": 6}"#,
        )
        .unwrap();
        assert_eq!(cfg.framing, Framing::TraceFile);
        assert_eq!(cfg.open_transactions, OpenTransactionPolicy::Reject);
        assert_eq!(cfg.clock_id, 6);
        assert!(cfg.strict_closed_transactions);
        assert_eq!(cfg.sequence_id, 1);
    }

    #[test]
    fn invalid_json() {
        assert_matches!(
            TraceConfig::from_json(r#"{"framing": "zstd"}"#),
            Err(Error::Config(_))
        );
    }

    #[test]
    fn builder() {
        let cfg = TraceConfig::default()
            .with_sequence_id(7)
            .with_strict_closed_transactions(false);
        assert!(cfg.emit_sequence_id);
        assert_eq!(cfg.sequence_id, 7);
        assert!(!cfg.strict_closed_transactions);
    }
}
