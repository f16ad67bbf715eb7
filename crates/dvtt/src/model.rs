//! Streams, transactions and the handles used to address them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::attr::Attribute;

// Identifies trace instances so that handles can't be mixed between traces.
static NEXT_TRACE_INSTANCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TraceInstance(u64);

impl TraceInstance {
    pub(crate) fn next() -> Self {
        TraceInstance(NEXT_TRACE_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a stream within its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId {
    pub(crate) trace: TraceInstance,
    pub(crate) index: usize,
}

impl StreamId {
    pub(crate) fn new(trace: TraceInstance, index: usize) -> Self {
        StreamId { trace, index }
    }
}

/// Handle to a transaction within its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub(crate) trace: TraceInstance,
    pub(crate) index: usize,
}

impl TransactionId {
    pub(crate) fn new(trace: TraceInstance, index: usize) -> Self {
        TransactionId { trace, index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Open,
    Closed,
}

#[derive(Debug)]
pub struct Stream {
    pub(crate) name: String,
    pub(crate) scope: Option<String>,
    pub(crate) type_name: Option<String>,
    pub(crate) track_uuid: u64,
    pub(crate) state: State,
    pub(crate) transactions: Vec<TransactionId>,
}

impl Stream {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The track every root transaction of this stream renders on.
    pub fn track_uuid(&self) -> u64 {
        self.track_uuid
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Transactions in creation order.
    pub fn transactions(&self) -> &[TransactionId] {
        &self.transactions
    }
}

/// The declared relationship of a flow link. Only the flow id reaches the
/// wire; the kind is kept for callers inspecting the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkKind {
    ParentChild,
    #[default]
    Related,
    CauseEffect,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    Outgoing,
    Incoming,
}

/// One end of a flow between two transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLink {
    pub flow_id: u64,
    pub peer: TransactionId,
    pub direction: LinkDirection,
    pub kind: LinkKind,
    pub relation: Option<String>,
}

#[derive(Debug)]
pub struct Transaction {
    pub(crate) id: u64,
    pub(crate) stream: StreamId,
    pub(crate) name: String,
    pub(crate) type_name: Option<String>,
    pub(crate) start_time: u64,
    pub(crate) end_time: Option<u64>,
    pub(crate) state: State,
    pub(crate) parent: Option<TransactionId>,
    pub(crate) track_uuid: u64,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) links: Vec<FlowLink>,
}

impl Transaction {
    /// The trace-wide transaction id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Set once the transaction is closed.
    pub fn end_time(&self) -> Option<u64> {
        self.end_time
    }

    pub fn parent(&self) -> Option<TransactionId> {
        self.parent
    }

    pub fn track_uuid(&self) -> u64 {
        self.track_uuid
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn links(&self) -> &[FlowLink] {
        &self.links
    }

    /// Flow ids in the order the links were added, both directions.
    pub fn flow_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.links.iter().map(|link| link.flow_id)
    }
}
