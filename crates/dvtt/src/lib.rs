//! Records design-verification transactions as a Perfetto trace.
//!
//! A [`Trace`] owns a set of streams (one per monitored bus or component),
//! each holding time-bounded transactions with attributes and flow links.
//! Packets are encoded and written as the trace is built, so the output is
//! valid to stream at any point:
//!
//! | Packet           | Written when                                 |
//! |------------------|----------------------------------------------|
//! | Clock snapshot   | the trace is created                         |
//! | Track descriptor | a stream or a child transaction is opened    |
//! | Slice begin/end  | a transaction is closed                      |
//!
//! # Usage
//!
//! ```no_run
//! use dvtt::{Radix, Trace};
//!
//! let mut trace = Trace::create("bus.trace", "tb", "1ns")?;
//! let bus = trace.create_stream("bus", Some("top.dut"), None)?;
//!
//! let rd = trace.begin_transaction(bus, "RD", 100, Some("read"), None)?;
//! trace.add_uint(rd, "addr", 0x1000, Radix::Hex)?;
//! trace.close_transaction(rd, 200)?;
//!
//! trace.close()?;
//! # Ok::<(), dvtt::Error>(())
//! ```

mod attr;
mod config;
mod error;
mod ids;
mod model;
pub mod protocol;
mod trace;
mod tracks;
mod writer;

pub use attr::{render_bits, AttrValue, Attribute, Radix};
pub use config::{Framing, OpenTransactionPolicy, TraceConfig, DEFAULT_CLOCK_ID};
pub use error::{Error, Result};
pub use ids::IdAllocator;
pub use model::{
    FlowLink, LinkDirection, LinkKind, Stream, StreamId, Transaction, TransactionId,
};
pub use trace::Trace;
pub use tracks::{Track, TrackOwner};
