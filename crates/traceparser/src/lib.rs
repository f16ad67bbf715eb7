//! Packet decoder for traces written by `dvtt`.
//!
//! Splits a trace into its framed `TracePacket`s and decodes each one with
//! prost into the types in [`perfetto`]. Fields outside the subset the writer
//! produces are skipped.
//!
//! # Framing
//!
//! Packets are delimited in one of two ways:
//!
//! | Framing          | Bytes per packet               |
//! |------------------|--------------------------------|
//! | `LengthPrefixed` | `uvarint(len)`, packet         |
//! | `TraceFile`      | `0x0A`, `uvarint(len)`, packet |
//!
//! # Usage
//!
//! ```no_run
//! use dvtt_traceparser::{parse_packet, Framing, ParseError};
//!
//! let data: &[u8] = &[/* trace bytes */];
//! let mut cursor = std::io::Cursor::new(data);
//!
//! loop {
//!     match parse_packet(&mut cursor, Framing::LengthPrefixed) {
//!         Ok(packet) => println!("{:?}", packet),
//!         Err(ParseError::EndOfStream) => break,
//!         Err(e) => eprintln!("parse error: {}", e),
//!     }
//! }
//! ```

pub mod perfetto;
pub mod types;
mod parser;
mod reader;

pub use parser::{parse_packet, parse_trace};
pub use perfetto::TracePacket;
pub use types::{Framing, ParseError};
