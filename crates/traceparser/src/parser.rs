use prost::Message;

use crate::perfetto::TracePacket;
use crate::reader;
use crate::types::{Framing, ParseError};

/// Parse a single framed packet from the reader.
///
/// Returns `ParseError::EndOfStream` when there are no more packets.
pub fn parse_packet(
    reader: &mut impl std::io::Read,
    framing: Framing,
) -> Result<TracePacket, ParseError> {
    let frame = reader::read_frame(reader, framing)?;
    Ok(TracePacket::decode(frame.as_slice())?)
}

/// Parse every packet in `data`.
pub fn parse_trace(data: &[u8], framing: Framing) -> Result<Vec<TracePacket>, ParseError> {
    let mut cursor = std::io::Cursor::new(data);
    let mut packets = Vec::new();
    loop {
        match parse_packet(&mut cursor, framing) {
            Ok(packet) => packets.push(packet),
            Err(ParseError::EndOfStream) => return Ok(packets),
            Err(e) => return Err(e),
        }
    }
}
