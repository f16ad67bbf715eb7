use std::io::Read;

use crate::types::{Framing, ParseError};

/// Tag of `Trace.packet`, which precedes every packet in a trace file.
const TRACE_PACKET_TAG: u8 = 0x0A;

/// Read one framed packet from a stream reader.
/// Returns `ParseError::EndOfStream` if there are no more packets (clean EOF).
///
/// The length prefix is not trusted for allocation: the body grows only as
/// bytes actually arrive, and a short body is `ParseError::UnexpectedEof`.
pub(crate) fn read_frame(reader: &mut impl Read, framing: Framing) -> Result<Vec<u8>, ParseError> {
    // The first byte of a frame is the only place EOF is not an error.
    let first = match read_byte(reader)? {
        Some(b) => b,
        None => return Err(ParseError::EndOfStream),
    };

    let len = match framing {
        Framing::LengthPrefixed => read_uvarint(reader, first)?,
        Framing::TraceFile => {
            if first != TRACE_PACKET_TAG {
                return Err(ParseError::InvalidData(format!(
                    "expected packet tag 0x0a, got 0x{first:02x}"
                )));
            }
            let b = read_byte(reader)?.ok_or(ParseError::UnexpectedEof)?;
            read_uvarint(reader, b)?
        }
    };

    let mut body = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut body)?;
    if (body.len() as u64) < len {
        return Err(ParseError::UnexpectedEof);
    }
    Ok(body)
}

fn read_byte(reader: &mut impl Read) -> Result<Option<u8>, ParseError> {
    let mut b = [0u8; 1];
    match reader.read_exact(&mut b) {
        Ok(()) => Ok(Some(b[0])),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(ParseError::Io(e)),
    }
}

/// Read the rest of a uvarint whose first byte has already been consumed.
fn read_uvarint(reader: &mut impl Read, first: u8) -> Result<u64, ParseError> {
    let mut result = (first & 0x7F) as u64;
    let mut b = first;
    let mut shift = 7;
    while b & 0x80 != 0 {
        if shift >= 64 {
            return Err(ParseError::InvalidData("varint overflow".into()));
        }
        b = read_byte(reader)?.ok_or(ParseError::UnexpectedEof)?;
        result |= ((b & 0x7F) as u64) << shift;
        shift += 7;
    }
    Ok(result)
}
