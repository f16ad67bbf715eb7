use std::io::{self, Write};

use crate::config::Framing;
use crate::protocol::eventbuf::EventBuffer;
use crate::protocol::{fields, Packet};

/// Frames packets and appends them to the output.
///
/// A failed write may leave part of a frame behind. After the first failure
/// the writer refuses every further write and the final flush, so nothing is
/// ever appended after a torn frame.
pub(crate) struct PacketWriter<W: Write> {
    out: W,
    framing: Framing,
    flush_every_packet: bool,
    failed: Option<io::ErrorKind>,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(out: W, framing: Framing, flush_every_packet: bool) -> Self {
        PacketWriter {
            out,
            framing,
            flush_every_packet,
            failed: None,
        }
    }

    /// Frames the packets into one buffer and hands it to the output with a
    /// single `write_all`. Nothing is written if the writer already failed.
    pub fn write(&mut self, packets: &[Packet]) -> io::Result<()> {
        self.check()?;

        let size: usize = packets.iter().map(|p| p.data.len() + 11).sum();
        let mut frame = EventBuffer::with_capacity(size);
        for packet in packets {
            match self.framing {
                Framing::LengthPrefixed => {
                    frame.uvarint(packet.data.len() as u64);
                    frame.raw(&packet.data);
                }
                Framing::TraceFile => {
                    frame.length_delimited(fields::trace::PACKET, &packet.data);
                }
            }
            log::trace!("packet {:?}: {} bytes", packet.kind, packet.data.len());
        }

        if let Err(err) = self.write_frame(frame.as_ref()) {
            log::error!("trace output failed, no further packets will be written: {err}");
            self.failed = Some(err.kind());
            return Err(err);
        }
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.out.write_all(frame)?;
        if self.flush_every_packet {
            self.out.flush()?;
        }
        Ok(())
    }

    fn check(&self) -> io::Result<()> {
        match self.failed {
            Some(kind) => Err(io::Error::new(
                kind,
                "an earlier write to the trace output failed",
            )),
            None => Ok(()),
        }
    }

    /// Flushes the output and gives it back. Fails without flushing if any
    /// earlier write failed.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.check()?;
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PacketKind;
    use bytes::Bytes;

    fn packet(data: &'static [u8]) -> Packet {
        Packet {
            kind: PacketKind::TrackDescriptor,
            data: Bytes::from_static(data),
        }
    }

    /// Accepts `room` bytes, then fails every write.
    struct ShortWriter {
        data: Vec<u8>,
        room: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.room == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "full"));
            }
            let n = self.room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn length_prefixed() {
        let mut w = PacketWriter::new(Vec::new(), Framing::LengthPrefixed, false);
        w.write(&[packet(&[1, 2, 3]), packet(&[])]).unwrap();
        assert_eq!(w.into_inner().unwrap(), [3, 1, 2, 3, 0]);
    }

    #[test]
    fn trace_file() {
        let mut w = PacketWriter::new(Vec::new(), Framing::TraceFile, true);
        w.write(&[packet(&[1, 2])]).unwrap();
        assert_eq!(w.into_inner().unwrap(), [0x0A, 2, 1, 2]);
    }

    #[test]
    fn long_packet_length() {
        static DATA: [u8; 200] = [7; 200];
        let mut w = PacketWriter::new(Vec::new(), Framing::LengthPrefixed, false);
        w.write(&[packet(&DATA)]).unwrap();
        let out = w.into_inner().unwrap();
        assert_eq!(&out[..2], [0xC8, 0x01]);
        assert_eq!(out.len(), 202);
    }

    #[test]
    fn failed_write_is_sticky() {
        let out = ShortWriter {
            data: Vec::new(),
            room: 2,
        };
        let mut w = PacketWriter::new(out, Framing::LengthPrefixed, false);

        let err = w.write(&[packet(&[1, 2, 3])]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(w.out.data, [3, 1]);

        w.out.room = 100;
        let err = w.write(&[packet(&[4])]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(w.out.data, [3, 1]);
        assert!(w.into_inner().is_err());
    }
}
