use bytes::{BufMut, Bytes, BytesMut};

/// Protobuf wire types used by the trace format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
}

/// A buffer for encoding tagged protobuf fields.
///
/// Nested messages are encoded into their own `EventBuffer` first and then
/// appended to the parent with [`EventBuffer::message`].
pub struct EventBuffer {
    scratch: [u8; 10],
    buf: BytesMut,
}

impl AsRef<[u8]> for EventBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl EventBuffer {
    pub fn with_capacity(size: usize) -> Self {
        EventBuffer {
            scratch: [0; 10],
            buf: BytesMut::with_capacity(size),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Writes raw bytes with no framing.
    #[inline]
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a variable-length unsigned integer.
    #[inline]
    pub fn uvarint<U: Into<u64>>(&mut self, u: U) {
        let mut u: u64 = u.into();
        let mut i = 0;
        while u >= 0x80 {
            self.scratch[i] = (u as u8) | 0x80;
            u >>= 7;
            i += 1;
        }
        self.scratch[i] = u as u8;
        i += 1;
        self.buf.extend_from_slice(&self.scratch[..i]);
    }

    /// Writes a zig-zag encoded variable-length signed integer.
    #[inline]
    pub fn svarint<I: Into<i64>>(&mut self, i: I) {
        self.uvarint(signed_to_unsigned_i64(i.into()));
    }

    /// Writes a field key.
    #[inline]
    pub fn tag(&mut self, field: u32, wire_type: WireType) {
        self.uvarint(((field as u64) << 3) | wire_type as u64);
    }

    #[inline]
    pub fn uint64_field(&mut self, field: u32, value: u64) {
        self.tag(field, WireType::Varint);
        self.uvarint(value);
    }

    /// Writes an `int64` field. Negative values are sign-extended to ten bytes,
    /// which is how protobuf `int64` (as opposed to `sint64`) is encoded.
    #[inline]
    pub fn int64_field(&mut self, field: u32, value: i64) {
        self.tag(field, WireType::Varint);
        self.uvarint(value as u64);
    }

    #[inline]
    pub fn sint64_field(&mut self, field: u32, value: i64) {
        self.tag(field, WireType::Varint);
        self.svarint(value);
    }

    #[inline]
    pub fn fixed64_field(&mut self, field: u32, value: u64) {
        self.tag(field, WireType::Fixed64);
        self.buf.reserve(8);
        self.buf.put_u64_le(value);
    }

    #[inline]
    pub fn double_field(&mut self, field: u32, value: f64) {
        self.tag(field, WireType::Fixed64);
        self.buf.reserve(8);
        self.buf.put_f64_le(value);
    }

    /// Writes a length-delimited field.
    #[inline]
    pub fn length_delimited(&mut self, field: u32, bytes: &[u8]) {
        // 5 bytes covers any tag we use, 10 is the maximum length of a uvarint.
        self.buf.reserve(5 + 10 + bytes.len());

        self.tag(field, WireType::LengthDelimited);
        self.uvarint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn string_field<S: AsRef<str>>(&mut self, field: u32, s: S) {
        self.length_delimited(field, s.as_ref().as_bytes());
    }

    /// Writes a nested message as a single length-delimited field.
    #[inline]
    pub fn message(&mut self, field: u32, msg: &EventBuffer) {
        self.length_delimited(field, msg.as_ref());
    }
}

#[inline]
pub(crate) fn signed_to_unsigned_i64(i: i64) -> u64 {
    ((i << 1) ^ (i >> 63)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(f: impl FnOnce(&mut EventBuffer)) -> Vec<u8> {
        let mut eb = EventBuffer::with_capacity(16);
        f(&mut eb);
        eb.as_ref().to_vec()
    }

    #[test]
    fn uvarint_known_values() {
        assert_eq!(bytes_of(|eb| eb.uvarint(0u64)), [0x00]);
        assert_eq!(bytes_of(|eb| eb.uvarint(1u64)), [0x01]);
        assert_eq!(bytes_of(|eb| eb.uvarint(127u64)), [0x7F]);
        assert_eq!(bytes_of(|eb| eb.uvarint(128u64)), [0x80, 0x01]);
        assert_eq!(bytes_of(|eb| eb.uvarint(300u64)), [0xAC, 0x02]);
        assert_eq!(
            bytes_of(|eb| eb.uvarint(u64::MAX)),
            [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
    }

    #[test]
    fn zigzag_known_values() {
        assert_eq!(signed_to_unsigned_i64(0), 0);
        assert_eq!(signed_to_unsigned_i64(-1), 1);
        assert_eq!(signed_to_unsigned_i64(1), 2);
        assert_eq!(signed_to_unsigned_i64(-2), 3);
        assert_eq!(signed_to_unsigned_i64(2147483647), 4294967294);
        assert_eq!(signed_to_unsigned_i64(-2147483648), 4294967295);
        assert_eq!(signed_to_unsigned_i64(i64::MAX), u64::MAX - 1);
        assert_eq!(signed_to_unsigned_i64(i64::MIN), u64::MAX);
    }

    #[test]
    fn tags() {
        assert_eq!(bytes_of(|eb| eb.tag(1, WireType::LengthDelimited)), [0x0A]);
        assert_eq!(bytes_of(|eb| eb.tag(8, WireType::Varint)), [0x40]);
        assert_eq!(bytes_of(|eb| eb.tag(47, WireType::Fixed64)), [0xF9, 0x02]);
        assert_eq!(
            bytes_of(|eb| eb.tag(60, WireType::LengthDelimited)),
            [0xE2, 0x03]
        );
    }

    #[test]
    fn fields() {
        assert_eq!(
            bytes_of(|eb| eb.string_field(2, "bus")),
            [0x12, 0x03, b'b', b'u', b's']
        );
        assert_eq!(bytes_of(|eb| eb.uint64_field(1, 5)), [0x08, 0x05]);
        assert_eq!(bytes_of(|eb| eb.sint64_field(1, -1)), [0x08, 0x01]);
        assert_eq!(
            bytes_of(|eb| eb.int64_field(4, -1)),
            [0x20, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );

        let mut expected = vec![0x29];
        expected.extend_from_slice(&3.3f64.to_le_bytes());
        assert_eq!(bytes_of(|eb| eb.double_field(5, 3.3)), expected);

        assert_eq!(
            bytes_of(|eb| eb.fixed64_field(47, 7)),
            [0xF9, 0x02, 7, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn nested_message() {
        let mut inner = EventBuffer::with_capacity(8);
        inner.uint64_field(1, 64);
        inner.uint64_field(2, 0);

        let out = bytes_of(|eb| eb.message(1, &inner));
        assert_eq!(out, [0x0A, 0x04, 0x08, 0x40, 0x10, 0x00]);
    }

    #[test]
    fn invertible_uvarint() {
        fn test(v: u64) -> bool {
            let encoded = bytes_of(|eb| eb.uvarint(v));
            let mut slice = encoded.as_slice();
            prost::encoding::decode_varint(&mut slice).ok() == Some(v) && slice.is_empty()
        }
        quickcheck::quickcheck(test as fn(u64) -> bool)
    }

    #[test]
    fn invertible_svarint() {
        fn test(v: i64) -> bool {
            let encoded = bytes_of(|eb| eb.svarint(v));
            let mut slice = encoded.as_slice();
            match prost::encoding::decode_varint(&mut slice) {
                Ok(u) => (((u >> 1) as i64) ^ -((u & 1) as i64)) == v,
                Err(_) => false,
            }
        }
        quickcheck::quickcheck(test as fn(i64) -> bool);
        for v in [i64::MIN, i64::MAX, 0, -1] {
            assert!(test(v), "svarint round trip failed for {v}");
        }
    }
}
