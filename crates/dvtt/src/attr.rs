//! Transaction attributes and their debug-annotation encoding.

use crate::error::{Error, Result};
use crate::protocol::eventbuf::EventBuffer;
use crate::protocol::fields::debug_annotation as field;

/// Display radix of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Radix {
    Bin,
    Oct,
    Dec,
    #[default]
    Hex,
    Unsigned,
    String,
    Time,
    Real,
}

impl Radix {
    /// The suffix appended to integer and bit-vector attribute names.
    pub fn suffix(self) -> &'static str {
        match self {
            Radix::Bin => "[bin]",
            Radix::Oct => "[oct]",
            Radix::Dec => "[dec]",
            Radix::Hex => "[hex]",
            Radix::Unsigned => "[u]",
            Radix::Time => "[time]",
            Radix::String | Radix::Real => "",
        }
    }

    fn decorate(self, name: &str) -> String {
        let suffix = self.suffix();
        let mut out = String::with_capacity(name.len() + suffix.len());
        out.push_str(name);
        out.push_str(suffix);
        out
    }
}

/// The value of an attribute, as it will be written to the trace.
///
/// Bit vectors and blobs have no native representation in the wire format and
/// are rendered to strings when the attribute is created.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bits(String),
    Blob(String),
}

/// A named, immutable attribute attached to a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    radix: Radix,
    value: AttrValue,
}

impl Attribute {
    pub fn int(name: &str, value: i64, radix: Radix) -> Self {
        Attribute {
            name: radix.decorate(name),
            radix,
            value: AttrValue::Int(value),
        }
    }

    pub fn uint(name: &str, value: u64, radix: Radix) -> Self {
        Attribute {
            name: radix.decorate(name),
            radix,
            value: AttrValue::Uint(value),
        }
    }

    pub fn time(name: &str, value: u64) -> Self {
        Self::uint(name, value, Radix::Time)
    }

    pub fn float(name: &str, value: f64) -> Self {
        Attribute {
            name: name.to_string(),
            radix: Radix::Real,
            value: AttrValue::Float(value),
        }
    }

    pub fn string(name: &str, value: &str) -> Self {
        Attribute {
            name: name.to_string(),
            radix: Radix::String,
            value: AttrValue::Str(value.to_string()),
        }
    }

    /// Creates a bit-vector attribute from little-endian `bits`, of which the
    /// low `num_bits` are significant.
    pub fn bits(name: &str, bits: &[u8], num_bits: usize, radix: Radix) -> Result<Self> {
        let rendered = render_bits(bits, num_bits, radix)?;
        Ok(Attribute {
            name: radix.decorate(name),
            radix,
            value: AttrValue::Bits(rendered),
        })
    }

    pub fn blob(name: &str, data: &[u8]) -> Self {
        Attribute {
            name: name.to_string(),
            radix: Radix::Hex,
            value: AttrValue::Blob(hex::encode(data)),
        }
    }

    /// The display name, including any radix suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    pub fn value(&self) -> &AttrValue {
        &self.value
    }

    /// Encodes the attribute as a `DebugAnnotation` message.
    pub fn encode(&self) -> EventBuffer {
        let mut eb = EventBuffer::with_capacity(16 + self.name.len());
        eb.string_field(field::NAME, &self.name);
        match &self.value {
            AttrValue::Int(v) => eb.int64_field(field::INT_VALUE, *v),
            AttrValue::Uint(v) => eb.uint64_field(field::UINT_VALUE, *v),
            AttrValue::Float(v) => eb.double_field(field::DOUBLE_VALUE, *v),
            AttrValue::Str(s) | AttrValue::Bits(s) | AttrValue::Blob(s) => {
                eb.string_field(field::STRING_VALUE, s)
            }
        }
        eb
    }
}

/// Renders a little-endian bit vector for display.
///
/// Binary output is fixed-width: the most significant byte comes first and the
/// result is cut to exactly `2 + num_bits` characters.
pub fn render_bits(bits: &[u8], num_bits: usize, radix: Radix) -> Result<String> {
    if num_bits > bits.len() * 8 {
        return Err(Error::BitWidth {
            num_bits,
            bytes: bits.len(),
        });
    }

    match radix {
        Radix::Bin => {
            let mut out = String::with_capacity(2 + bits.len() * 8);
            out.push_str("0b");
            for byte in bits.iter().rev() {
                out.push_str(&format!("{byte:08b}"));
            }
            out.truncate(2 + num_bits);
            Ok(out)
        }
        _ => Ok(format!("0x{}", hex::encode(bits))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn integer_names_carry_radix() {
        assert_eq!(Attribute::uint("addr", 0x1000, Radix::Hex).name(), "addr[hex]");
        assert_eq!(Attribute::int("delta", -4, Radix::Dec).name(), "delta[dec]");
        assert_eq!(Attribute::uint("mask", 3, Radix::Bin).name(), "mask[bin]");
        assert_eq!(Attribute::uint("mode", 3, Radix::Oct).name(), "mode[oct]");
        assert_eq!(Attribute::uint("len", 3, Radix::Unsigned).name(), "len[u]");
        assert_eq!(Attribute::time("t", 10).name(), "t[time]");
        assert_eq!(Attribute::uint("raw", 1, Radix::Real).name(), "raw");
        assert_eq!(Attribute::uint("raw", 1, Radix::String).name(), "raw");
    }

    #[test]
    fn plain_names() {
        assert_eq!(Attribute::float("v", 3.3).name(), "v");
        assert_eq!(Attribute::string("status", "OK").name(), "status");
        assert_eq!(Attribute::blob("payload", &[1, 2]).name(), "payload");
    }

    #[test]
    fn time_is_uint_with_time_radix() {
        let attr = Attribute::time("latency", 42);
        assert_eq!(attr.radix(), Radix::Time);
        assert_eq!(attr.value(), &AttrValue::Uint(42));
    }

    #[test]
    fn blob_renders_lowercase_hex() {
        let attr = Attribute::blob("data", &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(attr.value(), &AttrValue::Blob("deadbeef".to_string()));
    }

    #[test]
    fn bits_hex() {
        assert_eq!(render_bits(&[0x34, 0x12], 16, Radix::Hex).unwrap(), "0x3412");
        assert_eq!(render_bits(&[0xAB], 4, Radix::Hex).unwrap(), "0xab");
    }

    #[test]
    fn bits_bin_is_msb_first_and_truncated() {
        assert_eq!(render_bits(&[0x05], 8, Radix::Bin).unwrap(), "0b00000101");
        assert_eq!(
            render_bits(&[0x01, 0x80], 16, Radix::Bin).unwrap(),
            "0b1000000000000001"
        );
        assert_eq!(render_bits(&[0x01, 0x80], 4, Radix::Bin).unwrap(), "0b1000");
        assert_eq!(render_bits(&[0xFF], 0, Radix::Bin).unwrap(), "0b");
    }

    #[test]
    fn bits_other_radix_falls_back_to_hex() {
        for radix in [Radix::Oct, Radix::Dec, Radix::Unsigned, Radix::Time] {
            assert_eq!(render_bits(&[0x0F, 0xA0], 12, radix).unwrap(), "0x0fa0");
        }
    }

    #[test]
    fn bits_wider_than_backing_bytes() {
        assert_matches!(
            render_bits(&[0x00], 9, Radix::Bin),
            Err(Error::BitWidth {
                num_bits: 9,
                bytes: 1
            })
        );
        assert_matches!(
            Attribute::bits("x", &[], 1, Radix::Hex),
            Err(Error::BitWidth { .. })
        );
    }

    #[test]
    fn encode_uint() {
        let eb = Attribute::uint("a", 0x10, Radix::Hex).encode();
        assert_eq!(
            eb.as_ref(),
            [0x52, 0x06, b'a', b'[', b'h', b'e', b'x', b']', 0x18, 0x10]
        );
    }

    #[test]
    fn encode_string_kinds() {
        let eb = Attribute::bits("b", &[0x01], 1, Radix::Bin).unwrap().encode();
        assert_eq!(
            eb.as_ref(),
            [0x52, 0x06, b'b', b'[', b'b', b'i', b'n', b']', 0x32, 0x03, b'0', b'b', b'0']
        );

        let eb = Attribute::string("s", "hi").encode();
        assert_eq!(eb.as_ref(), [0x52, 0x01, b's', 0x32, 0x02, b'h', b'i']);
    }

    #[test]
    fn encode_float() {
        let eb = Attribute::float("v", 3.3).encode();
        let mut expected = vec![0x52, 0x01, b'v', 0x29];
        expected.extend_from_slice(&3.3f64.to_le_bytes());
        assert_eq!(eb.as_ref(), expected.as_slice());
    }
}
