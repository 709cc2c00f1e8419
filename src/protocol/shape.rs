//! Encoding shapes shared by the size and write passes
//!
//! Every encoding decision (which string form, which length width, which
//! count width, which identifier form) is made once here. The size pass asks
//! a shape for its `encoded_len`, the write pass asks the same shape to
//! `write` itself, so the two passes cannot disagree about a decision.

use bytes::BufMut;

use super::tokens::{self, Token};
use super::{EncodeError, Jid, Node, Tag, Value};

/// Longest string eligible for nibble or hex packing
pub const PACKED_MAX: usize = 127;

/// Largest count a `LIST_16` can carry
pub const COUNT_MAX: usize = u16::MAX as usize;

/// Top-level description written as an empty list instead of a node
pub const SENTINEL_DESCRIPTION: &str = "0";

/// Body written in place of a sentinel node
pub const SENTINEL_BODY: CountPrefix = CountPrefix::Short(0);

/// Check if a top-level node takes the sentinel encoding
pub fn is_sentinel(node: &Node) -> bool {
    node.description() == SENTINEL_DESCRIPTION
}

const BINARY_8_LIMIT: usize = 1 << 8;
const BINARY_20_LIMIT: usize = 1 << 20;
const BINARY_32_MAX: usize = u32::MAX as usize;

/// Element count prefix of a node or node list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountPrefix {
    /// `LIST_8` + one byte
    Short(u8),
    /// `LIST_16` + two bytes big-endian
    Long(u16),
}

impl CountPrefix {
    pub fn of(count: usize) -> Result<Self, EncodeError> {
        if let Ok(count) = u8::try_from(count) {
            return Ok(Self::Short(count));
        }
        u16::try_from(count)
            .map(Self::Long)
            .map_err(|_| EncodeError::CountOverflow {
                count,
                max: COUNT_MAX,
            })
    }

    pub const fn encoded_len(self) -> usize {
        match self {
            Self::Short(_) => 2,
            Self::Long(_) => 3,
        }
    }

    pub fn write<B: BufMut>(self, buf: &mut B) {
        match self {
            Self::Short(count) => {
                buf.put_u8(Tag::List8.as_u8());
                buf.put_u8(count);
            }
            Self::Long(count) => {
                buf.put_u8(Tag::List16.as_u8());
                buf.put_u16(count);
            }
        }
    }
}

/// Length prefix of raw data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    /// `BINARY_8` + one byte
    Short(u8),
    /// `BINARY_20` + three bytes big-endian (top nibble clear)
    Medium(u32),
    /// `BINARY_32` + four bytes big-endian
    Long(u32),
}

impl LengthPrefix {
    pub fn of(len: usize) -> Result<Self, EncodeError> {
        if len < BINARY_8_LIMIT {
            #[allow(clippy::cast_possible_truncation)]
            return Ok(Self::Short(len as u8));
        }
        let wide = u32::try_from(len).map_err(|_| EncodeError::PayloadTooLarge {
            len,
            max: BINARY_32_MAX,
        })?;
        if len < BINARY_20_LIMIT {
            Ok(Self::Medium(wide))
        } else {
            Ok(Self::Long(wide))
        }
    }

    pub const fn encoded_len(self) -> usize {
        match self {
            Self::Short(_) => 2,
            Self::Medium(_) => 4,
            Self::Long(_) => 5,
        }
    }

    pub fn write<B: BufMut>(self, buf: &mut B) {
        match self {
            Self::Short(len) => {
                buf.put_u8(Tag::Binary8.as_u8());
                buf.put_u8(len);
            }
            Self::Medium(len) => {
                buf.put_u8(Tag::Binary20.as_u8());
                buf.put_slice(&len.to_be_bytes()[1..]);
            }
            Self::Long(len) => {
                buf.put_u8(Tag::Binary32.as_u8());
                buf.put_u32(len);
            }
        }
    }
}

/// Packed string alphabets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    /// `0-9 - .`, tag `NIBBLE_8`
    Nibble,
    /// `0-9 A-F`, tag `HEX_8`
    Hex,
}

impl Packing {
    pub const NIBBLE_ALPHABET: &'static [u8; 12] = b"0123456789-.";
    pub const HEX_ALPHABET: &'static [u8; 16] = b"0123456789ABCDEF";

    /// Nibble appended when the string has an odd length
    pub const PADDING: u8 = 0x0F;

    pub const fn tag(self) -> Tag {
        match self {
            Self::Nibble => Tag::Nibble8,
            Self::Hex => Tag::Hex8,
        }
    }

    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Nibble => Self::NIBBLE_ALPHABET,
            Self::Hex => Self::HEX_ALPHABET,
        }
    }

    /// Encoder side: decimal strings nibble-pack, uppercase hex strings hex-pack.
    fn detect(text: &str) -> Option<Self> {
        if !(2..=PACKED_MAX).contains(&text.len()) {
            return None;
        }
        let bytes = text.as_bytes();
        if bytes.iter().all(u8::is_ascii_digit) {
            Some(Self::Nibble)
        } else if bytes.iter().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F')) {
            Some(Self::Hex)
        } else {
            None
        }
    }

    /// Position of `byte` in the alphabet. `detect` only picks a packing
    /// whose alphabet covers every byte of the string.
    #[allow(clippy::cast_possible_truncation)]
    fn nibble(self, byte: u8) -> u8 {
        let position = self.alphabet().iter().position(|&c| c == byte);
        debug_assert!(position.is_some(), "{byte:#04x} outside the {self:?} alphabet");
        position.map_or(Self::PADDING, |position| position as u8)
    }

    /// Length byte: packed byte count, bit 7 set for an odd character count
    #[allow(clippy::cast_possible_truncation)]
    fn length_byte(len: usize) -> u8 {
        let packed = len.div_ceil(2) as u8;
        if len % 2 == 1 { packed | 0x80 } else { packed }
    }
}

/// How one string is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringShape<'a> {
    /// `BINARY_8 0`
    Empty,
    /// Dictionary code
    Token(Token),
    /// Nibble or hex packed
    Packed(Packing, &'a str),
    /// Length-prefixed UTF-8
    Raw(LengthPrefix, &'a [u8]),
}

impl<'a> StringShape<'a> {
    pub fn of(text: &'a str) -> Result<Self, EncodeError> {
        if text.is_empty() {
            return Ok(Self::Empty);
        }
        if let Some(token) = tokens::lookup(text) {
            return Ok(Self::Token(token));
        }
        if let Some(packing) = Packing::detect(text) {
            return Ok(Self::Packed(packing, text));
        }
        Ok(Self::Raw(LengthPrefix::of(text.len())?, text.as_bytes()))
    }

    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::Empty => 2,
            Self::Token(token) => token.encoded_len(),
            Self::Packed(_, text) => 2 + text.len().div_ceil(2),
            Self::Raw(prefix, bytes) => prefix.encoded_len() + bytes.len(),
        }
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) {
        match *self {
            Self::Empty => {
                buf.put_u8(Tag::Binary8.as_u8());
                buf.put_u8(0);
            }
            Self::Token(Token::SingleByte(index)) => buf.put_u8(index),
            Self::Token(Token::DoubleByte { dictionary, index }) => {
                buf.put_u8(dictionary.as_u8());
                buf.put_u8(index);
            }
            Self::Packed(packing, text) => {
                buf.put_u8(packing.tag().as_u8());
                buf.put_u8(Packing::length_byte(text.len()));
                for pair in text.as_bytes().chunks(2) {
                    let high = packing.nibble(pair[0]);
                    let low = pair.get(1).map_or(Packing::PADDING, |&b| packing.nibble(b));
                    buf.put_u8((high << 4) | low);
                }
            }
            Self::Raw(prefix, bytes) => {
                prefix.write(buf);
                buf.put_slice(bytes);
            }
        }
    }
}

/// How one identifier is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JidShape<'a> {
    /// `AD_JID agent device user`
    Companion {
        agent: u8,
        device: u8,
        user: StringShape<'a>,
    },
    /// `JID_PAIR (user | LIST_EMPTY) server`
    Pair {
        user: Option<StringShape<'a>>,
        server: StringShape<'a>,
    },
}

impl<'a> JidShape<'a> {
    pub fn of(jid: &'a Jid) -> Result<Self, EncodeError> {
        Ok(match jid {
            Jid::Companion {
                user,
                agent,
                device,
            } => Self::Companion {
                agent: *agent,
                device: *device,
                user: StringShape::of(user)?,
            },
            Jid::Pair { user, server } => Self::Pair {
                user: user.as_deref().map(StringShape::of).transpose()?,
                server: StringShape::of(server)?,
            },
        })
    }

    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::Companion { user, .. } => 3 + user.encoded_len(),
            Self::Pair { user, server } => {
                let user = match user {
                    Some(user) => user.encoded_len(),
                    None => 1,
                };
                1 + user + server.encoded_len()
            }
        }
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::Companion {
                agent,
                device,
                user,
            } => {
                buf.put_u8(Tag::AdJid.as_u8());
                buf.put_u8(*agent);
                buf.put_u8(*device);
                user.write(buf);
            }
            Self::Pair { user, server } => {
                buf.put_u8(Tag::JidPair.as_u8());
                match user {
                    Some(user) => user.write(buf),
                    None => buf.put_u8(Tag::ListEmpty.as_u8()),
                }
                server.write(buf);
            }
        }
    }
}

/// How one scalar value is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape<'a> {
    /// Text-like scalars share the string encoder
    String(StringShape<'a>),
    /// Raw bytes
    Bytes(LengthPrefix, &'a [u8]),
    /// Identifier
    Jid(JidShape<'a>),
}

impl ValueShape<'_> {
    pub const fn encoded_len(&self) -> usize {
        match self {
            Self::String(shape) => shape.encoded_len(),
            Self::Bytes(prefix, bytes) => prefix.encoded_len() + bytes.len(),
            Self::Jid(shape) => shape.encoded_len(),
        }
    }

    pub fn write<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::String(shape) => shape.write(buf),
            Self::Bytes(prefix, bytes) => {
                prefix.write(buf);
                buf.put_slice(bytes);
            }
            Self::Jid(shape) => shape.write(buf),
        }
    }
}

/// Resolve the shape of `value` and hand it to `visit`.
///
/// Integers are formatted into a stack buffer, so the shape only lives for
/// the duration of the callback.
pub fn visit_value<R>(
    value: &Value,
    visit: impl FnOnce(ValueShape<'_>) -> R,
) -> Result<R, EncodeError> {
    let shape = match value {
        Value::Text(text) => ValueShape::String(StringShape::of(text)?),
        Value::Symbol(name) => ValueShape::String(StringShape::of(name)?),
        Value::Bool(flag) => ValueShape::String(StringShape::of(if *flag { "true" } else { "false" })?),
        Value::Bytes(bytes) => ValueShape::Bytes(LengthPrefix::of(bytes.len())?, bytes),
        Value::Jid(jid) => ValueShape::Jid(JidShape::of(jid)?),
        Value::Int(number) => {
            let text = IntText::new(*number);
            return Ok(visit(ValueShape::String(StringShape::of(text.as_str())?)));
        }
    };
    Ok(visit(shape))
}

/// Decimal rendering of an `i64` without heap allocation
pub struct IntText {
    buf: [u8; 20],
    start: usize,
}

impl IntText {
    pub fn new(number: i64) -> Self {
        let mut buf = [0u8; 20];
        let mut start = buf.len();
        let mut magnitude = number.unsigned_abs();
        loop {
            start -= 1;
            #[allow(clippy::cast_possible_truncation)]
            {
                buf[start] = b'0' + (magnitude % 10) as u8;
            }
            magnitude /= 10;
            if magnitude == 0 {
                break;
            }
        }
        if number < 0 {
            start -= 1;
            buf[start] = b'-';
        }
        Self { buf, start }
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits and '-' are ever written.
        std::str::from_utf8(&self.buf[self.start..]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(shape: &StringShape<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        shape.write(&mut out);
        assert_eq!(out.len(), shape.encoded_len());
        out
    }

    #[test]
    fn test_int_text() {
        for number in [0, 7, -7, 42, 1_700_000_000, i64::MAX, i64::MIN] {
            assert_eq!(IntText::new(number).as_str(), number.to_string());
        }
    }

    #[test]
    fn test_count_prefix_boundaries() {
        assert_eq!(CountPrefix::of(255).unwrap(), CountPrefix::Short(255));
        assert_eq!(CountPrefix::of(256).unwrap(), CountPrefix::Long(256));
        assert_eq!(CountPrefix::of(65_535).unwrap().encoded_len(), 3);
        assert_eq!(
            CountPrefix::of(65_536),
            Err(EncodeError::CountOverflow {
                count: 65_536,
                max: COUNT_MAX
            })
        );
    }

    #[test]
    fn test_length_prefix_boundaries() {
        let cases = [(0, 2), (255, 2), (256, 4), ((1 << 20) - 1, 4), (1 << 20, 5)];
        for (len, expected) in cases {
            assert_eq!(LengthPrefix::of(len).unwrap().encoded_len(), expected, "{len}");
        }

        let mut out = Vec::new();
        LengthPrefix::of(0x0A_BCDE).unwrap().write(&mut out);
        assert_eq!(out, [0xFD, 0x0A, 0xBC, 0xDE]);
    }

    #[test]
    fn test_string_shape_priority() {
        assert_eq!(written(&StringShape::of("").unwrap()), [0xFC, 0x00]);
        assert_eq!(written(&StringShape::of("iq").unwrap()), [25]);
        assert_eq!(written(&StringShape::of("read-self").unwrap()), [0xEC, 0x00]);
        assert!(matches!(
            StringShape::of("1-abc").unwrap(),
            StringShape::Raw(LengthPrefix::Short(5), _)
        ));
    }

    #[test]
    fn test_nibble_packing() {
        assert_eq!(written(&StringShape::of("123").unwrap()), [0xFF, 0x82, 0x12, 0x3F]);
        assert_eq!(written(&StringShape::of("1234").unwrap()), [0xFF, 0x02, 0x12, 0x34]);
        // single characters are no smaller packed than raw
        assert!(matches!(StringShape::of("5").unwrap(), StringShape::Raw(..)));
        assert!(matches!(StringShape::of("12a").unwrap(), StringShape::Raw(..)));
    }

    #[test]
    fn test_nibble_positions() {
        assert_eq!(Packing::Nibble.nibble(b'0'), 0);
        assert_eq!(Packing::Nibble.nibble(b'-'), 10);
        assert_eq!(Packing::Nibble.nibble(b'.'), 11);
        assert_eq!(Packing::Hex.nibble(b'9'), 9);
        assert_eq!(Packing::Hex.nibble(b'F'), 15);
    }

    #[test]
    fn test_hex_packing() {
        assert_eq!(written(&StringShape::of("A1F").unwrap()), [0xFB, 0x82, 0xA1, 0xFF]);
        assert!(matches!(StringShape::of("a1f").unwrap(), StringShape::Raw(..)));
    }

    #[test]
    fn test_packing_limit() {
        let long = "9".repeat(PACKED_MAX);
        assert!(matches!(StringShape::of(&long).unwrap(), StringShape::Packed(..)));
        let longer = "9".repeat(PACKED_MAX + 1);
        assert!(matches!(StringShape::of(&longer).unwrap(), StringShape::Raw(..)));
    }

    #[test]
    fn test_jid_shapes() {
        let companion = Jid::companion("1234", 1, 2);
        let shape = JidShape::of(&companion).unwrap();
        let mut out = Vec::new();
        shape.write(&mut out);
        assert_eq!(out, [0xF7, 1, 2, 0xFF, 0x02, 0x12, 0x34]);
        assert_eq!(out.len(), shape.encoded_len());

        let server = Jid::server_only("g.us");
        let shape = JidShape::of(&server).unwrap();
        let mut out = Vec::new();
        shape.write(&mut out);
        assert_eq!(out, [0xFA, 0x00, 28]);
        assert_eq!(out.len(), shape.encoded_len());
    }

    #[test]
    fn test_value_shapes_match_writes() {
        let values = [
            Value::Int(-12),
            Value::Int(1234),
            Value::Bool(false),
            Value::Bytes(vec![0; 300]),
            Value::Jid(Jid::user_jid("391234")),
            Value::Symbol("available"),
        ];
        for value in values {
            visit_value(&value, |shape| {
                let mut out = Vec::new();
                shape.write(&mut out);
                assert_eq!(out.len(), shape.encoded_len(), "{value:?}");
            })
            .unwrap();
        }
    }
}
