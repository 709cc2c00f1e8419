//! Streaming node decoder
//!
//! Single pass over a borrowed slice. Every read checks the remaining input
//! first, so truncated frames fail with [`Error::UnexpectedEof`] before any
//! allocation sized by peer-supplied lengths.

use std::io::Read;

use bytes::Buf;
use flate2::read::ZlibDecoder;
use tracing::{debug, trace};

use super::metrics::Metrics;
use super::shape::Packing;
use super::tokens;
use super::{
    Attributes, Content, DecodeError, Error, FrameFlags, Jid, MAX_INFLATED_LEN, Node, Result,
    Tag, Value,
};

/// Decoder limits for untrusted input
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Deepest child nesting accepted before the frame is rejected
    pub max_depth: usize,
    /// Largest inflated body accepted from a compressed frame
    pub max_inflated_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_inflated_len: MAX_INFLATED_LEN,
        }
    }
}

/// Decode one frame: marker byte, then a node body (inflated first when the
/// marker says so). Bytes after the node are ignored.
pub(crate) fn decode_frame(input: &[u8], config: &DecoderConfig) -> Result<Node> {
    let Some((&marker, body)) = input.split_first() else {
        return Err(Error::UnexpectedEof {
            needed: 1,
            remaining: 0,
        });
    };

    let flags = FrameFlags::from_u8(marker);
    trace!(flags = %flags, len = body.len(), "decoding frame");
    if flags.is_compressed() {
        Metrics::record_compressed_frame();
        let inflated = inflate(body, config.max_inflated_len)?;
        debug!(
            compressed = body.len(),
            inflated = inflated.len(),
            "inflated frame"
        );
        return decode_body(&inflated, config);
    }
    decode_body(body, config)
}

fn inflate(body: &[u8], max: usize) -> Result<Vec<u8>> {
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    let mut inflated = Vec::new();
    ZlibDecoder::new(body)
        .take(limit)
        .read_to_end(&mut inflated)?;
    if inflated.len() > max {
        debug!(max, "inflated frame exceeds limit");
        return Err(Error::InflatedTooLarge { max });
    }
    Ok(inflated)
}

fn decode_body(body: &[u8], config: &DecoderConfig) -> Result<Node> {
    let mut reader = Reader::new(body, config.max_depth);
    let node = reader.read_node(0)?;
    if reader.input.has_remaining() {
        debug!(trailing = reader.input.remaining(), "ignoring bytes after node");
    }
    Ok(node)
}

/// Cursor over one node body
struct Reader<'a> {
    input: &'a [u8],
    max_depth: usize,
}

impl<'a> Reader<'a> {
    const fn new(input: &'a [u8], max_depth: usize) -> Self {
        Self { input, max_depth }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.input.remaining();
        if remaining < needed {
            return Err(Error::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.input.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.input.get_u16())
    }

    fn read_u20(&mut self) -> Result<u32> {
        self.ensure(3)?;
        let high = u32::from(self.input.get_u8() & 0x0F);
        Ok((high << 16) | u32::from(self.input.get_u16()))
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.input.get_u32())
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn read_count(&mut self, tag: u8) -> Result<usize> {
        match Tag::from_u8(tag) {
            Some(Tag::List8) => self.read_u8().map(usize::from),
            Some(Tag::List16) => self.read_u16().map(usize::from),
            _ => Err(DecodeError::InvalidListTag { tag }.into()),
        }
    }

    fn read_node(&mut self, depth: usize) -> Result<Node> {
        if depth > self.max_depth {
            return Err(DecodeError::NestingTooDeep {
                max: self.max_depth,
            }
            .into());
        }

        let tag = self.read_u8()?;
        let count = self.read_count(tag)?;
        if count == 0 {
            return Err(DecodeError::EmptyNode.into());
        }

        let description = self.read_name("node description")?;
        let pairs = (count - 1) / 2;
        let mut attributes = Attributes::with_capacity(pairs.min(self.input.remaining() / 2));
        for _ in 0..pairs {
            let key = self.read_name("attribute key")?;
            if let Some(value) = self.read_attribute_value()? {
                attributes.put(key, value);
            }
        }

        let content = if count % 2 == 0 {
            self.read_content(depth)?
        } else {
            None
        };
        Ok(Node::from_parts(description, attributes, content))
    }

    fn read_name(&mut self, position: &'static str) -> Result<String> {
        let name = self.read_string(position)?;
        if name.is_empty() {
            return Err(DecodeError::EmptyName { position }.into());
        }
        Ok(name)
    }

    fn read_string(&mut self, expected: &'static str) -> Result<String> {
        let tag = self.read_u8()?;
        self.read_string_tagged(tag, expected)
    }

    /// String-shaped token whose tag byte was already consumed
    fn read_string_tagged(&mut self, tag: u8, expected: &'static str) -> Result<String> {
        match Tag::from_u8(tag) {
            Some(Tag::Binary8 | Tag::Binary20 | Tag::Binary32) => {
                let raw = self.read_binary(tag)?;
                Ok(String::from_utf8(raw.to_vec()).map_err(DecodeError::from)?)
            }
            Some(Tag::Nibble8) => self.read_packed(Packing::Nibble),
            Some(Tag::Hex8) => self.read_packed(Packing::Hex),
            Some(dictionary @ (Tag::Dictionary0 | Tag::Dictionary1 | Tag::Dictionary2 | Tag::Dictionary3)) => {
                let index = self.read_u8()?;
                tokens::double_byte(dictionary, index)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        DecodeError::TokenOutOfRange {
                            table: "double-byte dictionary",
                            index: usize::from(index),
                        }
                        .into()
                    })
            }
            Some(_) => Err(DecodeError::UnexpectedToken { expected, tag }.into()),
            None if tag < Tag::SINGLE_BYTE_LIMIT => tokens::single_byte(tag)
                .map(str::to_owned)
                .ok_or_else(|| {
                    DecodeError::TokenOutOfRange {
                        table: "single-byte dictionary",
                        index: usize::from(tag),
                    }
                    .into()
                }),
            None => Err(DecodeError::UnknownTag { tag }.into()),
        }
    }

    fn read_binary(&mut self, tag: u8) -> Result<&'a [u8]> {
        let len = match Tag::from_u8(tag) {
            Some(Tag::Binary8) => u32::from(self.read_u8()?),
            Some(Tag::Binary20) => self.read_u20()?,
            Some(Tag::Binary32) => self.read_u32()?,
            _ => {
                return Err(DecodeError::UnexpectedToken {
                    expected: "binary data",
                    tag,
                }
                .into());
            }
        };
        self.read_slice(usize::try_from(len).unwrap_or(usize::MAX))
    }

    fn read_packed(&mut self, packing: Packing) -> Result<String> {
        let name = match packing {
            Packing::Nibble => "NIBBLE_8",
            Packing::Hex => "HEX_8",
        };
        let length = self.read_u8()?;
        let odd = length >> 7 == 1;
        let packed = usize::from(length & 0x7F);
        if odd && packed == 0 {
            return Err(DecodeError::InvalidPackedLength { tag: name, length }.into());
        }

        let raw = self.read_slice(packed)?;
        let alphabet = packing.alphabet();
        let char_for = |nibble: u8| {
            alphabet
                .get(usize::from(nibble))
                .map(|&b| char::from(b))
                .ok_or(DecodeError::InvalidNibble { tag: name, nibble })
        };

        let mut text = String::with_capacity(packed * 2);
        for (position, byte) in raw.iter().enumerate() {
            text.push(char_for(byte >> 4)?);
            // the low nibble of the last byte is padding for odd lengths
            if !(odd && position + 1 == packed) {
                text.push(char_for(byte & 0x0F)?);
            }
        }
        Ok(text)
    }

    fn read_attribute_value(&mut self) -> Result<Option<Value>> {
        let tag = self.read_u8()?;
        match Tag::from_u8(tag) {
            Some(Tag::ListEmpty) => Ok(None),
            Some(Tag::AdJid) => self.read_companion().map(|jid| Some(Value::Jid(jid))),
            Some(Tag::JidPair) => self.read_pair().map(|jid| Some(Value::Jid(jid))),
            Some(Tag::List8 | Tag::List16) => Err(DecodeError::UnexpectedToken {
                expected: "attribute value",
                tag,
            }
            .into()),
            Some(Tag::Binary8 | Tag::Binary20 | Tag::Binary32) => {
                let raw = self.read_binary(tag)?;
                Ok(Some(match std::str::from_utf8(raw) {
                    Ok(text) => Value::Text(text.to_owned()),
                    Err(_) => Value::Bytes(raw.to_vec()),
                }))
            }
            _ => self
                .read_string_tagged(tag, "attribute value")
                .map(|text| Some(Value::Text(text))),
        }
    }

    fn read_content(&mut self, depth: usize) -> Result<Option<Content>> {
        let tag = self.read_u8()?;
        let content = match Tag::from_u8(tag) {
            Some(Tag::ListEmpty) => return Ok(None),
            Some(Tag::List8 | Tag::List16) => {
                let count = self.read_count(tag)?;
                // every child takes at least three bytes
                let mut children = Vec::with_capacity(count.min(self.input.remaining() / 3));
                for _ in 0..count {
                    children.push(self.read_node(depth + 1)?);
                }
                Content::Children(children)
            }
            Some(Tag::AdJid) => Content::Value(Value::Jid(self.read_companion()?)),
            Some(Tag::JidPair) => Content::Value(Value::Jid(self.read_pair()?)),
            Some(Tag::Binary8 | Tag::Binary20 | Tag::Binary32) => {
                Content::Value(Value::Bytes(self.read_binary(tag)?.to_vec()))
            }
            _ => Content::Value(Value::Text(self.read_string_tagged(tag, "node content")?)),
        };
        Ok(Some(content))
    }

    fn read_companion(&mut self) -> Result<Jid> {
        let agent = self.read_u8()?;
        let device = self.read_u8()?;
        let user = self.read_string("companion user")?;
        Ok(Jid::Companion {
            user,
            agent,
            device,
        })
    }

    fn read_pair(&mut self) -> Result<Jid> {
        let tag = self.read_u8()?;
        let user = match Tag::from_u8(tag) {
            Some(Tag::ListEmpty) => None,
            _ => Some(self.read_string_tagged(tag, "identifier user")?),
        };

        let tag = self.read_u8()?;
        if tag == Tag::ListEmpty.as_u8() {
            return Err(DecodeError::MissingServer.into());
        }
        let server = self.read_string_tagged(tag, "identifier server")?;
        Ok(Jid::Pair { user, server })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<Node> {
        decode_frame(input, &DecoderConfig::default())
    }

    #[test]
    fn test_decode_iq() {
        let mut frame = vec![0x00, 0xF8, 5, 25, 8, 0xFC, 3];
        frame.extend_from_slice(b"abc");
        frame.extend_from_slice(&[4, 41]);

        let node = decode(&frame).unwrap();
        assert_eq!(node.description(), "iq");
        assert_eq!(node.attributes().get_string("id").unwrap().as_deref(), Some("abc"));
        assert_eq!(node.attributes().get_string("type").unwrap().as_deref(), Some("get"));
        assert!(node.content().is_none());
    }

    #[test]
    fn test_decode_packed_strings() {
        // content "123" nibble packed, odd length
        let node = decode(&[0x00, 0xF8, 2, 65, 0xFF, 0x82, 0x12, 0x3F]).unwrap();
        assert_eq!(node.content_as_str().as_deref(), Some("123"));

        // content "A1" hex packed, even length
        let node = decode(&[0x00, 0xF8, 2, 65, 0xFB, 0x01, 0xA1]).unwrap();
        assert_eq!(node.content_as_str().as_deref(), Some("A1"));

        // nibble alphabet includes '-' and '.'
        let node = decode(&[0x00, 0xF8, 2, 65, 0xFF, 0x02, 0x1A, 0xB2]).unwrap();
        assert_eq!(node.content_as_str().as_deref(), Some("1-.2"));
    }

    #[test]
    fn test_decode_invalid_nibble() {
        let err = decode(&[0x00, 0xF8, 2, 65, 0xFF, 0x01, 0x1C]).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::InvalidNibble { nibble: 0x0C, .. })
        ));

        let err = decode(&[0x00, 0xF8, 2, 65, 0xFF, 0x80]).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::InvalidPackedLength { length: 0x80, .. })
        ));
    }

    #[test]
    fn test_decode_double_byte_token() {
        let node = decode(&[0x00, 0xF8, 1, 0xEC, 0x00]).unwrap();
        assert_eq!(node.description(), "read-self");

        let err = decode(&[0x00, 0xF8, 1, 0xEC, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::TokenOutOfRange { index: 255, .. })
        ));
    }

    #[test]
    fn test_decode_jids() {
        // attribute "to" -> pair (no user, g.us); content -> companion 1:2 user "12"
        let frame = [0x00, 0xF8, 4, 25, 17, 0xFA, 0x00, 28, 0xF7, 1, 2, 0xFF, 0x01, 0x12];
        let node = decode(&frame).unwrap();
        assert_eq!(
            node.attributes().get_jid("to").unwrap(),
            Some(Jid::server_only("g.us"))
        );
        let jid = node.content_as_jid().unwrap();
        assert_eq!(jid, Jid::companion("12", 1, 2));
        assert_eq!(jid.server(), "");
    }

    #[test]
    fn test_decode_pair_without_server() {
        let err = decode(&[0x00, 0xF8, 2, 25, 0xFA, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MissingServer)));
    }

    #[test]
    fn test_null_attribute_is_skipped() {
        let node = decode(&[0x00, 0xF8, 5, 25, 8, 0x00, 4, 41]).unwrap();
        assert_eq!(node.attributes().len(), 1);
        assert!(!node.attributes().contains_key("id"));
    }

    #[test]
    fn test_binary_attribute_fallback() {
        let node = decode(&[0x00, 0xF8, 3, 25, 8, 0xFC, 2, 0xFF, 0xFE]).unwrap();
        assert_eq!(
            node.attributes().get_value("id"),
            Some(&Value::Bytes(vec![0xFF, 0xFE]))
        );
    }

    #[test]
    fn test_binary20_length_masks_high_nibble() {
        let mut frame = vec![0x00, 0xF8, 2, 25, 0xFD, 0xF0, 0x01, 0x00];
        frame.extend(std::iter::repeat_n(7u8, 256));
        let node = decode(&frame).unwrap();
        assert_eq!(node.content_as_bytes().map(<[u8]>::len), Some(256));
    }

    #[test]
    fn test_failure_stops_at_offending_token() {
        // zero count: nothing past the count byte is read
        let mut reader = Reader::new(&[0xF8, 0x00, 0xAA, 0xBB], 128);
        assert!(matches!(
            reader.read_node(0),
            Err(Error::Decode(DecodeError::EmptyNode))
        ));
        assert_eq!(reader.input, [0xAA, 0xBB]);

        // list where the description belongs: stops after that tag
        let mut reader = Reader::new(&[0xF8, 0x01, 0xF8, 0x01, 25, 0xAA], 128);
        assert!(matches!(
            reader.read_node(0),
            Err(Error::Decode(DecodeError::UnexpectedToken { tag: 0xF8, .. }))
        ));
        assert_eq!(reader.input, [0x01, 25, 0xAA]);
    }

    #[test]
    fn test_empty_attribute_key_rejected() {
        let err = decode(&[0x00, 0xF8, 3, 25, 0xFC, 0x00, 0xFC, 0x01, b'x']).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::EmptyName {
                position: "attribute key"
            })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let node = decode(&[0x00, 0xF8, 1, 25, 0xDE, 0xAD]).unwrap();
        assert_eq!(node, Node::new("iq"));
    }

    #[test]
    fn test_depth_limit() {
        let config = DecoderConfig {
            max_depth: 2,
            ..DecoderConfig::default()
        };
        // four levels of nesting below the root
        let mut frame = vec![0x00];
        for _ in 0..4 {
            frame.extend_from_slice(&[0xF8, 2, 63, 0xF8, 1]);
        }
        frame.extend_from_slice(&[0xF8, 1, 63]);

        let err = decode_frame(&frame, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode(DecodeError::NestingTooDeep { max: 2 })
        ));
        assert!(decode(&frame).is_ok());
    }

    #[test]
    fn test_huge_declared_length_fails_without_allocating() {
        let err = decode(&[0x00, 0xF8, 2, 25, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                needed: 0xFFFF_FFFF,
                remaining: 0
            }
        ));
    }

    #[test]
    fn test_inflate_limit() {
        use flate2::{Compression, write::ZlibEncoder};
        use std::io::Write;

        let mut body = vec![0xF8, 2, 25, 0xFD, 0x00, 0x10, 0x00];
        body.extend(std::iter::repeat_n(0u8, 4096));
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body).unwrap();
        let mut frame = vec![FrameFlags::COMPRESSED];
        frame.extend(encoder.finish().unwrap());

        let node = decode(&frame).unwrap();
        assert_eq!(node.content_as_bytes().map(<[u8]>::len), Some(4096));

        let config = DecoderConfig {
            max_inflated_len: 1024,
            ..DecoderConfig::default()
        };
        let err = decode_frame(&frame, &config).unwrap_err();
        assert!(matches!(err, Error::InflatedTooLarge { max: 1024 }));
    }

    #[test]
    fn test_corrupt_zlib_is_io_error() {
        let err = decode(&[FrameFlags::COMPRESSED, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
