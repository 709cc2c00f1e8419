//! Write pass: emits a node tree into a buffer sized by the size pass

use bytes::{BufMut, BytesMut};

use super::shape::{self, CountPrefix, StringShape, visit_value};
use super::size::encoded_len;
use super::{Content, EncodeError, FrameFlags, Node};

/// Encode `node` into a fresh buffer of exactly [`encoded_len`] bytes.
pub(crate) fn encode_frame(node: &Node) -> Result<Vec<u8>, EncodeError> {
    let computed = encoded_len(node)?;
    let mut buf = Vec::with_capacity(computed);
    write_frame(node, &mut buf)?;
    check_written(computed, buf.len())?;
    Ok(buf)
}

/// Append the encoding of `node` to `out`, returning the bytes written.
///
/// On failure `out` is left as it was.
pub(crate) fn encode_frame_into(node: &Node, out: &mut BytesMut) -> Result<usize, EncodeError> {
    let computed = encoded_len(node)?;
    let start = out.len();
    out.reserve(computed);
    if let Err(err) = write_frame(node, out).and_then(|()| check_written(computed, out.len() - start)) {
        out.truncate(start);
        return Err(err);
    }
    Ok(computed)
}

fn check_written(computed: usize, written: usize) -> Result<(), EncodeError> {
    if computed == written {
        Ok(())
    } else {
        Err(EncodeError::SizeMismatch { computed, written })
    }
}

fn write_frame<B: BufMut>(node: &Node, buf: &mut B) -> Result<(), EncodeError> {
    buf.put_u8(FrameFlags::new().as_u8());
    if shape::is_sentinel(node) {
        shape::SENTINEL_BODY.write(buf);
        return Ok(());
    }
    write_node(node, buf)
}

fn write_node<B: BufMut>(node: &Node, buf: &mut B) -> Result<(), EncodeError> {
    if node.description().is_empty() {
        return Err(EncodeError::EmptyDescription);
    }

    CountPrefix::of(node.element_count())?.write(buf);
    StringShape::of(node.description())?.write(buf);
    for (key, value) in node.attributes().iter() {
        if key.is_empty() {
            return Err(EncodeError::EmptyAttributeKey);
        }
        StringShape::of(key)?.write(buf);
        visit_value(value, |shape| shape.write(buf))?;
    }
    if let Some(content) = node.content() {
        write_content(content, buf)?;
    }
    Ok(())
}

fn write_content<B: BufMut>(content: &Content, buf: &mut B) -> Result<(), EncodeError> {
    match content {
        Content::Value(value) => visit_value(value, |shape| shape.write(buf)),
        Content::Children(children) => {
            CountPrefix::of(children.len())?.write(buf);
            children.iter().try_for_each(|child| write_node(child, buf))
        }
    }
}
