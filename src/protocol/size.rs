//! Size pass: exact encoded length of a node tree

use super::shape::{self, CountPrefix, StringShape, visit_value};
use super::{Content, EncodeError, Node};

/// Marker byte preceding every frame
pub(crate) const MARKER_LEN: usize = 1;

/// Exact number of bytes [`encode`](super::encode) produces for `node`,
/// marker byte included. Nothing is allocated.
pub fn encoded_len(node: &Node) -> Result<usize, EncodeError> {
    let body = if shape::is_sentinel(node) {
        shape::SENTINEL_BODY.encoded_len()
    } else {
        node_len(node)?
    };
    Ok(MARKER_LEN + body)
}

fn node_len(node: &Node) -> Result<usize, EncodeError> {
    if node.description().is_empty() {
        return Err(EncodeError::EmptyDescription);
    }

    let mut len = CountPrefix::of(node.element_count())?.encoded_len();
    len += StringShape::of(node.description())?.encoded_len();
    for (key, value) in node.attributes().iter() {
        if key.is_empty() {
            return Err(EncodeError::EmptyAttributeKey);
        }
        len += StringShape::of(key)?.encoded_len();
        len += visit_value(value, |shape| shape.encoded_len())?;
    }
    if let Some(content) = node.content() {
        len += content_len(content)?;
    }
    Ok(len)
}

fn content_len(content: &Content) -> Result<usize, EncodeError> {
    match content {
        Content::Value(value) => visit_value(value, |shape| shape.encoded_len()),
        Content::Children(children) => {
            let mut len = CountPrefix::of(children.len())?.encoded_len();
            for child in children {
                len += node_len(child)?;
            }
            Ok(len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Attributes, Jid};

    #[test]
    fn test_bare_token_node() {
        // marker + LIST_8 1 + "iq"
        assert_eq!(encoded_len(&Node::new("iq")).unwrap(), 4);
    }

    #[test]
    fn test_sentinel_node() {
        let node = Node::with_attributes("0", Attributes::new().with("id", "1"));
        assert_eq!(encoded_len(&node).unwrap(), 3);
    }

    #[test]
    fn test_empty_description_rejected() {
        assert_eq!(
            encoded_len(&Node::new("")),
            Err(EncodeError::EmptyDescription)
        );
        let nested = Node::with_children("list", Attributes::new(), [Node::new("")]);
        assert_eq!(encoded_len(&nested), Err(EncodeError::EmptyDescription));
    }

    #[test]
    fn test_empty_attribute_key_rejected() {
        let attributes: Attributes = [("", "x")].into_iter().collect();
        let node = Node::with_attributes("iq", attributes);
        assert_eq!(encoded_len(&node), Err(EncodeError::EmptyAttributeKey));
    }

    #[test]
    fn test_pair_jid_counts_server() {
        // marker + LIST_8 + "iq" + "to" + JID_PAIR user(packed 4) server(token)
        let node = Node::with_attributes(
            "iq",
            Attributes::new().with("to", Jid::user_jid("391234")),
        );
        assert_eq!(encoded_len(&node).unwrap(), 1 + 2 + 1 + 1 + (1 + 5 + 1));
    }

    #[test]
    fn test_long_child_list() {
        let children = (0..300).map(|_| Node::new("item"));
        let node = Node::with_children("list", Attributes::new(), children);
        // marker + LIST_8 2 + "list" + LIST_16 300 + 300 * (LIST_8 1 + "item")
        assert_eq!(encoded_len(&node).unwrap(), 1 + 2 + 1 + 3 + 300 * 3);
    }
}
