//! Protocol nodes
//!
//! A [`Node`] is the unit every request, response and notification travels
//! as: a description (the element name), an ordered attribute map and an
//! optional content that is either one scalar [`Value`] or a list of child
//! nodes. Nodes are immutable once built; use [`NodeBuilder`] or the
//! constructors to assemble them.

use std::borrow::Cow;
use std::fmt;

use super::{Attributes, FromValue, Jid, Value};

/// Node content
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Content {
    /// Single scalar value
    Value(Value),
    /// Ordered child nodes
    Children(Vec<Node>),
}

impl Content {
    /// Child nodes, empty for scalar content
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Children(children) => children,
            Self::Value(_) => &[],
        }
    }

    /// Scalar value, if any
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Children(_) => None,
        }
    }
}

/// A lone node becomes a one-element child list.
impl From<Node> for Content {
    fn from(node: Node) -> Self {
        Self::Children(vec![node])
    }
}

impl From<Vec<Node>> for Content {
    fn from(children: Vec<Node>) -> Self {
        Self::Children(children)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

macro_rules! content_from_scalar {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Content {
            fn from(value: $ty) -> Self {
                Self::Value(Value::from(value))
            }
        }
    )*};
}

content_from_scalar!(
    String, &str, Vec<u8>, &[u8], bool, Jid, &Jid, i8, i16, i32, i64, u8, u16, u32, u64, usize
);

/// Protocol message unit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Node {
    description: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Attributes::is_empty"))]
    attributes: Attributes,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    content: Option<Content>,
}

impl Node {
    /// Create a node with no attributes and no content
    pub fn new(description: impl Into<String>) -> Self {
        Self::from_parts(description, Attributes::new(), None)
    }

    /// Create a node with attributes and no content
    pub fn with_attributes(description: impl Into<String>, attributes: Attributes) -> Self {
        Self::from_parts(description, attributes, None)
    }

    /// Create a node with content. An empty child list is stored as no content.
    pub fn with_content(
        description: impl Into<String>,
        attributes: Attributes,
        content: impl Into<Content>,
    ) -> Self {
        let content = match content.into() {
            Content::Children(children) if children.is_empty() => None,
            content => Some(content),
        };
        Self::from_parts(description, attributes, content)
    }

    /// Create a node with child nodes
    pub fn with_children(
        description: impl Into<String>,
        attributes: Attributes,
        children: impl IntoIterator<Item = Node>,
    ) -> Self {
        Self::with_content(description, attributes, children.into_iter().collect::<Vec<_>>())
    }

    /// Assemble a node exactly as given
    pub fn from_parts(
        description: impl Into<String>,
        attributes: Attributes,
        content: Option<Content>,
    ) -> Self {
        Self {
            description: description.into(),
            attributes,
            content,
        }
    }

    /// Start a builder
    pub fn builder(description: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(description)
    }

    /// Element name
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Attribute map
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Content, if any
    #[must_use]
    pub const fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// Check if content is present
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Number of wire elements: description, two per attribute, one for content
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + 2 * self.attributes.len() + usize::from(self.has_content())
    }

    /// Check the description
    #[must_use]
    pub fn has_description(&self, description: &str) -> bool {
        self.description == description
    }

    /// Child nodes, empty when the content is scalar or absent
    #[must_use]
    pub fn children(&self) -> &[Node] {
        self.content.as_ref().map_or(&[], Content::children)
    }

    /// First child
    #[must_use]
    pub fn first_child(&self) -> Option<&Node> {
        self.children().first()
    }

    /// First child with the given description
    #[must_use]
    pub fn find_child(&self, description: &str) -> Option<&Node> {
        self.children()
            .iter()
            .find(|child| child.has_description(description))
    }

    /// All children with the given description
    pub fn children_by<'a>(&'a self, description: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children()
            .iter()
            .filter(move |child| child.has_description(description))
    }

    /// Check for a child with the given description
    #[must_use]
    pub fn has_child(&self, description: &str) -> bool {
        self.find_child(description).is_some()
    }

    /// The `id` attribute as text
    #[must_use]
    pub fn id(&self) -> Option<Cow<'_, str>> {
        self.attributes.get_value("id").and_then(Value::as_text)
    }

    /// Scalar content
    #[must_use]
    pub fn content_value(&self) -> Option<&Value> {
        self.content.as_ref().and_then(Content::as_value)
    }

    /// Scalar content as text (UTF-8 bytes included)
    #[must_use]
    pub fn content_as_str(&self) -> Option<Cow<'_, str>> {
        self.content_value().and_then(Value::as_text)
    }

    /// Scalar content as raw bytes
    #[must_use]
    pub fn content_as_bytes(&self) -> Option<&[u8]> {
        self.content_value().and_then(Value::as_bytes)
    }

    /// Scalar content as an integer
    #[must_use]
    pub fn content_as_i64(&self) -> Option<i64> {
        self.content_value().and_then(i64::from_value)
    }

    /// Scalar content as a boolean
    #[must_use]
    pub fn content_as_bool(&self) -> Option<bool> {
        self.content_value().and_then(bool::from_value)
    }

    /// Scalar content as an identifier
    #[must_use]
    pub fn content_as_jid(&self) -> Option<Jid> {
        self.content_value().and_then(Jid::from_value)
    }

    /// Split into description, attributes and content
    #[must_use]
    pub fn into_parts(self) -> (String, Attributes, Option<Content>) {
        (self.description, self.attributes, self.content)
    }
}

/// XML-like rendering for logs
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.description)?;
        for (key, value) in self.attributes.iter() {
            write!(f, " {key}=\"{value}\"")?;
        }
        match &self.content {
            None => write!(f, "/>"),
            Some(Content::Children(children)) => {
                write!(f, ">")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{}>", self.description)
            }
            Some(Content::Value(value)) => write!(f, ">{value}</{}>", self.description),
        }
    }
}

/// Incremental node construction
#[derive(Debug, Clone)]
#[must_use]
pub struct NodeBuilder {
    description: String,
    attributes: Attributes,
    content: Option<Content>,
}

impl NodeBuilder {
    /// Start a builder for `description`
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: Attributes::new(),
            content: None,
        }
    }

    /// Replace the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an attribute
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.put(key, value);
        self
    }

    /// Add an attribute when present
    pub fn attribute_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.attributes.put_opt(key, value);
        self
    }

    /// Add an attribute when `condition` holds
    pub fn attribute_if(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        condition: bool,
    ) -> Self {
        self.attributes.put_if(key, value, condition);
        self
    }

    /// Merge an attribute map
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        for (key, value) in attributes.iter() {
            self.attributes.put(key, value.clone());
        }
        self
    }

    /// Set the content, replacing anything set before
    pub fn content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Append a child. Scalar content set earlier is discarded.
    pub fn child(mut self, child: Node) -> Self {
        match &mut self.content {
            Some(Content::Children(children)) => children.push(child),
            _ => self.content = Some(Content::Children(vec![child])),
        }
        self
    }

    /// Append several children
    pub fn children(self, children: impl IntoIterator<Item = Node>) -> Self {
        children.into_iter().fold(self, Self::child)
    }

    /// Finish the node
    #[must_use]
    pub fn build(self) -> Node {
        match self.content {
            Some(content) => Node::with_content(self.description, self.attributes, content),
            None => Node::with_attributes(self.description, self.attributes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::builder("iq")
            .attribute("id", "1-abc")
            .attribute("type", "get")
            .child(Node::with_attributes("item", Attributes::new().with("v", "1")))
            .child(Node::with_attributes("item", Attributes::new().with("v", "2")))
            .child(Node::new("ping"))
            .build()
    }

    #[test]
    fn test_node_creation() {
        let node = sample();
        assert_eq!(node.description(), "iq");
        assert_eq!(node.id().as_deref(), Some("1-abc"));
        assert_eq!(node.element_count(), 6);
        assert_eq!(node.children().len(), 3);
    }

    #[test]
    fn test_child_lookup() {
        let node = sample();
        assert!(node.has_child("ping"));
        assert!(!node.has_child("pong"));
        assert_eq!(node.children_by("item").count(), 2);
        let first = node.find_child("item").unwrap();
        assert_eq!(first.attributes().get_string("v").unwrap().as_deref(), Some("1"));
        assert_eq!(node.first_child().unwrap(), first);
    }

    #[test]
    fn test_single_node_content_becomes_list() {
        let node = Node::with_content("iq", Attributes::new(), Node::new("ping"));
        assert_eq!(node.children().len(), 1);
        assert!(matches!(node.content(), Some(Content::Children(_))));
    }

    #[test]
    fn test_empty_children_is_no_content() {
        let node = Node::with_children("list", Attributes::new(), Vec::new());
        assert!(!node.has_content());
        assert_eq!(node.element_count(), 1);
    }

    #[test]
    fn test_scalar_content_accessors() {
        let node = Node::with_content("count", Attributes::new(), 42);
        assert_eq!(node.content_as_i64(), Some(42));
        assert_eq!(node.content_as_str().as_deref(), Some("42"));
        assert!(node.children().is_empty());

        let bytes = Node::with_content("enc", Attributes::new(), vec![0xC0u8, 0x01]);
        assert_eq!(bytes.content_as_bytes(), Some(&[0xC0, 0x01][..]));
        assert_eq!(bytes.content_as_str(), None);

        let flag = Node::with_content("flag", Attributes::new(), "true");
        assert_eq!(flag.content_as_bool(), Some(true));
    }

    #[test]
    fn test_display() {
        let node = Node::builder("list")
            .child(Node::with_attributes("item", Attributes::new().with("v", "1")))
            .child(Node::with_content("body", Attributes::new(), "hi"))
            .build();
        assert_eq!(node.to_string(), r#"<list><item v="1"/><body>hi</body></list>"#);
    }

    #[test]
    fn test_builder_conditional_attributes() {
        let node = Node::builder("receipt")
            .attribute_opt("participant", None::<Jid>)
            .attribute_if("type", "read", true)
            .attribute_if("edit", "1", false)
            .build();
        assert_eq!(node.attributes().len(), 1);
        assert!(!node.has_content());
    }
}
