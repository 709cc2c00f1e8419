//! Codec error types

use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum Error {
    /// Node tree cannot be encoded (programmer error)
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Peer sent bytes that do not form a valid node
    #[error("protocol decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Input ended before the current token was complete
    #[error("unexpected end of input: need {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the current token needs
        needed: usize,
        /// Bytes left in the input
        remaining: usize,
    },

    /// Inflated frame exceeds the configured limit
    #[error("inflated frame too large: more than {max} bytes")]
    InflatedTooLarge {
        /// Maximum allowed
        max: usize,
    },

    /// IO error (decompression)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Typed attribute access failed
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Identifier string could not be parsed
    #[error(transparent)]
    Jid(#[from] JidParseError),
}

impl Error {
    /// Check if the error was caused by peer input, as opposed to local misuse
    #[must_use]
    pub const fn is_peer_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::UnexpectedEof { .. } | Self::InflatedTooLarge { .. } | Self::Io(_)
        )
    }
}

/// Errors raised while sizing or writing a node tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// List or node element count does not fit the two byte count
    #[error("list too large: {count} elements (max {max})")]
    CountOverflow {
        /// Element count
        count: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Raw payload does not fit the 32-bit length prefix
    #[error("payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        /// Payload length
        len: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Node description is empty
    #[error("node description must not be empty")]
    EmptyDescription,

    /// Attribute key is empty
    #[error("attribute key must not be empty")]
    EmptyAttributeKey,

    /// Write pass ended at a different offset than the size pass predicted
    #[error("size mismatch: computed {computed} bytes, wrote {written}")]
    SizeMismatch {
        /// Bytes predicted by the size pass
        computed: usize,
        /// Bytes emitted by the write pass
        written: usize,
    },
}

/// Malformed or unexpected token shapes in peer input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Node body declares zero elements
    #[error("empty node body")]
    EmptyNode,

    /// Description or attribute key decoded to an empty string
    #[error("empty {position}")]
    EmptyName {
        /// Where the empty string appeared
        position: &'static str,
    },

    /// Node does not start with a list tag
    #[error("expected list tag, got {tag:#04x}")]
    InvalidListTag {
        /// Tag found
        tag: u8,
    },

    /// Token shape does not fit its position
    #[error("expected {expected}, got tag {tag:#04x}")]
    UnexpectedToken {
        /// What the position requires
        expected: &'static str,
        /// Tag found
        tag: u8,
    },

    /// Tag is neither reserved nor a valid single-byte index
    #[error("unknown tag {tag:#04x}")]
    UnknownTag {
        /// Tag found
        tag: u8,
    },

    /// Dictionary index outside its table
    #[error("token index {index} out of range for {table}")]
    TokenOutOfRange {
        /// Table name
        table: &'static str,
        /// Index found
        index: usize,
    },

    /// Packed nibble outside the alphabet
    #[error("invalid packed nibble {nibble:#x} in {tag}")]
    InvalidNibble {
        /// Packing tag name
        tag: &'static str,
        /// Offending nibble
        nibble: u8,
    },

    /// Packed length byte declares an odd length with no characters
    #[error("invalid packed length {length:#04x} in {tag}")]
    InvalidPackedLength {
        /// Packing tag name
        tag: &'static str,
        /// Length byte found
        length: u8,
    },

    /// Raw text is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Pair identifier without a server part
    #[error("identifier pair has no server")]
    MissingServer,

    /// Nesting exceeds the configured depth
    #[error("node nesting deeper than {max}")]
    NestingTooDeep {
        /// Maximum allowed
        max: usize,
    },
}

/// Typed attribute access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// Required attribute absent
    #[error("missing required attribute {key}")]
    Missing {
        /// Attribute key
        key: String,
    },

    /// Stored value cannot be coerced to the requested type
    #[error("attribute {key}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Attribute key
        key: String,
        /// Requested type
        expected: &'static str,
        /// Stored value kind
        found: &'static str,
    },
}

/// Identifier parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JidParseError {
    /// Input is empty
    #[error("empty identifier")]
    Empty,

    /// Device part is not a number in 0..=255
    #[error("invalid device in {0:?}")]
    InvalidDevice(String),

    /// Agent part is not a number in 0..=255
    #[error("invalid agent in {0:?}")]
    InvalidAgent(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
