//! mdwire - Binary node codec for a multi-device messaging protocol
//!
//! Every request, response and notification of the protocol is a [`Node`]
//! tree: a description, an ordered attribute map and optional content. This
//! library converts node trees to and from the compact binary frame format
//! the server speaks, using shared token dictionaries for common vocabulary.
//!
//! # Quick Start
//!
//! ```rust
//! use mdwire::{Attributes, Node};
//!
//! // Build a node
//! let iq = Node::with_attributes(
//!     "iq",
//!     Attributes::new().with("id", "1-abc").with("type", "get"),
//! );
//!
//! // Encode into an exactly sized frame
//! let frame = mdwire::encode(&iq)?;
//! assert_eq!(frame.len(), mdwire::encoded_len(&iq)?);
//!
//! // Decode it back
//! let decoded = mdwire::decode(&frame)?;
//! assert_eq!(decoded, iq);
//! # Ok::<(), mdwire::Error>(())
//! ```
//!
//! # Features
//!
//! - **Exact-size encoding** - one allocation, one write pass
//! - **Token dictionaries** - one or two bytes for protocol vocabulary
//! - **Hardened decoding** - bounded depth, bounded inflate, no panics on peer input
//! - **`serde` feature** - serialize node trees for logging and debugging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;

pub use protocol::{
    AttributeError, Attributes, Content, DecodeError, DecoderConfig, EncodeError, Error,
    FrameFlags, FromValue, Jid, JidParseError, Node, NodeBuilder, NodeCodec, Result, Tag, Value,
    WireSymbol, decode, decode_with, encode, encode_into, encoded_len,
};

/// Token dictionary generation this build speaks
pub const VERSION: u8 = protocol::tokens::DICTIONARY_VERSION;
