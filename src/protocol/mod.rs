//! Binary node protocol core
//!
//! This module provides the node data model, the token dictionaries and the
//! frame codec.

mod attributes;
mod codec;
mod decoder;
mod encoder;
mod error;
mod jid;
pub mod metrics;
mod node;
mod shape;
mod size;
pub mod tokens;
mod types;
mod value;

pub use attributes::Attributes;
pub use codec::{NodeCodec, decode, decode_with, encode, encode_into};
pub use decoder::DecoderConfig;
pub use error::{AttributeError, DecodeError, EncodeError, Error, JidParseError, Result};
pub use jid::{Jid, server};
pub use node::{Content, Node, NodeBuilder};
pub use size::encoded_len;
pub use types::{FrameFlags, Tag};
pub use value::{FromValue, Value, WireSymbol};

/// Maximum inflated size of a compressed frame (16 MB)
pub const MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;
