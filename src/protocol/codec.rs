//! Node frame codec (encode/decode)
//!
//! Encoding is two-phase: the size pass computes the exact frame length,
//! then one write pass fills a buffer of that length. Decoding is a single
//! streaming pass over the frame.

use std::time::Instant;

use bytes::BytesMut;
use tracing::{debug, instrument, trace};

use super::decoder::{DecoderConfig, decode_frame};
use super::encoder::{encode_frame, encode_frame_into};
use super::metrics::{Direction, Metrics};
use super::{Node, Result};

/// Encode a node into a new frame
///
/// # Format
///
/// ```text
/// [MARKER (1 byte)] [COUNT] [DESCRIPTION] [KEY VALUE]* [CONTENT]?
/// ```
///
/// The marker is always `0` (uncompressed). A top-level node described
/// `"0"` is written as an empty list instead of a node.
///
/// # Errors
///
/// Returns [`Error::Encode`](super::Error::Encode) if an element count
/// exceeds two bytes, a payload exceeds four bytes of length, or a
/// description is empty.
#[instrument(level = "trace", skip(node), fields(description = node.description()))]
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    let started = Instant::now();
    match encode_frame(node) {
        Ok(frame) => {
            Metrics::record_frame(Direction::Encode, frame.len(), started.elapsed());
            trace!(len = frame.len(), "encoded frame");
            Ok(frame)
        }
        Err(err) => {
            Metrics::record_error(Direction::Encode);
            debug!(error = %err, "failed to encode node");
            Err(err.into())
        }
    }
}

/// Append the frame for `node` to `out`, returning the bytes written.
///
/// Exactly the frame length is reserved up front; on failure `out` is left
/// unchanged.
#[instrument(level = "trace", skip(node, out), fields(description = node.description()))]
pub fn encode_into(node: &Node, out: &mut BytesMut) -> Result<usize> {
    let started = Instant::now();
    match encode_frame_into(node, out) {
        Ok(written) => {
            Metrics::record_frame(Direction::Encode, written, started.elapsed());
            trace!(len = written, "encoded frame");
            Ok(written)
        }
        Err(err) => {
            Metrics::record_error(Direction::Encode);
            debug!(error = %err, "failed to encode node");
            Err(err.into())
        }
    }
}

/// Decode a frame with the default [`DecoderConfig`]
///
/// # Errors
///
/// Returns an error if:
/// - The input ends inside a token
/// - A token does not fit its position (e.g. a list where the description belongs)
/// - The node body is empty
/// - A compressed body fails to inflate or exceeds the inflate limit
pub fn decode(input: &[u8]) -> Result<Node> {
    decode_with(input, &DecoderConfig::default())
}

/// Decode a frame with explicit limits
#[instrument(level = "trace", skip(input, config), fields(len = input.len()))]
pub fn decode_with(input: &[u8], config: &DecoderConfig) -> Result<Node> {
    let started = Instant::now();
    match decode_frame(input, config) {
        Ok(node) => {
            Metrics::record_frame(Direction::Decode, input.len(), started.elapsed());
            trace!(description = node.description(), "decoded frame");
            Ok(node)
        }
        Err(err) => {
            Metrics::record_error(Direction::Decode);
            debug!(error = %err, "rejected frame");
            Err(err)
        }
    }
}

/// Codec bound to one set of decoder limits
///
/// Stateless apart from its configuration, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Default)]
pub struct NodeCodec {
    config: DecoderConfig,
}

impl NodeCodec {
    /// Create a codec with the given decoder limits
    #[must_use]
    pub const fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Decoder limits in use
    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// See [`encode`]
    pub fn encode(&self, node: &Node) -> Result<Vec<u8>> {
        encode(node)
    }

    /// See [`encode_into`]
    pub fn encode_into(&self, node: &Node, out: &mut BytesMut) -> Result<usize> {
        encode_into(node, out)
    }

    /// Decode with this codec's limits
    pub fn decode(&self, input: &[u8]) -> Result<Node> {
        decode_with(input, &self.config)
    }
}
