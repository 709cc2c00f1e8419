//! Decode a hex-encoded frame and print its node tree
//!
//! ```text
//! cargo run --example frame_inspect -- 00f80119
//! ```

use mdwire::{DecoderConfig, FrameFlags, NodeCodec, Tag};

/// `<presence type="available"/>`
const SAMPLE: &str = "00f8031f0488";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = std::env::args().nth(1).unwrap_or_else(|| SAMPLE.to_string());
    let digits: String = input.split_whitespace().collect();
    let frame = hex::decode(digits)?;

    println!("mdwire Frame Inspector");
    println!("======================\n");
    println!("Frame: {} bytes", frame.len());

    let Some((&marker, body)) = frame.split_first() else {
        return Err("empty frame".into());
    };
    println!("Marker: {}", FrameFlags::from_u8(marker));
    if let Some(&first) = body.first() {
        match Tag::from_u8(first) {
            Some(tag) => println!("Body starts with: {tag}"),
            None => println!("Body starts with token byte {first}"),
        }
    }

    let codec = NodeCodec::new(DecoderConfig {
        max_depth: 64,
        ..DecoderConfig::default()
    });
    match codec.decode(&frame) {
        Ok(node) => {
            println!("\n{node}");
            println!("\nRe-encodes to {} bytes", mdwire::encoded_len(&node)?);
        }
        Err(err) if err.is_peer_error() => println!("\nMalformed frame: {err}"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
