//! Build a stanza, encode it and read it back

use mdwire::protocol::{metrics, server};
use mdwire::{Attributes, Jid, Node};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("mdwire Node Round-Trip");
    println!("======================\n");

    let iq = Node::builder("iq")
        .attribute("id", "3EB0C431C26A1916E07A")
        .attribute("type", "get")
        .attribute("xmlns", "w:p")
        .attribute("to", Jid::server_only(server::USER))
        .child(Node::new("ping"))
        .build();
    println!("Built: {iq}");

    let frame = mdwire::encode(&iq)?;
    println!("Encoded to {} bytes: {:02x?}", frame.len(), frame);

    let decoded = mdwire::decode(&frame)?;
    println!("Decoded: {decoded}");
    assert_eq!(decoded, iq);

    let message = Node::with_children(
        "message",
        Attributes::new()
            .with("id", "3EB0A1B2C3D4")
            .with("to", Jid::companion("393495089819", 0, 3))
            .with("t", 1_700_000_000u64),
        [Node::with_content(
            "enc",
            Attributes::new().with("v", "2").with("type", "msg"),
            vec![0x42u8; 512],
        )],
    );
    let frame = mdwire::encode(&message)?;
    let decoded = mdwire::decode(&frame)?;
    let recipient = decoded.attributes().get_jid("to")?;
    println!(
        "\nMessage frame: {} bytes, recipient={}, payload={} bytes",
        frame.len(),
        recipient.map(|jid| jid.to_string()).unwrap_or_default(),
        decoded
            .find_child("enc")
            .and_then(Node::content_as_bytes)
            .map_or(0, <[u8]>::len)
    );

    let snapshot = metrics::snapshot();
    println!(
        "\nMetrics: encoded={} decoded={} avg_encode={}us",
        snapshot.frames_encoded,
        snapshot.frames_decoded,
        snapshot.avg_encode_time_us().unwrap_or(0)
    );

    println!("\n✅ Node codec working correctly!");

    Ok(())
}
