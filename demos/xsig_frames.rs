//! Print the XSig frames for a handful of signal changes
//!
//! # Usage
//!
//! ```bash
//! cargo run --example xsig_frames
//! ```

use xsig_link::protocol::xsig::{self, Signal};

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> xsig_link::Result<()> {
    let changes = [
        (1, Signal::Digital(true)),
        (4095, Signal::Digital(false)),
        (200, Signal::Analog(1000)),
        (12, Signal::Analog(u16::MAX)),
        (5, Signal::from("Lobby\r")),
    ];

    for (index, signal) in &changes {
        let frame = xsig::encode(*index, signal)?;
        println!("{:>5} {:<24} {}", index, format!("{:?}", signal), hex(&frame));
    }

    println!("clear outputs        {}", hex(&xsig::clear_outputs()));
    println!("send status          {}", hex(&xsig::send_status()));

    let run = xsig::encode_digitals(1, &[true, false, true, true])?;
    println!("digital run 1..=4    {}", hex(&run));

    match xsig::encode_analog(1024, 0) {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("rejected: {}", e),
    }
    Ok(())
}
