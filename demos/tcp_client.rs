//! Connect to a control processor and echo everything it sends
//!
//! # Usage
//!
//! ```bash
//! # Defaults to 127.0.0.1:41794
//! cargo run --example tcp_client
//!
//! # Custom endpoint and verbose communicator logs
//! RUST_LOG=xsig_link=debug cargo run --example tcp_client -- 10.0.0.20:1702
//! ```
//!
//! Every line typed on stdin is sent as a command with a trailing `\r`.

use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use xsig_link::io::{CommEvent, Communicator, CommunicatorBuilder, SocketCommunicator};
use xsig_link::logging::DebugLevel;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xsig_link=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

async fn run() -> xsig_link::Result<()> {
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:41794".to_string());

    let comm = CommunicatorBuilder::new()
        .id("demo")
        .tcp(&addr)?
        .debug_level(DebugLevel::AllEnabled)
        .build()?;
    let mut events = comm.subscribe()?;
    comm.connect()?;
    println!("[INFO] Connecting to {} (Ctrl+C to quit)", addr);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(CommEvent::ConnectedChanged(up)) => {
                    println!("[INFO] {}", if up { "Connected" } else { "Disconnected" });
                }
                Some(CommEvent::StatusChanged(change)) => {
                    println!("[INFO] Status {} ({})", change.name, change.code);
                }
                Some(CommEvent::Response(text)) => println!("<- {:?}", text),
                None => break,
            },
            line = stdin.next_line() => match line {
                Ok(Some(line)) => comm.send_str(&format!("{}\r", line))?,
                Ok(None) | Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    comm.disconnect()?;
    comm.shutdown();
    println!("[INFO] Done");
    Ok(())
}
