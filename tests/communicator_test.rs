//! End-to-end tests against a real loopback listener
//!
//! A plain `TcpListener` plays the control processor. Timeouts bound every
//! wait so a regression fails instead of hanging.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use xsig_link::io::{
    CommEvent, CommunicatorBuilder, ConnectionState, EventReceiver, SocketCommunicator,
};
use xsig_link::protocol::xsig::{self, Signal};
use xsig_link::protocol::SocketStatus;

const WAIT: Duration = Duration::from_secs(5);

async fn next(events: &mut EventReceiver) -> CommEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

async fn accept(listener: &TcpListener) -> TcpStream {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("timed out waiting for connection")
        .unwrap();
    stream
}

fn status(status: SocketStatus) -> CommEvent {
    CommEvent::StatusChanged(status.into())
}

#[tokio::test]
async fn test_full_session_with_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let comm = CommunicatorBuilder::new()
        .id("loopback")
        .retry_delay(Duration::from_millis(100))
        .build()
        .unwrap();
    let mut events = comm.subscribe().unwrap();
    comm.connect_to("127.0.0.1", port).unwrap();

    let mut server = accept(&listener).await;
    assert_eq!(next(&mut events).await, CommEvent::ConnectedChanged(true));
    assert_eq!(next(&mut events).await, status(SocketStatus::Connected));

    // Responses arrive undecoded beyond the byte-to-char mapping
    server.write_all(b"OK\r\n").await.unwrap();
    let mut received = String::new();
    while received.len() < 4 {
        match next(&mut events).await {
            CommEvent::Response(chunk) => received.push_str(&chunk),
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert_eq!(received, "OK\r\n");

    // Commands and frames are written byte-for-byte
    comm.send_str("ping\r").unwrap();
    comm.send_bytes(&xsig::clear_outputs()).unwrap();
    comm.send_signal(200, &Signal::Analog(1000)).unwrap();
    let mut buf = [0u8; 10];
    timeout(WAIT, server.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"ping\r\xFC\xC1\x47\x07\x68");

    // Remote close triggers a retry that finds the listener again
    drop(server);
    assert_eq!(next(&mut events).await, CommEvent::ConnectedChanged(false));
    assert_eq!(next(&mut events).await, status(SocketStatus::BrokenRemotely));

    let _server = accept(&listener).await;
    assert_eq!(next(&mut events).await, CommEvent::ConnectedChanged(true));
    assert_eq!(next(&mut events).await, status(SocketStatus::Connected));
    assert_eq!(comm.state(), ConnectionState::Connected);

    comm.disconnect().unwrap();
    assert_eq!(next(&mut events).await, CommEvent::ConnectedChanged(false));
    assert_eq!(next(&mut events).await, status(SocketStatus::BrokenLocally));
    assert_eq!(comm.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_refused_connection_keeps_retrying() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let comm = CommunicatorBuilder::new()
        .retry_delay(Duration::from_millis(50))
        .build()
        .unwrap();
    let mut events = comm.subscribe().unwrap();
    comm.connect_to("127.0.0.1", port).unwrap();

    for _ in 0..3 {
        assert_eq!(next(&mut events).await, status(SocketStatus::ConnectFailed));
    }
    assert!(!comm.is_connected());

    comm.disconnect().unwrap();
    assert_eq!(comm.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_drop_ends_event_stream() {
    let comm = CommunicatorBuilder::new().build().unwrap();
    let mut events = comm.subscribe().unwrap();
    drop(comm);

    let end = timeout(WAIT, events.recv()).await.unwrap();
    assert_eq!(end, None);
}
