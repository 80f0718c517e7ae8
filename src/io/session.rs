//! Per-connection session task
//!
//! One task owns the stream of an established connection. It re-arms a read
//! after every chunk and hands each chunk, decoded one character per byte, to
//! the owner as a single response; no framing is applied. Outbound commands
//! arrive over a channel and are written in order. Dropping the
//! [`SessionHandle`] closes the write side and ends the task.

use crate::error::{CommError, Result};
use crate::protocol::latin1;
use crate::protocol::status::SocketStatus;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Callbacks from a running session
///
/// `generation` identifies the connection attempt the session belongs to so
/// the owner can discard callbacks from a session it already abandoned.
pub(crate) trait SessionEvents: Send + Sync + 'static {
    /// A chunk arrived and was decoded
    fn on_response(&self, generation: u64, response: String);

    /// The session ended; `error` carries the I/O failure, if any
    fn on_closed(self: Arc<Self>, generation: u64, status: SocketStatus, error: Option<CommError>);
}

/// Owner's handle to a running session
#[derive(Debug)]
pub(crate) struct SessionHandle {
    generation: u64,
    tx: mpsc::UnboundedSender<Bytes>,
}

impl SessionHandle {
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue bytes for writing
    pub(crate) fn send(&self, data: Bytes) -> Result<()> {
        self.tx.send(data).map_err(|_| {
            CommError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "session task has ended",
            ))
        })
    }
}

/// Start the session task for `stream`
pub(crate) fn spawn<S>(
    runtime: &Handle,
    stream: S,
    generation: u64,
    buffer_size: usize,
    events: Arc<dyn SessionEvents>,
) -> SessionHandle
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    runtime.spawn(run(stream, rx, generation, buffer_size.max(1), events));
    SessionHandle { generation, tx }
}

async fn run<S>(
    stream: S,
    mut commands: mpsc::UnboundedReceiver<Bytes>,
    generation: u64,
    buffer_size: usize,
    events: Arc<dyn SessionEvents>,
) where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut buf = vec![0u8; buffer_size];

    let (status, error) = loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break (SocketStatus::BrokenRemotely, None),
                Ok(n) => {
                    trace!(generation = generation, bytes_read = n, "Response chunk received");
                    events.on_response(generation, latin1::decode(&buf[..n]));
                }
                Err(e) => break (SocketStatus::LinkLost, Some(CommError::Io(e))),
            },
            command = commands.recv() => match command {
                Some(data) => {
                    let written = async {
                        writer.write_all(&data).await?;
                        writer.flush().await
                    }
                    .await;
                    match written {
                        Ok(()) => trace!(generation = generation, bytes_sent = data.len(), "Command written"),
                        Err(e) => break (SocketStatus::LinkLost, Some(CommError::Io(e))),
                    }
                }
                None => {
                    let _ = writer.shutdown().await;
                    break (SocketStatus::BrokenLocally, None);
                }
            },
        }
    };

    debug!(generation = generation, status = %status, "Session ended");
    events.on_closed(generation, status, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        responses: Mutex<Vec<String>>,
        closed: Mutex<Option<(u64, SocketStatus, bool)>>,
        done: tokio::sync::Notify,
    }

    impl SessionEvents for Recorder {
        fn on_response(&self, _generation: u64, response: String) {
            self.responses.lock().push(response);
        }

        fn on_closed(self: Arc<Self>, generation: u64, status: SocketStatus, error: Option<CommError>) {
            *self.closed.lock() = Some((generation, status, error.is_some()));
            self.done.notify_one();
        }
    }

    #[tokio::test]
    async fn test_chunks_are_dispatched_without_framing() {
        let (client, mut server) = tokio::io::duplex(1024);
        let recorder = Arc::new(Recorder::default());
        let handle = spawn(&Handle::current(), client, 7, 4, recorder.clone());

        server.write_all(&[b'a', 0xE9, b'\r', b'z', b'q']).await.unwrap();
        drop(server);
        recorder.done.notified().await;

        let joined: String = recorder.responses.lock().concat();
        assert_eq!(joined, "a\u{e9}\rzq");
        assert!(recorder.responses.lock().iter().all(|r| r.chars().count() <= 4));
        assert_eq!(*recorder.closed.lock(), Some((7, SocketStatus::BrokenRemotely, false)));
        assert_eq!(handle.generation(), 7);
    }

    #[tokio::test]
    async fn test_commands_are_written_in_order() {
        let (client, mut server) = tokio::io::duplex(1024);
        let recorder = Arc::new(Recorder::default());
        let handle = spawn(&Handle::current(), client, 1, 64, recorder.clone());

        handle.send(Bytes::from_static(b"one ")).unwrap();
        handle.send(Bytes::from_static(&[0x80, 0x7F])).unwrap();

        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"one \x80\x7F");
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_locally() {
        let (client, mut server) = tokio::io::duplex(1024);
        let recorder = Arc::new(Recorder::default());
        let handle = spawn(&Handle::current(), client, 3, 64, recorder.clone());

        drop(handle);
        recorder.done.notified().await;

        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
        assert_eq!(*recorder.closed.lock(), Some((3, SocketStatus::BrokenLocally, false)));
    }
}
