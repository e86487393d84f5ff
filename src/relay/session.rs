//! A single relay session: backend body in, client frames out.
//!
//! # State Machine
//! ```text
//! Streaming ──EOF──────────────▶ Closed(Clean)
//!     │ ────read error─────────▶ Closed(ReadError)
//!     │ ────client gone────────▶ Closed(WriteError)
//!     └ ────cancellation───────▶ Closed(Cancelled)
//! ```
//! `Closed(ConnectError)` is reached by the handler before a session exists.
//!
//! # Design Decisions
//! - One line per read, split on `\n`, terminator kept, bytes forwarded verbatim
//! - One body frame per line. The next backend read only happens when the
//!   HTTP layer polls for the next frame, so a slow client stalls the backend
//!   instead of growing a buffer
//! - Lines that arrived from the backend together may leave in one socket
//!   write; a line is never held back while the session waits on the backend
//! - A line longer than the session's limit ends the stream as a read error,
//!   so a backend that never sends `\n` cannot grow the buffer without bound
//! - The backend body is owned by the session and released when it drops

use std::fmt;
use std::io;
use std::time::Instant;

use axum::body::Bytes;
use futures_util::stream::{self, Stream};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::observability::{metrics, SharedLogger};
use crate::relay::error::RelayError;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Backend body reached end-of-stream.
    Clean,
    /// Reading the backend body failed.
    ReadError,
    /// The client could not be written to (usually: it disconnected).
    WriteError,
    /// The backend connection could not be established.
    ConnectError,
    /// The session was cancelled from outside (e.g. server shutdown).
    Cancelled,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Clean => "clean",
            CloseReason::ReadError => "read_error",
            CloseReason::WriteError => "write_error",
            CloseReason::ConnectError => "connect_error",
            CloseReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Streaming,
    Closed(CloseReason),
}

/// Longest line a session accepts, terminator included.
pub const MAX_LINE_BYTES: u64 = 1024 * 1024;

/// One relayed stream. Owned by the task serving the response body.
pub struct RelaySession<R> {
    backend_url: String,
    reader: R,
    max_line: u64,
    cancel: CancellationToken,
    logger: SharedLogger,
    state: SessionState,
    lines: u64,
    started: Instant,
}

impl<R> RelaySession<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Start streaming from an already connected backend body.
    pub fn new(
        backend_url: impl Into<String>,
        reader: R,
        cancel: CancellationToken,
        logger: SharedLogger,
    ) -> Self {
        metrics::session_opened();
        Self {
            backend_url: backend_url.into(),
            reader,
            max_line: MAX_LINE_BYTES,
            cancel,
            logger,
            state: SessionState::Streaming,
            lines: 0,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Override the line length limit.
    pub fn with_max_line(mut self, max_line: u64) -> Self {
        self.max_line = max_line;
        self
    }

    /// Number of lines handed out so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Read the next line from the backend, terminator included.
    ///
    /// Returns `None` once the session is closed; the close reason is then
    /// available through [`RelaySession::state`].
    pub async fn next_line(&mut self) -> Option<Bytes> {
        if self.state != SessionState::Streaming {
            return None;
        }

        let mut line = Vec::new();
        let mut limited = (&mut self.reader).take(self.max_line);
        let read = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            read = limited.read_until(b'\n', &mut line) => Some(read),
        };

        match read {
            None => {
                self.close(CloseReason::Cancelled);
                None
            }
            Some(Ok(0)) => {
                self.close(CloseReason::Clean);
                None
            }
            Some(Ok(n)) if n as u64 >= self.max_line && line.last() != Some(&b'\n') => {
                let err = RelayError::LineTooLong {
                    limit: self.max_line,
                };
                self.logger.error(format_args!("{}", err));
                self.close(CloseReason::ReadError);
                None
            }
            Some(Ok(_)) if line.last() != Some(&b'\n') => {
                // EOF in the middle of a line; an unterminated event is never forwarded.
                self.logger.debug(format_args!(
                    "reader EOF with {} unterminated bytes discarded",
                    line.len()
                ));
                self.close(CloseReason::Clean);
                None
            }
            Some(Ok(n)) => {
                self.lines += 1;
                metrics::line_relayed(n);
                self.logger
                    .debug(format_args!("Event: {}", line.escape_ascii()));
                Some(Bytes::from(line))
            }
            Some(Err(e)) => {
                self.logger
                    .debug(format_args!("{}", RelayError::BackendRead(e)));
                self.close(CloseReason::ReadError);
                None
            }
        }
    }

    /// Turn the session into a body stream yielding one frame per line.
    ///
    /// Dropping the stream before it ends (the HTTP layer does this when the
    /// client is gone) closes the session with [`CloseReason::WriteError`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
    where
        R: Send + 'static,
    {
        stream::unfold(self, |mut session| async move {
            let line = session.next_line().await?;
            Some((Ok::<_, io::Error>(line), session))
        })
    }
}

impl<R> RelaySession<R> {
    fn close(&mut self, reason: CloseReason) {
        if self.state != SessionState::Streaming {
            return;
        }
        self.state = SessionState::Closed(reason);
        metrics::session_closed(reason.as_str(), self.started);

        match reason {
            CloseReason::Clean => self.logger.debug(format_args!(
                "reader EOF from {} after {} lines",
                self.backend_url, self.lines
            )),
            CloseReason::Cancelled => self.logger.info(format_args!(
                "relay from {} cancelled after {} lines",
                self.backend_url, self.lines
            )),
            CloseReason::ReadError | CloseReason::WriteError | CloseReason::ConnectError => {
                self.logger.debug(format_args!(
                    "relay from {} closed ({}) after {} lines",
                    self.backend_url, reason, self.lines
                ))
            }
        }
    }
}

impl<R> Drop for RelaySession<R> {
    fn drop(&mut self) {
        if self.state == SessionState::Streaming {
            self.close(CloseReason::WriteError);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::observability::Logger;
    use futures_util::{FutureExt, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    /// Logger that keeps every message, for assertions.
    #[derive(Default)]
    pub(crate) struct MemoryLogger {
        pub(crate) lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl MemoryLogger {
        fn push(&self, level: &'static str, args: fmt::Arguments<'_>) {
            self.lines.lock().unwrap().push((level, args.to_string()));
        }

        pub(crate) fn contains(&self, needle: &str) -> bool {
            self.lines
                .lock()
                .unwrap()
                .iter()
                .any(|(_, line)| line.contains(needle))
        }
    }

    impl Logger for MemoryLogger {
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.push("debug", args)
        }
        fn info(&self, args: fmt::Arguments<'_>) {
            self.push("info", args)
        }
        fn warning(&self, args: fmt::Arguments<'_>) {
            self.push("warning", args)
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.push("error", args)
        }
        fn critical(&self, args: fmt::Arguments<'_>) {
            self.push("critical", args)
        }
        fn fatal(&self, args: fmt::Arguments<'_>) {
            self.push("fatal", args)
        }
    }

    fn session<R: AsyncBufRead + Unpin>(
        reader: R,
    ) -> (RelaySession<R>, Arc<MemoryLogger>, CancellationToken) {
        let logger = Arc::new(MemoryLogger::default());
        let cancel = CancellationToken::new();
        let session = RelaySession::new(
            "http://backend/events-stream/testid",
            reader,
            cancel.clone(),
            logger.clone(),
        );
        (session, logger, cancel)
    }

    #[tokio::test]
    async fn test_lines_are_forwarded_verbatim() {
        let body: &[u8] = b"event: message\ndata: one\n\nevent: message\r\ndata: two\n\n";
        let (mut session, _, _) = session(body);

        let mut lines = Vec::new();
        while let Some(line) = session.next_line().await {
            lines.push(line);
        }

        assert_eq!(
            lines,
            vec![
                Bytes::from_static(b"event: message\n"),
                Bytes::from_static(b"data: one\n"),
                Bytes::from_static(b"\n"),
                Bytes::from_static(b"event: message\r\n"),
                Bytes::from_static(b"data: two\n"),
                Bytes::from_static(b"\n"),
            ]
        );
        assert_eq!(session.state(), SessionState::Closed(CloseReason::Clean));
        assert_eq!(session.lines(), 6);
    }

    #[tokio::test]
    async fn test_unterminated_tail_is_discarded() {
        let body: &[u8] = b"data: one\n\ndata: partial";
        let (mut session, logger, _) = session(body);

        assert_eq!(session.next_line().await.unwrap(), "data: one\n");
        assert_eq!(session.next_line().await.unwrap(), "\n");
        assert!(session.next_line().await.is_none());
        assert_eq!(session.state(), SessionState::Closed(CloseReason::Clean));
        assert!(logger.contains("unterminated"));
    }

    #[tokio::test]
    async fn test_hundred_events_become_one_frame_per_line() {
        let mut body = Vec::new();
        for i in 1..=100 {
            body.extend_from_slice(format!("data: message {i}\n\n").as_bytes());
        }
        let (session, logger, _) = session(std::io::Cursor::new(body));

        let frames: Vec<Bytes> = session
            .into_stream()
            .map(|frame| frame.unwrap())
            .collect()
            .await;

        // 100 events, each a data line plus the blank separator line.
        assert_eq!(frames.len(), 200);
        for (i, pair) in frames.chunks(2).enumerate() {
            assert_eq!(pair[0], format!("data: message {}\n", i + 1));
            assert_eq!(pair[1], "\n");
        }
        assert!(logger.contains("after 200 lines"));
    }

    #[tokio::test]
    async fn test_backend_is_read_only_when_the_consumer_polls() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let chunks: Vec<io::Result<Bytes>> = (1..=5)
            .map(|i| Ok(Bytes::from(format!("data: {i}\n"))))
            .collect();
        let backend = stream::iter(chunks).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (session, _, _) = session(tokio_util::io::StreamReader::new(backend));
        let mut frames = Box::pin(session.into_stream());

        assert_eq!(pulled.load(Ordering::SeqCst), 0);
        assert_eq!(frames.next().await.unwrap().unwrap(), "data: 1\n");
        assert_eq!(pulled.load(Ordering::SeqCst), 1);

        tokio::task::yield_now().await;
        assert_eq!(pulled.load(Ordering::SeqCst), 1);

        assert_eq!(frames.next().await.unwrap().unwrap(), "data: 2\n");
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_line_is_yielded_before_the_backend_sends_more() {
        let (client, mut backend) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(client);
        let (session, _, _) = session(reader);
        let mut frames = Box::pin(session.into_stream());

        backend.write_all(b"data: one\n").await.unwrap();
        assert_eq!(frames.next().await.unwrap().unwrap(), "data: one\n");

        // Nothing more from the backend: the next frame is pending, not buffered.
        assert!(frames.next().now_or_never().is_none());

        backend.write_all(b"\n").await.unwrap();
        assert_eq!(frames.next().await.unwrap().unwrap(), "\n");
    }

    #[tokio::test]
    async fn test_overlong_line_ends_the_session() {
        let body: &[u8] = b"data: ok\ndata: this line is far too long\ndata: never\n";
        let (session, logger, _) = session(body);
        let mut session = session.with_max_line(16);

        assert_eq!(session.next_line().await.unwrap(), "data: ok\n");
        assert!(session.next_line().await.is_none());
        assert_eq!(session.state(), SessionState::Closed(CloseReason::ReadError));
        assert!(logger.contains("exceeds 16 bytes"));
    }

    #[tokio::test]
    async fn test_line_exactly_at_the_limit_is_relayed() {
        let body: &[u8] = b"0123456789abcde\n";
        let (session, _, _) = session(body);
        let mut session = session.with_max_line(16);

        assert_eq!(session.next_line().await.unwrap(), "0123456789abcde\n");
        assert!(session.next_line().await.is_none());
        assert_eq!(session.state(), SessionState::Closed(CloseReason::Clean));
    }

    #[tokio::test]
    async fn test_read_error_closes_session() {
        let reader = chunked_reader(vec![
            Ok(Bytes::from_static(b"data: one\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let (mut session, logger, _) = session(reader);

        assert_eq!(session.next_line().await.unwrap(), "data: one\n");
        assert!(session.next_line().await.is_none());
        assert_eq!(session.state(), SessionState::Closed(CloseReason::ReadError));
        assert!(logger.contains("error reading from SSE server: reset"));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_a_pending_read() {
        let (client, _backend) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(client);
        let (mut session, _, cancel) = session(reader);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let line = tokio::time::timeout(Duration::from_secs(2), session.next_line())
            .await
            .expect("cancellation must wake the read");
        assert!(line.is_none());
        assert_eq!(session.state(), SessionState::Closed(CloseReason::Cancelled));
    }

    #[tokio::test]
    async fn test_dropping_the_stream_counts_as_client_gone() {
        let (client, mut backend) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(client);
        let (session, logger, _) = session(reader);

        backend.write_all(b"data: one\n").await.unwrap();
        let mut stream = Box::pin(session.into_stream());
        assert_eq!(stream.next().await.unwrap().unwrap(), "data: one\n");
        drop(stream);

        assert!(logger.contains("closed (write_error) after 1 lines"));
        // The backend side observes the reader going away.
        assert!(backend.write_all(b"data: two\n").await.is_err());
    }

    #[tokio::test]
    async fn test_stream_ends_after_backend_eof() {
        let body: &[u8] = b"data: one\n\n";
        let (session, logger, _) = session(body);

        let frames: Vec<_> = session.into_stream().collect().await;
        assert_eq!(frames.len(), 2);
        assert!(logger.contains("reader EOF"));
        assert!(!logger.contains("write_error"));
    }

    fn chunked_reader(
        chunks: Vec<io::Result<Bytes>>,
    ) -> tokio_util::io::StreamReader<stream::Iter<std::vec::IntoIter<io::Result<Bytes>>>, Bytes>
    {
        tokio_util::io::StreamReader::new(stream::iter(chunks))
    }
}
