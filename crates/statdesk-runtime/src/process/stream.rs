//! Async stream log readers (non-UTF8-safe).
//!
//! Backends can emit non-UTF8 bytes (localized paths, native extensions).
//! `BufReader::lines()` would end the reader task on the first invalid byte,
//! so lines are read as bytes and decoded lossily.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use statdesk_core::{BackendLogSinkPort, OutputStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::events::BackendEvent;

/// Watches output for the startup banner and reports it once.
#[derive(Clone)]
pub struct BannerSignal {
    needle: Arc<str>,
    seen: Arc<AtomicBool>,
    events: broadcast::Sender<BackendEvent>,
}

impl BannerSignal {
    pub fn new(
        needle: &str,
        seen: Arc<AtomicBool>,
        events: broadcast::Sender<BackendEvent>,
    ) -> Self {
        Self {
            needle: Arc::from(needle),
            seen,
            events,
        }
    }

    fn observe(&self, line: &str) {
        if self.needle.is_empty() || !line.contains(&*self.needle) {
            return;
        }
        if !self.seen.swap(true, Ordering::SeqCst) {
            info!(line = %line, "Backend startup banner seen");
            let _ = self.events.send(BackendEvent::BannerSeen);
        }
    }
}

/// Read `stream` line by line until EOF, forwarding every line to `sinks`.
///
/// Both streams are checked for the banner since uvicorn logs to stderr.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: OutputStream,
    sinks: Vec<Arc<dyn BackendLogSinkPort>>,
    banner: Option<BannerSignal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    debug!(target: "statdesk::backend", stream = %kind, "{line}");
                    if let Some(signal) = &banner {
                        signal.observe(&line);
                    }
                    for sink in &sinks {
                        sink.append(kind, line.clone());
                    }
                }
                Err(e) => {
                    debug!(stream = %kind, error = %e, "Backend stream reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(stream = %kind, "Backend stream reader task exiting");
    })
}
