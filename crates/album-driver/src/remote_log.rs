//! Fire-and-forget logging to the oracle's log endpoints.
//!
//! Every message is mirrored to the local `tracing` subscriber and queued
//! for a single writer task, which posts them one by one so the sink sees
//! them in order.  Nothing here can fail from the caller's point of view: a
//! full queue drops the message and an unreachable sink is only noted
//! locally.

use album_proto::protocol::{Severity, LOG_ACK};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const QUEUE_DEPTH: usize = 256;

pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, message: String);

    fn debug(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Severity::Debug, message.into());
    }

    fn info(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Severity::Info, message.into());
    }

    fn warning(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Severity::Warning, message.into());
    }

    fn error(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.log(Severity::Error, message.into());
    }
}

/// Sends log lines to `<base_url>/<severity>`.
#[derive(Clone)]
pub struct RemoteLog {
    tx: mpsc::Sender<(Severity, String)>,
}

impl RemoteLog {
    /// Spawns the writer task; must be called inside a tokio runtime.
    pub fn spawn(base_url: &str, client: reqwest::Client) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(writer_task(
            base_url.trim_end_matches('/').to_string(),
            client,
            rx,
        ));
        Self { tx }
    }
}

impl LogSink for RemoteLog {
    fn log(&self, severity: Severity, message: String) {
        match severity {
            Severity::Debug => debug!(target: "album", "{}", message),
            Severity::Info => info!(target: "album", "{}", message),
            Severity::Warning => warn!(target: "album", "{}", message),
            Severity::Error => error!(target: "album", "{}", message),
        }
        if self.tx.try_send((severity, message)).is_err() {
            debug!("log queue full or closed, dropping message");
        }
    }
}

async fn writer_task(
    base_url: String,
    client: reqwest::Client,
    mut rx: mpsc::Receiver<(Severity, String)>,
) {
    while let Some((severity, message)) = rx.recv().await {
        let url = format!("{}{}", base_url, severity.path());
        match client.post(&url).body(message).send().await {
            Ok(response) => {
                if let Ok(text) = response.text().await {
                    report_echo(&text);
                }
            }
            Err(e) => debug!("log sink unreachable: {}", e),
        }
    }
}

/// The message itself was already mirrored locally, so an echo is only
/// worth a debug line.
fn report_echo(reply: &str) {
    if let Some(echo) = echo_of(reply) {
        debug!(target: "album::echo", "{}", echo);
    }
}

/// The sink's reply, unless it is only an acknowledgement.
fn echo_of(reply: &str) -> Option<&str> {
    if reply.contains(LOG_ACK) {
        None
    } else {
        Some(reply.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tracing::Level;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[test]
    fn test_echo_of() {
        assert_eq!(echo_of("X"), None);
        assert_eq!(echo_of("INFO:    hello\n"), Some("INFO:    hello"));
    }

    #[tokio::test]
    async fn test_unreachable_sink_never_blocks() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let log = RemoteLog::spawn("http://127.0.0.1:9", client);

        let started = Instant::now();
        let burst = tokio::time::timeout(Duration::from_secs(1), async {
            for i in 0..(QUEUE_DEPTH * 2) {
                log.info(format!("line {}", i));
            }
            log.error("still fine");
        })
        .await;

        assert!(burst.is_ok(), "logging blocked the caller");
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /// Records the level of every event it sees.
    struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

    impl<S: tracing::Subscriber> Layer<S> for LevelRecorder {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn test_echo_is_logged_at_debug_only() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LevelRecorder(levels.clone()));

        tracing::subscriber::with_default(subscriber, || {
            report_echo("INFO:    Download succeeded. Going to next image.");
            report_echo("X");
        });

        assert_eq!(*levels.lock().unwrap(), vec![Level::DEBUG]);
    }
}
