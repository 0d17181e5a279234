//! Metric export (fire-and-forget).
//!
//! Each line is one HTTP push. A failed push is logged and forgotten: no
//! retry, no backoff, no carry-over into the next flush. `send` never returns
//! an error, only a summary for the flush log.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use pizzapulse_core::error::{PulseError, Result};
use pizzapulse_core::protocol::line::MetricLine;

use crate::config::MetricsSection;

/// Destination for encoded metric lines.
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn push(&self, line: &MetricLine) -> Result<()>;
}

/// Pushes each line as a `text/plain` POST body with a bearer credential.
pub struct HttpSink {
    client: Client,
    url: String,
    authorization: String,
}

impl HttpSink {
    pub fn new(cfg: &MetricsSection) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.push_timeout())
            .build()
            .map_err(|e| PulseError::Internal(format!("metrics http client: {e}")))?;

        Ok(Self {
            client,
            url: cfg.url.clone(),
            authorization: format!("Bearer {}:{}", cfg.user_id, cfg.api_key),
        })
    }
}

#[async_trait]
impl MetricSink for HttpSink {
    async fn push(&self, line: &MetricLine) -> Result<()> {
        let res = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "text/plain")
            .body(line.encode())
            .send()
            .await
            .map_err(|e| PulseError::Export(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(PulseError::ExportStatus(status.as_u16()));
        }
        Ok(())
    }
}

/// Result of one `send`, for logging only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct Exporter {
    sink: Arc<dyn MetricSink>,
    max_concurrent: usize,
}

impl Exporter {
    pub fn new(sink: Arc<dyn MetricSink>, max_concurrent: usize) -> Self {
        Self {
            sink,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Push every line, at most `max_concurrent` at a time. One failure never
    /// stops the others.
    pub async fn send(&self, lines: Vec<MetricLine>) -> ExportSummary {
        let attempted = lines.len();
        let delivered = stream::iter(lines)
            .map(|line| push_logged(self.sink.as_ref(), line))
            .buffer_unordered(self.max_concurrent)
            .filter(|ok| std::future::ready(*ok))
            .count()
            .await;

        ExportSummary {
            attempted,
            delivered,
            failed: attempted - delivered,
        }
    }
}

async fn push_logged(sink: &dyn MetricSink, line: MetricLine) -> bool {
    match sink.push(&line).await {
        Ok(()) => {
            tracing::debug!(line = %line, "metric pushed");
            true
        }
        Err(e) => {
            tracing::warn!(
                line = %line,
                code = e.code().as_str(),
                error = %e,
                "metric push failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;

    /// Records every attempted line, failing those whose `method` tag matches.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl MetricSink for Recording {
        async fn push(&self, line: &MetricLine) -> Result<()> {
            self.seen.lock().unwrap().push(line.encode());
            if self.fail_on.is_some() && line.tag("method") == self.fail_on {
                return Err(PulseError::Export("connection refused".into()));
            }
            Ok(())
        }
    }

    fn five_lines() -> Vec<MetricLine> {
        ["all", "get", "post", "put", "delete"]
            .into_iter()
            .map(|m| MetricLine::new("request", "s", ("method", m), "total", 1u64))
            .collect()
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let sink = Arc::new(Recording {
            fail_on: Some("post"),
            ..Default::default()
        });
        let exporter = Exporter::new(sink.clone(), 1);

        let summary = exporter.send(five_lines()).await;

        assert_eq!(
            summary,
            ExportSummary {
                attempted: 5,
                delivered: 4,
                failed: 1
            }
        );
        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[2], "request,source=s,method=post total=1");
        assert_eq!(seen[4], "request,source=s,method=delete total=1");
    }

    #[tokio::test]
    async fn concurrent_pushes_attempt_everything() {
        let sink = Arc::new(Recording::default());
        let exporter = Exporter::new(sink.clone(), 8);

        let summary = exporter.send(five_lines()).await;

        assert_eq!(summary.delivered, 5);
        let mut seen = sink.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn empty_send() {
        let exporter = Exporter::new(Arc::new(Recording::default()), 0);
        assert_eq!(exporter.send(Vec::new()).await, ExportSummary::default());
    }

    /// Formatted log output, shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn failed_push_is_reported_in_the_log() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        // current-thread runtime: every push is polled on this thread
        let _guard = tracing::subscriber::set_default(subscriber);

        let sink = Arc::new(Recording {
            fail_on: Some("post"),
            ..Default::default()
        });
        let summary = Exporter::new(sink, 2).send(five_lines()).await;
        assert_eq!(summary.failed, 1);

        let lines = logs.lines();
        let failures: Vec<&String> = lines
            .iter()
            .filter(|l| l.contains("metric push failed"))
            .collect();
        assert_eq!(failures.len(), 1, "logs: {lines:#?}");
        assert!(failures[0].contains("WARN"));
        assert!(failures[0].contains("request,source=s,method=post total=1"));
        assert!(failures[0].contains("EXPORT_FAILED"));

        let pushed = lines.iter().filter(|l| l.contains("metric pushed")).count();
        assert_eq!(pushed, 4);
    }
}
