//! Query-log sink writing structured records through `tracing`.
//!
//! The chain stage hands records to an unbounded channel; a background
//! consumer emits them on the `warden_dns::query_log` target, so the
//! request path never blocks on log output.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use warden_dns_application::ports::{QueryLogRecord, QueryLogSink};

pub const QUERY_LOG_TARGET: &str = "warden_dns::query_log";

pub struct TracingQueryLog {
    tx: mpsc::UnboundedSender<QueryLogRecord>,
}

impl TracingQueryLog {
    /// Creates the sink and spawns its consumer task.
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueryLogRecord>();

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                info!(
                    target: QUERY_LOG_TARGET,
                    client = %record.client_ip,
                    protocol = record.protocol,
                    client_names = %record.client_names.join(","),
                    question = %record.question,
                    record_type = %record.record_type,
                    response_kind = record.response_kind,
                    response_code = record.response_code,
                    answers = record.answer_count,
                    duration_ms = record.duration_ms,
                    "query"
                );
            }
        });

        (Self { tx }, handle)
    }
}

impl QueryLogSink for TracingQueryLog {
    fn log(&self, record: QueryLogRecord) {
        // A closed channel only happens during shutdown; drop the record.
        let _ = self.tx.send(record);
    }
}
