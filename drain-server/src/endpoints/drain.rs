//! Receives batches of log lines from a platform log drain.

use std::time::Instant;

use axum::body::{Body, BodyDataStream};
use axum::extract::State;
use axum::http::StatusCode;
use bytes::Bytes;
use drain_metrics::{LineClass, MetricEmitter, logfmt};
use drain_quotas::Admission;
use drain_statsd::metric;
use futures::StreamExt;

use crate::constants;
use crate::extractors::TenantAuth;
use crate::service::ServiceState;
use crate::statsd::{ServerCounters, ServerTimers};
use crate::utils::LineSplitter;

/// Processes the lines of one request.
struct BatchProcessor<'a> {
    state: &'a ServiceState,
    emitter: MetricEmitter<'a>,
    tenant_id: &'a str,
}

impl BatchProcessor<'_> {
    async fn process(&self, raw: &[u8]) {
        if raw.is_empty() {
            return;
        }

        let raw = String::from_utf8_lossy(raw);
        let line = logfmt::parse(&raw);
        let class = LineClass::of(&line);

        if !self.admit_line(class).await {
            return;
        }

        self.emitter.emit(class, &line);
    }

    async fn admit_line(&self, class: LineClass) -> bool {
        let protector = self.state.protector();
        if protector.checks_requests() || !protector.is_active() || !class.is_flood_protected() {
            return true;
        }

        let key = protector.key(self.tenant_id, class.as_str());
        let admission = protector.check(&key).await;
        log_admission(self.tenant_id, admission);
        protector.config().policy.should_emit(admission)
    }
}

fn log_admission(tenant: &str, admission: Admission) {
    if let Admission::LimitReached { count } = admission {
        drain_log::debug!(tenant, count, "tenant reached the flood limit");
    }
}

/// Handles `POST /`.
///
/// The body is read as a stream and every line is processed as soon as it is complete. The
/// response is sent when the body ends, independent of what the lines contained.
pub async fn handle(
    State(state): State<ServiceState>,
    TenantAuth(tenant): TenantAuth,
    body: Body,
) -> Result<&'static str, StatusCode> {
    let start = Instant::now();
    metric!(counter(ServerCounters::RequestsReceived) += 1);

    let protector = state.protector();
    let emit_batch = match protector.checks_requests() {
        true => {
            let admission = protector.check(tenant.tenant_id()).await;
            log_admission(tenant.tenant_id(), admission);
            protector.config().policy.should_emit(admission)
        }
        false => true,
    };

    let mut stream = body.into_data_stream();

    if emit_batch {
        let processor = BatchProcessor {
            state: &state,
            emitter: MetricEmitter::new(&tenant, state.sink()),
            tenant_id: tenant.tenant_id(),
        };

        let mut splitter = LineSplitter::new(state.config().max_line_size());
        while let Some(chunk) = next_chunk(&mut stream).await? {
            splitter.push(&chunk);
            while let Some(line) = splitter.next_line() {
                processor.process(&line).await;
            }
        }

        if let Some(line) = splitter.finish() {
            processor.process(&line).await;
        }
    } else {
        metric!(counter(ServerCounters::FloodDropped) += 1);
        while next_chunk(&mut stream).await?.is_some() {}
    }

    metric!(timer(ServerTimers::RequestDuration) = start.elapsed());
    Ok(constants::OK)
}

async fn next_chunk(stream: &mut BodyDataStream) -> Result<Option<Bytes>, StatusCode> {
    match stream.next().await {
        Some(Ok(chunk)) => Ok(Some(chunk)),
        Some(Err(error)) => {
            drain_log::debug!(
                error = &error as &dyn std::error::Error,
                "failed to read log batch"
            );
            Err(StatusCode::BAD_REQUEST)
        }
        None => Ok(None),
    }
}
