//! Request tracing.

use std::future::Future;
use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::response::Response;

/// Runs `fut` inside a `request` span and logs one event with the outcome.
pub async fn traced<F>(method: &str, target: &str, fut: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = info_span!("request", method, path = target);
    async move {
        let started = Instant::now();
        let resp = fut.await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(status = resp.status_code().code(), latency_ms, "handled");
        resp
    }
    .instrument(span)
    .await
}
