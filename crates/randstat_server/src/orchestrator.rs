//! Request orchestration: validation, fan-out and fan-in
//!
//! [`Orchestrator::handle`] validates the query, dispatches one task per batch
//! and merges their outcomes. Workers never touch shared state: each sends
//! exactly one [`BatchOutcome`] over an mpsc channel, and only the receive
//! loop in [`Orchestrator::collect`] writes the result slots. The first
//! failure cancels every outstanding batch and becomes the sole result.

use std::sync::Arc;

use randstat_core::aggregate::{assemble, AggregateResult};
use randstat_core::types::{BatchRequest, BatchSuccess};
use serde::Deserialize;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::client::RandomSource;
use crate::config::{Credential, DEFAULT_MAX_REQUESTS};
use crate::error::{ApiError, AuthError, ExternalApiError, ValidationError};

/// Smallest accepted batch length
pub const MIN_LENGTH: i64 = 3;

/// Smallest accepted batch count
pub const MIN_REQUESTS: i64 = 1;

/// Raw `/random/mean` query parameters, parsed by [`Orchestrator::validate`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeanQuery {
    /// Integers per batch, as sent by the caller
    pub length: Option<String>,
    /// Number of batches, as sent by the caller
    pub requests: Option<String>,
}

impl MeanQuery {
    /// Query with both parameters set
    pub fn new(length: impl ToString, requests: impl ToString) -> Self {
        Self {
            length: Some(length.to_string()),
            requests: Some(requests.to_string()),
        }
    }
}

/// Validated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanParams {
    /// Integers per batch, at least [`MIN_LENGTH`]
    pub length: usize,
    /// Number of batches, between [`MIN_REQUESTS`] and the configured maximum
    pub requests: usize,
}

/// Result of one dispatched batch
#[derive(Debug)]
pub enum BatchOutcome {
    /// The provider returned a usable batch
    Success(BatchSuccess),
    /// The upstream call for batch `index` failed
    Failure {
        index: usize,
        error: ExternalApiError,
    },
}

/// Drives one aggregation request against a [`RandomSource`]
pub struct Orchestrator {
    source: Arc<dyn RandomSource>,
    credential: Option<Credential>,
    in_flight_limit: Option<usize>,
    max_requests: usize,
}

impl Orchestrator {
    /// Create an orchestrator; `credential` is `None` when no key was loaded
    pub fn new(source: Arc<dyn RandomSource>, credential: Option<Credential>) -> Self {
        Self {
            source,
            credential,
            in_flight_limit: None,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }

    /// Cap concurrent upstream calls per request
    pub fn with_in_flight_limit(mut self, limit: Option<usize>) -> Self {
        self.in_flight_limit = limit.filter(|&n| n > 0);
        self
    }

    /// Largest batch count a single request may ask for
    pub fn with_max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Whether a provider credential is configured
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Check the query, reporting the first violation in this order:
    /// length, requests, credential, then unparsable parameters.
    pub fn validate(&self, query: &MeanQuery) -> Result<(MeanParams, &Credential), ApiError> {
        let length = parse_param(query.length.as_deref());
        let requests = parse_param(query.requests.as_deref());

        if matches!(length, Some(n) if n < MIN_LENGTH) {
            return Err(ValidationError::Length.into());
        }
        if let Some(n) = requests {
            if n < MIN_REQUESTS {
                return Err(ValidationError::Requests.into());
            }
            if usize::try_from(n).map_or(true, |n| n > self.max_requests) {
                return Err(ValidationError::TooManyRequests {
                    max: self.max_requests,
                }
                .into());
            }
        }
        let credential = self
            .credential
            .as_ref()
            .ok_or(AuthError::MissingCredential)?;

        let (Some(length), Some(requests)) = (length, requests) else {
            return Err(ValidationError::Parse.into());
        };
        let (Ok(length), Ok(requests)) = (usize::try_from(length), usize::try_from(requests))
        else {
            return Err(ValidationError::Parse.into());
        };

        Ok((MeanParams { length, requests }, credential))
    }

    /// Validate, fan out, fan in and assemble one request
    pub async fn handle(&self, query: &MeanQuery) -> Result<AggregateResult, ApiError> {
        let (params, credential) = self.validate(query)?;
        // 32 bits keeps the id exact in any JSON parser
        let correlation_id = u64::from(rand::random::<u32>());

        let span = tracing::info_span!(
            "mean",
            correlation_id,
            length = params.length,
            requests = params.requests
        );

        async move {
            let batches = BatchRequest::plan(params.requests, params.length, correlation_id);
            let successes = self.collect(credential, batches).await?;
            let result = assemble(successes)?;
            tracing::info!(entries = result.len(), "Aggregate assembled");
            Ok::<_, ApiError>(result)
        }
        .instrument(span)
        .await
    }

    /// Run every batch concurrently and gather the outcomes.
    ///
    /// Returns all successes, or the first failure observed. Outstanding
    /// batches are cancelled on failure and whenever this future is dropped.
    pub async fn collect(
        &self,
        credential: &Credential,
        batches: Vec<BatchRequest>,
    ) -> Result<Vec<BatchSuccess>, ApiError> {
        let total = batches.len();
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let limiter = self.in_flight_limit.map(|n| Arc::new(Semaphore::new(n)));
        let (tx, mut rx) = mpsc::channel(total.max(1));

        for batch in batches {
            let worker = BatchWorker {
                source: self.source.clone(),
                credential: credential.clone(),
                cancel: cancel.clone(),
                limiter: limiter.clone(),
                tx: tx.clone(),
            };
            let span = tracing::debug_span!("batch", index = batch.index);
            tokio::spawn(worker.run(batch).instrument(span));
        }
        // Only workers hold senders now; if they all vanish, recv returns None
        drop(tx);

        let mut slots: Vec<Option<Vec<i64>>> = vec![None; total];
        let mut received = 0;

        while received < total {
            match rx.recv().await {
                Some(BatchOutcome::Success(batch)) => {
                    tracing::debug!(index = batch.index, "Batch completed");
                    let Some(slot) = slots.get_mut(batch.index).filter(|s| s.is_none()) else {
                        cancel.cancel();
                        return Err(ApiError::Internal(format!(
                            "unexpected outcome for batch {}",
                            batch.index
                        )));
                    };
                    *slot = Some(batch.values);
                    received += 1;
                }
                Some(BatchOutcome::Failure { index, error }) => {
                    tracing::warn!(index, error = %error, detail = %error.detail(), "Batch failed, cancelling remaining batches");
                    cancel.cancel();
                    return Err(error.into());
                }
                None => {
                    return Err(ApiError::Internal(format!(
                        "workers exited after {} of {} batches",
                        received, total
                    )));
                }
            }
        }

        Ok(slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, values)| values.map(|v| BatchSuccess::new(index, v)))
            .collect())
    }
}

fn parse_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// One spawned batch
struct BatchWorker {
    source: Arc<dyn RandomSource>,
    credential: Credential,
    cancel: CancellationToken,
    limiter: Option<Arc<Semaphore>>,
    tx: mpsc::Sender<BatchOutcome>,
}

impl BatchWorker {
    async fn run(self, batch: BatchRequest) {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Batch cancelled");
                return;
            }
            outcome = self.fetch(&batch) => outcome,
        };

        // The receiver is gone once the request has settled
        let _ = self.tx.send(outcome).await;
    }

    async fn fetch(&self, batch: &BatchRequest) -> BatchOutcome {
        let _permit = match &self.limiter {
            Some(limiter) => match limiter.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    return BatchOutcome::Failure {
                        index: batch.index,
                        error: ExternalApiError::transport("concurrency limiter closed"),
                    }
                }
            },
            None => None,
        };

        match self.source.fetch(&self.credential, batch).await {
            Ok(values) => BatchOutcome::Success(BatchSuccess::new(batch.index, values)),
            Err(error) => BatchOutcome::Failure {
                index: batch.index,
                error,
            },
        }
    }
}
