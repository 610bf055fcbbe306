//! Random batch statistics endpoint
//!
//! `GET /random/mean?length=<int>&requests=<int>` fetches `requests` batches of
//! `length` integers concurrently and returns their standard deviations.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
    routing::get,
    Router,
};
use randstat_core::aggregate::AggregateResult;

use super::AppState;
use crate::error::{ApiError, ValidationError};
use crate::orchestrator::MeanQuery;

/// Build the random statistics routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/random/mean", get(mean_handler))
}

/// GET /random/mean - Per-batch and combined standard deviation
///
/// The response is written once, after every batch has settled or the first
/// one has failed. A query string that does not deserialize at all is
/// reported with the same envelope as an unparsable value.
async fn mean_handler(
    State(state): State<AppState>,
    query: Result<Query<MeanQuery>, QueryRejection>,
) -> Result<Json<AggregateResult>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Query string rejected");
        ValidationError::Parse
    })?;

    state.orchestrator.handle(&query).await.map(Json)
}
