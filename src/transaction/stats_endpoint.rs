use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    transaction::{StatsSnapshot, TransactionState, get_stats_for_user},
};

/// A route handler that returns the statistics for the caller's transactions.
pub async fn get_stats_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<StatsSnapshot>, Error> {
    let connection = state.db_connection.lock()?;

    get_stats_for_user(user_id, &connection).map(Json)
}
