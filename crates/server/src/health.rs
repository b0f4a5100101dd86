use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::error;

use prosperity_db::{ping, DbPool};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness route. Not behind the signature gate.
pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    match ping(&state.db_pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(failure) => {
            error!(
                event_name = "system.health.database_unavailable",
                correlation_id = "health",
                error = %failure,
                "database probe failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Json(HealthResponse { status: "unavailable" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use prosperity_db::connect_with_settings;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_is_ok_when_database_answers() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool.clone() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ok");
        pool.close().await;
    }

    #[tokio::test]
    async fn health_fails_when_database_is_closed() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload.status, "unavailable");
    }
}
