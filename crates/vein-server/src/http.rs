//! HTTP API and dashboard surface.
//!
//! Serves the admin/user JSON API and, when configured, the static
//! dashboard files. Balances are strictly server-computed: there is no
//! endpoint that accepts a balance from a client, only session start/stop
//! and challenge-gated boosts.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use uuid::Uuid;

use vein_application::{BoostService, MiningService};
use vein_core::account::{AccountRepository, AccountStatus};
use vein_core::error::VeinError;
use vein_core::session::SubjectId;

use crate::challenge_store::ChallengeStore;

#[derive(Clone)]
pub struct ApiState {
    pub mining: Arc<MiningService>,
    pub boost: Arc<BoostService>,
    pub repository: Arc<dyn AccountRepository>,
    pub challenges: Arc<ChallengeStore>,
}

/// JSON error body, `{"error": "..."}` like the API has always returned.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError(VeinError);

impl From<VeinError> for ApiError {
    fn from(err: VeinError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            VeinError::NotFound { .. } => (StatusCode::NOT_FOUND, "User not found".to_string()),
            VeinError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
            VeinError::StoreUnavailable(_) | VeinError::Io { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily unavailable".to_string(),
            ),
            _ => {
                tracing::error!(err = %self.0, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(state: ApiState, static_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/:identity", get(get_user))
        .route(
            "/api/users/:identity/status",
            get(user_status).patch(set_user_status),
        )
        .route("/api/users/:identity/boost", post(boost_user))
        .route("/api/sessions/:subject/start", post(start_session))
        .route("/api/sessions/:subject/stop", post(stop_session))
        .route("/api/challenge", get(issue_challenge))
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    router
}

/// Binds and serves until the process exits.
pub async fn serve(addr: &str, state: ApiState, static_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http surface listening");
    axum::serve(listener, router(state, static_dir)).await?;
    Ok(())
}

async fn list_users(
    State(state): State<ApiState>,
) -> ApiResult<Json<Vec<vein_core::account::Account>>> {
    Ok(Json(state.repository.list_all().await?))
}

async fn get_user(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
) -> ApiResult<Json<vein_core::account::Account>> {
    let account = state
        .repository
        .find_by_identity(&identity)
        .await?
        .ok_or_else(|| VeinError::not_found("account", identity))?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    /// Session subject to report on. Web clients that mine under their
    /// own identity can omit it.
    subject: Option<String>,
}

async fn user_status(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<vein_application::MiningStatus>> {
    let subject = SubjectId::new(query.subject.unwrap_or_else(|| identity.clone()));
    let status = state.mining.status(&subject, &identity).await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
struct SetStatusBody {
    status: AccountStatus,
}

async fn set_user_status(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
    Json(body): Json<SetStatusBody>,
) -> ApiResult<Json<vein_core::account::Account>> {
    let account = state.repository.set_status(&identity, body.status).await?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
struct StartSessionBody {
    identity: String,
}

async fn start_session(
    State(state): State<ApiState>,
    Path(subject): Path<String>,
    Json(body): Json<StartSessionBody>,
) -> ApiResult<Json<vein_application::StartOutcome>> {
    let outcome = state
        .mining
        .start(SubjectId::new(subject), &body.identity)
        .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum StopResponse {
    Stopped(vein_application::StopSummary),
    NoSession { stopped: bool },
}

async fn stop_session(
    State(state): State<ApiState>,
    Path(subject): Path<String>,
) -> ApiResult<Json<StopResponse>> {
    let response = match state.mining.stop(&SubjectId::new(subject)).await? {
        Some(summary) => StopResponse::Stopped(summary),
        None => StopResponse::NoSession { stopped: false },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ChallengeResponse {
    id: Uuid,
    kind: vein_core::boost::ChallengeKind,
    prompt: String,
    /// Advisory cooldown for the client's local countdown.
    cooldown_secs: u64,
}

async fn issue_challenge(State(state): State<ApiState>) -> Json<ChallengeResponse> {
    let challenge = state.challenges.issue().await;
    Json(ChallengeResponse {
        id: challenge.id,
        kind: challenge.kind,
        prompt: challenge.prompt.clone(),
        cooldown_secs: state.boost.cooldown_secs(),
    })
}

#[derive(Debug, Deserialize)]
struct BoostBody {
    challenge_id: Uuid,
    answer: String,
}

#[derive(Debug, Serialize)]
struct BoostResponse {
    accepted: bool,
    mining_power: Option<f64>,
    cooldown_secs: Option<u64>,
}

async fn boost_user(
    State(state): State<ApiState>,
    Path(identity): Path<String>,
    Json(body): Json<BoostBody>,
) -> ApiResult<Json<BoostResponse>> {
    let Some(challenge) = state.challenges.take(&body.challenge_id).await else {
        return Err(VeinError::invalid_input("unknown or expired challenge").into());
    };

    let response = match state.boost.redeem(&identity, &challenge, &body.answer).await? {
        Some(account) => BoostResponse {
            accepted: true,
            mining_power: Some(account.mining_power),
            cooldown_secs: Some(state.boost.cooldown_secs()),
        },
        None => BoostResponse {
            accepted: false,
            mining_power: None,
            cooldown_secs: None,
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let response = ApiError(VeinError::not_found("account", "durov")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError(VeinError::invalid_input("bad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(VeinError::store_unavailable("down")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = ApiError(VeinError::internal("bug")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
