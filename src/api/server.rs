//! Axum server wiring and request handlers.
//!
//! The whole engine sits behind one mutex: every settlement operation
//! is strictly serialized, which is what the hash-chain protocol
//! requires anyway. Handlers lock, operate, and release before
//! responding.

use super::models::*;
use crate::casino::{Casino, PlayRequest};
use crate::config::ApiConfig;
use crate::errors::CasinoError;
use crate::games::{BackgammonTable, BlackJack, GameModule, Roulette, Slots};
use crate::hash_chain::Digest32;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub struct AppState {
    casino: Mutex<Casino>,
}

impl AppState {
    pub fn new(casino: Casino) -> Arc<Self> {
        Arc::new(Self {
            casino: Mutex::new(casino),
        })
    }

    fn casino(&self) -> MutexGuard<'_, Casino> {
        self.casino.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API-facing error with an HTTP status.
pub enum ApiError {
    Casino(CasinoError),
    BadRequest(String),
}

impl From<CasinoError> for ApiError {
    fn from(e: CasinoError) -> Self {
        ApiError::Casino(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Casino(e) => {
                let status = match &e {
                    CasinoError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                    CasinoError::UnknownGame(_)
                    | CasinoError::UnknownToken(_)
                    | CasinoError::UnknownMatch(_) => StatusCode::NOT_FOUND,
                    CasinoError::HashChainViolation | CasinoError::InvalidMatchState { .. } => {
                        StatusCode::CONFLICT
                    }
                    CasinoError::TreasuryRetired => StatusCode::GONE,
                    CasinoError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn parse_digest(raw: &str) -> Result<Digest32, ApiError> {
    let bytes = hex::decode(raw)
        .map_err(|e| ApiError::BadRequest(format!("invalid hex digest: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| ApiError::BadRequest("digest must be 32 bytes".to_string()))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/games/:game_id/balance", get(game_balance))
        .route("/api/play", post(play))
        .route("/api/backgammon/start", post(bg_start))
        .route("/api/backgammon/raise", post(bg_raise))
        .route("/api/backgammon/call", post(bg_call))
        .route("/api/backgammon/drop", post(bg_drop))
        .route("/api/backgammon/resolve", post(bg_resolve))
        .route("/api/points/:player", get(points))
        .route("/api/events", get(events))
        .route("/api/admin/games", post(add_game))
        .route("/api/admin/funds", post(add_funds))
        .route("/api/admin/withdraw", post(withdraw))
        .route("/api/admin/withdraw-max", post(withdraw_max))
        .route("/api/admin/max-bet", post(max_bet))
        .route("/api/admin/tail", post(set_tail))
        .route("/api/admin/workers", post(add_worker))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let casino = state.casino();
    Json(StatusResponse {
        treasury_address: casino.treasury().address().clone(),
        retired: casino.is_retired(),
        tail: casino.tail().map(hex::encode),
        games: casino
            .treasury()
            .games()
            .map(|g| GameSummary {
                id: g.id,
                name: g.name.clone(),
                enabled: g.enabled,
            })
            .collect(),
    })
}

#[derive(Deserialize)]
struct BalanceQuery {
    token_symbol: String,
}

async fn game_balance(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<u64>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let casino = state.casino();
    casino.treasury().game(game_id)?;
    let balance = casino.treasury().balance(game_id, &query.token_symbol);
    Ok(Json(BalanceResponse {
        game_id,
        token_symbol: query.token_symbol,
        allocated: balance.allocated,
        maximum_bet: balance.maximum_bet,
    }))
}

async fn play(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayBody>,
) -> Result<Json<PlayResponse>, ApiError> {
    let local_hash = parse_digest(&body.local_hash)?;
    let request = PlayRequest {
        game_id: body.game_id,
        token_symbol: body.token_symbol,
        land_id: body.land_id,
        machine_id: body.machine_id,
        players: body.players,
        bet_types: body.bet_types,
        bet_values: body.bet_values,
        bet_amounts: body.bet_amounts,
        local_hash,
    };
    let settlement = state.casino().play(&body.caller, &request)?;
    Ok(Json(PlayResponse { settlement }))
}

async fn bg_start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartMatchBody>,
) -> Result<Json<StartMatchResponse>, ApiError> {
    let [a, b] = body.players;
    let match_id = state.casino().backgammon_start(
        &body.caller,
        body.game_id,
        &body.token_symbol,
        body.stake,
        [a, b],
        body.wearables,
    )?;
    Ok(Json(StartMatchResponse { match_id }))
}

async fn bg_raise(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MatchActionBody>,
) -> Result<StatusCode, ApiError> {
    state
        .casino()
        .backgammon_raise(&body.caller, body.game_id, body.match_id, &body.player)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bg_call(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MatchActionBody>,
) -> Result<StatusCode, ApiError> {
    state
        .casino()
        .backgammon_call(&body.caller, body.game_id, body.match_id, &body.player)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bg_drop(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MatchActionBody>,
) -> Result<StatusCode, ApiError> {
    state
        .casino()
        .backgammon_drop(&body.caller, body.game_id, body.match_id, &body.player)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn bg_resolve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MatchActionBody>,
) -> Result<StatusCode, ApiError> {
    state
        .casino()
        .backgammon_resolve(&body.caller, body.game_id, body.match_id, &body.player)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn points(
    State(state): State<Arc<AppState>>,
    Path(player): Path<String>,
) -> Json<PointsResponse> {
    let points = state.casino().pointer().balance_of(&player);
    Json(PointsResponse { player, points })
}

async fn events(State(state): State<Arc<AppState>>) -> Json<EventsResponse> {
    Json(EventsResponse {
        events: state.casino().events().entries().to_vec(),
    })
}

async fn add_game(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddGameBody>,
) -> Result<Json<AddGameResponse>, ApiError> {
    let module = match body.kind.as_str() {
        "roulette" => GameModule::Roulette(Roulette::default()),
        "slots" => GameModule::Slots(Slots::default()),
        "blackjack" => GameModule::BlackJack(BlackJack::new()),
        "backgammon" => GameModule::Backgammon(BackgammonTable::new()),
        other => {
            return Err(ApiError::BadRequest(format!("unknown game kind '{}'", other)));
        }
    };
    let game_id = state.casino().add_game(
        &body.caller,
        body.name,
        module,
        body.maximum_bet,
        body.enabled,
    )?;
    Ok(Json(AddGameResponse { game_id }))
}

async fn add_funds(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FundsBody>,
) -> Result<Json<NewBalanceResponse>, ApiError> {
    let new_balance =
        state
            .casino()
            .add_funds(&body.caller, body.game_id, &body.token_symbol, body.amount)?;
    Ok(Json(NewBalanceResponse { new_balance }))
}

async fn withdraw(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FundsBody>,
) -> Result<Json<NewBalanceResponse>, ApiError> {
    let new_balance = state.casino().withdraw_tokens(
        &body.caller,
        body.game_id,
        &body.token_symbol,
        body.amount,
    )?;
    Ok(Json(NewBalanceResponse { new_balance }))
}

async fn withdraw_max(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WithdrawMaxBody>,
) -> Result<Json<NewBalanceResponse>, ApiError> {
    let swept = state
        .casino()
        .withdraw_max_tokens(&body.caller, &body.token_symbol)?;
    Ok(Json(NewBalanceResponse { new_balance: swept }))
}

async fn max_bet(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MaxBetBody>,
) -> Result<StatusCode, ApiError> {
    state.casino().set_maximum_bet(
        &body.caller,
        body.game_id,
        &body.token_symbol,
        body.maximum_bet,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_tail(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TailBody>,
) -> Result<StatusCode, ApiError> {
    let tail = parse_digest(&body.tail)?;
    state.casino().set_tail(&body.caller, tail)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_worker(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WorkerBody>,
) -> Result<StatusCode, ApiError> {
    state.casino().add_worker(&body.caller, body.worker)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Binds and serves the API until Ctrl+C or SIGTERM.
pub async fn serve(
    config: &ApiConfig,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = create_router(state).layer(TraceLayer::new_for_http());
    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received terminate signal"),
    }
}
