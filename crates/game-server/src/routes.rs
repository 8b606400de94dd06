use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use twenty48_core::engine::Move;
use twenty48_core::game::{Game, GameError, GameState};

use crate::app::AppState;

#[derive(Deserialize)]
pub struct MoveRequest {
    game_id: String,
    direction: Move,
}

#[derive(Deserialize)]
pub struct UndoRequest {
    game_id: String,
}

#[derive(Deserialize)]
pub struct SwapRequest {
    game_id: String,
    pos1: [usize; 2],
    pos2: [usize; 2],
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    game_id: String,
    number: u32,
}

#[derive(Serialize)]
pub(crate) struct NewGameResponse {
    game_id: String,
    #[serde(flatten)]
    state: GameState,
}

#[derive(Serialize)]
pub(crate) struct MoveResponse {
    moved: bool,
    #[serde(flatten)]
    state: GameState,
}

/// Outcome of a power-up attempt plus the (possibly unchanged) state.
#[derive(Serialize)]
pub(crate) struct ActionResponse {
    success: bool,
    message: String,
    #[serde(flatten)]
    state: GameState,
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    active_games: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// A status code with a JSON `{"error": ...}` body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn game_not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Game not found".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/new-game", post(new_game))
        .route("/api/game/:game_id", get(get_game))
        .route("/api/move", post(make_move))
        .route("/api/undo", post(undo_move))
        .route("/api/swap", post(swap_tiles))
        .route("/api/delete", post(delete_tiles))
        .route("/api/health", get(get_health))
        .with_state(state)
}

pub async fn new_game(State(state): State<AppState>) -> Json<NewGameResponse> {
    let created = state.store.create();
    info!("new game" = %created.game_id, seed = created.seed);
    Json(NewGameResponse {
        game_id: created.game_id,
        state: created.state,
    })
}

pub async fn get_game(
    State(state): State<AppState>,
    AxumPath(game_id): AxumPath<String>,
) -> Result<Json<GameState>, ApiError> {
    let game = state
        .store
        .get(&game_id)
        .ok_or_else(ApiError::game_not_found)?;
    let game = game.lock();
    Ok(Json(game.state()))
}

pub async fn make_move(
    State(state): State<AppState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let game = state
        .store
        .get(&request.game_id)
        .ok_or_else(ApiError::game_not_found)?;
    let mut game = game.lock();
    let moved = game.make_move(request.direction);
    if moved && game.is_game_over() {
        info!(
            "game over" = %request.game_id,
            score = game.score(),
            highest_tile = game.board().highest_tile(),
        );
    }
    Ok(Json(MoveResponse {
        moved,
        state: game.state(),
    }))
}

pub async fn undo_move(
    State(state): State<AppState>,
    Json(request): Json<UndoRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let game = state
        .store
        .get(&request.game_id)
        .ok_or_else(ApiError::game_not_found)?;
    let mut game = game.lock();
    let result = game.undo().map(|()| "Undo successful".to_string());
    Ok(Json(action_response(result, &game)))
}

pub async fn swap_tiles(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let game = state
        .store
        .get(&request.game_id)
        .ok_or_else(ApiError::game_not_found)?;
    let mut game = game.lock();
    let result = game
        .swap_tiles(
            (request.pos1[0], request.pos1[1]),
            (request.pos2[0], request.pos2[1]),
        )
        .map(|()| "Swap successful".to_string());
    Ok(Json(action_response(result, &game)))
}

pub async fn delete_tiles(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let game = state
        .store
        .get(&request.game_id)
        .ok_or_else(ApiError::game_not_found)?;
    let mut game = game.lock();
    let result = game.delete_value(request.number).map(|cleared| {
        debug!("deleted tiles" = %request.game_id, value = request.number, cleared);
        format!("Deleted all {} tiles", request.number)
    });
    Ok(Json(action_response(result, &game)))
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_games: state.store.active_games(),
    })
}

/// Power-up failures are part of the normal flow: they come back as 200s
/// with `success: false` and the message verbatim, never as error statuses.
fn action_response(result: Result<String, GameError>, game: &Game) -> ActionResponse {
    match result {
        Ok(message) => ActionResponse {
            success: true,
            message,
            state: game.state(),
        },
        Err(err) => ActionResponse {
            success: false,
            message: err.to_string(),
            state: game.state(),
        },
    }
}
