use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/static/skrate.js", get(handlers::script))
        .route("/start_game", get(handlers::start_game))
        .route("/get_game_stats", get(handlers::game_stats))
        .route(
            "/get_single_trick_stats/:trick_id",
            get(handlers::single_trick_stats),
        )
        .route("/attempt/:trick_id/:landed/:past", get(handlers::attempt))
        .route("/:user", get(handlers::index))
        .with_state(state)
}
