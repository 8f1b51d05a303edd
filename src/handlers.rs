use crate::errors::AppError;
use crate::game::{past_user, GameState};
use crate::models::{AppData, Attempt, AttemptResponse, Game, StartGameResponse};
use crate::session::{self, Session, GAME_COOKIE, USER_COOKIE};
use crate::state::AppState;
use crate::stats::{all_trick_stats, trick_stats};
use crate::storage::persist_data;
use crate::ui::{render_game, render_index, render_trick_stats, SCRIPT};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, Html, IntoResponse, Redirect},
    Json,
};
use chrono::Utc;
use tracing::info;

pub async fn root() -> Redirect {
    Redirect::to(&format!("/{}", session::DEFAULT_USER))
}

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !session::is_valid_user(&user) {
        return Err(AppError::bad_request(
            "user name must be 1-64 letters, digits, '_' or '-'",
        ));
    }

    // the game cookie survives a reload as long as it names this user's open game
    let visit = Session {
        user: user.clone(),
        game_id: Session::from_headers(&headers).game_id,
    };

    let data = state.data.lock().await;
    let tricks = all_trick_stats(&data, &user);
    let game = ongoing_game(&data, &visit).map(|game| replay(&data, game));
    let html = render_index(&user, &tricks, game.as_ref());
    info!("user {user} started a session");

    let mut cookies = vec![(header::SET_COOKIE, session::set_cookie(USER_COOKIE, &user))];
    if visit.game_id.is_some() && game.is_none() {
        cookies.push((header::SET_COOKIE, session::clear_cookie(GAME_COOKIE)));
    }

    Ok((AppendHeaders(cookies), Html(html)))
}

pub async fn attempt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((trick_id, landed, past)): Path<(String, String, String)>,
) -> Result<Json<AttemptResponse>, AppError> {
    let trick_id = parse_trick_id(&trick_id)?;
    let landed = landed == "true";
    let past = past == "true";
    let session = Session::from_headers(&headers);
    let attempter = if past {
        past_user(&session.user)
    } else {
        session.user.clone()
    };

    let mut data = state.data.lock().await;
    if data.trick(trick_id).is_none() {
        return Err(AppError::not_found(format!("no trick with id {trick_id}")));
    }

    let game_id = ongoing_game(&data, &session).map(|game| game.id);
    info!(
        user = %attempter,
        trick_id,
        landed,
        game_id = ?game_id,
        "recording attempt"
    );

    let attempt = Attempt {
        id: data.next_attempt_id(),
        trick_id,
        user: attempter,
        landed,
        game_id,
        recorded_at: Utc::now().to_rfc3339(),
    };
    data.attempts.push(attempt);

    if let Some(game_id) = game_id {
        settle_game(&mut data, game_id);
    }

    persist_data(&state.data_path, &data).await?;

    Ok(Json(AttemptResponse {
        attempted: true,
        update_game: game_id.is_some(),
        update_all_tricks: false,
        update_tricks: vec![trick_id.to_string()],
    }))
}

pub async fn single_trick_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(trick_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let trick_id = parse_trick_id(&trick_id)?;
    let session = Session::from_headers(&headers);
    let data = state.data.lock().await;
    let stats = trick_stats(&data, trick_id, &session.user)
        .ok_or_else(|| AppError::not_found(format!("no trick with id {trick_id}")))?;
    Ok(Html(render_trick_stats(&stats)))
}

pub async fn start_game(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let session = Session::from_headers(&headers);
    let mut data = state.data.lock().await;
    let game = Game {
        id: data.next_game_id(),
        user: session.user.clone(),
        complete: false,
        winner: None,
        started_at: Utc::now().to_rfc3339(),
    };
    let game_id = game.id;
    data.games.push(game);
    persist_data(&state.data_path, &data).await?;
    info!("user {} started game {game_id}", session.user);

    Ok((
        [(header::SET_COOKIE, session::set_cookie(GAME_COOKIE, &game_id.to_string()))],
        Json(StartGameResponse {
            started: true,
            game_id,
        }),
    ))
}

pub async fn game_stats(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let session = Session::from_headers(&headers);
    let data = state.data.lock().await;
    let game = session
        .game_id
        .and_then(|id| data.game(id))
        .filter(|game| game.user == session.user)
        .map(|game| replay(&data, game));
    Html(render_game(game.as_ref()))
}

pub async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SCRIPT,
    )
}

fn parse_trick_id(raw: &str) -> Result<u32, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("trick id must be an integer, got '{raw}'")))
}

fn ongoing_game<'a>(data: &'a AppData, session: &Session) -> Option<&'a Game> {
    session
        .game_id
        .and_then(|id| data.game(id))
        .filter(|game| game.user == session.user && !game.complete)
}

fn replay(data: &AppData, game: &Game) -> GameState {
    GameState::replay(&game.user, data.game_attempts(game.id), &data.tricks)
}

/// Replays the game and closes it once someone has spelled the word.
fn settle_game(data: &mut AppData, game_id: u64) {
    let Some(game) = data.game(game_id) else {
        return;
    };
    let state = replay(data, game);
    let Some(winner) = state.winner() else {
        return;
    };
    if let Some(game) = data.game_mut(game_id) {
        info!("game {game_id} over, {winner} wins");
        game.complete = true;
        game.winner = Some(winner);
    }
}
