use axum::http::{header, HeaderMap};

pub const USER_COOKIE: &str = "skrate_user";
pub const GAME_COOKIE: &str = "skrate_game";
pub const DEFAULT_USER: &str = "guest";

const MAX_USER_LEN: usize = 64;

/// Who is skating, and which game (if any) they are playing.
/// Carried in plain cookies; there is no authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub game_id: Option<u64>,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut user = None;
        let mut game_id = None;

        for value in headers.get_all(header::COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((name, content)) = pair.trim().split_once('=') else {
                    continue;
                };
                match name {
                    USER_COOKIE if is_valid_user(content) => user = Some(content.to_string()),
                    GAME_COOKIE => game_id = content.parse().ok(),
                    _ => {}
                }
            }
        }

        Self {
            user: user.unwrap_or_else(|| DEFAULT_USER.to_string()),
            game_id,
        }
    }
}

pub fn is_valid_user(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_USER_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn set_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/; SameSite=Lax")
}

pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; SameSite=Lax")
}
