use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures of one record/refresh chain on the client side.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("element id `{0}` does not carry a trick id as its second dash-separated token")]
    MalformedElementId(String),

    #[error("element `{0}` is not an attempt control")]
    NotAControl(String),

    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },

    #[error("request to {path} returned status {status}")]
    Status { path: String, status: u16 },

    #[error("no tokio runtime to run the request on: {0}")]
    NoRuntime(String),

    #[error("invalid base url: {0}")]
    BaseUrl(String),
}
