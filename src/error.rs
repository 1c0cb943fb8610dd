use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Every way a request to the relay can fail.
pub enum AppError {
    MethodNotAllowed,
    /// The caller sent something unusable; the message is shown as is.
    BadRequest(String),
    /// Anything past payload decoding: provider, cleanup, token.
    Internal(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MethodNotAllowed => {
                "Method not allowed. Only POST requests are allowed.".to_string()
            }
            Self::BadRequest(msg) => format!("Bad request. {msg}"),
            Self::Internal(err) => format!("Internal server error. {err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [("content-type", "text/plain; charset=utf-8")],
            format!("{}\n", self.message()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}
