use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::GameError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error("{}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),

    #[error(transparent)]
    Game(#[from] GameError),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUserId(_) => "invalid_user_id",
            AppError::InvalidBody(_) => "invalid_body",
            AppError::InvalidQuery(_) => "invalid_query",
            AppError::Game(e) => e.code(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUserId(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(rejection) => rejection.status(),
            AppError::InvalidQuery(rejection) => rejection.status(),
            AppError::Game(GameError::UnknownProducer(_) | GameError::UnknownUpgrade(_)) => StatusCode::NOT_FOUND,
            AppError::Game(GameError::InsufficientFunds { .. }) => StatusCode::CONFLICT,
            AppError::Game(GameError::InvalidInterval(_)) => StatusCode::BAD_REQUEST,
            AppError::Game(GameError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            error!("{self}");
        }

        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
