//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Model declaration failures. Raised while building the schema registry at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("primary key not found for model {model}")]
    MissingPrimaryKey { model: String },
    #[error("duplicate primary key for field: {field} (model {model})")]
    DuplicatePrimaryKey { model: String, field: String },
    #[error("duplicate field {field} in model {model}")]
    DuplicateField { model: String, field: String },
    #[error("model {0} is already registered")]
    AlreadyRegistered(String),
    #[error("model {0} is not registered")]
    Unregistered(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Handler registration failures. Raised while assembling the router at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("method is not defined for handler {0}")]
    MissingMethod(String),
    #[error("path is not defined for handler {0}")]
    MissingPath(String),
    #[error("unknown http method {0}")]
    UnknownMethod(String),
    #[error("route {method} {path} is already registered")]
    Duplicate { method: String, path: String },
    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("path {path} conflicts with {existing}")]
    ConflictingPath { path: String, existing: String },
    #[error("request parameter must follow the positional and precede the keyword parameters of {0}")]
    RequestNotLast(String),
    #[error("duplicate parameter {param} in {handler}")]
    DuplicateParam { handler: String, param: String },
    #[error("more than one request parameter in {0}")]
    MultipleRequest(String),
    #[error("more than one catch-all parameter in {0}")]
    MultipleCatchAll(String),
}

/// Domain error raised by handlers. Rendered to callers as `{ error, data, message }`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{error}: {data} {message}")]
pub struct ApiError {
    pub error: String,
    pub data: String,
    pub message: String,
}

impl ApiError {
    pub const VALUE_INVALID: &'static str = "value:invalid";
    pub const VALUE_NOT_FOUND: &'static str = "value:notfound";
    pub const PERMISSION_FORBIDDEN: &'static str = "permission:forbidden";

    pub fn new(error: impl Into<String>, data: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            error: error.into(),
            data: data.into(),
            message: message.into(),
        }
    }

    /// Input field is missing, malformed or fails validation. `data` names the field.
    pub fn value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Self::VALUE_INVALID, field, message)
    }

    /// Referenced entity does not exist. `data` names the resource.
    pub fn not_found(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Self::VALUE_NOT_FOUND, resource, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(Self::PERMISSION_FORBIDDEN, "permission", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            Self::VALUE_NOT_FOUND => StatusCode::NOT_FOUND,
            Self::PERMISSION_FORBIDDEN => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("Unsupported Content-Type: {0}")]
    UnsupportedMediaType(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

/// Error shape returned to callers.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub data: String,
    pub message: String,
}

impl AppError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let body = |code: &str, data: &str, message: String| ErrorBody {
            error: code.to_string(),
            data: data.to_string(),
            message,
        };
        match self {
            AppError::Api(e) => (
                e.status(),
                body(&e.error, &e.data, e.message.clone()),
            ),
            AppError::MissingArgument(name) => (
                StatusCode::BAD_REQUEST,
                body("request:missing_argument", name, self.to_string()),
            ),
            AppError::UnsupportedMediaType(kind) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                body("request:unsupported_media_type", kind, self.to_string()),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                body("request:bad_request", "", msg.clone()),
            ),
            AppError::InvalidArgument(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("internal:invalid_argument", "", msg.clone()),
            ),
            AppError::Schema(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("internal:schema", "", e.to_string()),
            ),
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("internal:config", "", e.to_string()),
            ),
            AppError::Db(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("internal:database", "", "database error".to_string()),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                body("internal:error", "", msg.clone()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_kinds_carry_field_and_status() {
        let e = ApiError::value("email", "Invalid email.");
        assert_eq!(e.error, "value:invalid");
        assert_eq!(e.data, "email");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e = ApiError::not_found("Blog", "");
        assert_eq!(e.error, "value:notfound");
        assert_eq!(e.status(), StatusCode::NOT_FOUND);

        let e = ApiError::permission("Please signin first.");
        assert_eq!(e.data, "permission");
        assert_eq!(e.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn database_errors_do_not_leak_detail() {
        let (status, body) = AppError::Db(sqlx::Error::RowNotFound).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "database error");
    }

    #[test]
    fn dispatcher_errors_name_the_field() {
        let (status, body) = AppError::MissingArgument("content".into()).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.data, "content");
        assert_eq!(body.message, "Missing argument: content");

        let (status, _) = AppError::UnsupportedMediaType("text/plain".into()).status_and_body();
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
