//! What a handler receives and what it returns.

use crate::error::AppError;
use crate::orm::Record;
use crate::state::AppState;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

/// The live request, as seen by a handler that declares a request parameter.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Signed-in user from the session cookie, password masked.
    pub user: Option<Record>,
}

impl RequestContext {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Resolved arguments of one call.
#[derive(Clone)]
pub struct Arguments {
    values: Map<String, Value>,
    state: AppState,
    request: Option<RequestContext>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>, state: AppState, request: Option<RequestContext>) -> Self {
        Arguments { values, state, request }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Argument as text. Numbers and booleans are rendered; absent or null is empty.
    pub fn text(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(v) => v.to_string(),
        }
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Present only when the handler declared a request parameter.
    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_ref()
    }

    pub fn user(&self) -> Option<&Record> {
        self.request.as_ref().and_then(|r| r.user.as_ref())
    }
}

/// Handler result.
pub enum Reply {
    Json(Value),
    /// `302 Found` to the given location.
    Redirect(String),
    Status(StatusCode),
    Response(Response),
}

impl Reply {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, AppError> {
        serde_json::to_value(value)
            .map(Reply::Json)
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(v) => Json(v).into_response(),
            Reply::Redirect(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            Reply::Status(status) => status.into_response(),
            Reply::Response(r) => r,
        }
    }
}
