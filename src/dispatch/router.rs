//! Handler registration: method + path template + declared parameters, assembled into an axum router.

use crate::dispatch::args::{Arguments, Reply, RequestContext};
use crate::dispatch::descriptor::{Param, Signature};
use crate::dispatch::extract::extract_payload;
use crate::error::{AppError, RouteError};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

pub type HandlerFuture = BoxFuture<'static, Result<Reply, AppError>>;
pub type BoxHandler = Arc<dyn Fn(Arguments) -> HandlerFuture + Send + Sync>;

const METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

struct Route {
    method: Method,
    path: String,
    signature: Arc<Signature>,
    handler: BoxHandler,
}

/// Registered handlers, turned into an [`axum::Router`] with [`Dispatcher::into_router`].
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, method: &str, path: &str, params: Vec<Param>, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, AppError>> + Send + 'static,
    {
        let name = std::any::type_name::<F>();
        let method = parse_method(name, method)?;
        if path.trim().is_empty() {
            return Err(RouteError::MissingPath(name.to_string()));
        }
        check_template(path)?;
        if self.routes.iter().any(|r| r.method == method && r.path == path) {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        // templates that differ only in placeholder names map to the same routed path
        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.path != path && path_shape(&r.path) == path_shape(path))
        {
            return Err(RouteError::ConflictingPath {
                path: path.to_string(),
                existing: existing.path.clone(),
            });
        }
        let signature = Signature::new(name, params)?;
        tracing::info!("add route {} {} => {}({})", method, path, name, signature);
        let handler = Arc::new(handler);
        self.routes.push(Route {
            method,
            path: path.to_string(),
            signature: Arc::new(signature),
            handler: Arc::new(move |args: Arguments| -> HandlerFuture { Box::pin(handler(args)) }),
        });
        Ok(self)
    }

    /// Registered `(method, path template)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.path.as_str()))
    }

    pub fn into_router(self) -> axum::Router<AppState> {
        let mut by_path: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();
        for route in self.routes {
            let filter = match MethodFilter::try_from(route.method.clone()) {
                Ok(f) => f,
                Err(_) => continue,
            };
            let path = router_path(&route.path);
            let method_router = by_path.remove(&path).unwrap_or_else(MethodRouter::new);
            let signature = route.signature;
            let handler = route.handler;
            let endpoint = move |State(state): State<AppState>, req: Request| {
                let signature = signature.clone();
                let handler = handler.clone();
                async move { dispatch(state, req, &signature, &handler).await }
            };
            by_path.insert(path, method_router.on(filter, endpoint));
        }
        by_path
            .into_iter()
            .fold(axum::Router::new(), |router, (path, method_router)| router.route(&path, method_router))
    }
}

async fn dispatch(state: AppState, req: Request, signature: &Signature, handler: &BoxHandler) -> Response {
    let (mut parts, body) = req.into_parts();
    let path_params: Map<String, Value> = match RawPathParams::from_request_parts(&mut parts, &state).await {
        Ok(params) => params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect(),
        Err(_) => Map::new(),
    };
    let user = match CurrentUser::from_request_parts(&mut parts, &state).await {
        Ok(CurrentUser(user)) => user,
        Err(never) => match never {},
    };
    let context = RequestContext {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        headers: parts.headers.clone(),
        user,
    };
    let req = Request::from_parts(parts, body);

    let extracted = if signature.needs_payload() {
        match extract_payload(req).await {
            Ok(extracted) => extracted,
            Err(e) => return e.into_response(),
        }
    } else {
        None
    };
    let values = match signature.resolve(extracted, path_params) {
        Ok(values) => values,
        Err(e) => return e.into_response(),
    };
    let shown = serde_json::Value::Object(values.clone());
    tracing::info!("call with args: {}", shown);
    let request = signature.has_request().then_some(context);
    match handler(Arguments::new(values, state, request)).await {
        Ok(reply) => reply.into_response(),
        Err(e) => e.into_response(),
    }
}

fn parse_method(handler: &str, method: &str) -> Result<Method, RouteError> {
    let method = method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err(RouteError::MissingMethod(handler.to_string()));
    }
    METHODS
        .iter()
        .find(|m| m.as_str() == method)
        .cloned()
        .ok_or(RouteError::UnknownMethod(method))
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

fn check_template(path: &str) -> Result<(), RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if !path.starts_with('/') {
        return Err(invalid("must start with /"));
    }
    if path.split('/').any(|seg| placeholder(seg).is_some_and(|name| name.trim().is_empty())) {
        return Err(invalid("empty placeholder"));
    }
    Ok(())
}

/// Template with placeholder names erased, e.g. `/a/{}/b`.
fn path_shape(template: &str) -> String {
    template
        .split('/')
        .map(|seg| if placeholder(seg).is_some() { "{}" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

/// `{name}` segments become `:name`.
fn router_path(template: &str) -> String {
    template
        .split('/')
        .map(|seg| match placeholder(seg) {
            Some(name) => format!(":{}", name),
            None => seg.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_args: Arguments) -> Result<Reply, AppError> {
        Ok(Reply::Json(Value::Null))
    }

    #[test]
    fn path_templates_use_router_syntax() {
        assert_eq!(router_path("/api/blogs/{id}/comments"), "/api/blogs/:id/comments");
        assert_eq!(router_path("/api/users"), "/api/users");
    }

    #[test]
    fn registration_rejects_bad_routes() {
        let mut d = Dispatcher::new();
        assert!(matches!(d.register("", "/a", vec![], noop), Err(RouteError::MissingMethod(_))));
        assert!(matches!(d.register("GET", " ", vec![], noop), Err(RouteError::MissingPath(_))));
        assert!(matches!(d.register("FETCH", "/a", vec![], noop), Err(RouteError::UnknownMethod(_))));
        assert!(d.register("get", "/a", vec![], noop).is_ok());
        assert!(matches!(d.register("GET", "/a", vec![], noop), Err(RouteError::Duplicate { .. })));
        assert!(d.register("POST", "/a", vec![], noop).is_ok());
        assert_eq!(d.routes().count(), 2);
    }

    #[test]
    fn path_must_start_with_slash() {
        let mut d = Dispatcher::new();
        assert_eq!(
            d.register("GET", "api/users", vec![], noop).err(),
            Some(RouteError::InvalidPath {
                path: "api/users".into(),
                reason: "must start with /".into(),
            })
        );
        assert_eq!(d.routes().count(), 0);
    }

    #[test]
    fn empty_placeholder_is_rejected() {
        let mut d = Dispatcher::new();
        assert!(matches!(
            d.register("GET", "/api/blogs/{}", vec![], noop),
            Err(RouteError::InvalidPath { .. })
        ));
        assert!(matches!(
            d.register("GET", "/api/blogs/{ }/comments", vec![], noop),
            Err(RouteError::InvalidPath { .. })
        ));
    }

    #[test]
    fn differently_named_placeholders_conflict() {
        let mut d = Dispatcher::new();
        d.register("GET", "/a/{id}", vec![Param::positional("id")], noop).unwrap();
        assert_eq!(
            d.register("POST", "/a/{name}", vec![Param::positional("name")], noop).err(),
            Some(RouteError::ConflictingPath {
                path: "/a/{name}".into(),
                existing: "/a/{id}".into(),
            })
        );
        d.register("POST", "/a/{id}", vec![Param::positional("id")], noop).unwrap();
        d.register("GET", "/a/{id}/b", vec![Param::positional("id")], noop).unwrap();
        assert_eq!(d.routes().count(), 3);
        let _router = d.into_router();
    }
}
