//! JSON API route table.

use crate::dispatch::{Dispatcher, Param, BODY_LIMIT};
use crate::error::RouteError;
use crate::handlers::{blogs, comments, users};
use crate::routes::common_routes;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Register every API handler with its declared parameters.
pub fn api_dispatcher() -> Result<Dispatcher, RouteError> {
    let mut d = Dispatcher::new();
    d.register("GET", "/api/users", vec![Param::optional("page", "1")], users::api_get_users)?
        .register(
            "POST",
            "/api/users",
            vec![Param::required("email"), Param::required("name"), Param::required("passwd")],
            users::api_register_user,
        )?
        .register(
            "POST",
            "/api/authenticate",
            vec![Param::required("email"), Param::required("passwd")],
            users::authenticate,
        )?
        .register("GET", "/signout", vec![Param::request()], users::signout)?
        .register("GET", "/api/blogs", vec![Param::optional("page", "1")], blogs::api_blogs)?
        .register("GET", "/api/blogs/{id}", vec![Param::required("id")], blogs::api_get_blog)?
        .register(
            "POST",
            "/api/blogs",
            vec![
                Param::request(),
                Param::required("name"),
                Param::required("summary"),
                Param::required("content"),
            ],
            blogs::api_create_blog,
        )?
        .register(
            "POST",
            "/api/blogs/{id}",
            vec![
                Param::positional("id"),
                Param::request(),
                Param::required("name"),
                Param::required("summary"),
                Param::required("content"),
            ],
            blogs::api_update_blog,
        )?
        .register(
            "POST",
            "/api/blogs/{id}/delete",
            vec![Param::request(), Param::required("id")],
            blogs::api_delete_blog,
        )?
        .register("GET", "/api/comments", vec![Param::optional("page", "1")], comments::api_comments)?
        .register(
            "POST",
            "/api/blogs/{id}/comments",
            vec![Param::positional("id"), Param::request(), Param::required("content")],
            comments::api_create_comment,
        )?
        .register(
            "POST",
            "/api/comments/{id}/delete",
            vec![Param::positional("id"), Param::request()],
            comments::api_delete_comments,
        )?;
    Ok(d)
}

/// The full application: common routes plus the JSON API, with tracing and a body limit.
pub fn app(state: AppState) -> Result<Router, RouteError> {
    let api = api_dispatcher()?.into_router();
    Ok(common_routes()
        .merge(api)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
