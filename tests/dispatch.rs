mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use blog_core::{ApiError, AppError, Arguments, Dispatcher, Param, Reply};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

async fn echo(args: Arguments) -> Result<Reply, AppError> {
    Ok(Reply::Json(json!({
        "args": Value::Object(args.values().clone()),
        "has_request": args.request().is_some(),
    })))
}

static REJECTED_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Only reachable through requests that must be rejected before dispatch.
async fn unreachable_handler(_args: Arguments) -> Result<Reply, AppError> {
    REJECTED_CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(Reply::Status(StatusCode::NO_CONTENT))
}

async fn missing(_args: Arguments) -> Result<Reply, AppError> {
    Err(ApiError::not_found("Blog", "Blog not found.").into())
}

async fn redirect(_args: Arguments) -> Result<Reply, AppError> {
    Ok(Reply::Redirect("/elsewhere".into()))
}

async fn app() -> axum::Router {
    let state = common::memory_state().await;
    let mut d = Dispatcher::new();
    d.register("POST", "/echo", vec![Param::required("name"), Param::optional("page", "1")], echo)
        .unwrap()
        .register("GET", "/echo", vec![Param::required("name")], echo)
        .unwrap()
        .register(
            "POST",
            "/items/{id}",
            vec![Param::required("id"), Param::required("name")],
            echo,
        )
        .unwrap()
        .register("GET", "/items/{id}", vec![Param::positional("id"), Param::request()], echo)
        .unwrap()
        .register("GET", "/guarded", vec![Param::required("name")], unreachable_handler)
        .unwrap()
        .register("POST", "/guarded", vec![Param::required("name")], unreachable_handler)
        .unwrap()
        .register("POST", "/any", vec![Param::catch_all()], echo)
        .unwrap()
        .register("GET", "/missing", vec![], missing)
        .unwrap()
        .register("GET", "/redirect", vec![], redirect)
        .unwrap();
    d.into_router().with_state(state)
}

fn post(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(Body::from(body.to_string())).expect("failed to build request")
}

#[tokio::test]
async fn missing_required_argument_never_reaches_the_handler() {
    let resp = app()
        .await
        .oneshot(common::get_request("/guarded?other=1", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["data"], "name");
    assert_eq!(body["message"], "Missing argument: name");
    assert_eq!(REJECTED_CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_without_content_type_is_rejected() {
    let resp = app()
        .await
        .oneshot(post("/guarded", None, "name=a"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(resp).await;
    assert_eq!(body["message"], "Missing Content-Type.");
    assert_eq!(REJECTED_CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_content_type_is_415() {
    let resp = app()
        .await
        .oneshot(post("/echo", Some("text/plain"), "name=a"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn undeclared_fields_are_dropped_and_defaults_filled() {
    let resp = app()
        .await
        .oneshot(post("/echo", Some("application/json"), r#"{"name":"a","admin":true}"#))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = common::body_json(resp).await;
    assert_eq!(body["args"], json!({"name": "a", "page": "1"}));
    assert_eq!(body["has_request"], false);
}

#[tokio::test]
async fn form_bodies_and_catch_all() {
    let resp = app()
        .await
        .oneshot(post("/any", Some("application/x-www-form-urlencoded"), "x=1&y=2&x=3"))
        .await
        .expect("request failed");
    let body = common::body_json(resp).await;
    assert_eq!(body["args"], json!({"x": "1", "y": "2"}));
}

#[tokio::test]
async fn path_parameters_win_over_body_fields() {
    let resp = app()
        .await
        .oneshot(post("/items/42", Some("application/json"), r#"{"id":"body","name":"n"}"#))
        .await
        .expect("request failed");
    let body = common::body_json(resp).await;
    assert_eq!(body["args"], json!({"id": "42", "name": "n"}));
}

#[tokio::test]
async fn positional_params_come_from_the_path_with_request_context() {
    let resp = app()
        .await
        .oneshot(common::get_request("/items/7", None))
        .await
        .expect("request failed");
    let body = common::body_json(resp).await;
    assert_eq!(body["args"], json!({"id": "7"}));
    assert_eq!(body["has_request"], true);
}

#[tokio::test]
async fn domain_errors_become_structured_results() {
    let resp = app()
        .await
        .oneshot(common::get_request("/missing", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(resp).await;
    assert_eq!(body, json!({"error": "value:notfound", "data": "Blog", "message": "Blog not found."}));
}

#[tokio::test]
async fn redirects_are_302() {
    let resp = app()
        .await
        .oneshot(common::get_request("/redirect", None))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[header::LOCATION], "/elsewhere");
}
