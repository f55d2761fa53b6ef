//! Request payload extraction: JSON, form-encoded or multipart bodies, or the query string.

use crate::error::AppError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, Method};
use serde_json::{Map, Value};

/// Largest body read by the extractor.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Methods whose arguments come from the body.
pub fn is_body_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Methods whose arguments come from the query string.
pub fn is_query_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Extract the flat argument mapping of a request. `None` when nothing was supplied.
pub async fn extract_payload(req: Request) -> Result<Option<Map<String, Value>>, AppError> {
    let method = req.method().clone();
    if is_body_method(&method) {
        return extract_body(req).await.map(Some);
    }
    if is_query_method(&method) {
        return Ok(req
            .uri()
            .query()
            .filter(|q| !q.is_empty())
            .map(|q| parse_form(q.as_bytes())));
    }
    Ok(None)
}

async fn extract_body(req: Request) -> Result<Map<String, Value>, AppError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type.".into()))?;

    if content_type.starts_with("application/json") {
        let bytes = read_body(req).await?;
        return match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(m)) => Ok(m),
            Ok(_) => Err(AppError::BadRequest("JSON body must be object.".into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
        };
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let bytes = read_body(req).await?;
        return Ok(parse_form(&bytes));
    }
    if content_type.starts_with("multipart/form-data") {
        return parse_multipart(req).await;
    }
    Err(AppError::UnsupportedMediaType(content_type))
}

async fn read_body(req: Request) -> Result<axum::body::Bytes, AppError> {
    axum::body::to_bytes(req.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| AppError::BadRequest(format!("failed to read body: {}", e)))
}

/// Form or query decoding. The first value of a repeated key wins.
pub fn parse_form(input: &[u8]) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in url::form_urlencoded::parse(input) {
        if !out.contains_key(k.as_ref()) {
            out.insert(k.into_owned(), Value::String(v.into_owned()));
        }
    }
    out
}

async fn parse_multipart(req: Request) -> Result<Map<String, Value>, AppError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let mut out = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else { continue };
        let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if !out.contains_key(&name) {
            out.insert(name, Value::String(text));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    fn request(method: Method, uri: &str, content_type: Option<&str>, body: &str) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let m = parse_form(b"a=1&b=two+words&a=3&empty=");
        assert_eq!(Value::Object(m), json!({"a": "1", "b": "two words", "empty": ""}));
    }

    #[tokio::test]
    async fn json_body_must_be_an_object() {
        let m = extract_payload(request(Method::POST, "/", Some("application/json; charset=utf-8"), r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(m, json!({"x": 1}).as_object().cloned());

        let err = extract_payload(request(Method::POST, "/", Some("application/json"), "[1]"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn body_methods_need_a_content_type() {
        let err = extract_payload(request(Method::POST, "/", None, "a=1")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing Content-Type."));

        let err = extract_payload(request(Method::PUT, "/", Some("text/plain"), "a=1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(ref ct) if ct == "text/plain"));
    }

    #[tokio::test]
    async fn query_methods_read_the_query_string() {
        let m = extract_payload(request(Method::GET, "/api/blogs?page=2&page=3", None, ""))
            .await
            .unwrap();
        assert_eq!(m, json!({"page": "2"}).as_object().cloned());
        assert_eq!(extract_payload(request(Method::GET, "/api/blogs", None, "")).await.unwrap(), None);
        assert_eq!(extract_payload(request(Method::OPTIONS, "/?a=1", None, "")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn multipart_text_fields() {
        let body = "--XX\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nhello\r\n--XX\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nagain\r\n--XX--\r\n";
        let m = extract_payload(request(Method::POST, "/", Some("multipart/form-data; boundary=XX"), body))
            .await
            .unwrap();
        assert_eq!(m, json!({"name": "hello"}).as_object().cloned());
    }
}
