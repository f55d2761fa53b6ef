//! JSON API handlers for users, blogs and comments.

pub mod blogs;
pub mod comments;
pub mod users;

use crate::dispatch::{Arguments, Reply};
use crate::error::{ApiError, AppError};
use crate::orm::{FindAll, Limit, Model, Record};
use crate::page::{get_page_index, Page, DEFAULT_PAGE_SIZE};
use crate::service::authorize;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Map, Value};

/// Management actions need an admin session.
pub(crate) fn check_admin(args: &Arguments) -> Result<(), AppError> {
    if authorize(args.request()) {
        Ok(())
    } else {
        Err(ApiError::permission("Admin permission required.").into())
    }
}

/// One page of `M`, newest first: `{ "page": Page, "<key>": [...] }`.
pub(crate) async fn paged<M: Model>(
    args: &Arguments,
    key: &str,
    map: fn(Record) -> Record,
) -> Result<Reply, AppError> {
    let state = args.state();
    let schema = state.schemas.get::<M>()?;
    let page_index = get_page_index(&args.text("page"));
    let num = Record::find_number(&state.db, &schema, "count(id)", None, &[]).await?;
    let count = num.and_then(|v| v.as_i64()).unwrap_or(0).max(0) as u64;
    let page = Page::new(count, page_index, DEFAULT_PAGE_SIZE);

    let items = if page.is_empty() {
        Vec::new()
    } else {
        let query = FindAll::new().order_by("created_at desc").limit(Limit::Range {
            offset: page.offset as i64,
            count: page.limit as i64,
        });
        Record::find_all(&state.db, &schema, &query).await?
    };
    let items: Vec<Value> = items
        .into_iter()
        .map(|r| Value::Object(map(r).values().clone()))
        .collect();

    let mut out = Map::new();
    out.insert("page".into(), serde_json::to_value(page).map_err(|e| AppError::Internal(e.to_string()))?);
    out.insert(key.to_string(), Value::Array(items));
    Ok(Reply::Json(Value::Object(out)))
}

/// JSON body with a cookie attached.
pub(crate) fn with_cookie(body: Value, cookie: Cookie<'static>) -> Reply {
    Reply::Response((CookieJar::new().add(cookie), Reply::Json(body)).into_response())
}

pub(crate) fn deleted(id: &str) -> Reply {
    Reply::Json(json!({ "id": id }))
}
