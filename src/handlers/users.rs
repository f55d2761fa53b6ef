//! User listing, registration, sign-in and sign-out.

use crate::dispatch::{Arguments, Reply};
use crate::error::{ApiError, AppError};
use crate::handlers::{paged, with_cookie};
use crate::models::{next_id, User};
use crate::orm::{FindAll, Limit, Record};
use crate::service::session::mask_password;
use crate::service::sha256_hex;
use crate::service::validation::{require_text, validate_email, validate_password_digest};
use crate::state::AppState;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::Value;

fn masked(mut user: Record) -> Record {
    mask_password(&mut user);
    user
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<Record>, AppError> {
    let schema = state.schemas.get::<User>()?;
    let query = FindAll::new()
        .filter("email=?", vec![Value::from(email)])
        .limit(Limit::Count(1));
    Ok(Record::find_all(&state.db, &schema, &query).await?.into_iter().next())
}

/// Signed-in response: the masked user plus a fresh session cookie.
fn signed_in(state: &AppState, mut user: Record) -> Result<Reply, AppError> {
    let uid = user.get_str("id").unwrap_or_default().to_string();
    let passwd = user.get_str("passwd").unwrap_or_default().to_string();
    let cookie = state.session.cookie(&uid, &passwd, Utc::now().timestamp());
    mask_password(&mut user);
    Ok(with_cookie(Value::Object(user.values().clone()), cookie))
}

/// `GET /api/users`
pub async fn api_get_users(args: Arguments) -> Result<Reply, AppError> {
    paged::<User>(&args, "users", masked).await
}

/// `POST /api/users`
pub async fn api_register_user(args: Arguments) -> Result<Reply, AppError> {
    let name = args.text("name");
    let email = args.text("email");
    let passwd = args.text("passwd");
    require_text("name", &name, "name cannot be empty.")?;
    validate_email(&email)?;
    validate_password_digest(&passwd)?;

    let state = args.state();
    if find_by_email(state, &email).await?.is_some() {
        return Err(ApiError::new("register:failed", "email", "Email is already in use.").into());
    }
    let uid = next_id();
    let image = format!("http://www.gravatar.com/avatar/{}?d=mm&s=120", sha256_hex(&email));
    let mut user = Record::new(state.schemas.get::<User>()?)
        .with("id", uid.as_str())?
        .with("name", name.trim())?
        .with("email", email.as_str())?
        .with("passwd", state.session.hash_password(&uid, &passwd))?
        .with("image", image)?;
    user.save(&state.db).await?;
    tracing::info!(uid = %uid, "registered user");
    signed_in(state, user)
}

/// `POST /api/authenticate`
pub async fn authenticate(args: Arguments) -> Result<Reply, AppError> {
    let email = args.text("email");
    let passwd = args.text("passwd");
    if email.is_empty() {
        return Err(ApiError::value("email", "Invalid email.").into());
    }
    if passwd.is_empty() {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    let state = args.state();
    let Some(user) = find_by_email(state, &email).await? else {
        return Err(ApiError::value("email", "Email not exist.").into());
    };
    let uid = user.get_str("id").unwrap_or_default();
    if user.get_str("passwd") != Some(state.session.hash_password(uid, &passwd).as_str()) {
        return Err(ApiError::value("passwd", "Invalid password.").into());
    }
    signed_in(state, user)
}

/// `GET /signout`
pub async fn signout(args: Arguments) -> Result<Reply, AppError> {
    let referer = args
        .request()
        .and_then(|r| r.header("referer"))
        .filter(|r| !r.is_empty())
        .unwrap_or("/")
        .to_string();
    let jar = CookieJar::new().add(args.state().session.removal_cookie());
    tracing::info!("user signed out");
    Ok(Reply::Response((jar, Reply::Redirect(referer)).into_response()))
}
