//! Signed-in user from the session cookie.

use crate::models::User;
use crate::orm::Record;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use chrono::Utc;

/// Extractor for the user named by a valid session cookie. Never rejects.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<Record>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(state.session.cookie_name()) else {
            return Ok(CurrentUser(None));
        };
        let Ok(users) = state.schemas.get::<User>() else {
            return Ok(CurrentUser(None));
        };
        let user = state
            .session
            .decode(&state.db, &users, cookie.value(), Utc::now().timestamp())
            .await;
        if let Some(u) = &user {
            tracing::debug!(user = u.get_str("email").unwrap_or_default(), "set current user");
        }
        Ok(CurrentUser(user))
    }
}
