//! Session cookie codec: `uid-expires-signature`, signed with a pluggable digest.

use crate::config::SessionConfig;
use crate::dispatch::RequestContext;
use crate::orm::{Record, Schema};
use crate::sql::Database;
use axum_extra::extract::cookie::Cookie;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hex digest function used for cookie signatures and stored passwords.
pub type DigestFn = fn(&str) -> String;

pub const MASKED_PASSWORD: &str = "******";

pub fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[derive(Clone)]
pub struct SessionCodec {
    secret: String,
    cookie_name: String,
    max_age: i64,
    digest: DigestFn,
}

impl SessionCodec {
    pub fn new(config: &SessionConfig) -> Self {
        SessionCodec {
            secret: config.secret.clone(),
            cookie_name: config.cookie_name.clone(),
            max_age: config.max_age,
            digest: sha256_hex,
        }
    }

    pub fn with_digest(mut self, digest: DigestFn) -> Self {
        self.digest = digest;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Stored form of a client-side password digest.
    pub fn hash_password(&self, uid: &str, passwd: &str) -> String {
        (self.digest)(&format!("{}:{}", uid, passwd))
    }

    fn signature(&self, uid: &str, passwd: &str, expires: i64) -> String {
        (self.digest)(&format!("{}-{}-{}-{}", uid, passwd, expires, self.secret))
    }

    /// Cookie value for `uid` with stored password `passwd`, valid until `now + max_age`.
    pub fn encode(&self, uid: &str, passwd: &str, now: i64) -> String {
        let expires = now + self.max_age;
        format!("{}-{}-{}", uid, expires, self.signature(uid, passwd, expires))
    }

    /// Split a cookie value into `(uid, expires, signature)`. Expired or malformed values yield `None`.
    pub fn split<'a>(&self, value: &'a str, now: i64) -> Option<(&'a str, i64, &'a str)> {
        let parts: Vec<&str> = value.split('-').collect();
        let [uid, expires, signature] = parts.as_slice() else {
            return None;
        };
        let expires: i64 = expires.parse().ok()?;
        if uid.is_empty() || expires < now {
            return None;
        }
        Some((*uid, expires, *signature))
    }

    pub fn verify(&self, uid: &str, passwd: &str, expires: i64, signature: &str) -> bool {
        self.signature(uid, passwd, expires) == signature
    }

    /// Load the signed-in user for a cookie value. Any rejection is "no user".
    pub async fn decode(&self, db: &Database, users: &Arc<Schema>, value: &str, now: i64) -> Option<Record> {
        let (uid, expires, signature) = self.split(value, now)?;
        let mut user = match Record::find(db, users, &Value::from(uid)).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "session user lookup failed");
                return None;
            }
        };
        let passwd = user.get_str("passwd").unwrap_or_default().to_string();
        if !self.verify(uid, &passwd, expires, signature) {
            tracing::info!("invalid session cookie signature");
            return None;
        }
        mask_password(&mut user);
        Some(user)
    }

    /// Session cookie for a freshly authenticated user.
    pub fn cookie(&self, uid: &str, passwd: &str, now: i64) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), self.encode(uid, passwd, now)))
            .path("/")
            .http_only(true)
            .max_age(time::Duration::seconds(self.max_age))
            .build()
    }

    /// Overwrites the session cookie with an immediately expiring placeholder.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), "-deleted-"))
            .path("/")
            .http_only(true)
            .max_age(time::Duration::ZERO)
            .build()
    }
}

pub fn mask_password(user: &mut Record) {
    user.replace("passwd", MASKED_PASSWORD);
}

/// Admin check for management actions: a signed-in user with the admin flag.
pub fn authorize(request: Option<&RequestContext>) -> bool {
    request
        .and_then(|r| r.user.as_ref())
        .and_then(|u| u.get("admin"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
