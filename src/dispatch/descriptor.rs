//! Dispatch descriptor: a handler's declared parameters and the argument resolution built on them.

use crate::error::{AppError, RouteError};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One declared handler parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    /// Filled by name from the path parameters.
    Positional(String),
    /// The live request context. At most one; it sits after the positional parameters and before any keyword parameter.
    Request,
    /// Keyword parameter. Required when it has no default.
    Named { name: String, default: Option<Value> },
    /// Accepts every extracted field.
    CatchAll,
}

impl Param {
    pub fn positional(name: &str) -> Self {
        Param::Positional(name.to_string())
    }

    pub fn request() -> Self {
        Param::Request
    }

    pub fn required(name: &str) -> Self {
        Param::Named {
            name: name.to_string(),
            default: None,
        }
    }

    pub fn optional(name: &str, default: impl Into<Value>) -> Self {
        Param::Named {
            name: name.to_string(),
            default: Some(default.into()),
        }
    }

    pub fn catch_all() -> Self {
        Param::CatchAll
    }

    fn name(&self) -> &str {
        match self {
            Param::Positional(name) | Param::Named { name, .. } => name,
            Param::Request => "request",
            Param::CatchAll => "**kw",
        }
    }
}

/// Validated parameter list of one handler.
#[derive(Clone, Debug)]
pub struct Signature {
    params: Vec<Param>,
    positional: Vec<String>,
    named: Vec<(String, Option<Value>)>,
    has_request: bool,
    has_catch_all: bool,
}

impl Signature {
    pub fn new(handler: &str, params: Vec<Param>) -> Result<Self, RouteError> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        let mut has_request = false;
        let mut has_catch_all = false;
        let mut seen_keyword = false;
        let mut seen = HashSet::new();
        for p in &params {
            match p {
                Param::Positional(name) => {
                    if has_request {
                        return Err(RouteError::RequestNotLast(handler.to_string()));
                    }
                    positional.push(name.clone());
                }
                Param::Request => {
                    if has_request {
                        return Err(RouteError::MultipleRequest(handler.to_string()));
                    }
                    if seen_keyword {
                        return Err(RouteError::RequestNotLast(handler.to_string()));
                    }
                    has_request = true;
                }
                Param::Named { name, default } => {
                    seen_keyword = true;
                    named.push((name.clone(), default.clone()));
                }
                Param::CatchAll => {
                    if has_catch_all {
                        return Err(RouteError::MultipleCatchAll(handler.to_string()));
                    }
                    seen_keyword = true;
                    has_catch_all = true;
                }
            }
            if matches!(p, Param::Positional(_) | Param::Named { .. }) && !seen.insert(p.name().to_string()) {
                return Err(RouteError::DuplicateParam {
                    handler: handler.to_string(),
                    param: p.name().to_string(),
                });
            }
        }
        Ok(Signature {
            params,
            positional,
            named,
            has_request,
            has_catch_all,
        })
    }

    pub fn has_request(&self) -> bool {
        self.has_request
    }

    /// Whether the request payload (body or query) must be extracted.
    pub fn needs_payload(&self) -> bool {
        self.has_catch_all || !self.named.is_empty()
    }

    /// Required names: positional parameters and named parameters without a default.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.positional.iter().map(String::as_str).chain(
            self.named
                .iter()
                .filter(|(_, default)| default.is_none())
                .map(|(name, _)| name.as_str()),
        )
    }

    /// Resolve the call arguments from the extracted payload and the path parameters.
    ///
    /// Without a catch-all, extracted fields are narrowed to the declared named parameters.
    /// Path parameters win over extracted fields of the same name.
    pub fn resolve(&self, extracted: Option<Map<String, Value>>, path: Map<String, Value>) -> Result<Map<String, Value>, AppError> {
        let mut kw = match extracted {
            None => path,
            Some(data) => {
                let mut kw = if !self.has_catch_all && !self.named.is_empty() {
                    data.into_iter()
                        .filter(|(k, _)| self.named.iter().any(|(name, _)| name == k))
                        .collect()
                } else {
                    data
                };
                for (k, v) in path {
                    if kw.contains_key(&k) {
                        tracing::warn!("duplicate arg name in named arg and path param: {}", k);
                    }
                    kw.insert(k, v);
                }
                kw
            }
        };
        if let Some(missing) = self.required().find(|name| !kw.contains_key(*name)) {
            return Err(AppError::MissingArgument(missing.to_string()));
        }
        for (name, default) in &self.named {
            if let Some(default) = default {
                if !kw.contains_key(name) {
                    kw.insert(name.clone(), default.clone());
                }
            }
        }
        Ok(kw)
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.params.iter().map(Param::name).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn request_must_precede_keyword_params_only() {
        assert!(Signature::new("h", vec![Param::positional("id"), Param::request(), Param::required("name")]).is_ok());
        assert_eq!(
            Signature::new("h", vec![Param::request(), Param::positional("id")]).unwrap_err(),
            RouteError::RequestNotLast("h".into())
        );
        assert_eq!(
            Signature::new("h", vec![Param::required("name"), Param::request()]).unwrap_err(),
            RouteError::RequestNotLast("h".into())
        );
        assert_eq!(
            Signature::new("h", vec![Param::catch_all(), Param::request()]).unwrap_err(),
            RouteError::RequestNotLast("h".into())
        );
        assert_eq!(
            Signature::new("h", vec![Param::request(), Param::request()]).unwrap_err(),
            RouteError::MultipleRequest("h".into())
        );
        assert_eq!(
            Signature::new("h", vec![Param::catch_all(), Param::catch_all()]).unwrap_err(),
            RouteError::MultipleCatchAll("h".into())
        );
        assert!(matches!(
            Signature::new("h", vec![Param::positional("id"), Param::required("id")]),
            Err(RouteError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn extras_are_dropped_without_catch_all() {
        let sig = Signature::new("h", vec![Param::required("name"), Param::optional("page", "1")]).unwrap();
        let kw = sig
            .resolve(Some(map(json!({"name": "a", "admin": true}))), Map::new())
            .unwrap();
        assert_eq!(Value::Object(kw), json!({"name": "a", "page": "1"}));
    }

    #[test]
    fn catch_all_keeps_everything() {
        let sig = Signature::new("h", vec![Param::required("name"), Param::catch_all()]).unwrap();
        let kw = sig.resolve(Some(map(json!({"name": "a", "x": 1}))), Map::new()).unwrap();
        assert_eq!(Value::Object(kw), json!({"name": "a", "x": 1}));
    }

    #[test]
    fn path_params_override_extracted_values() {
        let sig = Signature::new("h", vec![Param::positional("id"), Param::required("id2")]).unwrap();
        let kw = sig
            .resolve(
                Some(map(json!({"id2": "body"}))),
                map(json!({"id": "path", "id2": "path2"})),
            )
            .unwrap();
        assert_eq!(Value::Object(kw), json!({"id": "path", "id2": "path2"}));
    }

    #[test]
    fn nothing_extracted_falls_back_to_path_params() {
        let sig = Signature::new("h", vec![Param::positional("id"), Param::optional("page", "1")]).unwrap();
        let kw = sig.resolve(None, map(json!({"id": "7"}))).unwrap();
        assert_eq!(Value::Object(kw), json!({"id": "7", "page": "1"}));
    }

    #[test]
    fn missing_required_argument_is_reported_by_name() {
        let sig = Signature::new("h", vec![Param::required("email"), Param::required("passwd")]).unwrap();
        let err = sig.resolve(Some(map(json!({"email": "a@b.c"}))), Map::new()).unwrap_err();
        assert!(matches!(err, AppError::MissingArgument(ref n) if n == "passwd"));

        let err = sig.resolve(None, Map::new()).unwrap_err();
        assert!(matches!(err, AppError::MissingArgument(ref n) if n == "email"));
    }

    #[test]
    fn payload_needed_only_for_keyword_params() {
        assert!(!Signature::new("h", vec![Param::positional("id"), Param::request()]).unwrap().needs_payload());
        assert!(Signature::new("h", vec![Param::catch_all()]).unwrap().needs_payload());
    }
}
