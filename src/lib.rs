//! Blog backend library: schema-driven micro ORM, signature-driven request dispatch and the JSON API built on them.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod orm;
pub mod page;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::AppConfig;
pub use dispatch::{Arguments, Dispatcher, Param, Reply, RequestContext};
pub use error::{ApiError, AppError, ConfigError, RouteError, SchemaError};
pub use orm::{FieldDescriptor, FindAll, Limit, Model, Record, Schema, SchemaBuilder, SchemaRegistry};
pub use page::Page;
pub use routes::{api_dispatcher, app, common_routes};
pub use sql::Database;
pub use state::AppState;
