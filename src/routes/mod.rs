mod api;
mod common;

pub use api::{api_dispatcher, app};
pub use common::common_routes;
