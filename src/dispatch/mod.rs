//! Signature-driven request dispatch.

mod args;
mod descriptor;
mod extract;
mod router;

pub use args::{Arguments, Reply, RequestContext};
pub use descriptor::{Param, Signature};
pub use extract::{extract_payload, is_body_method, is_query_method, parse_form, BODY_LIMIT};
pub use router::{BoxHandler, Dispatcher, HandlerFuture};
