//! Micro ORM: field descriptors, schema registry and records.

mod field;
mod record;
mod schema;

pub use field::{ColumnType, DefaultValue, FieldDescriptor};
pub use record::{FindAll, Limit, Record};
pub use schema::{Model, Schema, SchemaBuilder, SchemaRegistry};
