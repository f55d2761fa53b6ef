//! Blog application models: users, blogs and comments.

use crate::error::SchemaError;
use crate::orm::{FieldDescriptor, Model, SchemaBuilder, SchemaRegistry};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

/// 50-char sortable id: 15-digit epoch millis, 32 random hex chars, "000".
pub fn next_id() -> String {
    format!("{:015}{}000", Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}

/// Current time as fractional epoch seconds.
pub fn now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn id_default() -> Value {
    Value::from(next_id())
}

fn now_default() -> Value {
    Value::from(now())
}

fn id_field() -> FieldDescriptor {
    FieldDescriptor::string("id").varchar(50).primary_key().default_with(id_default)
}

fn created_at_field() -> FieldDescriptor {
    FieldDescriptor::real("created_at").default_with(now_default)
}

pub struct User;

impl Model for User {
    fn declare() -> SchemaBuilder {
        SchemaBuilder::new("User")
            .table("users")
            .field(id_field())
            .field(FieldDescriptor::string("email").varchar(50))
            .field(FieldDescriptor::string("passwd").varchar(50))
            .field(FieldDescriptor::boolean("admin"))
            .field(FieldDescriptor::string("name").varchar(50))
            .field(FieldDescriptor::string("image").varchar(500))
            .field(created_at_field())
    }
}

pub struct Blog;

impl Model for Blog {
    fn declare() -> SchemaBuilder {
        SchemaBuilder::new("Blog")
            .table("blogs")
            .field(id_field())
            .field(FieldDescriptor::string("user_id").varchar(50))
            .field(FieldDescriptor::string("user_name").varchar(50))
            .field(FieldDescriptor::string("user_image").varchar(500))
            .field(FieldDescriptor::string("name").varchar(50))
            .field(FieldDescriptor::string("summary").varchar(200))
            .field(FieldDescriptor::text("content"))
            .field(created_at_field())
    }
}

pub struct Comment;

impl Model for Comment {
    fn declare() -> SchemaBuilder {
        SchemaBuilder::new("Comment")
            .table("comments")
            .field(id_field())
            .field(FieldDescriptor::string("blog_id").varchar(50))
            .field(FieldDescriptor::string("user_id").varchar(50))
            .field(FieldDescriptor::string("user_name").varchar(50))
            .field(FieldDescriptor::string("user_image").varchar(500))
            .field(FieldDescriptor::text("content"))
            .field(created_at_field())
    }
}

/// Registry with every application model registered.
pub fn registry() -> Result<SchemaRegistry, SchemaError> {
    let mut registry = SchemaRegistry::new();
    registry.register::<User>()?;
    registry.register::<Blog>()?;
    registry.register::<Comment>()?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fifty_chars_and_sortable() {
        let a = next_id();
        assert_eq!(a.len(), 50);
        assert!(a.ends_with("000"));
        assert!(a[..15].chars().all(|c| c.is_ascii_digit()));
        let b = next_id();
        assert!(a[..15] <= b[..15]);
    }

    #[test]
    fn registry_knows_all_models() {
        let registry = registry().unwrap();
        assert_eq!(registry.get::<User>().unwrap().table(), "users");
        assert_eq!(registry.get::<Blog>().unwrap().fields().len(), 7);
        assert_eq!(registry.get::<Comment>().unwrap().primary_key(), "id");
    }
}
