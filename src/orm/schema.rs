//! Schema registry: per-model metadata and the SQL templates derived from it.

use crate::error::SchemaError;
use crate::orm::field::FieldDescriptor;
use crate::sql::{args_string, quoted};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A model type: declares its fields once; the registry turns the declaration into a [`Schema`].
pub trait Model: 'static {
    fn declare() -> SchemaBuilder;
}

/// Ordered field declaration for one model type.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    model: String,
    table: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    pub fn new(model: &str) -> Self {
        SchemaBuilder {
            model: model.to_string(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Explicit table name. Defaults to the model name.
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate the primary-key invariant and precompute the statement templates.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let table = self.table.unwrap_or_else(|| self.model.clone());
        tracing::info!(model = %self.model, table = %table, "found model");

        let mut primary_key: Option<String> = None;
        let mut fields = Vec::new();
        let mut mappings = HashMap::new();
        let mut declared = Vec::new();
        for f in self.fields {
            if mappings.contains_key(&f.attr) {
                return Err(SchemaError::DuplicateField {
                    model: self.model,
                    field: f.attr,
                });
            }
            tracing::info!("  found mapping: {} ==> {}", f.attr, f);
            if f.primary_key {
                if primary_key.is_some() {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        model: self.model,
                        field: f.attr,
                    });
                }
                primary_key = Some(f.attr.clone());
            } else {
                fields.push(f.attr.clone());
            }
            declared.push(f.attr.clone());
            mappings.insert(f.attr.clone(), f);
        }
        let primary_key = primary_key.ok_or_else(|| SchemaError::MissingPrimaryKey {
            model: self.model.clone(),
        })?;

        let column = |attr: &str| quoted(mappings[attr].column_name());
        let select_item = |attr: &str| {
            let col = mappings[attr].column_name();
            if col == attr {
                quoted(col)
            } else {
                format!("{} as {}", quoted(col), quoted(attr))
            }
        };
        let q_table = quoted(&table);
        let q_pk = column(&primary_key);

        let select_list: Vec<String> = std::iter::once(primary_key.as_str())
            .chain(fields.iter().map(String::as_str))
            .map(select_item)
            .collect();
        let insert_cols: Vec<String> = fields
            .iter()
            .map(|f| column(f))
            .chain(std::iter::once(q_pk.clone()))
            .collect();
        let sets: Vec<String> = fields.iter().map(|f| format!("{}=?", column(f))).collect();

        let select_sql = format!("select {} from {}", select_list.join(", "), q_table);
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            q_table,
            insert_cols.join(", "),
            args_string(fields.len() + 1)
        );
        let update_sql = format!("update {} set {} where {}=?", q_table, sets.join(", "), q_pk);
        let delete_sql = format!("delete from {} where {}=?", q_table, q_pk);

        Ok(Schema {
            model: self.model,
            table,
            primary_key,
            fields,
            declared,
            mappings,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }
}

/// Immutable per-model metadata. Built once, shared by every record of the model.
#[derive(Debug)]
pub struct Schema {
    model: String,
    table: String,
    primary_key: String,
    fields: Vec<String>,
    declared: Vec<String>,
    mappings: HashMap<String, FieldDescriptor>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl Schema {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary-key attribute name.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key attribute names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, attr: &str) -> Option<&FieldDescriptor> {
        self.mappings.get(attr)
    }

    pub fn primary_key_field(&self) -> &FieldDescriptor {
        &self.mappings[&self.primary_key]
    }

    /// Attribute for a result-set column (column name or attribute alias).
    pub fn attr_for_column(&self, column: &str) -> Option<&str> {
        if self.mappings.contains_key(column) {
            return Some(self.mappings[column].attr.as_str());
        }
        self.mappings
            .values()
            .find(|f| f.column_name() == column)
            .map(|f| f.attr.as_str())
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    /// Descriptive `create table` statement. Never executed by the ORM itself.
    pub fn ddl(&self) -> String {
        let cols: Vec<String> = self
            .declared
            .iter()
            .map(|attr| {
                let f = &self.mappings[attr];
                let not_null = if f.primary_key || f.default.is_some() { " not null" } else { "" };
                format!("{} {}{}", quoted(f.column_name()), f.column_type.ddl(), not_null)
            })
            .collect();
        format!(
            "create table {} ({}, primary key ({}))",
            quoted(&self.table),
            cols.join(", "),
            quoted(self.primary_key_field().column_name())
        )
    }
}

/// Process-wide mapping from model type to its schema. Each model registers exactly once.
#[derive(Default, Debug)]
pub struct SchemaRegistry {
    by_type: HashMap<TypeId, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            by_type: HashMap::new(),
        }
    }

    pub fn register<M: Model>(&mut self) -> Result<Arc<Schema>, SchemaError> {
        let id = TypeId::of::<M>();
        if self.by_type.contains_key(&id) {
            return Err(SchemaError::AlreadyRegistered(
                std::any::type_name::<M>().to_string(),
            ));
        }
        let schema = Arc::new(M::declare().build()?);
        self.by_type.insert(id, schema.clone());
        Ok(schema)
    }

    pub fn get<M: Model>(&self) -> Result<Arc<Schema>, SchemaError> {
        self.by_type
            .get(&TypeId::of::<M>())
            .cloned()
            .ok_or_else(|| SchemaError::Unregistered(std::any::type_name::<M>().to_string()))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.by_type.values()
    }
}
