//! Map-backed entities described by data instead of Rust types.
//!
//! Schema files and command-line tools know tables only as [`TableSpec`]
//! records. [`DynamicEntity`] implements [`Entity`] on top of such a record,
//! storing field values in a map keyed by accessor name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::registry::{Entity, FieldSpec};
use crate::value::Value;

/// Serializable description of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    /// Statements run right after the table is created.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_create: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_create: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn on_create(mut self, statement: impl Into<String>) -> Self {
        self.on_create.push(statement.into());
        self
    }

    /// An empty entity of this table, suitable for registration.
    pub fn prototype(&self) -> Arc<dyn Entity> {
        Arc::new(self.entity())
    }

    /// An empty entity of this table; every field reads as `NULL`.
    pub fn entity(&self) -> DynamicEntity {
        DynamicEntity {
            spec: Arc::new(self.clone()),
            values: BTreeMap::new(),
        }
    }
}

/// Entity whose fields live in a map.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicEntity {
    spec: Arc<TableSpec>,
    values: BTreeMap<String, Value>,
}

impl DynamicEntity {
    /// Sets `field`, builder style. Unknown fields are ignored.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        if self.declares(field) {
            self.values.insert(field.to_string(), value.into());
        }
        self
    }

    /// Current value of `field`, if it was set.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn declares(&self, field: &str) -> bool {
        self.spec.fields.iter().any(|f| f.name == field)
    }
}

impl Entity for DynamicEntity {
    fn table_name(&self) -> &str {
        &self.spec.name
    }

    fn fields(&self) -> Vec<FieldSpec> {
        self.spec.fields.clone()
    }

    fn on_create(&self) -> Vec<String> {
        self.spec.on_create.clone()
    }

    fn get(&self, field: &str) -> Option<Value> {
        if !self.declares(field) {
            return None;
        }
        Some(self.values.get(field).cloned().unwrap_or_default())
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        if !self.declares(field) {
            return Err(Error::Validation(format!(
                "table '{}' has no field '{field}'",
                self.spec.name
            )));
        }
        self.values.insert(field.to_string(), value);
        Ok(())
    }
}
