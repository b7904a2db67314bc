//! Partial updates to a work item.

use super::{ItemStatus, ItemType};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Field names accepted in an update.
pub const PATCH_FIELDS: [&str; 6] = [
    "title",
    "description",
    "status",
    "type",
    "parent_id",
    "order_index",
];

/// A partial field update for a work item.
///
/// `None` leaves a field untouched. `parent_id` is doubly optional:
/// `Some(None)` moves the item to the top level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub item_type: Option<ItemType>,
    pub parent_id: Option<Option<i64>>,
    pub order_index: Option<f64>,
}

impl WorkItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn parent_id(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn order_index(mut self, order_index: f64) -> Self {
        self.order_index = Some(order_index);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Names of the fields this patch sets, in canonical order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.item_type.is_some() {
            fields.push("type");
        }
        if self.parent_id.is_some() {
            fields.push("parent_id");
        }
        if self.order_index.is_some() {
            fields.push("order_index");
        }
        fields
    }

    /// Whether the patch touches the item's position in the hierarchy.
    pub fn changes_structure(&self) -> bool {
        self.item_type.is_some() || self.parent_id.is_some()
    }

    /// Parse an untyped JSON object into a patch.
    ///
    /// Rejects unknown keys, values of the wrong JSON type, and any attempt
    /// to move the item to another project.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            Error::Validation("Update patch must be a JSON object".to_string())
        })?;
        Self::from_map(map)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut patch = Self::new();

        for (field, value) in map {
            match field.as_str() {
                "title" => patch.title = Some(expect_string(field, value)?),
                "description" => patch.description = Some(expect_string(field, value)?),
                "status" => patch.status = Some(expect_string(field, value)?.parse()?),
                "type" => patch.item_type = Some(expect_string(field, value)?.parse()?),
                "parent_id" => {
                    patch.parent_id = Some(match value {
                        Value::Null => None,
                        _ => Some(value.as_i64().ok_or_else(|| wrong_type(field, "an integer or null", value))?),
                    })
                }
                "order_index" => {
                    patch.order_index =
                        Some(value.as_f64().ok_or_else(|| wrong_type(field, "a number", value))?)
                }
                "project_id" => {
                    return Err(Error::Isolation(
                        "Cannot change project_id - this would break project isolation"
                            .to_string(),
                    ));
                }
                other => {
                    return Err(Error::Validation(format!(
                        "Invalid field '{}'. Valid fields: {}",
                        other,
                        PATCH_FIELDS.join(", ")
                    )));
                }
            }
        }

        Ok(patch)
    }
}

fn expect_string(field: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(field, "a string", value))
}

fn wrong_type(field: &str, expected: &str, value: &Value) -> Error {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Error::Validation(format!("Field '{}' must be {}, got {}", field, expected, actual))
}
