//! Domain models passed between the record store, the filter, the form
//! bridge, and the terminal shell. Students and teachers share one `Record`
//! shape; what differs between them (labels, resource path, the name and
//! allowed values of the category field) lives in `KindConfig`.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Record identifier. Ids handed out by the API are kept exactly as
/// received; ids issued locally by the store are always numeric. Immutable
/// for the record's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Num(u64),
    Text(String),
}

impl RecordId {
    pub const fn new(value: u64) -> Self {
        RecordId::Num(value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        RecordId::Text(value.into())
    }

    /// The numeric value, when the id is a number.
    pub fn number(&self) -> Option<u64> {
        match self {
            RecordId::Num(value) => Some(*value),
            RecordId::Text(_) => None,
        }
    }

    fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Number(number) => number
                .as_u64()
                .map(RecordId::Num)
                .ok_or_else(|| format!("id {number} is not a non-negative integer")),
            Value::String(text) if !text.is_empty() => Ok(RecordId::Text(text.clone())),
            Value::String(_) => Err("id must not be empty".to_string()),
            _ => Err("id must be a number or a string".to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(value) => write!(f, "{value}"),
            RecordId::Text(text) => f.write_str(text),
        }
    }
}

/// The two record kinds managed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Student,
    Teacher,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Student, EntityKind::Teacher];

    /// Built-in configuration used when no config file overrides it.
    pub fn default_config(self) -> KindConfig {
        match self {
            EntityKind::Student => KindConfig {
                kind: self,
                singular: "Student".to_string(),
                plural: "Students".to_string(),
                resource: "students".to_string(),
                category_field: "group".to_string(),
                category_label: "Group".to_string(),
                categories: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            },
            EntityKind::Teacher => KindConfig {
                kind: self,
                singular: "Teacher".to_string(),
                plural: "Teachers".to_string(),
                resource: "teachers".to_string(),
                category_field: "level".to_string(),
                category_label: "Level".to_string(),
                categories: vec![
                    "Junior".to_string(),
                    "Middle".to_string(),
                    "Senior".to_string(),
                ],
            },
        }
    }
}

/// Per-kind configuration: display labels, where the records come from, and
/// which classification values are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KindConfig {
    pub kind: EntityKind,
    pub singular: String,
    pub plural: String,
    /// Path segment appended to the API base URL, e.g. `students`.
    pub resource: String,
    /// JSON key holding the category (`group` or `level`).
    pub category_field: String,
    pub category_label: String,
    pub categories: Vec<String>,
}

impl KindConfig {
    pub fn allows_category(&self, value: &str) -> bool {
        self.categories.iter().any(|category| category == value)
    }

    /// Lowercase noun used inside sentences ("students").
    pub fn plural_noun(&self) -> String {
        self.plural.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A student or teacher as held by the store.
pub struct Record {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// Group for students, level for teachers.
    pub category: String,
}

impl Record {
    /// `First Last`, the text the search box matches against.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Decode one entity object. The category is read from the key named by
    /// `config.category_field` and must be one of the configured values.
    pub fn from_json(value: &Value, config: &KindConfig) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected a JSON object".to_string())?;

        let raw_id = object
            .get("id")
            .ok_or_else(|| "missing field 'id'".to_string())?;
        let id = RecordId::from_json(raw_id)?;

        let first_name = text_field(object, "firstName")?;
        let last_name = text_field(object, "lastName")?;
        let category = text_field(object, &config.category_field)?;
        if !config.allows_category(&category) {
            return Err(format!(
                "record {id} has unknown {} '{category}'",
                config.category_field
            ));
        }

        Ok(Record {
            id,
            first_name,
            last_name,
            category,
        })
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Result<String, String> {
    match object.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(format!("field '{key}' must be a string")),
        None => Err(format!("missing field '{key}'")),
    }
}

/// Complete set of mutable fields, as produced by a validated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub first_name: String,
    pub last_name: String,
    pub category: String,
}

/// Field-level changes for `RecordStore::update`. `None` keeps the stored
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub category: Option<String>,
}

impl RecordPatch {
    pub fn apply_to(self, record: &mut Record) {
        if let Some(first_name) = self.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            record.last_name = last_name;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
    }
}

impl From<RecordFields> for RecordPatch {
    fn from(fields: RecordFields) -> Self {
        Self {
            first_name: Some(fields.first_name),
            last_name: Some(fields.last_name),
            category: Some(fields.category),
        }
    }
}
