//! Record types declared in TOML.
//!
//! ```toml
//! root = "Order"
//!
//! [types.Order]
//! num = "int"
//! value = "int?"
//! items = "Item[]"
//!
//! [types.Item]
//! name = "string"
//! ```
//!
//! Field types are `bool`, `int`, `long`, `double`, `string`, `datetime`,
//! `object` or another record name, with any number of `?` and `[]`
//! suffixes. A `base` key names the base record. Record references must not
//! form a cycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use sift_typeck::{RecordType, Type};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid schema: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown type `{name}` in `{owner}`")]
    UnknownType { name: String, owner: String },
    #[error("`{text}` is not a type (in `{owner}`)")]
    InvalidType { text: String, owner: String },
    #[error("record `{name}` refers to itself")]
    Cycle { name: String },
    #[error("base of `{owner}` must be a record, found `{base}`")]
    InvalidBase { base: String, owner: String },
    #[error("schema declares no root type")]
    NoRoot,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    root: Option<String>,
    #[serde(default)]
    types: BTreeMap<String, BTreeMap<String, String>>,
}

/// A set of record types, one of which may be the query root.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    records: Vec<Arc<RecordType>>,
    root: Option<Type>,
}

impl Schema {
    pub fn from_toml_str(content: &str) -> Result<Schema, SchemaError> {
        let raw: RawSchema = toml::from_str(content)?;
        let mut builder = Builder {
            raw: &raw.types,
            built: FxHashMap::default(),
            visiting: Vec::new(),
        };
        let mut records = Vec::with_capacity(raw.types.len());
        for name in raw.types.keys() {
            records.push(builder.record(name, name)?);
        }
        let root = match &raw.root {
            Some(text) => Some(builder.parse_type(text, "root")?),
            None => None,
        };
        tracing::debug!(records = records.len(), "loaded schema");
        Ok(Schema { records, root })
    }

    pub fn load(path: &Path) -> Result<Schema, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The declared root type.
    pub fn root(&self) -> Result<Type, SchemaError> {
        self.root.clone().ok_or(SchemaError::NoRoot)
    }

    /// Look a record up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<Type> {
        self.records
            .iter()
            .find(|record| record.name.eq_ignore_ascii_case(name))
            .map(|record| Type::Record(record.clone()))
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.records.iter()
    }
}

struct Builder<'a> {
    raw: &'a BTreeMap<String, BTreeMap<String, String>>,
    /// Finished records by lowercased name.
    built: FxHashMap<String, Arc<RecordType>>,
    visiting: Vec<String>,
}

impl Builder<'_> {
    fn record(&mut self, name: &str, owner: &str) -> Result<Arc<RecordType>, SchemaError> {
        let key = name.to_lowercase();
        if let Some(record) = self.built.get(&key) {
            return Ok(record.clone());
        }
        let raw = self.raw;
        let Some((declared, fields)) = raw.iter().find(|(n, _)| n.eq_ignore_ascii_case(name))
        else {
            return Err(SchemaError::UnknownType {
                name: name.to_string(),
                owner: owner.to_string(),
            });
        };
        if self.visiting.contains(&key) {
            return Err(SchemaError::Cycle {
                name: declared.clone(),
            });
        }
        self.visiting.push(key.clone());

        let mut record = RecordType::new(declared);
        for (field, text) in fields {
            if field == "base" {
                let Type::Record(base) = self.parse_type(text, declared)? else {
                    return Err(SchemaError::InvalidBase {
                        base: text.clone(),
                        owner: declared.clone(),
                    });
                };
                record = record.with_base(base);
            } else {
                let ty = self.parse_type(text, declared)?;
                record = record.with_field(field, ty);
            }
        }

        self.visiting.pop();
        let record = Arc::new(record);
        self.built.insert(key, record.clone());
        Ok(record)
    }

    fn parse_type(&mut self, text: &str, owner: &str) -> Result<Type, SchemaError> {
        let text = text.trim();
        if let Some(elem) = text.strip_suffix("[]") {
            return Ok(Type::array(self.parse_type(elem, owner)?));
        }
        if let Some(inner) = text.strip_suffix('?') {
            return Ok(Type::nullable(self.parse_type(inner, owner)?));
        }
        let ty = match text {
            "bool" => Type::Bool,
            "int" => Type::Int32,
            "long" => Type::Int64,
            "double" => Type::Double,
            "string" => Type::String,
            "datetime" => Type::DateTimeOffset,
            "object" => Type::Object,
            name if is_name(name) => Type::Record(self.record(name, owner)?),
            _ => {
                return Err(SchemaError::InvalidType {
                    text: text.to_string(),
                    owner: owner.to_string(),
                })
            }
        };
        Ok(ty)
    }
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = r#"
root = "Order"

[types.Entity]
id = "long"

[types.Order]
base = "Entity"
num = "int"
value = "int?"
placed = "datetime"
tags = "string[]"
items = "Item[]"

[types.Item]
name = "string"
qty = "int"
"#;

    #[test]
    fn parse_records_and_root() {
        let schema = Schema::from_toml_str(ORDERS).unwrap();
        let Type::Record(order) = schema.root().unwrap() else {
            panic!("root is not a record");
        };
        assert_eq!(&*order.name, "Order");
        assert_eq!(order.find_field("VALUE").unwrap().ty, Type::nullable(Type::Int32));
        assert_eq!(order.find_field("tags").unwrap().ty.to_string(), "string[]");
        assert_eq!(order.find_field("items").unwrap().ty.to_string(), "Item[]");
        // Inherited through the base record.
        assert_eq!(order.find_field("id").unwrap().ty, Type::Int64);
        assert_eq!(schema.records().count(), 3);
        assert!(schema.get("item").is_some());
    }

    #[test]
    fn unknown_and_malformed_types() {
        let err = Schema::from_toml_str("[types.A]\nb = \"Missing\"\n").unwrap_err();
        assert_eq!(err.to_string(), "unknown type `Missing` in `A`");
        let err = Schema::from_toml_str("[types.A]\nb = \"int<3>\"\n").unwrap_err();
        assert_eq!(err.to_string(), "`int<3>` is not a type (in `A`)");
        let err = Schema::from_toml_str("[types.A]\nbase = \"int\"\n").unwrap_err();
        assert_eq!(err.to_string(), "base of `A` must be a record, found `int`");
    }

    #[test]
    fn cycles_are_rejected() {
        let toml = "[types.A]\nb = \"B\"\n\n[types.B]\na = \"A[]\"\n";
        let err = Schema::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, SchemaError::Cycle { .. }), "{err}");
    }

    #[test]
    fn root_is_optional_until_asked_for() {
        let schema = Schema::from_toml_str("[types.A]\nx = \"int\"\n").unwrap();
        assert!(matches!(schema.root(), Err(SchemaError::NoRoot)));
        let schema = Schema::from_toml_str("root = \"int[]\"\n").unwrap();
        assert_eq!(schema.root().unwrap(), Type::array(Type::Int32));
    }
}
