//! Table definition value types.
//!
//! These mirror the shape of a DynamoDB `CreateTable` request, but as plain
//! owned values with structural equality so they can be compared against
//! what the store reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DdlError;

/// Role of an attribute inside a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Hash => "HASH",
            KeyType::Range => "RANGE",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{attribute, role}` pair of a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

impl KeyElement {
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

impl fmt::Display for KeyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.attribute_name, self.key_type)
    }
}

/// Render a key schema as `[{id,HASH}, {ts,RANGE}]`.
pub fn format_key_schema(key_schema: &[KeyElement]) -> String {
    let parts: Vec<String> = key_schema.iter().map(|k| k.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// String
    S,
    /// Number
    N,
    /// Binary
    B,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::S => "S",
            ScalarType::N => "N",
            ScalarType::B => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarType,
}

/// Which attributes an index makes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectionType {
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "KEYS_ONLY")]
    KeysOnly,
    #[serde(rename = "INCLUDE")]
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::All => "ALL",
            ProjectionType::KeysOnly => "KEYS_ONLY",
            ProjectionType::Include => "INCLUDE",
        }
    }
}

impl FromStr for ProjectionType {
    type Err = DdlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(ProjectionType::All),
            "KEYS_ONLY" => Ok(ProjectionType::KeysOnly),
            "INCLUDE" => Ok(ProjectionType::Include),
            _ => Err(DdlError::configuration(format!(
                "{} is not a valid projection type! Use ALL, KEYS_ONLY or INCLUDE",
                s
            ))),
        }
    }
}

impl fmt::Display for ProjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection {
    pub projection_type: ProjectionType,
    /// Only meaningful for `INCLUDE`.
    pub non_key_attributes: Vec<String>,
}

impl Projection {
    pub fn all() -> Self {
        Self::of(ProjectionType::All)
    }

    pub fn keys_only() -> Self {
        Self::of(ProjectionType::KeysOnly)
    }

    pub fn include<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            projection_type: ProjectionType::Include,
            non_key_attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn of(projection_type: ProjectionType) -> Self {
        Self {
            projection_type,
            non_key_attributes: Vec::new(),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.non_key_attributes.is_empty() {
            f.write_str(self.projection_type.as_str())
        } else {
            write!(
                f,
                "{}({})",
                self.projection_type,
                self.non_key_attributes.join(",")
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl ProvisionedThroughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeyElement>,
    pub projection: Projection,
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

impl fmt::Display for GlobalSecondaryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}: {} {}}}",
            self.index_name,
            format_key_schema(&self.key_schema),
            self.projection
        )
    }
}

/// Local secondary index: same partition key as the table, different sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeyElement>,
    pub projection: Projection,
}

/// Everything needed to create one table.
///
/// Built by [`TableDefinitionBuilder`](super::TableDefinitionBuilder) and
/// treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeyElement>,
    /// `None` when the entity declares no global secondary indexes.
    pub global_secondary_indexes: Option<Vec<GlobalSecondaryIndex>>,
    pub local_secondary_indexes: Option<Vec<LocalSecondaryIndex>>,
    pub provisioned_throughput: ProvisionedThroughput,
}

/// Everything needed to delete one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTableDefinition {
    pub table_name: String,
}
