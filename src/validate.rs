//! Compare a live table against the expected definition.
//!
//! Two independent checks:
//! - key schema: ordered sequence equality
//! - global secondary indexes: set equality over name, key schema and
//!   projection. Throughput is ignored. Skipped when the entity declares
//!   no global secondary indexes.

use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::control_plane::TableObservation;
use crate::table_operations::{
    GlobalSecondaryIndex, KeyElement, ProjectionType, TableDefinition, format_key_schema,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchemaMismatch {
    pub expected: Vec<KeyElement>,
    pub actual: Vec<KeyElement>,
}

impl fmt::Display for KeySchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeySchema is not as expected. Expected: <{}> but found <{}>",
            format_key_schema(&self.expected),
            format_key_schema(&self.actual)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMismatch {
    pub expected: Vec<GlobalSecondaryIndex>,
    /// `None` when the store reported no indexes at all.
    pub actual: Option<Vec<GlobalSecondaryIndex>>,
}

impl fmt::Display for IndexMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actual = match &self.actual {
            Some(indexes) => format_indexes(indexes),
            None => "none".to_string(),
        };
        write!(
            f,
            "Global Secondary Indexes are not as expected. Expected: <{}> but found <{}>",
            format_indexes(&self.expected),
            actual
        )
    }
}

/// Every check that failed, with both snapshots verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchDetail {
    pub key_schema: Option<KeySchemaMismatch>,
    pub global_secondary_indexes: Option<IndexMismatch>,
}

impl fmt::Display for MismatchDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(k) = &self.key_schema {
            parts.push(k.to_string());
        }
        if let Some(i) = &self.global_secondary_indexes {
            parts.push(i.to_string());
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for MismatchDetail {}

/// Check `actual` against `expected`. Read-only.
pub fn validate(
    expected: &TableDefinition,
    actual: &TableObservation,
) -> Result<(), MismatchDetail> {
    let key_schema = if expected.key_schema == actual.key_schema {
        debug!("KeySchema is valid");
        None
    } else {
        Some(KeySchemaMismatch {
            expected: expected.key_schema.clone(),
            actual: actual.key_schema.clone(),
        })
    };

    let global_secondary_indexes = match &expected.global_secondary_indexes {
        Some(expected_indexes) => {
            let actual_indexes = actual.global_secondary_indexes.as_deref().unwrap_or_default();
            if canonical(expected_indexes) == canonical(actual_indexes) {
                debug!("Global Secondary Indexes are valid");
                None
            } else {
                Some(IndexMismatch {
                    expected: expected_indexes.clone(),
                    actual: actual.global_secondary_indexes.clone(),
                })
            }
        }
        None => None,
    };

    if key_schema.is_none() && global_secondary_indexes.is_none() {
        Ok(())
    } else {
        Err(MismatchDetail {
            key_schema,
            global_secondary_indexes,
        })
    }
}

type IndexSnapshot<'a> = (&'a str, &'a [KeyElement], ProjectionType, BTreeSet<&'a str>);

fn canonical(indexes: &[GlobalSecondaryIndex]) -> BTreeSet<IndexSnapshot<'_>> {
    indexes
        .iter()
        .map(|index| {
            (
                index.index_name.as_str(),
                index.key_schema.as_slice(),
                index.projection.projection_type,
                index
                    .projection
                    .non_key_attributes
                    .iter()
                    .map(String::as_str)
                    .collect(),
            )
        })
        .collect()
}

fn format_indexes(indexes: &[GlobalSecondaryIndex]) -> String {
    let parts: Vec<String> = indexes.iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
