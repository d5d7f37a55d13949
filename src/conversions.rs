//! Type conversions between table definitions and AWS SDK DynamoDB types.

use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::types as sdk;

use crate::control_plane::{TableObservation, TableStatus};
use crate::errors::{ControlPlaneErrorKind, DdlError, Result};
use crate::table_operations::{
    AttributeDefinition, GlobalSecondaryIndex, KeyElement, KeyType, LocalSecondaryIndex,
    Projection, ProjectionType, ProvisionedThroughput, ScalarType,
};

fn build_error(what: &str, err: BuildError) -> DdlError {
    DdlError::control_plane(
        ControlPlaneErrorKind::Validation,
        format!("Failed to build {}: {}", what, err),
    )
}

// ========== TO SDK ==========

pub fn key_schema_to_sdk(key_schema: &[KeyElement]) -> Result<Vec<sdk::KeySchemaElement>> {
    key_schema
        .iter()
        .map(|key| {
            let key_type = match key.key_type {
                KeyType::Hash => sdk::KeyType::Hash,
                KeyType::Range => sdk::KeyType::Range,
            };
            sdk::KeySchemaElement::builder()
                .attribute_name(&key.attribute_name)
                .key_type(key_type)
                .build()
                .map_err(|e| build_error("key schema element", e))
        })
        .collect()
}

pub fn attribute_definitions_to_sdk(
    attributes: &[AttributeDefinition],
) -> Result<Vec<sdk::AttributeDefinition>> {
    attributes
        .iter()
        .map(|attr| {
            let attribute_type = match attr.attribute_type {
                ScalarType::S => sdk::ScalarAttributeType::S,
                ScalarType::N => sdk::ScalarAttributeType::N,
                ScalarType::B => sdk::ScalarAttributeType::B,
            };
            sdk::AttributeDefinition::builder()
                .attribute_name(&attr.attribute_name)
                .attribute_type(attribute_type)
                .build()
                .map_err(|e| build_error("attribute definition", e))
        })
        .collect()
}

pub fn projection_to_sdk(projection: &Projection) -> sdk::Projection {
    let projection_type = match projection.projection_type {
        ProjectionType::All => sdk::ProjectionType::All,
        ProjectionType::KeysOnly => sdk::ProjectionType::KeysOnly,
        ProjectionType::Include => sdk::ProjectionType::Include,
    };
    let non_key_attributes = (!projection.non_key_attributes.is_empty())
        .then(|| projection.non_key_attributes.clone());

    sdk::Projection::builder()
        .projection_type(projection_type)
        .set_non_key_attributes(non_key_attributes)
        .build()
}

pub fn throughput_to_sdk(throughput: &ProvisionedThroughput) -> Result<sdk::ProvisionedThroughput> {
    sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()
        .map_err(|e| build_error("provisioned throughput", e))
}

pub fn gsi_to_sdk(index: &GlobalSecondaryIndex) -> Result<sdk::GlobalSecondaryIndex> {
    let mut builder = sdk::GlobalSecondaryIndex::builder()
        .index_name(&index.index_name)
        .set_key_schema(Some(key_schema_to_sdk(&index.key_schema)?))
        .projection(projection_to_sdk(&index.projection));

    if let Some(throughput) = &index.provisioned_throughput {
        builder = builder.provisioned_throughput(throughput_to_sdk(throughput)?);
    }

    builder
        .build()
        .map_err(|e| build_error("global secondary index", e))
}

pub fn lsi_to_sdk(index: &LocalSecondaryIndex) -> Result<sdk::LocalSecondaryIndex> {
    sdk::LocalSecondaryIndex::builder()
        .index_name(&index.index_name)
        .set_key_schema(Some(key_schema_to_sdk(&index.key_schema)?))
        .projection(projection_to_sdk(&index.projection))
        .build()
        .map_err(|e| build_error("local secondary index", e))
}

// ========== FROM SDK ==========

/// Key types other than `HASH` and `RANGE` are rejected rather than guessed.
pub fn key_schema_from_sdk(key_schema: &[sdk::KeySchemaElement]) -> Result<Vec<KeyElement>> {
    key_schema
        .iter()
        .map(|key| {
            let key_type = match key.key_type() {
                sdk::KeyType::Hash => KeyType::Hash,
                sdk::KeyType::Range => KeyType::Range,
                other => {
                    return Err(DdlError::control_plane(
                        ControlPlaneErrorKind::Other,
                        format!(
                            "Unknown key type '{}' for attribute '{}'",
                            other.as_str(),
                            key.attribute_name()
                        ),
                    ));
                }
            };
            Ok(KeyElement {
                attribute_name: key.attribute_name().to_string(),
                key_type,
            })
        })
        .collect()
}

/// A missing projection is read as `ALL`.
pub fn projection_from_sdk(projection: Option<&sdk::Projection>) -> Projection {
    let Some(projection) = projection else {
        return Projection::all();
    };

    let projection_type = match projection.projection_type() {
        Some(sdk::ProjectionType::KeysOnly) => ProjectionType::KeysOnly,
        Some(sdk::ProjectionType::Include) => ProjectionType::Include,
        _ => ProjectionType::All,
    };

    Projection {
        projection_type,
        non_key_attributes: projection.non_key_attributes().to_vec(),
    }
}

pub fn gsi_from_sdk(index: &sdk::GlobalSecondaryIndexDescription) -> Result<GlobalSecondaryIndex> {
    let provisioned_throughput = index.provisioned_throughput().and_then(|pt| {
        Some(ProvisionedThroughput::new(
            pt.read_capacity_units()?,
            pt.write_capacity_units()?,
        ))
    });

    Ok(GlobalSecondaryIndex {
        index_name: index.index_name().unwrap_or_default().to_string(),
        key_schema: key_schema_from_sdk(index.key_schema())?,
        projection: projection_from_sdk(index.projection()),
        provisioned_throughput,
    })
}

pub fn lsi_from_sdk(index: &sdk::LocalSecondaryIndexDescription) -> Result<LocalSecondaryIndex> {
    Ok(LocalSecondaryIndex {
        index_name: index.index_name().unwrap_or_default().to_string(),
        key_schema: key_schema_from_sdk(index.key_schema())?,
        projection: projection_from_sdk(index.projection()),
    })
}

/// Snapshot a `DescribeTable` result.
///
/// Keeps the difference between "no indexes reported" (`None`) and an
/// empty index list.
pub fn observation_from_sdk(
    table_name: &str,
    table: &sdk::TableDescription,
) -> Result<TableObservation> {
    Ok(TableObservation {
        table_name: table.table_name().unwrap_or(table_name).to_string(),
        status: table
            .table_status()
            .map(|s| TableStatus::parse(s.as_str()))
            .unwrap_or_else(|| TableStatus::Other("UNKNOWN".to_string())),
        key_schema: key_schema_from_sdk(table.key_schema())?,
        global_secondary_indexes: table
            .global_secondary_indexes
            .as_ref()
            .map(|indexes| indexes.iter().map(gsi_from_sdk).collect::<Result<Vec<_>>>())
            .transpose()?,
        local_secondary_indexes: table
            .local_secondary_indexes
            .as_ref()
            .map(|indexes| indexes.iter().map(lsi_from_sdk).collect::<Result<Vec<_>>>())
            .transpose()?,
    })
}
