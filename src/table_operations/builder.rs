//! Derive table definitions from entity descriptors.

use crate::entity::{EntityDescriptor, KeyAttribute};
use crate::errors::{DdlError, Result};
use crate::mapper_config::{MapperConfig, TableNameOverride};

use super::definition::{
    AttributeDefinition, DeleteTableDefinition, GlobalSecondaryIndex, KeyElement,
    LocalSecondaryIndex, Projection, ProvisionedThroughput, TableDefinition,
};
use crate::config::DdlSettings;

/// Builds create and delete definitions for entities.
///
/// Every global secondary index gets the same projection and the same
/// throughput as the base table, both taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinitionBuilder {
    throughput: ProvisionedThroughput,
    gsi_projection: Projection,
    table_name_override: Option<TableNameOverride>,
}

impl TableDefinitionBuilder {
    pub fn new(settings: &DdlSettings) -> Self {
        Self {
            throughput: settings.throughput(),
            gsi_projection: settings.projection(),
            table_name_override: None,
        }
    }

    /// Use the table name override of a mapper configuration.
    pub fn with_mapper_config(mut self, config: &MapperConfig) -> Self {
        self.table_name_override = config.table_name_override.clone();
        self
    }

    /// Build the create definition for `descriptor`.
    ///
    /// Fails with [`DdlError::InvalidSchema`] when the entity has no hash key.
    pub fn build(&self, descriptor: &EntityDescriptor) -> Result<TableDefinition> {
        let (table_name, key_schema) = self.derive_keys(descriptor)?;

        let mut attributes = AttributeCollector::new(descriptor.domain_type());
        if let Some(hash) = descriptor.hash_key() {
            attributes.add(hash)?;
        }
        if let Some(range) = descriptor.range_key() {
            attributes.add(range)?;
        }

        let mut global_indexes = Vec::with_capacity(descriptor.global_indexes().len());
        for index in descriptor.global_indexes() {
            let hash = index.hash_key.as_ref().ok_or_else(|| {
                DdlError::invalid_schema(
                    descriptor.domain_type(),
                    format!("global secondary index '{}' declares no hash key", index.name),
                )
            })?;
            let mut index_keys = vec![KeyElement::hash(&hash.name)];
            attributes.add(hash)?;
            if let Some(range) = &index.range_key {
                index_keys.push(KeyElement::range(&range.name));
                attributes.add(range)?;
            }

            global_indexes.push(GlobalSecondaryIndex {
                index_name: index.name.clone(),
                key_schema: index_keys,
                projection: self.gsi_projection.clone(),
                provisioned_throughput: Some(self.throughput),
            });
        }

        let mut local_indexes = Vec::with_capacity(descriptor.local_indexes().len());
        for index in descriptor.local_indexes() {
            attributes.add(&index.range_key)?;
            local_indexes.push(LocalSecondaryIndex {
                index_name: index.name.clone(),
                key_schema: vec![
                    key_schema[0].clone(),
                    KeyElement::range(&index.range_key.name),
                ],
                projection: index.projection.clone(),
            });
        }

        Ok(TableDefinition {
            table_name,
            attribute_definitions: attributes.finish(),
            key_schema,
            global_secondary_indexes: (!global_indexes.is_empty()).then_some(global_indexes),
            local_secondary_indexes: (!local_indexes.is_empty()).then_some(local_indexes),
            provisioned_throughput: self.throughput,
        })
    }

    /// Build the delete definition for `descriptor`.
    ///
    /// Uses the same derivation as [`build`](Self::build), so both name the same table.
    pub fn build_delete(&self, descriptor: &EntityDescriptor) -> Result<DeleteTableDefinition> {
        let (table_name, _) = self.derive_keys(descriptor)?;
        Ok(DeleteTableDefinition { table_name })
    }

    fn derive_keys(&self, descriptor: &EntityDescriptor) -> Result<(String, Vec<KeyElement>)> {
        let hash = descriptor.hash_key().ok_or_else(|| {
            DdlError::invalid_schema(descriptor.domain_type(), "no hash key declared")
        })?;

        let mut key_schema = vec![KeyElement::hash(&hash.name)];
        if let Some(range) = descriptor.range_key() {
            key_schema.push(KeyElement::range(&range.name));
        }

        let table_name = match &self.table_name_override {
            Some(o) => o.apply(descriptor.table_name()),
            None => descriptor.table_name().to_string(),
        };

        Ok((table_name, key_schema))
    }
}

/// Collects attribute definitions in first-use order, one per name.
struct AttributeCollector<'a> {
    domain_type: &'a str,
    definitions: Vec<AttributeDefinition>,
}

impl<'a> AttributeCollector<'a> {
    fn new(domain_type: &'a str) -> Self {
        Self {
            domain_type,
            definitions: Vec::new(),
        }
    }

    fn add(&mut self, attribute: &KeyAttribute) -> Result<()> {
        match self
            .definitions
            .iter()
            .find(|d| d.attribute_name == attribute.name)
        {
            Some(existing) if existing.attribute_type != attribute.scalar_type => {
                Err(DdlError::invalid_schema(
                    self.domain_type,
                    format!(
                        "attribute '{}' is used as both {} and {}",
                        attribute.name,
                        existing.attribute_type.as_str(),
                        attribute.scalar_type.as_str()
                    ),
                ))
            }
            Some(_) => Ok(()),
            None => {
                self.definitions.push(AttributeDefinition {
                    attribute_name: attribute.name.clone(),
                    attribute_type: attribute.scalar_type,
                });
                Ok(())
            }
        }
    }

    fn finish(self) -> Vec<AttributeDefinition> {
        self.definitions
    }
}
