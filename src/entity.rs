//! Entity schema descriptors.
//!
//! A descriptor is the key and index metadata of one domain type. It is
//! built once at startup and only read afterwards.
//!
//! # Examples
//!
//! ```
//! use dynoddl::entity::{EntityDescriptor, GlobalIndexDescriptor};
//! use dynoddl::ScalarType;
//!
//! let orders = EntityDescriptor::builder("Order", "orders")
//!     .hash_key("id", ScalarType::S)
//!     .global_index(GlobalIndexDescriptor::new("byStatus").hash_key("status", ScalarType::S))
//!     .build();
//!
//! assert_eq!(orders.table_name(), "orders");
//! ```

use crate::table_operations::{Projection, ScalarType};

/// A key attribute and its scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub scalar_type: ScalarType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
        }
    }
}

/// Global secondary index declared on an entity.
///
/// Carries keys only; the projection comes from [`DdlSettings`](crate::DdlSettings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalIndexDescriptor {
    pub name: String,
    pub hash_key: Option<KeyAttribute>,
    pub range_key: Option<KeyAttribute>,
}

impl GlobalIndexDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash_key: None,
            range_key: None,
        }
    }

    pub fn hash_key(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.hash_key = Some(KeyAttribute::new(name, scalar_type));
        self
    }

    pub fn range_key(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.range_key = Some(KeyAttribute::new(name, scalar_type));
        self
    }
}

/// Local secondary index declared on an entity. Shares the table's hash key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIndexDescriptor {
    pub name: String,
    pub range_key: KeyAttribute,
    pub projection: Projection,
}

impl LocalIndexDescriptor {
    pub fn new(name: impl Into<String>, range_key: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            range_key: KeyAttribute::new(range_key, scalar_type),
            projection: Projection::all(),
        }
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

/// Key structure and secondary indexes of one domain type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    domain_type: String,
    table_name: String,
    hash_key: Option<KeyAttribute>,
    range_key: Option<KeyAttribute>,
    global_indexes: Vec<GlobalIndexDescriptor>,
    local_indexes: Vec<LocalIndexDescriptor>,
}

impl EntityDescriptor {
    pub fn builder(
        domain_type: impl Into<String>,
        table_name: impl Into<String>,
    ) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder {
            inner: EntityDescriptor {
                domain_type: domain_type.into(),
                table_name: table_name.into(),
                hash_key: None,
                range_key: None,
                global_indexes: Vec::new(),
                local_indexes: Vec::new(),
            },
        }
    }

    /// Name of the domain type, used in error messages.
    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    /// Table name before any mapper override is applied.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn hash_key(&self) -> Option<&KeyAttribute> {
        self.hash_key.as_ref()
    }

    pub fn range_key(&self) -> Option<&KeyAttribute> {
        self.range_key.as_ref()
    }

    pub fn global_indexes(&self) -> &[GlobalIndexDescriptor] {
        &self.global_indexes
    }

    pub fn local_indexes(&self) -> &[LocalIndexDescriptor] {
        &self.local_indexes
    }
}

pub struct EntityDescriptorBuilder {
    inner: EntityDescriptor,
}

impl EntityDescriptorBuilder {
    pub fn hash_key(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.inner.hash_key = Some(KeyAttribute::new(name, scalar_type));
        self
    }

    pub fn range_key(mut self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        self.inner.range_key = Some(KeyAttribute::new(name, scalar_type));
        self
    }

    /// Indexes keep their declaration order.
    pub fn global_index(mut self, index: GlobalIndexDescriptor) -> Self {
        self.inner.global_indexes.push(index);
        self
    }

    pub fn local_index(mut self, index: LocalIndexDescriptor) -> Self {
        self.inner.local_indexes.push(index);
        self
    }

    pub fn build(self) -> EntityDescriptor {
        self.inner
    }
}

/// A domain type that can describe its own table layout.
pub trait DynamoEntity {
    fn descriptor() -> EntityDescriptor;
}
