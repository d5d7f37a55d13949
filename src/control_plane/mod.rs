//! Control-plane seam between the lifecycle manager and the store.
//!
//! Every call is a single request. Create and delete are only *accepted*
//! by the store; convergence is observed by the poller in
//! [`table_operations`](crate::table_operations).

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use std::fmt;

use crate::errors::Result;
use crate::table_operations::{GlobalSecondaryIndex, KeyElement, LocalSecondaryIndex, TableDefinition};

/// Table status as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Updating,
    Deleting,
    Active,
    Archiving,
    Archived,
    InaccessibleEncryptionCredentials,
    /// A status this crate does not know about.
    Other(String),
}

impl TableStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Archiving => "ARCHIVING",
            TableStatus::Archived => "ARCHIVED",
            TableStatus::InaccessibleEncryptionCredentials => "INACCESSIBLE_ENCRYPTION_CREDENTIALS",
            TableStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CREATING" => TableStatus::Creating,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            "ACTIVE" => TableStatus::Active,
            "ARCHIVING" => TableStatus::Archiving,
            "ARCHIVED" => TableStatus::Archived,
            "INACCESSIBLE_ENCRYPTION_CREDENTIALS" => TableStatus::InaccessibleEncryptionCredentials,
            other => TableStatus::Other(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TableStatus::Active)
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a live table, fetched fresh for every poll or validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableObservation {
    pub table_name: String,
    pub status: TableStatus,
    pub key_schema: Vec<KeyElement>,
    /// `None` when the store reports no global secondary indexes at all.
    pub global_secondary_indexes: Option<Vec<GlobalSecondaryIndex>>,
    pub local_secondary_indexes: Option<Vec<LocalSecondaryIndex>>,
}

impl TableObservation {
    /// What an active table created from `definition` looks like.
    pub fn active(definition: &TableDefinition) -> Self {
        Self {
            table_name: definition.table_name.clone(),
            status: TableStatus::Active,
            key_schema: definition.key_schema.clone(),
            global_secondary_indexes: definition.global_secondary_indexes.clone(),
            local_secondary_indexes: definition.local_secondary_indexes.clone(),
        }
    }
}

/// Administrative API of the store.
///
/// Errors are reported as [`DdlError`](crate::DdlError). A missing table must
/// surface as [`DdlError::NotFound`](crate::DdlError::NotFound) from both
/// `describe_table` and `delete_table`.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()>;

    async fn delete_table(&self, table_name: &str) -> Result<()>;

    async fn describe_table(&self, table_name: &str) -> Result<TableObservation>;

    async fn list_table_names(&self) -> Result<Vec<String>>;
}
