//! Table management operations for DynamoDB.
//!
//! This module provides table lifecycle operations:
//! - `definition` - Table definition value types
//! - `builder` - Derive definitions from entity descriptors
//! - `create` - Create a table and wait for it to become active
//! - `delete` - Delete a table and wait for it to disappear
//! - `exists` - Check if a table exists
//! - `wait` - Fixed-interval polling until a table converges

mod builder;
mod create;
mod definition;
mod delete;
mod exists;
mod wait;

// Re-export public items
pub use builder::TableDefinitionBuilder;
pub use create::create_table;
pub use definition::{
    AttributeDefinition, DeleteTableDefinition, GlobalSecondaryIndex, KeyElement, KeyType,
    LocalSecondaryIndex, Projection, ProjectionType, ProvisionedThroughput, ScalarType,
    TableDefinition, format_key_schema,
};
pub use delete::delete_table;
pub use exists::table_exists;
pub use wait::{
    DEFAULT_POLL_INTERVAL, Pending, await_state, wait_for_table_active, wait_for_table_removed,
};
