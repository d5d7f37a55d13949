//! Entity-driven DynamoDB table lifecycle.
//!
//! Derives table definitions from entity metadata and applies a
//! [`LifecyclePolicy`] to them: create, drop, drop-then-create,
//! create-then-drop-on-shutdown, or validate the live table.
//!
//! Create and delete are asynchronous on the store side. The lifecycle
//! polls every second until the table is active (or gone) and defines no
//! deadline of its own; cancel [`TableLifecycle::cancellation_token`] or
//! wrap the async call in a timeout to bound it.

pub mod client;
pub mod config;
pub mod control_plane;
pub mod conversions;
pub mod entity;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod mapper_config;
mod runtime;
pub mod table_operations;
pub mod validate;

pub use client::{ClientConfig, DynamoControlPlane, build_client};
pub use config::{CONFIGURATION_KEY, DdlSettings, LifecyclePolicy};
pub use control_plane::{ControlPlane, TableObservation, TableStatus};
pub use entity::{DynamoEntity, EntityDescriptor};
pub use errors::{ControlPlaneErrorKind, DdlError, Result};
pub use lifecycle::TableLifecycle;
pub use logging::init_logging;
pub use mapper_config::{MapperConfig, repair as repair_mapper_config};
pub use table_operations::{
    KeyElement, KeyType, Projection, ProjectionType, ProvisionedThroughput, ScalarType,
    TableDefinition, TableDefinitionBuilder,
};
pub use validate::{MismatchDetail, validate};
