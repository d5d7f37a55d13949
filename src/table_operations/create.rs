//! Create table operation.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::definition::TableDefinition;
use super::wait::wait_for_table_active;
use crate::control_plane::ControlPlane;
use crate::errors::Result;

/// Create the table and block until it reports `ACTIVE`.
pub async fn create_table<C>(
    control_plane: &C,
    definition: &TableDefinition,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ControlPlane + ?Sized,
{
    control_plane.create_table(definition).await?;

    wait_for_table_active(control_plane, &definition.table_name, poll_interval, cancel).await?;

    info!("Created table {}", definition.table_name);
    Ok(())
}
