//! Delete table operation.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::definition::DeleteTableDefinition;
use super::wait::wait_for_table_removed;
use crate::control_plane::ControlPlane;
use crate::errors::Result;

/// Delete the table and block until it is no longer listed.
///
/// A missing table fails with [`DdlError::NotFound`](crate::DdlError::NotFound).
pub async fn delete_table<C>(
    control_plane: &C,
    definition: &DeleteTableDefinition,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ControlPlane + ?Sized,
{
    control_plane.delete_table(&definition.table_name).await?;

    wait_for_table_removed(control_plane, &definition.table_name, poll_interval, cancel).await?;

    info!("Deleted table {}", definition.table_name);
    Ok(())
}
