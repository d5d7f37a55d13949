//! Check if a table exists.

use crate::control_plane::ControlPlane;
use crate::errors::Result;

/// `true` if the store can describe the table, whatever its status.
pub async fn table_exists<C>(control_plane: &C, table_name: &str) -> Result<bool>
where
    C: ControlPlane + ?Sized,
{
    match control_plane.describe_table(table_name).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
