//! Wait for a table to reach a state.
//!
//! Fixed-interval polling, no backoff and no deadline. A caller that needs
//! an upper bound wraps the call in its own timeout or cancels the token.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::control_plane::ControlPlane;
use crate::errors::{DdlError, Result};

/// Default sleep between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// An undesired state to wait out. The wait ends once it no longer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// The table name is still in the table list (after delete).
    TableListed,
    /// The table status is not yet `ACTIVE` (after create).
    NotActive,
}

impl Pending {
    async fn holds<C>(&self, control_plane: &C, table_name: &str) -> Result<bool>
    where
        C: ControlPlane + ?Sized,
    {
        match self {
            Pending::TableListed => {
                let tables = control_plane.list_table_names().await?;
                debug!("Table {} list check: {:?}", table_name, tables);
                Ok(tables.iter().any(|t| t == table_name))
            }
            Pending::NotActive => {
                let status = control_plane.describe_table(table_name).await?.status;
                debug!("Table {} status check: {}", table_name, status);
                Ok(!status.is_active())
            }
        }
    }
}

/// Sleep `interval`, observe the table, repeat while `pending` holds.
///
/// The first observation happens after the first sleep. Cancelling
/// `cancel` during a sleep fails with [`DdlError::WaitInterrupted`];
/// control-plane errors propagate unchanged.
pub async fn await_state<C>(
    control_plane: &C,
    table_name: &str,
    pending: Pending,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ControlPlane + ?Sized,
{
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(DdlError::WaitInterrupted {
                    table: table_name.to_string(),
                });
            }
            _ = tokio::time::sleep(interval) => {}
        }

        if !pending.holds(control_plane, table_name).await? {
            return Ok(());
        }
    }
}

/// Wait until the table reports `ACTIVE`.
pub async fn wait_for_table_active<C>(
    control_plane: &C,
    table_name: &str,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ControlPlane + ?Sized,
{
    await_state(control_plane, table_name, Pending::NotActive, interval, cancel).await
}

/// Wait until the table no longer shows up in the table list.
pub async fn wait_for_table_removed<C>(
    control_plane: &C,
    table_name: &str,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ControlPlane + ?Sized,
{
    await_state(control_plane, table_name, Pending::TableListed, interval, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::fake::{Call, FakeControlPlane};
    use crate::control_plane::TableObservation;
    use crate::errors::ControlPlaneErrorKind;
    use crate::table_operations::{KeyElement, ProvisionedThroughput, TableDefinition};

    fn definition(name: &str) -> TableDefinition {
        TableDefinition {
            table_name: name.to_string(),
            attribute_definitions: Vec::new(),
            key_schema: vec![KeyElement::hash("id")],
            global_secondary_indexes: None,
            local_secondary_indexes: None,
            provisioned_throughput: ProvisionedThroughput::new(1, 1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn active_wait_polls_until_status_is_active() {
        let cp = FakeControlPlane::with_lag(3, 0);
        cp.create_table(&definition("orders")).await.unwrap();

        let token = CancellationToken::new();
        wait_for_table_active(&cp, "orders", DEFAULT_POLL_INTERVAL, &token)
            .await
            .unwrap();

        let describes = cp
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Describe(_)))
            .count();
        assert_eq!(describes, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_wait_polls_until_table_is_unlisted() {
        let cp = FakeControlPlane::with_lag(0, 2);
        cp.insert(TableObservation::active(&definition("orders")));
        cp.delete_table("orders").await.unwrap();

        let token = CancellationToken::new();
        wait_for_table_removed(&cp, "orders", DEFAULT_POLL_INTERVAL, &token)
            .await
            .unwrap();

        let lists = cp.calls().iter().filter(|c| **c == Call::List).count();
        assert_eq!(lists, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn first_observation_happens_after_one_interval() {
        let cp = FakeControlPlane::new();
        cp.insert(TableObservation::active(&definition("orders")));

        let start = tokio::time::Instant::now();
        let token = CancellationToken::new();
        wait_for_table_active(&cp, "orders", Duration::from_secs(5), &token)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let cp = FakeControlPlane::with_lag(u32::MAX, 0);
        cp.create_table(&definition("stuck")).await.unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            canceller.cancel();
        });

        let err = wait_for_table_active(&cp, "stuck", DEFAULT_POLL_INTERVAL, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, DdlError::WaitInterrupted { ref table } if table == "stuck"));
    }

    #[tokio::test(start_paused = true)]
    async fn control_plane_errors_propagate() {
        let cp = FakeControlPlane::new();
        cp.fail_next(
            "list",
            DdlError::control_plane(ControlPlaneErrorKind::Throttled, "slow down"),
        );

        let token = CancellationToken::new();
        let err = wait_for_table_removed(&cp, "orders", DEFAULT_POLL_INTERVAL, &token)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DdlError::ControlPlane { kind: ControlPlaneErrorKind::Throttled, .. }
        ));
    }
}
