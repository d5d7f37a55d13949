//! Table lifecycle orchestration.
//!
//! [`TableLifecycle`] maps a [`LifecyclePolicy`] to create, drop and
//! validate steps for one entity. It is meant to run once at startup (and
//! once at shutdown for `create-drop`), blocking the caller while tables
//! converge.
//!
//! No locking is done across call sites: two lifecycles working on the
//! same table name race the same way two store clients would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DdlSettings, LifecyclePolicy};
use crate::control_plane::ControlPlane;
use crate::entity::{DynamoEntity, EntityDescriptor};
use crate::errors::{DdlError, Result};
use crate::mapper_config::{self, MapperConfig};
use crate::runtime::block_on;
use crate::table_operations::{
    DeleteTableDefinition, TableDefinitionBuilder, create_table, delete_table, table_exists,
};
use crate::validate::validate;

/// Applies lifecycle policies to entity tables.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use dynoddl::{ClientConfig, DdlSettings, DynamoControlPlane, TableLifecycle};
/// use dynoddl::entity::EntityDescriptor;
/// use dynoddl::ScalarType;
///
/// let settings = DdlSettings::from_env()?;
/// let control_plane = DynamoControlPlane::connect_blocking(&ClientConfig::default())?;
/// let lifecycle = TableLifecycle::new(Arc::new(control_plane), &settings);
///
/// let orders = EntityDescriptor::builder("Order", "orders")
///     .hash_key("id", ScalarType::S)
///     .build();
/// lifecycle.execute(settings.policy, &orders)?;
/// # Ok::<(), dynoddl::DdlError>(())
/// ```
pub struct TableLifecycle<C: ?Sized> {
    control_plane: Arc<C>,
    builder: TableDefinitionBuilder,
    poll_interval: Duration,
    cancel: CancellationToken,
    drop_on_shutdown: Mutex<Vec<DeleteTableDefinition>>,
}

impl<C> TableLifecycle<C>
where
    C: ControlPlane + ?Sized,
{
    pub fn new(control_plane: Arc<C>, settings: &DdlSettings) -> Self {
        Self {
            control_plane,
            builder: TableDefinitionBuilder::new(settings),
            poll_interval: settings.poll_interval(),
            cancel: CancellationToken::new(),
            drop_on_shutdown: Mutex::new(Vec::new()),
        }
    }

    /// Resolve table names through a mapper configuration.
    ///
    /// The configuration is repaired first; the repaired copy is returned
    /// for the caller to build its mapper with.
    pub fn with_mapper_config(mut self, config: &Arc<MapperConfig>) -> (Self, Arc<MapperConfig>) {
        let repaired = mapper_config::repair(config);
        self.builder = self.builder.with_mapper_config(&repaired);
        (self, repaired)
    }

    /// Token that interrupts any wait in progress when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn builder(&self) -> &TableDefinitionBuilder {
        &self.builder
    }

    /// Apply `policy` to the table of `descriptor`.
    pub async fn execute_async(
        &self,
        policy: LifecyclePolicy,
        descriptor: &EntityDescriptor,
    ) -> Result<()> {
        match policy {
            LifecyclePolicy::None => {
                debug!(
                    "No auto table DDL performed for {}",
                    descriptor.domain_type()
                );
                Ok(())
            }
            LifecyclePolicy::CreateOnly => self.create(descriptor).await,
            LifecyclePolicy::Drop => self.drop_table(descriptor).await,
            LifecyclePolicy::Create => {
                self.drop_if_present(descriptor).await?;
                self.create(descriptor).await
            }
            LifecyclePolicy::CreateDrop => {
                self.create(descriptor).await?;
                self.register_drop_on_shutdown(descriptor)
            }
            LifecyclePolicy::Validate => self.validate(descriptor).await,
        }
    }

    /// Blocking variant of [`execute_async`](Self::execute_async).
    ///
    /// Fails with [`DdlError::Runtime`] when called from inside a Tokio runtime.
    pub fn execute(&self, policy: LifecyclePolicy, descriptor: &EntityDescriptor) -> Result<()> {
        block_on("execute_async", self.execute_async(policy, descriptor))
    }

    pub fn execute_for<E: DynamoEntity>(&self, policy: LifecyclePolicy) -> Result<()> {
        self.execute(policy, &E::descriptor())
    }

    /// Drop every table registered by `create-drop`.
    ///
    /// Every registered table is attempted and the first error is returned.
    /// Tables that were dropped leave the registry; tables whose drop failed
    /// stay registered, so a later call retries them.
    pub async fn shutdown_async(&self) -> Result<()> {
        let pending = std::mem::take(&mut *self.registry());

        let mut first_error = None;
        let mut failed = Vec::new();
        for definition in pending {
            if let Err(e) =
                delete_table(&*self.control_plane, &definition, self.poll_interval, &self.cancel)
                    .await
            {
                warn!("Failed to drop table {} on shutdown: {}", definition.table_name, e);
                first_error.get_or_insert(e);
                failed.push(definition);
            }
        }

        if !failed.is_empty() {
            let mut registry = self.registry();
            for definition in failed {
                if !registry.contains(&definition) {
                    registry.push(definition);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Blocking variant of [`shutdown_async`](Self::shutdown_async).
    pub fn shutdown(&self) -> Result<()> {
        block_on("shutdown_async", self.shutdown_async())
    }

    /// Table names that `shutdown` will drop.
    pub fn pending_shutdown_drops(&self) -> Vec<String> {
        self.registry()
            .iter()
            .map(|d| d.table_name.clone())
            .collect()
    }

    pub async fn table_exists(&self, descriptor: &EntityDescriptor) -> Result<bool> {
        let definition = self.builder.build_delete(descriptor)?;
        table_exists(&*self.control_plane, &definition.table_name).await
    }

    async fn create(&self, descriptor: &EntityDescriptor) -> Result<()> {
        let definition = self.builder.build(descriptor)?;
        info!("Creating table {}", definition.table_name);
        create_table(&*self.control_plane, &definition, self.poll_interval, &self.cancel).await
    }

    async fn drop_table(&self, descriptor: &EntityDescriptor) -> Result<()> {
        let definition = self.builder.build_delete(descriptor)?;
        info!("Deleting table {}", definition.table_name);
        delete_table(&*self.control_plane, &definition, self.poll_interval, &self.cancel).await
    }

    async fn drop_if_present(&self, descriptor: &EntityDescriptor) -> Result<()> {
        match self.drop_table(descriptor).await {
            Err(DdlError::NotFound { table }) => {
                debug!("Table {} does not exist yet, nothing to drop", table);
                Ok(())
            }
            other => other,
        }
    }

    async fn validate(&self, descriptor: &EntityDescriptor) -> Result<()> {
        let expected = self.builder.build(descriptor)?;
        let actual = self
            .control_plane
            .describe_table(&expected.table_name)
            .await?;

        validate(&expected, &actual).map_err(DdlError::SchemaMismatch)
    }

    fn register_drop_on_shutdown(&self, descriptor: &EntityDescriptor) -> Result<()> {
        let definition = self.builder.build_delete(descriptor)?;
        let mut pending = self.registry();
        if !pending.contains(&definition) {
            debug!("Table {} will be dropped on shutdown", definition.table_name);
            pending.push(definition);
        }
        Ok(())
    }

    fn registry(&self) -> MutexGuard<'_, Vec<DeleteTableDefinition>> {
        self.drop_on_shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::fake::{Call, FakeControlPlane};
    use crate::control_plane::TableObservation;
    use crate::entity::GlobalIndexDescriptor;
    use crate::errors::ControlPlaneErrorKind;
    use crate::mapper_config::TableNameOverride;
    use crate::table_operations::{KeyElement, ScalarType};

    fn orders() -> EntityDescriptor {
        EntityDescriptor::builder("Order", "orders")
            .hash_key("id", ScalarType::S)
            .global_index(GlobalIndexDescriptor::new("byStatus").hash_key("status", ScalarType::S))
            .build()
    }

    fn lifecycle(cp: FakeControlPlane) -> (Arc<FakeControlPlane>, TableLifecycle<FakeControlPlane>) {
        let cp = Arc::new(cp);
        let lifecycle = TableLifecycle::new(Arc::clone(&cp), &DdlSettings::default());
        (cp, lifecycle)
    }

    fn live_orders(lifecycle: &TableLifecycle<FakeControlPlane>) -> TableObservation {
        TableObservation::active(&lifecycle.builder().build(&orders()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn none_makes_no_calls() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        lifecycle
            .execute_async(LifecyclePolicy::None, &orders())
            .await
            .unwrap();
        assert!(cp.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn create_only_creates_and_waits_for_active() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(2, 0));

        lifecycle
            .execute_async(LifecyclePolicy::CreateOnly, &orders())
            .await
            .unwrap();

        let creates = cp.creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].key_schema, vec![KeyElement::hash("id")]);
        let gsis = creates[0].global_secondary_indexes.as_ref().unwrap();
        assert_eq!(gsis.len(), 1);
        assert_eq!(gsis[0].index_name, "byStatus");

        let describes: Vec<Call> = cp
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Describe(_)))
            .collect();
        assert_eq!(describes.len(), 3);
        assert!(cp.contains("orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn create_on_missing_table_swallows_not_found() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(1, 1));

        lifecycle
            .execute_async(LifecyclePolicy::Create, &orders())
            .await
            .unwrap();

        let calls = cp.calls();
        assert_eq!(calls[0], Call::Delete("orders".to_string()));
        assert!(matches!(calls[1], Call::Create(_)));
        assert!(cp.contains("orders"));
        assert!(lifecycle.table_exists(&orders()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn create_on_existing_table_drops_then_recreates() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(1, 2));
        cp.insert(live_orders(&lifecycle));

        lifecycle
            .execute_async(LifecyclePolicy::Create, &orders())
            .await
            .unwrap();

        let calls = cp.calls();
        let delete_at = calls
            .iter()
            .position(|c| *c == Call::Delete("orders".into()))
            .unwrap();
        let create_at = calls
            .iter()
            .position(|c| matches!(c, Call::Create(_)))
            .unwrap();
        assert!(delete_at < create_at);
        // the create is only issued once the table left the list
        assert_eq!(calls[create_at - 1], Call::List);
        assert!(cp.contains("orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_on_missing_table_surfaces_not_found() {
        let (_, lifecycle) = lifecycle(FakeControlPlane::new());

        let err = lifecycle
            .execute_async(LifecyclePolicy::Drop, &orders())
            .await
            .unwrap_err();
        assert!(matches!(err, DdlError::NotFound { ref table } if table == "orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_waits_until_table_is_gone() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(0, 3));
        cp.insert(live_orders(&lifecycle));

        lifecycle
            .execute_async(LifecyclePolicy::Drop, &orders())
            .await
            .unwrap();

        assert!(!cp.contains("orders"));
        assert!(!lifecycle.table_exists(&orders()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn create_only_propagates_control_plane_errors() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        cp.insert(live_orders(&lifecycle));

        let err = lifecycle
            .execute_async(LifecyclePolicy::CreateOnly, &orders())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DdlError::ControlPlane { kind: ControlPlaneErrorKind::ResourceInUse, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_schema_fails_before_any_call() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        let keyless = EntityDescriptor::builder("Keyless", "keyless").build();

        for policy in [
            LifecyclePolicy::CreateOnly,
            LifecyclePolicy::Drop,
            LifecyclePolicy::Create,
            LifecyclePolicy::Validate,
        ] {
            let err = lifecycle.execute_async(policy, &keyless).await.unwrap_err();
            assert!(matches!(err, DdlError::InvalidSchema { .. }));
        }
        assert!(cp.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn validate_passes_silently_on_matching_table() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        cp.insert(live_orders(&lifecycle));

        lifecycle
            .execute_async(LifecyclePolicy::Validate, &orders())
            .await
            .unwrap();
        assert_eq!(cp.calls(), vec![Call::Describe("orders".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn validate_reports_key_schema_drift() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        let mut live = live_orders(&lifecycle);
        live.key_schema = vec![KeyElement::hash("id"), KeyElement::range("ts")];
        cp.insert(live);

        let err = lifecycle
            .execute_async(LifecyclePolicy::Validate, &orders())
            .await
            .unwrap_err();

        assert!(matches!(err, DdlError::SchemaMismatch(_)));
        let message = err.to_string();
        assert!(message.contains("[{id,HASH}]"));
        assert!(message.contains("[{id,HASH}, {ts,RANGE}]"));
    }

    #[tokio::test(start_paused = true)]
    async fn validate_on_missing_table_surfaces_not_found() {
        let (_, lifecycle) = lifecycle(FakeControlPlane::new());
        let err = lifecycle
            .execute_async(LifecyclePolicy::Validate, &orders())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn validate_refetches_every_time() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());
        cp.insert(live_orders(&lifecycle));

        for _ in 0..2 {
            lifecycle
                .execute_async(LifecyclePolicy::Validate, &orders())
                .await
                .unwrap();
        }
        assert_eq!(cp.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn create_drop_drops_once_on_shutdown() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(1, 1));

        lifecycle
            .execute_async(LifecyclePolicy::CreateDrop, &orders())
            .await
            .unwrap();
        assert!(cp.contains("orders"));
        assert_eq!(lifecycle.pending_shutdown_drops(), vec!["orders".to_string()]);

        lifecycle.shutdown_async().await.unwrap();
        assert!(!cp.contains("orders"));
        assert!(lifecycle.pending_shutdown_drops().is_empty());

        let before = cp.calls().len();
        lifecycle.shutdown_async().await.unwrap();
        assert_eq!(cp.calls().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_shutdown_drop_stays_registered_for_retry() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::with_lag(1, 1));
        lifecycle
            .execute_async(LifecyclePolicy::CreateDrop, &orders())
            .await
            .unwrap();

        cp.fail_next(
            "delete",
            DdlError::control_plane(ControlPlaneErrorKind::Throttled, "slow down"),
        );
        let err = lifecycle.shutdown_async().await.unwrap_err();
        assert!(matches!(
            err,
            DdlError::ControlPlane { kind: ControlPlaneErrorKind::Throttled, .. }
        ));
        assert!(cp.contains("orders"));
        assert_eq!(lifecycle.pending_shutdown_drops(), vec!["orders".to_string()]);

        lifecycle.shutdown_async().await.unwrap();
        assert!(!cp.contains("orders"));
        assert!(lifecycle.pending_shutdown_drops().is_empty());
    }

    #[tokio::test]
    async fn blocking_calls_inside_a_runtime_return_an_error() {
        let (cp, lifecycle) = lifecycle(FakeControlPlane::new());

        let err = lifecycle
            .execute(LifecyclePolicy::None, &orders())
            .unwrap_err();
        assert!(matches!(err, DdlError::Runtime(ref msg) if msg.contains("execute_async")));

        let err = lifecycle.shutdown().unwrap_err();
        assert!(matches!(err, DdlError::Runtime(ref msg) if msg.contains("shutdown_async")));
        assert!(cp.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_interrupts_create() {
        let (_, lifecycle) = lifecycle(FakeControlPlane::with_lag(u32::MAX, 0));
        lifecycle.cancellation_token().cancel();

        let err = lifecycle
            .execute_async(LifecyclePolicy::CreateOnly, &orders())
            .await
            .unwrap_err();
        assert!(matches!(err, DdlError::WaitInterrupted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn mapper_config_override_is_repaired_and_applied() {
        let cp = Arc::new(FakeControlPlane::new());
        let partial = Arc::new(
            MapperConfig::builder()
                .table_name_override(TableNameOverride::Prefix("it_".into()))
                .build(),
        );
        let (lifecycle, repaired) =
            TableLifecycle::new(Arc::clone(&cp), &DdlSettings::default()).with_mapper_config(&partial);
        assert!(repaired.is_complete());

        lifecycle
            .execute_async(LifecyclePolicy::CreateOnly, &orders())
            .await
            .unwrap();
        assert!(cp.contains("it_orders"));
    }

    #[test]
    fn blocking_execute_runs_on_shared_runtime() {
        let cp = Arc::new(FakeControlPlane::with_lag(1, 0));
        let settings = DdlSettings {
            poll_interval_ms: 1,
            ..DdlSettings::default()
        };
        let lifecycle = TableLifecycle::new(Arc::clone(&cp), &settings);

        lifecycle
            .execute(LifecyclePolicy::CreateOnly, &orders())
            .unwrap();
        lifecycle
            .execute(LifecyclePolicy::Validate, &orders())
            .unwrap();
        assert!(cp.contains("orders"));
    }

    #[test]
    fn bad_policy_string_fails_before_any_call() {
        let cp = FakeControlPlane::new();
        let parsed = DdlSettings::from_json_str(r#"{"policy": "create-onlyx"}"#);
        assert!(matches!(parsed, Err(DdlError::Configuration(_))));
        assert!(cp.calls().is_empty());
    }

    struct Order;

    impl DynamoEntity for Order {
        fn descriptor() -> EntityDescriptor {
            orders()
        }
    }

    #[test]
    fn execute_for_uses_entity_descriptor() {
        let cp = Arc::new(FakeControlPlane::new());
        let settings = DdlSettings {
            poll_interval_ms: 1,
            ..DdlSettings::default()
        };
        let lifecycle = TableLifecycle::new(Arc::clone(&cp), &settings);

        lifecycle
            .execute_for::<Order>(LifecyclePolicy::CreateOnly)
            .unwrap();
        assert!(cp.contains("orders"));
    }
}
