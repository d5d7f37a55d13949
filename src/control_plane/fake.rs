//! In-memory control plane for tests.
//!
//! Tables converge lazily: a created table reports `CREATING` for
//! `create_lag` describes, a deleted table stays listed for `delete_lag`
//! list calls. A lag of zero converges immediately.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ControlPlane, TableObservation, TableStatus};
use crate::errors::{ControlPlaneErrorKind, DdlError, Result};
use crate::table_operations::TableDefinition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(TableDefinition),
    Delete(String),
    Describe(String),
    List,
}

struct FakeTable {
    observation: TableObservation,
    polls_until_active: u32,
    /// `Some(n)`: deleted, still listed for `n` more list calls.
    polls_until_gone: Option<u32>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, FakeTable>,
    calls: Vec<Call>,
    errors: HashMap<&'static str, DdlError>,
}

pub(crate) struct FakeControlPlane {
    create_lag: u32,
    delete_lag: u32,
    state: Mutex<State>,
}

impl FakeControlPlane {
    pub(crate) fn new() -> Self {
        Self::with_lag(0, 0)
    }

    pub(crate) fn with_lag(create_lag: u32, delete_lag: u32) -> Self {
        Self {
            create_lag,
            delete_lag,
            state: Mutex::new(State::default()),
        }
    }

    /// Seed an already active table.
    pub(crate) fn insert(&self, observation: TableObservation) {
        let mut state = self.state.lock().unwrap();
        state.tables.insert(
            observation.table_name.clone(),
            FakeTable {
                observation,
                polls_until_active: 0,
                polls_until_gone: None,
            },
        );
    }

    /// Fail the next call to `op` ("create", "delete", "describe", "list").
    pub(crate) fn fail_next(&self, op: &'static str, err: DdlError) {
        self.state.lock().unwrap().errors.insert(op, err);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn creates(&self) -> Vec<TableDefinition> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(def) => Some(def),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn contains(&self, table_name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table_name)
            .is_some_and(|t| t.polls_until_gone.is_none())
    }

    fn record(&self, call: Call, op: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.errors.remove(op) {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let mut state = self.record(Call::Create(definition.clone()), "create")?;
        if state.tables.contains_key(&definition.table_name) {
            return Err(DdlError::control_plane(
                ControlPlaneErrorKind::ResourceInUse,
                format!("Table '{}' already exists", definition.table_name),
            ));
        }
        let mut observation = TableObservation::active(definition);
        observation.status = if self.create_lag == 0 {
            TableStatus::Active
        } else {
            TableStatus::Creating
        };
        state.tables.insert(
            definition.table_name.clone(),
            FakeTable {
                observation,
                polls_until_active: self.create_lag,
                polls_until_gone: None,
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        let mut state = self.record(Call::Delete(table_name.to_string()), "delete")?;
        let delete_lag = self.delete_lag;
        match state.tables.get_mut(table_name) {
            Some(table) if table.polls_until_gone.is_none() => {
                table.observation.status = TableStatus::Deleting;
                table.polls_until_gone = Some(delete_lag);
            }
            _ => return Err(DdlError::not_found(table_name)),
        }
        if delete_lag == 0 {
            state.tables.remove(table_name);
        }
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableObservation> {
        let mut state = self.record(Call::Describe(table_name.to_string()), "describe")?;
        let table = state
            .tables
            .get_mut(table_name)
            .ok_or_else(|| DdlError::not_found(table_name))?;
        if table.polls_until_active > 0 {
            table.polls_until_active -= 1;
        } else if table.observation.status == TableStatus::Creating {
            table.observation.status = TableStatus::Active;
        }
        Ok(table.observation.clone())
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        let mut state = self.record(Call::List, "list")?;
        let mut names: Vec<String> = state.tables.keys().cloned().collect();
        names.sort();

        state.tables.retain(|_, table| match table.polls_until_gone.as_mut() {
            Some(n) if *n <= 1 => false,
            Some(n) => {
                *n -= 1;
                true
            }
            None => true,
        });
        Ok(names)
    }
}
