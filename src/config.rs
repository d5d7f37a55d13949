//! Lifecycle configuration.
//!
//! The policy string is parsed eagerly: an unknown value fails here, before
//! any control-plane call is made.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{DdlError, Result};
use crate::table_operations::{Projection, ProjectionType, ProvisionedThroughput};

/// Name of the policy setting.
pub const CONFIGURATION_KEY: &str = "dynoddl.entity2ddl.auto";

const ENV_POLICY: &str = "DYNODDL_ENTITY2DDL_AUTO";
const ENV_READ_CAPACITY: &str = "DYNODDL_READ_CAPACITY";
const ENV_WRITE_CAPACITY: &str = "DYNODDL_WRITE_CAPACITY";
const ENV_GSI_PROJECTION: &str = "DYNODDL_GSI_PROJECTION";

/// What to do with an entity's table at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecyclePolicy {
    /// No action is performed.
    #[default]
    None,
    /// Create the table and wait for it to become active.
    CreateOnly,
    /// Drop the table and wait for it to disappear.
    Drop,
    /// Drop the table (if present), then create it. Destroys existing data.
    Create,
    /// Create on startup, drop again on shutdown.
    CreateDrop,
    /// Compare the live table against the entity.
    Validate,
}

impl LifecyclePolicy {
    pub const ALL: [LifecyclePolicy; 6] = [
        LifecyclePolicy::None,
        LifecyclePolicy::CreateOnly,
        LifecyclePolicy::Drop,
        LifecyclePolicy::Create,
        LifecyclePolicy::CreateDrop,
        LifecyclePolicy::Validate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePolicy::None => "none",
            LifecyclePolicy::CreateOnly => "create-only",
            LifecyclePolicy::Drop => "drop",
            LifecyclePolicy::Create => "create",
            LifecyclePolicy::CreateDrop => "create-drop",
            LifecyclePolicy::Validate => "validate",
        }
    }
}

impl FromStr for LifecyclePolicy {
    type Err = DdlError;

    fn from_str(s: &str) -> Result<Self> {
        LifecyclePolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                DdlError::configuration(format!("{} is not a valid configuration value!", s))
            })
    }
}

impl fmt::Display for LifecyclePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LifecyclePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LifecyclePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Settings for the table lifecycle manager.
///
/// ```
/// use dynoddl::{DdlSettings, LifecyclePolicy};
///
/// let settings = DdlSettings::from_json_str(r#"{"policy": "validate"}"#).unwrap();
/// assert_eq!(settings.policy, LifecyclePolicy::Validate);
/// assert_eq!(settings.read_capacity, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DdlSettings {
    pub policy: LifecyclePolicy,
    /// Read capacity for the table and every global secondary index.
    pub read_capacity: i64,
    /// Write capacity for the table and every global secondary index.
    pub write_capacity: i64,
    /// Projection applied to every global secondary index. `ALL` or `KEYS_ONLY`.
    pub gsi_projection: ProjectionType,
    pub poll_interval_ms: u64,
}

impl Default for DdlSettings {
    fn default() -> Self {
        Self {
            policy: LifecyclePolicy::None,
            read_capacity: 10,
            write_capacity: 10,
            gsi_projection: ProjectionType::All,
            poll_interval_ms: 1000,
        }
    }
}

impl DdlSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: DdlSettings = serde_json::from_str(json)
            .map_err(|e| DdlError::configuration(format!("Invalid settings: {}", e)))?;
        settings.check()?;
        Ok(settings)
    }

    /// Read settings from `DYNODDL_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = DdlSettings::default();

        if let Some(policy) = lookup(ENV_POLICY) {
            settings.policy = policy.trim().parse()?;
        }
        if let Some(read) = lookup(ENV_READ_CAPACITY) {
            settings.read_capacity = parse_capacity(ENV_READ_CAPACITY, &read)?;
        }
        if let Some(write) = lookup(ENV_WRITE_CAPACITY) {
            settings.write_capacity = parse_capacity(ENV_WRITE_CAPACITY, &write)?;
        }
        if let Some(projection) = lookup(ENV_GSI_PROJECTION) {
            settings.gsi_projection = projection.trim().parse()?;
        }

        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<()> {
        if self.read_capacity < 1 || self.write_capacity < 1 {
            return Err(DdlError::configuration(format!(
                "Provisioned capacity must be at least 1 (read={}, write={})",
                self.read_capacity, self.write_capacity
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(DdlError::configuration("poll_interval_ms must be positive"));
        }
        // settings carry no non-key attribute list to project
        if self.gsi_projection == ProjectionType::Include {
            return Err(DdlError::configuration(
                "gsi_projection INCLUDE is not supported, use ALL or KEYS_ONLY",
            ));
        }
        Ok(())
    }

    pub fn throughput(&self) -> ProvisionedThroughput {
        ProvisionedThroughput::new(self.read_capacity, self.write_capacity)
    }

    pub fn projection(&self) -> Projection {
        Projection::of(self.gsi_projection)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_capacity(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| DdlError::configuration(format!("{} must be an integer, got '{}'", key, value)))
}
