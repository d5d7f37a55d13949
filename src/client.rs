//! DynamoDB control-plane client.
//!
//! Provides a DynamoDB client that supports multiple credential sources:
//! - Hardcoded credentials
//! - AWS profiles
//! - Environment variables and the default chain
//!
//! and an adapter implementing [`ControlPlane`] on top of it.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use std::time::Duration;
use tracing::debug;

use crate::control_plane::{ControlPlane, TableObservation};
use crate::conversions::{
    attribute_definitions_to_sdk, gsi_to_sdk, key_schema_to_sdk, lsi_to_sdk, observation_from_sdk,
    throughput_to_sdk,
};
use crate::errors::{DdlError, Result, map_sdk_error};
use crate::runtime::block_on;
use crate::table_operations::TableDefinition;

/// Connection settings for the DynamoDB client.
///
/// Credentials priority:
/// 1. Hardcoded credentials (access_key, secret_key, session_token)
/// 2. AWS profile from ~/.aws/credentials
/// 3. Default credential chain (env vars, instance profile, etc.)
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// AWS region (default: SDK chain, then us-east-1)
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    pub profile: Option<String>,
    /// Custom endpoint URL for local testing (DynamoDB Local, LocalStack)
    pub endpoint_url: Option<String>,
    /// Operation timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Build the AWS SDK DynamoDB client with the given configuration.
pub async fn build_client(config: &ClientConfig) -> Client {
    // Region priority: param > env var > default
    let region_provider = RegionProviderChain::first_try(
        config
            .region
            .clone()
            .map(aws_sdk_dynamodb::config::Region::new),
    )
    .or_default_provider()
    .or_else("us-east-1");

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    // Credentials priority: hardcoded > profile > env/default chain
    if let (Some(ak), Some(sk)) = (&config.access_key, &config.secret_key) {
        let creds = Credentials::new(
            ak,
            sk,
            config.session_token.clone(),
            None,
            "dynoddl-hardcoded",
        );
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = &config.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }

    let sdk_config = config_loader.load().await;

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);

    if let Some(url) = &config.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    if let Some(timeout_ms) = config.timeout_ms {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_millis(timeout_ms))
            .build();
        dynamo_config = dynamo_config.timeout_config(timeout_config);
    }

    Client::from_conf(dynamo_config.build())
}

/// [`ControlPlane`] backed by the AWS SDK.
#[derive(Clone)]
pub struct DynamoControlPlane {
    client: Client,
}

impl std::fmt::Debug for DynamoControlPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoControlPlane").finish_non_exhaustive()
    }
}

impl DynamoControlPlane {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        Ok(Self::from_client(build_client(config).await))
    }

    /// Blocking variant of [`connect`](Self::connect).
    pub fn connect_blocking(config: &ClientConfig) -> Result<Self> {
        block_on("connect", Self::connect(config))
    }

    /// Create from a pre-built client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Check connectivity with a one-table `ListTables` call.
    pub async fn ping(&self) -> Result<bool> {
        self.client
            .list_tables()
            .limit(1)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, None))?;
        Ok(true)
    }
}

#[async_trait]
impl ControlPlane for DynamoControlPlane {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let mut request = self
            .client
            .create_table()
            .table_name(&definition.table_name)
            .set_attribute_definitions(Some(attribute_definitions_to_sdk(
                &definition.attribute_definitions,
            )?))
            .set_key_schema(Some(key_schema_to_sdk(&definition.key_schema)?))
            .provisioned_throughput(throughput_to_sdk(&definition.provisioned_throughput)?);

        if let Some(indexes) = &definition.global_secondary_indexes {
            let gsis = indexes.iter().map(gsi_to_sdk).collect::<Result<Vec<_>>>()?;
            request = request.set_global_secondary_indexes(Some(gsis));
        }
        if let Some(indexes) = &definition.local_secondary_indexes {
            let lsis = indexes.iter().map(lsi_to_sdk).collect::<Result<Vec<_>>>()?;
            request = request.set_local_secondary_indexes(Some(lsis));
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, Some(&definition.table_name)))?;

        debug!(
            "Create table {} accepted with status {:?}",
            definition.table_name,
            output
                .table_description()
                .and_then(|t| t.table_status())
                .map(|s| s.as_str())
        );
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, Some(table_name)))?;
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableObservation> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, Some(table_name)))?;

        match output.table() {
            Some(table) => observation_from_sdk(table_name, table),
            None => Err(DdlError::not_found(table_name)),
        }
    }

    async fn list_table_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(e, None))?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => return Ok(names),
            }
        }
    }
}
