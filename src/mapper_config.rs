//! Mapper configuration and repair of partially built configurations.
//!
//! A `MapperConfig` assembled from an empty builder may miss the conversion
//! schema or the type converter factory. [`repair`] merges the missing
//! values from [`MapperConfig::default_config`] into a new instance.

use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::warn;

/// The well-known default configuration, shared by identity.
static DEFAULT: Lazy<Arc<MapperConfig>> = Lazy::new(|| {
    Arc::new(MapperConfig {
        save_behavior: Some(SaveBehavior::Update),
        consistent_reads: Some(ConsistentReads::Eventual),
        table_name_override: None,
        conversion_schema: Some(ConversionSchema::V2Compatible),
        type_converter_factory: Some(TypeConverterFactory::Standard),
    })
});

/// How items are marshalled to the store's generic attribute format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionSchema {
    V1,
    V2Compatible,
    V2,
}

/// Source of attribute type converters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeConverterFactory {
    Standard,
    /// Named, application-registered converter set.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveBehavior {
    Update,
    Clobber,
    UpdateSkipNullAttributes,
    AppendSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistentReads {
    Eventual,
    Consistent,
}

/// Rewrites the table name an entity declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableNameOverride {
    /// Prepend to the declared name.
    Prefix(String),
    /// Replace the declared name.
    Name(String),
}

impl TableNameOverride {
    pub fn apply(&self, table_name: &str) -> String {
        match self {
            TableNameOverride::Prefix(prefix) => format!("{}{}", prefix, table_name),
            TableNameOverride::Name(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapperConfig {
    pub save_behavior: Option<SaveBehavior>,
    pub consistent_reads: Option<ConsistentReads>,
    pub table_name_override: Option<TableNameOverride>,
    pub conversion_schema: Option<ConversionSchema>,
    pub type_converter_factory: Option<TypeConverterFactory>,
}

impl MapperConfig {
    /// The shared default instance.
    pub fn default_config() -> Arc<MapperConfig> {
        Arc::clone(&DEFAULT)
    }

    /// Start from an empty configuration, every field unset.
    pub fn builder() -> MapperConfigBuilder {
        MapperConfigBuilder::default()
    }

    pub fn is_complete(&self) -> bool {
        self.conversion_schema.is_some() && self.type_converter_factory.is_some()
    }
}

#[derive(Debug, Default)]
pub struct MapperConfigBuilder {
    config: MapperConfig,
}

impl MapperConfigBuilder {
    pub fn save_behavior(mut self, save_behavior: SaveBehavior) -> Self {
        self.config.save_behavior = Some(save_behavior);
        self
    }

    pub fn consistent_reads(mut self, consistent_reads: ConsistentReads) -> Self {
        self.config.consistent_reads = Some(consistent_reads);
        self
    }

    pub fn table_name_override(mut self, table_name_override: TableNameOverride) -> Self {
        self.config.table_name_override = Some(table_name_override);
        self
    }

    pub fn conversion_schema(mut self, conversion_schema: ConversionSchema) -> Self {
        self.config.conversion_schema = Some(conversion_schema);
        self
    }

    pub fn type_converter_factory(mut self, factory: TypeConverterFactory) -> Self {
        self.config.type_converter_factory = Some(factory);
        self
    }

    pub fn build(self) -> MapperConfig {
        self.config
    }
}

/// Fill in the conversion schema and type converter factory from the
/// default configuration.
///
/// The default instance itself is returned as-is. Any other configuration
/// yields a new instance; the original is never touched.
pub fn repair(config: &Arc<MapperConfig>) -> Arc<MapperConfig> {
    let default = MapperConfig::default_config();
    if Arc::ptr_eq(config, &default) {
        return default;
    }

    let mut merged = MapperConfig::clone(config);

    if merged.conversion_schema.is_none() {
        warn!(
            "No conversion schema set in the provided mapper config! Merging with the default mapper config"
        );
        merged.conversion_schema = default.conversion_schema;
    }

    if merged.type_converter_factory.is_none() {
        warn!(
            "No type converter factory set in the provided mapper config! Merging with the default mapper config"
        );
        merged.type_converter_factory = default.type_converter_factory.clone();
    }

    Arc::new(merged)
}
