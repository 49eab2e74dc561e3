//! Schema Registry for Version Management
//!
//! Schemas are registered under a qualified name (`measurement_v1`); the part
//! before the last `_v` is the base name used for version tracking. Exports
//! look schemas up by base name and always write the highest version.

use apache_avro::Schema;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::SchemaError;

/// Schema metadata for registry entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMetadata {
    /// Base name (e.g., "measurement")
    pub name: String,

    /// Version (e.g., "v1")
    pub version: String,

    /// Full qualified name (e.g., "measurement_v1")
    pub qualified_name: String,
}

impl SchemaMetadata {
    /// Split `"measurement_v2"` into base name and version; unversioned names are `v1`
    pub fn from_qualified_name(name: &str) -> Self {
        let (base, version) = match name.rfind("_v") {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => (name, "v1"),
        };
        Self {
            name: base.to_string(),
            version: version.to_string(),
            qualified_name: name.to_string(),
        }
    }

    fn version_number(&self) -> u32 {
        self.version.trim_start_matches('v').parse().unwrap_or(0)
    }
}

/// Thread-safe schema registry with version management
#[derive(Default)]
pub struct SchemaRegistry {
    /// Schemas indexed by qualified name
    schemas: RwLock<HashMap<String, Schema>>,

    /// Latest qualified name for each base name
    latest: RwLock<HashMap<String, SchemaMetadata>>,
}

fn poisoned<T>(_: T) -> SchemaError {
    SchemaError::ValidationError("registry lock poisoned".to_string())
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under `name`; duplicates are rejected
    pub fn register(&self, name: &str, schema: Schema) -> Result<(), SchemaError> {
        let metadata = SchemaMetadata::from_qualified_name(name);

        {
            let mut schemas = self.schemas.write().map_err(poisoned)?;
            if schemas.contains_key(name) {
                return Err(SchemaError::ValidationError(format!(
                    "Schema {} already registered",
                    name
                )));
            }
            schemas.insert(name.to_string(), schema);
        }

        let mut latest = self.latest.write().map_err(poisoned)?;
        let newer = latest
            .get(&metadata.name)
            .map_or(true, |current| metadata.version_number() > current.version_number());
        if newer {
            latest.insert(metadata.name.clone(), metadata);
        }
        Ok(())
    }

    /// Get a schema by qualified name
    pub fn get(&self, name: &str) -> Result<Schema, SchemaError> {
        let schemas = self.schemas.read().map_err(poisoned)?;
        schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /// Get the highest registered version of a schema
    pub fn get_latest(&self, base_name: &str) -> Result<Schema, SchemaError> {
        let qualified = {
            let latest = self.latest.read().map_err(poisoned)?;
            latest
                .get(base_name)
                .map(|metadata| metadata.qualified_name.clone())
                .ok_or_else(|| SchemaError::NotFound(format!("No versions of {}", base_name)))?
        };
        self.get(&qualified)
    }

    /// Load all default Trackfuse schemas
    pub fn load_defaults(&self) -> Result<(), SchemaError> {
        use crate::schemas;

        self.register("measurement_v1", schemas::measurement_v1()?)?;
        self.register("estimate_v1", schemas::estimate_v1()?)?;
        self.register("scan_batch_v1", schemas::scan_batch_v1()?)?;
        Ok(())
    }
}

lazy_static::lazy_static! {
    /// Global schema registry with default schemas loaded
    pub static ref GLOBAL_REGISTRY: SchemaRegistry = {
        let registry = SchemaRegistry::new();
        // Built-in schemas are static JSON; a failure here surfaces as NotFound on lookup
        let _ = registry.load_defaults();
        registry
    };
}
