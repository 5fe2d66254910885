use std::fs;
use std::path::PathBuf;

use livery_application::{ApplicationError, CatalogSource};
use livery_domain::{Catalog, Variant};
use serde::Deserialize;

const DEFAULT_CATALOG_JSON: &str = include_str!("default.json");

/// Reads the catalog from a JSON file, or from the embedded default when no
/// path is configured.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalogSource {
    path: Option<PathBuf>,
}

impl JsonCatalogSource {
    pub fn builtin() -> Self {
        Self { path: None }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl CatalogSource for JsonCatalogSource {
    fn load_catalog(&self) -> Result<Catalog, ApplicationError> {
        match &self.path {
            None => parse_catalog(DEFAULT_CATALOG_JSON),
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|error| {
                    ApplicationError::Io(format!("failed to read catalog {:?}: {error}", path))
                })?;
                parse_catalog(&json)
            }
        }
    }
}

/// One catalog entry as written on disk. Field values are validated by the
/// domain constructors, not by serde.
#[derive(Debug, Deserialize)]
struct VariantRecord {
    id: String,
    name: String,
    accent: String,
    image: String,
}

impl VariantRecord {
    fn into_variant(self) -> Result<Variant, ApplicationError> {
        Ok(Variant::new(&self.id, &self.name, &self.accent, &self.image)?)
    }
}

pub fn parse_catalog(json: &str) -> Result<Catalog, ApplicationError> {
    let records: Vec<VariantRecord> = serde_json::from_str(json)
        .map_err(|error| ApplicationError::InvalidInput(format!("catalog json: {error}")))?;
    let variants = records
        .into_iter()
        .map(VariantRecord::into_variant)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Catalog::new(variants)?)
}
