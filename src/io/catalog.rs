//! Garment Catalog - fixed measurement sets for the items on sale
//!
//! Catalog file format (TOML):
//!
//! ```toml
//! [[garment]]
//! sku = "knit-sweater-m"
//! name = "Premium Knit Sweater"
//! size = "M"
//!
//! [garment.measurements]
//! shoulder = 44
//! chest = 104
//! waist = 100
//! arm = 65
//! ```

use crate::domain::garment::{CatalogFault, GarmentMeasurements, GarmentRecord, GarmentSpec};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown sku: {0}")]
    UnknownSku(String),

    #[error("garment {sku}: {fault}")]
    Fault {
        sku: String,
        #[source]
        fault: CatalogFault,
    },

    #[error("duplicate sku in catalog: {0}")]
    DuplicateSku(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Source of garment measurement sets
#[async_trait]
pub trait GarmentCatalog: Send + Sync {
    /// Raw catalog entry; measurements may still be faulty
    async fn get_garment(&self, sku: &str) -> Result<GarmentRecord, CatalogError>;

    /// Strict lookup: fails fast if any measurement is missing or malformed
    async fn get_garment_spec(&self, sku: &str) -> Result<GarmentSpec, CatalogError> {
        let record = self.get_garment(sku).await?;
        GarmentSpec::try_from(&record)
            .map_err(|fault| CatalogError::Fault { sku: record.sku.clone(), fault })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "garment")]
    garments: Vec<GarmentRecord>,
}

/// In-memory catalog loaded from a TOML document
#[derive(Debug, Clone)]
pub struct TomlCatalog {
    garments: FxHashMap<String, GarmentRecord>,
}

impl TomlCatalog {
    /// Catalog holding the single sample garment
    pub fn builtin() -> Self {
        let sample = GarmentRecord {
            sku: "knit-sweater-m".to_string(),
            name: "Premium Knit Sweater".to_string(),
            size: "M".to_string(),
            measurements: GarmentMeasurements::new(44.0, 104.0, 100.0, 65.0),
        };
        let mut garments = FxHashMap::default();
        garments.insert(sample.sku.clone(), sample);
        Self { garments }
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut garments = FxHashMap::default();
        for garment in file.garments {
            if let Err(fault) = GarmentSpec::try_from(&garment) {
                // kept: the fault is reported per zone at analysis time
                warn!(sku = %garment.sku, error = %fault, "catalog_entry_incomplete");
            }
            if garments.contains_key(&garment.sku) {
                return Err(CatalogError::DuplicateSku(garment.sku));
            }
            garments.insert(garment.sku.clone(), garment);
        }

        Ok(Self { garments })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&content)?;
        info!(file = %path.display(), garments = %catalog.len(), "catalog_loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.garments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.garments.is_empty()
    }
}

#[async_trait]
impl GarmentCatalog for TomlCatalog {
    async fn get_garment(&self, sku: &str) -> Result<GarmentRecord, CatalogError> {
        self.garments.get(sku).cloned().ok_or_else(|| CatalogError::UnknownSku(sku.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ZoneOutcome;
    use crate::domain::types::{FitStatus, Zone};
    use crate::services::analysis::analyze;

    const CATALOG: &str = r#"
[[garment]]
sku = "knit-sweater-m"
name = "Premium Knit Sweater"
size = "M"

[garment.measurements]
shoulder = 44
chest = 104.0
waist = 100
arm = 65

[[garment]]
sku = "cropped-jacket-s"
name = "Cropped Jacket"
size = "S"

[garment.measurements]
shoulder = 41
chest = 92
arm = 58
"#;

    #[tokio::test]
    async fn test_parse_and_lookup() {
        let catalog = TomlCatalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let spec = catalog.get_garment_spec("knit-sweater-m").await.unwrap();
        assert_eq!(spec.name, "Premium Knit Sweater");
        assert_eq!(spec.measurement(Zone::Chest), 104.0);
    }

    #[tokio::test]
    async fn test_incomplete_entry_fails_strict_lookup() {
        let catalog = TomlCatalog::parse(CATALOG).unwrap();

        let record = catalog.get_garment("cropped-jacket-s").await.unwrap();
        assert_eq!(record.measurements.waist, None);

        let err = catalog.get_garment_spec("cropped-jacket-s").await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Fault { fault: CatalogFault::Missing { zone: Zone::Waist }, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_spoil_catalog() {
        let content = r#"
[[garment]]
sku = "knit-sweater-m"
name = "Premium Knit Sweater"
size = "M"

[garment.measurements]
shoulder = 44
chest = 104
waist = 100
arm = 65

[[garment]]
sku = "wool-coat-m"
name = "Wool Coat"
size = "M"

[garment.measurements]
shoulder = 46
chest = "n/a"
waist = true
arm = 66
"#;
        let catalog = TomlCatalog::parse(content).unwrap();
        assert_eq!(catalog.len(), 2);

        // the good entry is unaffected
        let spec = catalog.get_garment_spec("knit-sweater-m").await.unwrap();
        assert_eq!(spec.measurement(Zone::Chest), 104.0);

        // the bad one faults per zone, other zones still classify
        let record = catalog.get_garment("wool-coat-m").await.unwrap();
        let report = analyze(None, &record);
        assert_eq!(report.zone(Zone::Chest).outcome, ZoneOutcome::Fault(CatalogFault::Malformed { zone: Zone::Chest }));
        assert_eq!(report.zone(Zone::Waist).outcome, ZoneOutcome::Fault(CatalogFault::Malformed { zone: Zone::Waist }));
        assert_eq!(report.status(Zone::Shoulder), Some(FitStatus::MissingData));
        assert_eq!(report.status(Zone::Arm), Some(FitStatus::MissingData));

        let err = catalog.get_garment_spec("wool-coat-m").await.unwrap_err();
        assert!(matches!(err, CatalogError::Fault { fault: CatalogFault::Malformed { zone: Zone::Chest }, .. }));
    }

    #[tokio::test]
    async fn test_unknown_sku() {
        let catalog = TomlCatalog::builtin();
        let err = catalog.get_garment("nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSku(ref sku) if sku == "nope"));
    }

    #[test]
    fn test_duplicate_sku_rejected() {
        let doubled = format!("{CATALOG}\n{CATALOG}");
        assert!(matches!(TomlCatalog::parse(&doubled), Err(CatalogError::DuplicateSku(_))));
    }

    #[tokio::test]
    async fn test_builtin_sample() {
        let catalog = TomlCatalog::builtin();
        let spec = catalog.get_garment_spec("knit-sweater-m").await.unwrap();
        assert_eq!(spec.measurement(Zone::Shoulder), 44.0);
        assert_eq!(spec.measurement(Zone::Waist), 100.0);
    }
}
