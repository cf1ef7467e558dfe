//! Domain types - pure data, no IO
//!
//! - `types` - body zones, viewports, fit verdicts
//! - `profile` - saved shopper profile and its measurement set
//! - `garment` - catalog measurement sets
//! - `report` - per-garment verdict set handed to the surface

pub mod garment;
pub mod profile;
pub mod report;
pub mod types;

pub use garment::{CatalogFault, GarmentMeasurements, GarmentRecord, GarmentSpec, GarmentValue};
pub use profile::{FitPreference, Measurements, UserId, UserProfile};
pub use report::{FitReport, ZoneOutcome, ZoneReport};
pub use types::{FitStatus, FitVerdict, ViewBox, Zone};
