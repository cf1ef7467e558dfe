//! Builds the verdict set for one presentation session
//!
//! Each zone is classified independently. A missing user measurement is
//! `MissingData`; a missing or malformed garment measurement becomes a
//! per-zone fault instead of a fabricated verdict.

use crate::domain::garment::GarmentRecord;
use crate::domain::profile::{FitPreference, UserProfile};
use crate::domain::report::{FitReport, ZoneOutcome, ZoneReport};
use crate::domain::types::Zone;
use crate::services::classifier::classify;
use tracing::{debug, warn};

/// Classify every zone of `garment` against an optional profile.
///
/// An absent profile yields `MissingData` on every zone with a valid
/// garment measurement.
pub fn analyze(profile: Option<&UserProfile>, garment: &GarmentRecord) -> FitReport {
    let zones = Zone::ALL.map(|zone| {
        let user_value = profile.and_then(|p| p.measurements.get(zone));
        let garment_value = garment.measurements.raw(zone);

        let outcome = match garment.measurements.get(zone) {
            Ok(g) => ZoneOutcome::Verdict(classify(user_value, g)),
            Err(fault) => {
                warn!(sku = %garment.sku, zone = %zone, error = %fault, "catalog_fault");
                ZoneOutcome::Fault(fault)
            }
        };

        ZoneReport { zone, user_value, garment_value, outcome }
    });

    let report = FitReport {
        sku: garment.sku.clone(),
        garment_name: garment.name.clone(),
        garment_size: garment.size.clone(),
        fit_preference: profile.map(|p| p.preferences.default_fit).unwrap_or(FitPreference::Regular),
        zones,
    };

    debug!(
        sku = %report.sku,
        has_profile = %profile.is_some(),
        tight = ?report.tight_zones().as_slice(),
        "fit_analyzed"
    );

    report
}
