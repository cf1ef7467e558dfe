//! Fit report - the verdict set exposed to the rendering surface

use crate::domain::garment::CatalogFault;
use crate::domain::profile::FitPreference;
use crate::domain::types::{FitStatus, FitVerdict, Zone};
use serde::Serialize;
use smallvec::SmallVec;

/// Outcome for one zone: a verdict, or a catalog data-integrity fault
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneOutcome {
    Verdict(FitVerdict),
    Fault(CatalogFault),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneReport {
    pub zone: Zone,
    pub user_value: Option<f64>,
    pub garment_value: Option<f64>,
    pub outcome: ZoneOutcome,
}

impl ZoneReport {
    pub fn verdict(&self) -> Option<FitVerdict> {
        match self.outcome {
            ZoneOutcome::Verdict(v) => Some(v),
            ZoneOutcome::Fault(_) => None,
        }
    }
}

/// Per-zone verdicts for one garment against one shopper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    pub sku: String,
    pub garment_name: String,
    pub garment_size: String,
    /// Informational only; does not affect classification
    pub fit_preference: FitPreference,
    /// One entry per zone, in `Zone::ALL` order
    pub zones: [ZoneReport; 4],
}

impl FitReport {
    #[inline]
    pub fn zone(&self, zone: Zone) -> &ZoneReport {
        &self.zones[zone as usize]
    }

    pub fn verdict(&self, zone: Zone) -> Option<FitVerdict> {
        self.zone(zone).verdict()
    }

    pub fn status(&self, zone: Zone) -> Option<FitStatus> {
        self.verdict(zone).map(|v| v.status)
    }

    /// Zones classified `Tight`, in enumeration order (the tour queue)
    pub fn tight_zones(&self) -> SmallVec<[Zone; 4]> {
        self.zones
            .iter()
            .filter(|z| z.verdict().is_some_and(|v| v.is_tight()))
            .map(|z| z.zone)
            .collect()
    }

    pub fn faults(&self) -> impl Iterator<Item = &CatalogFault> {
        self.zones.iter().filter_map(|z| match &z.outcome {
            ZoneOutcome::Fault(f) => Some(f),
            ZoneOutcome::Verdict(_) => None,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
