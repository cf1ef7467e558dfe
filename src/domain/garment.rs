//! Garment records from the Garment Catalog
//!
//! `GarmentRecord` is the catalog's raw shape; every measurement is
//! optional there, and a value of the wrong type is kept as `Malformed`,
//! so a data-integrity fault can be reported per zone without losing the
//! rest of the catalog. `GarmentSpec` is the validated form with all four
//! measurements present.

use crate::domain::types::Zone;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Per-zone catalog data-integrity fault
#[derive(Debug, Clone, Copy, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum CatalogFault {
    #[error("garment measurement for {zone} is missing")]
    Missing { zone: Zone },
    #[error("garment measurement for {zone} is not a positive finite number: {value}")]
    Invalid { zone: Zone, value: f64 },
    #[error("garment measurement for {zone} is not a number")]
    Malformed { zone: Zone },
}

impl CatalogFault {
    pub fn zone(&self) -> Zone {
        match self {
            CatalogFault::Missing { zone }
            | CatalogFault::Invalid { zone, .. }
            | CatalogFault::Malformed { zone } => *zone,
        }
    }
}

/// One catalog measurement as written in the catalog file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GarmentValue {
    Number(f64),
    /// Present but not a number (`"n/a"`, `true`, a table, ...)
    Malformed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarmentMeasurements {
    #[serde(default, deserialize_with = "deserialize_garment_value")]
    pub shoulder: Option<GarmentValue>,
    #[serde(default, deserialize_with = "deserialize_garment_value")]
    pub chest: Option<GarmentValue>,
    #[serde(default, deserialize_with = "deserialize_garment_value")]
    pub waist: Option<GarmentValue>,
    #[serde(default, deserialize_with = "deserialize_garment_value")]
    pub arm: Option<GarmentValue>,
}

impl GarmentMeasurements {
    pub fn new(shoulder: f64, chest: f64, waist: f64, arm: f64) -> Self {
        Self {
            shoulder: Some(GarmentValue::Number(shoulder)),
            chest: Some(GarmentValue::Number(chest)),
            waist: Some(GarmentValue::Number(waist)),
            arm: Some(GarmentValue::Number(arm)),
        }
    }

    fn entry(&self, zone: Zone) -> Option<GarmentValue> {
        match zone {
            Zone::Shoulder => self.shoulder,
            Zone::Chest => self.chest,
            Zone::Waist => self.waist,
            Zone::Arm => self.arm,
        }
    }

    /// Numeric value as written, valid or not
    pub fn raw(&self, zone: Zone) -> Option<f64> {
        match self.entry(zone) {
            Some(GarmentValue::Number(value)) => Some(value),
            Some(GarmentValue::Malformed) | None => None,
        }
    }

    /// Validated measurement for a zone
    pub fn get(&self, zone: Zone) -> Result<f64, CatalogFault> {
        match self.entry(zone) {
            None => Err(CatalogFault::Missing { zone }),
            Some(GarmentValue::Malformed) => Err(CatalogFault::Malformed { zone }),
            Some(GarmentValue::Number(value)) if value.is_finite() && value > 0.0 => Ok(value),
            Some(GarmentValue::Number(value)) => Err(CatalogFault::Invalid { zone, value }),
        }
    }
}

/// Accepts any value: numbers and numeric strings are kept, an empty
/// string is missing, everything else is `Malformed`
fn deserialize_garment_value<'de, D>(deserializer: D) -> Result<Option<GarmentValue>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

    struct GarmentValueVisitor;

    impl<'de> Visitor<'de> for GarmentValueVisitor {
        type Value = Option<GarmentValue>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a garment measurement")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(GarmentValue::Number(value)))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(GarmentValue::Number(value as f64)))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(GarmentValue::Number(value as f64)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            Ok(Some(trimmed.parse().map(GarmentValue::Number).unwrap_or(GarmentValue::Malformed)))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(Some(GarmentValue::Malformed))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, deserializer: D2) -> Result<Self::Value, D2::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(Some(GarmentValue::Malformed))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(Some(GarmentValue::Malformed))
        }
    }

    deserializer.deserialize_any(GarmentValueVisitor)
}

/// Catalog entry for the item being viewed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentRecord {
    pub sku: String,
    pub name: String,
    pub size: String,
    #[serde(default)]
    pub measurements: GarmentMeasurements,
}

/// Garment with all four measurements validated
#[derive(Debug, Clone, PartialEq)]
pub struct GarmentSpec {
    pub sku: String,
    pub name: String,
    pub size: String,
    values: [f64; 4],
}

impl GarmentSpec {
    #[inline]
    pub fn measurement(&self, zone: Zone) -> f64 {
        self.values[zone as usize]
    }
}

impl TryFrom<&GarmentRecord> for GarmentSpec {
    type Error = CatalogFault;

    fn try_from(record: &GarmentRecord) -> Result<Self, Self::Error> {
        let mut values = [0.0; 4];
        for zone in Zone::ALL {
            values[zone as usize] = record.measurements.get(zone)?;
        }
        Ok(Self {
            sku: record.sku.clone(),
            name: record.name.clone(),
            size: record.size.clone(),
            values,
        })
    }
}
