//! User profile record read from the Profile Provider
//!
//! The profile document is written by the measurement wizard, so numeric
//! fields arrive in whatever shape the form left them: a number, a numeric
//! string, an empty string, `null`, or not at all. Anything that is not a
//! positive finite number reads as "never recorded".

use crate::domain::types::Zone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity key of a profile record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    #[serde(alias = "erkek")]
    Male,
    #[serde(alias = "kadın", alias = "kadin")]
    Female,
}

/// Default cut the shopper prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPreference {
    Slim,
    #[default]
    Regular,
    Oversize,
}

impl FitPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitPreference::Slim => "slim",
            FitPreference::Regular => "regular",
            FitPreference::Oversize => "oversize",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub height_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub weight_kg: Option<f64>,
}

/// The seven tracked body measurements, in centimeters.
///
/// Only the four compared zones are read by the classifier; hip, inseam
/// and outseam are carried for garments that do not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub shoulder_width_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub chest_circumference_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub waist_circumference_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub hip_circumference_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub arm_length_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub inseam_cm: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_measurement")]
    pub outseam_cm: Option<f64>,
}

impl Measurements {
    /// Recorded value for a compared zone, or `None` if never measured
    pub fn get(&self, zone: Zone) -> Option<f64> {
        let raw = match zone {
            Zone::Shoulder => self.shoulder_width_cm,
            Zone::Chest => self.chest_circumference_cm,
            Zone::Waist => self.waist_circumference_cm,
            Zone::Arm => self.arm_length_cm,
        };
        raw.filter(|v| is_recorded(*v))
    }

    /// Builder used by tests and fixtures
    pub fn with(mut self, zone: Zone, value: f64) -> Self {
        match zone {
            Zone::Shoulder => self.shoulder_width_cm = Some(value),
            Zone::Chest => self.chest_circumference_cm = Some(value),
            Zone::Waist => self.waist_circumference_cm = Some(value),
            Zone::Arm => self.arm_length_cm = Some(value),
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_fit: FitPreference,
}

/// Most recently saved measurement/preference record for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "null_as_default")]
    pub basic_info: BasicInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub measurements: Measurements,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferences: Preferences,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, measurements: Measurements) -> Self {
        Self {
            id: UserId(id.into()),
            gender: Gender::default(),
            basic_info: BasicInfo::default(),
            measurements,
            preferences: Preferences::default(),
            updated_at: None,
        }
    }
}

/// A zero, negative, or non-finite body measurement was never recorded
#[inline]
fn is_recorded(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// `null` reads the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accepts a number, numeric string, empty string, or null
fn deserialize_measurement<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct MeasurementVisitor;

    impl<'de> Visitor<'de> for MeasurementVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, numeric string, empty string, or null")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Option<f64>, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Option<f64>, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Option<f64>, E> {
            Ok(Some(value as f64))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Option<f64>, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().map(Some).map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<f64>, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<f64>, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, deserializer: D2) -> Result<Option<f64>, D2::Error> {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(MeasurementVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_wizard_json() {
        let json = r#"{
            "id": "u-1",
            "gender": "erkek",
            "basic_info": { "height_cm": 180, "weight_kg": "" },
            "measurements": {
                "shoulder_width_cm": 44,
                "chest_circumference_cm": "96",
                "waist_circumference_cm": "",
                "hip_circumference_cm": null,
                "arm_length_cm": 62.5
            },
            "preferences": { "default_fit": "slim" },
            "updated_at": "2026-01-05T12:00:00Z"
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, UserId::from("u-1"));
        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.basic_info.height_cm, Some(180.0));
        assert_eq!(profile.basic_info.weight_kg, None);
        assert_eq!(profile.measurements.get(Zone::Shoulder), Some(44.0));
        assert_eq!(profile.measurements.get(Zone::Chest), Some(96.0));
        assert_eq!(profile.measurements.get(Zone::Waist), None);
        assert_eq!(profile.measurements.get(Zone::Arm), Some(62.5));
        assert_eq!(profile.measurements.inseam_cm, None);
        assert_eq!(profile.preferences.default_fit, FitPreference::Slim);
        assert!(profile.updated_at.is_some());
    }

    #[test]
    fn test_minimal_profile_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{ "id": "u-2" }"#).unwrap();
        assert_eq!(profile.preferences.default_fit, FitPreference::Regular);
        assert!(Zone::ALL.iter().all(|z| profile.measurements.get(*z).is_none()));
    }

    #[test]
    fn test_zero_and_negative_read_as_absent() {
        let m = Measurements::default().with(Zone::Shoulder, 0.0).with(Zone::Chest, -3.0);
        assert_eq!(m.get(Zone::Shoulder), None);
        assert_eq!(m.get(Zone::Chest), None);

        let m = Measurements::default().with(Zone::Waist, f64::NAN);
        assert_eq!(m.get(Zone::Waist), None);
    }

    #[test]
    fn test_non_numeric_string_rejected() {
        let result: Result<Measurements, _> =
            serde_json::from_str(r#"{ "shoulder_width_cm": "wide" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_null_sections_read_as_defaults() {
        let profile: UserProfile = serde_json::from_str(
            r#"{
                "id": "u-4",
                "gender": null,
                "basic_info": null,
                "measurements": { "shoulder_width_cm": 48 },
                "preferences": null,
                "updated_at": null
            }"#,
        )
        .unwrap();
        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.basic_info, BasicInfo::default());
        assert_eq!(profile.measurements.get(Zone::Shoulder), Some(48.0));
        assert_eq!(profile.preferences.default_fit, FitPreference::Regular);

        let profile: UserProfile = serde_json::from_str(
            r#"{ "id": "u-5", "measurements": null, "preferences": { "default_fit": null } }"#,
        )
        .unwrap();
        assert_eq!(profile.measurements, Measurements::default());
        assert_eq!(profile.preferences.default_fit, FitPreference::Regular);
    }

    #[test]
    fn test_female_alias() {
        let profile: UserProfile =
            serde_json::from_str(r#"{ "id": "u-3", "gender": "kadın" }"#).unwrap();
        assert_eq!(profile.gender, Gender::Female);
    }
}
