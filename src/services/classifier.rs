//! Fit classification for a single zone
//!
//! Pure function of (user value, garment value). No state, no I/O.

use crate::domain::types::{FitStatus, FitVerdict};

/// Upper edge of the perfect-fit band, in centimeters (inclusive)
pub const PERFECT_TOLERANCE_CM: f64 = 4.0;

/// Classify one zone.
///
/// `garment_value` must be a positive finite number; the catalog layer
/// guarantees it. `user_value` is `None` when the shopper never measured
/// the zone.
///
/// # Example
///
/// ```
/// use fit_engine::domain::types::FitStatus;
/// use fit_engine::services::classifier::classify;
///
/// let verdict = classify(Some(48.0), 44.0);
/// assert_eq!(verdict.status, FitStatus::Tight);
/// assert_eq!(verdict.delta, 4.0);
/// ```
#[inline]
pub fn classify(user_value: Option<f64>, garment_value: f64) -> FitVerdict {
    let Some(user) = user_value else {
        return FitVerdict::MISSING;
    };

    let delta = garment_value - user;
    if delta < 0.0 {
        FitVerdict { status: FitStatus::Tight, delta: delta.abs() }
    } else if delta <= PERFECT_TOLERANCE_CM {
        FitVerdict { status: FitStatus::Perfect, delta }
    } else {
        FitVerdict { status: FitStatus::Loose, delta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_value() {
        for garment in [0.5, 44.0, 104.0, 1000.0] {
            assert_eq!(classify(None, garment), FitVerdict::MISSING);
        }
    }

    #[test]
    fn test_tight_reports_magnitude() {
        let v = classify(Some(48.0), 44.0);
        assert_eq!(v.status, FitStatus::Tight);
        assert_eq!(v.delta, 4.0);

        let v = classify(Some(100.5), 96.0);
        assert_eq!(v.status, FitStatus::Tight);
        assert_eq!(v.delta, 100.5 - 96.0);
    }

    #[test]
    fn test_perfect_band() {
        assert_eq!(classify(Some(44.0), 44.0), FitVerdict { status: FitStatus::Perfect, delta: 0.0 });
        assert_eq!(classify(Some(62.0), 65.0), FitVerdict { status: FitStatus::Perfect, delta: 3.0 });
        assert_eq!(classify(Some(96.0), 100.0).status, FitStatus::Perfect);
    }

    #[test]
    fn test_loose() {
        assert_eq!(classify(Some(96.0), 104.0), FitVerdict { status: FitStatus::Loose, delta: 8.0 });
        assert_eq!(classify(Some(80.0), 100.0), FitVerdict { status: FitStatus::Loose, delta: 20.0 });
    }

    #[test]
    fn test_strict_boundaries() {
        // exactly at the tolerance edge
        assert_eq!(classify(Some(40.0), 44.0).status, FitStatus::Perfect);
        // just past it
        assert_eq!(classify(Some(40.0), 44.0001).status, FitStatus::Loose);
        // just under the body
        assert_eq!(classify(Some(40.0), 39.9999).status, FitStatus::Tight);
        assert_eq!(classify(Some(0.0001), 0.0).status, FitStatus::Tight);
    }

    #[test]
    fn test_deterministic() {
        let a = classify(Some(47.3), 44.1);
        let b = classify(Some(47.3), 44.1);
        assert_eq!(a.status, b.status);
        assert_eq!(a.delta.to_bits(), b.delta.to_bits());
    }
}
