//! Bio Index - excess ratio to bounded severity score and class
//!
//! Two independent mappings, deliberately decoupled:
//! - the 0-10 INDEX uses a sigmoid (or an optional linear clip) of the
//!   excess ratio, tuned for smooth dashboards;
//! - the qualitative CLASS thresholds the RAW excess ratio so its boundaries
//!   stay interpretable in fuel terms (10% / 20% over baseline).
//!
//! Deriving the class from the index would move the class boundaries whenever
//! the sigmoid constants are retuned; implementations must keep the two
//! calculations separate.

use crate::config::IndexConfig;
use crate::types::BioClass;

/// Normalized biofouling signal in [0, 1].
///
/// Sigmoid mode: `1 / (1 + e^(−k·(ER − midpoint)))`, clipped to [0, 1].
/// Linear mode: `clip(ER, 0, 1)`.
pub fn bio_index_unit(excess_ratio: f64, cfg: &IndexConfig) -> f64 {
    if !cfg.use_sigmoid {
        return excess_ratio.clamp(0.0, 1.0);
    }
    let val = 1.0 / (1.0 + (-cfg.sigmoid_k * (excess_ratio - cfg.sigmoid_midpoint)).exp());
    val.clamp(0.0, 1.0)
}

/// Severity index on the 0-10 reporting scale, one decimal.
pub fn bio_index_0_10(excess_ratio: f64, cfg: &IndexConfig) -> f64 {
    (bio_index_unit(excess_ratio, cfg) * 100.0).round() / 10.0
}

/// Qualitative class from the RAW excess ratio.
///
/// `NaN` maps to `Unknown` — an unlabeled row, not an error.
pub fn classify(excess_ratio: f64) -> BioClass {
    if excess_ratio.is_nan() {
        return BioClass::Unknown;
    }
    if excess_ratio < 0.10 {
        BioClass::Leve
    } else if excess_ratio < 0.20 {
        BioClass::Moderada
    } else {
        BioClass::Severa
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> IndexConfig {
        IndexConfig::default()
    }

    #[test]
    fn test_index_bounded_for_extreme_ratios() {
        for er in [-1.0e6, -10.0, -0.5, 0.0, 0.1, 0.5, 10.0, 1.0e6] {
            let idx = bio_index_0_10(er, &cfg());
            assert!((0.0..=10.0).contains(&idx), "index out of bounds for ER={er}: {idx}");
        }
    }

    #[test]
    fn test_index_monotone_in_excess_ratio() {
        let ratios = [-0.5, -0.1, 0.0, 0.05, 0.10, 0.15, 0.25, 0.5, 1.0];
        let mut prev = f64::NEG_INFINITY;
        for er in ratios {
            let idx = bio_index_0_10(er, &cfg());
            assert!(idx >= prev, "index not monotone at ER={er}: {idx} < {prev}");
            prev = idx;
        }
    }

    #[test]
    fn test_sigmoid_midpoint_reads_half() {
        // ER at the midpoint → unit index 0.5 → 5.0 on the reporting scale
        assert!((bio_index_0_10(0.10, &cfg()) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_linear_mode_is_plain_clip() {
        let linear = IndexConfig {
            use_sigmoid: false,
            ..IndexConfig::default()
        };
        assert!(bio_index_unit(-0.2, &linear).abs() < f64::EPSILON);
        assert!((bio_index_unit(0.35, &linear) - 0.35).abs() < f64::EPSILON);
        assert!((bio_index_unit(1.7, &linear) - 1.0).abs() < f64::EPSILON);
        assert!((bio_index_0_10(0.35, &linear) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_one_decimal_rounding() {
        // Sigmoid(0) with k=10, mid=0.1 = 1/(1+e) ≈ 0.26894 → 2.7
        assert!((bio_index_0_10(0.0, &cfg()) - 2.7).abs() < 1e-12);
    }

    #[test]
    fn test_class_thresholds() {
        assert_eq!(classify(0.05), BioClass::Leve);
        assert_eq!(classify(0.15), BioClass::Moderada);
        assert_eq!(classify(0.25), BioClass::Severa);
        assert_eq!(classify(f64::NAN), BioClass::Unknown);
    }

    #[test]
    fn test_class_boundary_values() {
        assert_eq!(classify(0.10), BioClass::Moderada);
        assert_eq!(classify(0.20), BioClass::Severa);
        assert_eq!(classify(-0.3), BioClass::Leve);
    }

    #[test]
    fn test_class_ignores_index_mode() {
        // The class thresholds the raw ratio; switching the index to linear
        // mode must not move a class boundary.
        assert_eq!(classify(0.15), BioClass::Moderada);
        let linear = IndexConfig {
            use_sigmoid: false,
            ..IndexConfig::default()
        };
        // Even though the linear index of 0.15 is 1.5 (not 5-ish), the class
        // is unchanged.
        assert!((bio_index_0_10(0.15, &linear) - 1.5).abs() < 1e-12);
        assert_eq!(classify(0.15), BioClass::Moderada);
    }
}
