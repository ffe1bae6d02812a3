//! Anemia categories and the crisp-index lookup table

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnemiaError, AnemiaResult};

/// Values this close to an integer boundary are snapped onto it before lookup
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Anemia classification, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnemiaCategory {
    #[serde(rename = "Normal")]
    Normal = 0,
    #[serde(rename = "Microcytic Hypochromic")]
    MicrocyticHypochromic = 1,
    #[serde(rename = "Microcytic Normochromic")]
    MicrocyticNormochromic = 2,
    #[serde(rename = "Microcytic Hyperchromic")]
    MicrocyticHyperchromic = 3,
    #[serde(rename = "Normocytic Hypochromic")]
    NormocyticHypochromic = 4,
    #[serde(rename = "Normocytic Normochromic")]
    NormocyticNormochromic = 5,
    #[serde(rename = "Normocytic Hyperchromic")]
    NormocyticHyperchromic = 6,
    #[serde(rename = "Macrocytic Hypochromic")]
    MacrocyticHypochromic = 7,
    #[serde(rename = "Macrocytic Normochromic")]
    MacrocyticNormochromic = 8,
    #[serde(rename = "Macrocytic Hyperchromic")]
    MacrocyticHyperchromic = 9,
    /// Sentinel when no rule fired or the index fell off the table
    #[serde(rename = "Diagnosis Inconclusive")]
    Inconclusive = 10,
}

impl AnemiaCategory {
    /// The ten diagnostic categories (sentinel excluded)
    pub const ALL: [AnemiaCategory; 10] = [
        AnemiaCategory::Normal,
        AnemiaCategory::MicrocyticHypochromic,
        AnemiaCategory::MicrocyticNormochromic,
        AnemiaCategory::MicrocyticHyperchromic,
        AnemiaCategory::NormocyticHypochromic,
        AnemiaCategory::NormocyticNormochromic,
        AnemiaCategory::NormocyticHyperchromic,
        AnemiaCategory::MacrocyticHypochromic,
        AnemiaCategory::MacrocyticNormochromic,
        AnemiaCategory::MacrocyticHyperchromic,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            AnemiaCategory::Normal => "Normal",
            AnemiaCategory::MicrocyticHypochromic => "Microcytic Hypochromic",
            AnemiaCategory::MicrocyticNormochromic => "Microcytic Normochromic",
            AnemiaCategory::MicrocyticHyperchromic => "Microcytic Hyperchromic",
            AnemiaCategory::NormocyticHypochromic => "Normocytic Hypochromic",
            AnemiaCategory::NormocyticNormochromic => "Normocytic Normochromic",
            AnemiaCategory::NormocyticHyperchromic => "Normocytic Hyperchromic",
            AnemiaCategory::MacrocyticHypochromic => "Macrocytic Hypochromic",
            AnemiaCategory::MacrocyticNormochromic => "Macrocytic Normochromic",
            AnemiaCategory::MacrocyticHyperchromic => "Macrocytic Hyperchromic",
            AnemiaCategory::Inconclusive => "Diagnosis Inconclusive",
        }
    }

    /// Position in the index table; `None` for the sentinel
    pub const fn index(self) -> Option<usize> {
        match self {
            AnemiaCategory::Inconclusive => None,
            other => Some(other as usize),
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .chain(std::iter::once(&AnemiaCategory::Inconclusive))
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
            .copied()
    }

    pub fn is_inconclusive(self) -> bool {
        self == AnemiaCategory::Inconclusive
    }
}

impl fmt::Display for AnemiaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One half-open interval `[low, high)` of the category table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryInterval {
    pub low: f64,
    pub high: f64,
    pub category: AnemiaCategory,
}

impl CategoryInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value < self.high
    }
}

/// Ordered table of half-open intervals partitioning `[0, 10)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMap {
    intervals: Vec<CategoryInterval>,
}

impl CategoryMap {
    /// `[i, i + 1)` for each category index `i`
    pub fn standard() -> Self {
        let intervals = AnemiaCategory::ALL
            .iter()
            .enumerate()
            .map(|(i, &category)| CategoryInterval {
                low: i as f64,
                high: (i + 1) as f64,
                category,
            })
            .collect();
        Self { intervals }
    }

    /// Build from explicit intervals; they must tile a range with no gaps
    /// or overlaps.
    pub fn from_intervals(intervals: Vec<CategoryInterval>) -> AnemiaResult<Self> {
        if intervals.is_empty() {
            return Err(AnemiaError::configuration("Category map has no intervals"));
        }
        for interval in &intervals {
            if !(interval.low.is_finite() && interval.high.is_finite() && interval.low < interval.high) {
                return Err(AnemiaError::configuration(format!(
                    "Category interval [{}, {}) for '{}' is empty or not finite",
                    interval.low, interval.high, interval.category
                )));
            }
        }
        for pair in intervals.windows(2) {
            if pair[0].high != pair[1].low {
                return Err(AnemiaError::configuration(format!(
                    "Category intervals [{}, {}) and [{}, {}) do not meet",
                    pair[0].low, pair[0].high, pair[1].low, pair[1].high
                )));
            }
        }
        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[CategoryInterval] {
        &self.intervals
    }

    pub fn low(&self) -> f64 {
        self.intervals.first().map(|i| i.low).unwrap_or(0.0)
    }

    pub fn high(&self) -> f64 {
        self.intervals.last().map(|i| i.high).unwrap_or(0.0)
    }

    /// First interval containing the value.
    ///
    /// A value within [`BOUNDARY_TOLERANCE`] of an integer is looked up at
    /// that integer first, unless the snapped value falls off the table.
    /// Values below the table are never snapped onto it.
    pub fn categorize(&self, value: f64) -> AnemiaResult<AnemiaCategory> {
        if value.is_nan() || value < self.low() {
            return Err(AnemiaError::out_of_range(value, self.low(), self.high()));
        }
        let lookup = |x: f64| {
            self.intervals
                .iter()
                .find(|interval| interval.contains(x))
                .map(|interval| interval.category)
        };
        lookup(snap_to_boundary(value))
            .or_else(|| lookup(value))
            .ok_or_else(|| AnemiaError::out_of_range(value, self.low(), self.high()))
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// Map a crisp index onto the standard table
pub fn categorize(value: f64) -> AnemiaResult<AnemiaCategory> {
    CategoryMap::standard().categorize(value)
}

fn snap_to_boundary(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < BOUNDARY_TOLERANCE {
        nearest
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_names_are_ordered() {
        let names: Vec<&str> = AnemiaCategory::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names[0], "Normal");
        assert_eq!(names[4], "Normocytic Hypochromic");
        assert_eq!(names[9], "Macrocytic Hyperchromic");
        assert_eq!(AnemiaCategory::Inconclusive.to_string(), "Diagnosis Inconclusive");
    }

    #[test]
    fn test_index_round_trip() {
        for (i, category) in AnemiaCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), Some(i));
            assert_eq!(AnemiaCategory::from_index(i), Some(*category));
        }
        assert_eq!(AnemiaCategory::Inconclusive.index(), None);
        assert_eq!(AnemiaCategory::from_index(10), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            AnemiaCategory::from_name("microcytic hypochromic"),
            Some(AnemiaCategory::MicrocyticHypochromic)
        );
        assert_eq!(
            AnemiaCategory::from_name("Diagnosis Inconclusive"),
            Some(AnemiaCategory::Inconclusive)
        );
        assert_eq!(AnemiaCategory::from_name("Sickle"), None);
    }

    #[test]
    fn test_categorize_partitions_range() {
        let map = CategoryMap::standard();
        for i in 0..1000 {
            let v = i as f64 * 0.01;
            let hits = map.intervals().iter().filter(|i| i.contains(v)).count();
            assert_eq!(hits, 1, "value {}", v);
            assert!(map.categorize(v).is_ok());
        }
        assert_eq!(
            map.categorize(10.0 - 1e-12).unwrap(),
            AnemiaCategory::MacrocyticHyperchromic
        );
    }

    #[test]
    fn test_categorize_boundaries() {
        assert_eq!(categorize(0.0).unwrap(), AnemiaCategory::Normal);
        assert_eq!(categorize(0.999).unwrap(), AnemiaCategory::Normal);
        assert_eq!(categorize(1.0).unwrap(), AnemiaCategory::MicrocyticHypochromic);
        assert_eq!(categorize(9.5).unwrap(), AnemiaCategory::MacrocyticHyperchromic);
    }

    #[test]
    fn test_categorize_snaps_float_drift() {
        assert_eq!(
            categorize(1.0 - 1e-13).unwrap(),
            AnemiaCategory::MicrocyticHypochromic
        );
        assert_eq!(
            categorize(2.0 - 4e-15).unwrap(),
            AnemiaCategory::MicrocyticNormochromic
        );
    }

    #[test]
    fn test_categorize_does_not_snap_below_table() {
        assert_eq!(categorize(-1e-12).unwrap_err().code, ErrorCode::OutOfRange);
        assert_eq!(categorize(-1e-10).unwrap_err().code, ErrorCode::OutOfRange);
        assert_eq!(categorize(-0.0).unwrap(), AnemiaCategory::Normal);
    }

    #[test]
    fn test_categorize_out_of_range() {
        assert_eq!(categorize(-0.5).unwrap_err().code, ErrorCode::OutOfRange);
        assert_eq!(categorize(10.0).unwrap_err().code, ErrorCode::OutOfRange);
        assert!(categorize(f64::NAN).is_err());
        assert!(categorize(f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_intervals_rejects_gaps() {
        let gap = vec![
            CategoryInterval { low: 0.0, high: 1.0, category: AnemiaCategory::Normal },
            CategoryInterval {
                low: 1.5,
                high: 2.0,
                category: AnemiaCategory::MicrocyticHypochromic,
            },
        ];
        assert!(CategoryMap::from_intervals(gap).is_err());
        assert!(CategoryMap::from_intervals(Vec::new()).is_err());
        assert!(CategoryMap::from_intervals(CategoryMap::standard().intervals().to_vec()).is_ok());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&AnemiaCategory::NormocyticHyperchromic).unwrap();
        assert_eq!(json, "\"Normocytic Hyperchromic\"");
        let back: AnemiaCategory = serde_json::from_str("\"Diagnosis Inconclusive\"").unwrap();
        assert_eq!(back, AnemiaCategory::Inconclusive);
    }
}
