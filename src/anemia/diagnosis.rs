//! Diagnosis entry points
//!
//! [`Diagnoser`] bundles the immutable fuzzy system with the category table.
//! Build it once and share it by reference; every call runs its own
//! inference context and never mutates the diagnoser.
//!
//! ```rust,ignore
//! use fuzzy_anemia::Diagnoser;
//!
//! let diagnoser = Diagnoser::new()?;
//! assert_eq!(diagnoser.diagnose(14.0, 90.0, 34.0).name(), "Normal");
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::{AnemiaError, AnemiaResult, ErrorCode};
use crate::fuzzy::{FuzzySystem, Inference, RuleFiring};
use super::category::{AnemiaCategory, CategoryMap};
use super::knowledge::{knowledge_base, HGB, INPUTS, MCHC, MCV};

/// Membership curves of one variable, keyed by term, as `(x, degree)` pairs
pub type TermCurves = IndexMap<String, Vec<(f64, f64)>>;

/// The three crisp laboratory values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisInput {
    pub hgb: f64,
    pub mcv: f64,
    pub mchc: f64,
}

impl DiagnosisInput {
    pub fn new(hgb: f64, mcv: f64, mchc: f64) -> Self {
        Self { hgb, mcv, mchc }
    }

    /// Parse raw text fields, reporting the first missing or non-numeric one
    pub fn parse(hgb: Option<&str>, mcv: Option<&str>, mchc: Option<&str>) -> AnemiaResult<Self> {
        Ok(Self {
            hgb: parse_field(HGB, hgb)?,
            mcv: parse_field(MCV, mcv)?,
            mchc: parse_field(MCHC, mchc)?,
        })
    }

    fn pairs(&self) -> [(&'static str, f64); 3] {
        [(HGB, self.hgb), (MCV, self.mcv), (MCHC, self.mchc)]
    }
}

fn parse_field(name: &str, raw: Option<&str>) -> AnemiaResult<f64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or_else(|| AnemiaError::missing_input(name))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AnemiaError::non_numeric(name, raw)),
    }
}

/// Everything one diagnosis produced, for callers that show more than the label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisReport {
    pub input: DiagnosisInput,
    pub category: AnemiaCategory,
    /// Defuzzified result index; `None` when no rule fired
    pub result_index: Option<f64>,
    /// Why the diagnosis is inconclusive, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub fuzzified: IndexMap<String, IndexMap<String, f64>>,
    pub rules: Vec<RuleFiring>,
    pub term_strengths: IndexMap<String, f64>,
    /// Aggregated output curve over the anemia universe
    pub aggregate: Vec<(f64, f64)>,
}

impl fmt::Display for DiagnosisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diagnosis: {}", self.category)?;
        match self.result_index {
            Some(index) => write!(f, " | Result Index: {:.2}", index),
            None => write!(f, " | Result Index: n/a"),
        }
    }
}

/// Immutable diagnosis service
#[derive(Debug, Clone)]
pub struct Diagnoser {
    system: FuzzySystem,
    categories: CategoryMap,
}

impl Diagnoser {
    /// Diagnoser with Mamdani min implication and centroid defuzzification
    pub fn new() -> AnemiaResult<Self> {
        Self::with_config(&InferenceConfig::default())
    }

    pub fn with_config(config: &InferenceConfig) -> AnemiaResult<Self> {
        Ok(Self {
            system: knowledge_base(config.implication, config.defuzzification)?,
            categories: CategoryMap::standard(),
        })
    }

    pub fn system(&self) -> &FuzzySystem {
        &self.system
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    /// Run the fuzzy pipeline without category lookup
    pub fn infer(&self, input: &DiagnosisInput) -> AnemiaResult<Inference> {
        self.system.infer(input.pairs())
    }

    /// Classify three crisp values. Never fails: anything that prevents a
    /// category (no rule fired, index off the table, unusable input) yields
    /// [`AnemiaCategory::Inconclusive`].
    pub fn diagnose(&self, hgb: f64, mcv: f64, mchc: f64) -> AnemiaCategory {
        let input = DiagnosisInput::new(hgb, mcv, mchc);
        match self.infer(&input).and_then(|inference| self.classify(&inference)) {
            Ok(category) => category,
            Err(err) => {
                warn!(hgb, mcv, mchc, code = ?err.code, "diagnosis inconclusive: {}", err.message);
                AnemiaCategory::Inconclusive
            }
        }
    }

    /// Full report. Fails only on invalid input; inconclusive outcomes are
    /// reported through `category` and `reason`.
    pub fn report(&self, input: &DiagnosisInput) -> AnemiaResult<DiagnosisReport> {
        let inference = self.infer(input)?;
        let (category, reason) = match self.classify(&inference) {
            Ok(category) => (category, None),
            Err(err) if err.is_inconclusive() => {
                warn!(?input, code = ?err.code, "diagnosis inconclusive: {}", err.message);
                (AnemiaCategory::Inconclusive, Some(err.message))
            }
            Err(err) => return Err(err),
        };
        debug!(?input, %category, index = ?inference.crisp, "diagnosis report built");

        Ok(DiagnosisReport {
            input: *input,
            category,
            result_index: inference.crisp,
            reason,
            fuzzified: inference.fuzzified,
            rules: inference.rules,
            term_strengths: inference.term_strengths,
            aggregate: inference.aggregate,
        })
    }

    fn classify(&self, inference: &Inference) -> AnemiaResult<AnemiaCategory> {
        let crisp = inference.crisp_output()?;
        self.categories.categorize(crisp)
    }

    /// Term shapes of one variable for plotting. Full universe resolution
    /// unless `downsample` asks for fewer points.
    pub fn membership_curves(&self, variable: &str, downsample: Option<usize>) -> AnemiaResult<TermCurves> {
        self.system
            .variable(variable)
            .map(|var| var.curves(downsample))
            .ok_or_else(|| {
                AnemiaError::new(
                    ErrorCode::InvalidInput,
                    format!("Unknown variable '{}'", variable),
                )
                .with_hint(format!("Known variables: {}, anemia", INPUTS.join(", ")))
            })
    }

    /// Curves for all three inputs, in input order
    pub fn input_curves(&self, downsample: Option<usize>) -> Vec<VariableCurves> {
        self.system
            .inputs()
            .iter()
            .map(|var| VariableCurves {
                variable: var.name().to_string(),
                min: var.universe().min(),
                max: var.universe().max(),
                terms: var.curves(downsample),
            })
            .collect()
    }
}

/// Serializable curve export of one variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableCurves {
    pub variable: String,
    pub min: f64,
    pub max: f64,
    pub terms: TermCurves,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::DefuzzificationMethod;

    fn diagnoser() -> Diagnoser {
        Diagnoser::new().unwrap()
    }

    #[test]
    fn test_all_normal_is_normal() {
        assert_eq!(diagnoser().diagnose(14.0, 90.0, 34.0), AnemiaCategory::Normal);
    }

    #[test]
    fn test_all_low_is_microcytic_hypochromic() {
        assert_eq!(
            diagnoser().diagnose(9.0, 70.0, 29.0),
            AnemiaCategory::MicrocyticHypochromic
        );
    }

    #[test]
    fn test_low_hgb_normal_indices_is_microcytic_normochromic() {
        assert_eq!(
            diagnoser().diagnose(9.0, 95.0, 34.0),
            AnemiaCategory::MicrocyticNormochromic
        );
    }

    #[test]
    fn test_uncovered_combination_is_inconclusive() {
        assert_eq!(
            diagnoser().diagnose(16.0, 110.0, 39.0),
            AnemiaCategory::Inconclusive
        );
        assert_eq!(
            diagnoser().diagnose(18.0, 90.0, 34.0),
            AnemiaCategory::Inconclusive
        );
    }

    #[test]
    fn test_normal_hgb_low_indices_is_normocytic_hypochromic() {
        assert_eq!(
            diagnoser().diagnose(14.0, 65.0, 29.0),
            AnemiaCategory::NormocyticHypochromic
        );
    }

    #[test]
    fn test_non_finite_input_is_inconclusive() {
        assert_eq!(
            diagnoser().diagnose(f64::NAN, 90.0, 34.0),
            AnemiaCategory::Inconclusive
        );
    }

    #[test]
    fn test_report_contents() {
        let report = diagnoser().report(&DiagnosisInput::new(9.0, 70.0, 29.0)).unwrap();
        assert_eq!(report.category, AnemiaCategory::MicrocyticHypochromic);
        let index = report.result_index.unwrap();
        assert!((index - 1.0).abs() < 1e-9);
        assert_eq!(report.rules.len(), 6);
        assert_eq!(report.rules[3].strength, 1.0);
        assert_eq!(report.term_strengths["Microcytic Hypochromic"], 1.0);
        assert_eq!(report.fuzzified["hgb"]["low"], 1.0);
        assert_eq!(report.aggregate.len(), 91);
        assert!(report.reason.is_none());
        assert!(report.to_string().starts_with("Diagnosis: Microcytic Hypochromic | Result Index: 1.00"));
    }

    #[test]
    fn test_report_inconclusive_has_reason() {
        let report = diagnoser().report(&DiagnosisInput::new(16.0, 110.0, 39.0)).unwrap();
        assert_eq!(report.category, AnemiaCategory::Inconclusive);
        assert!(report.result_index.is_none());
        assert!(report.reason.as_ref().unwrap().contains("No rule fired"));
        assert!(report.to_string().ends_with("n/a"));
    }

    #[test]
    fn test_report_rejects_invalid_input() {
        let err = diagnoser()
            .report(&DiagnosisInput::new(9.0, f64::INFINITY, 29.0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NonNumericInput);
        assert_eq!(err.context_field("field"), Some("mcv"));
    }

    #[test]
    fn test_parse_input() {
        let input = DiagnosisInput::parse(Some(" 12.5 "), Some("88"), Some("33.1")).unwrap();
        assert_eq!(input, DiagnosisInput::new(12.5, 88.0, 33.1));

        let missing = DiagnosisInput::parse(Some("12"), None, Some("33")).unwrap_err();
        assert_eq!(missing.code, ErrorCode::MissingInput);
        assert_eq!(missing.context_field("field"), Some("mcv"));

        let blank = DiagnosisInput::parse(Some(""), Some("88"), Some("33")).unwrap_err();
        assert_eq!(blank.code, ErrorCode::MissingInput);

        let bad = DiagnosisInput::parse(Some("12"), Some("88"), Some("abc")).unwrap_err();
        assert_eq!(bad.code, ErrorCode::NonNumericInput);
        assert_eq!(bad.context_field("field"), Some("mchc"));

        assert!(DiagnosisInput::parse(Some("NaN"), Some("88"), Some("33")).is_err());
    }

    #[test]
    fn test_membership_curves_full_resolution() {
        let curves = diagnoser().membership_curves("hgb", None).unwrap();
        assert_eq!(curves.keys().collect::<Vec<_>>(), vec!["low", "normal", "high"]);
        assert_eq!(curves["normal"].len(), 141);
        let peak = curves["normal"]
            .iter()
            .find(|(x, _)| (x - 14.0).abs() < 1e-9)
            .unwrap();
        assert_eq!(peak.1, 1.0);
        assert_eq!(curves["high"].last().unwrap().1, 1.0);
    }

    #[test]
    fn test_membership_curves_downsampled_and_unknown() {
        let d = diagnoser();
        let curves = d.membership_curves("mcv", Some(50)).unwrap();
        assert_eq!(curves["low"].len(), 50);
        assert_eq!(d.membership_curves("anemia", None).unwrap().len(), 10);

        let err = d.membership_curves("rdw", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_input_curves_order() {
        let curves = diagnoser().input_curves(Some(20));
        let names: Vec<&str> = curves.iter().map(|c| c.variable.as_str()).collect();
        assert_eq!(names, INPUTS.to_vec());
        assert_eq!(curves[1].max, 120.9);
    }

    #[test]
    fn test_alternative_defuzzification() {
        let config = InferenceConfig {
            defuzzification: DefuzzificationMethod::MeanOfMaximum,
            ..InferenceConfig::default()
        };
        let d = Diagnoser::with_config(&config).unwrap();
        assert_eq!(d.diagnose(9.0, 70.0, 29.0), AnemiaCategory::MicrocyticHypochromic);
    }
}
