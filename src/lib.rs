//! fuzzy-anemia - Mamdani fuzzy classifier for anemia screening
//!
//! Maps three blood indices (hemoglobin, mean corpuscular volume, mean
//! corpuscular hemoglobin concentration) to one of ten morphological anemia
//! categories, or "Diagnosis Inconclusive" when no rule applies.
//!
//! # Architecture
//!
//! - [`fuzzy`] - generic fuzzy engine: membership functions, linguistic
//!   variables, rules and Mamdani inference
//! - [`anemia`] - the fixed clinical knowledge base, category table and
//!   the diagnosis service built on the engine
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - structured errors with stable codes
//!
//! # Example
//!
//! ```rust
//! use fuzzy_anemia::{AnemiaCategory, Diagnoser};
//!
//! let diagnoser = Diagnoser::new().unwrap();
//! assert_eq!(diagnoser.diagnose(14.0, 95.0, 34.0), AnemiaCategory::Normal);
//! assert_eq!(diagnoser.diagnose(18.0, 90.0, 34.0), AnemiaCategory::Inconclusive);
//! ```

use std::sync::OnceLock;

pub mod anemia;
pub mod config;
pub mod error;
pub mod fuzzy;

// Re-export the diagnosis surface
pub use crate::anemia::{
    categorize, knowledge_base, rule_base, AnemiaCategory, CategoryInterval, CategoryMap,
    Diagnoser, DiagnosisInput, DiagnosisReport, TermCurves, VariableCurves,
};

// Re-export engine types
pub use crate::fuzzy::{
    defuzzify, DefuzzificationMethod, FuzzyAntecedent, FuzzyConsequent, FuzzyRule, FuzzySet,
    FuzzySystem, FuzzySystemBuilder, FuzzyValue, Implication, Inference, InferenceContext,
    LinguisticVariable, MembershipFunction, RuleFiring, Universe,
};

// Re-export configuration and errors
pub use crate::config::{AnemiaConfig, ConfigError, InferenceConfig, LogLevel, OutputFormat};
pub use crate::error::{AnemiaError, AnemiaResult, ErrorCode, ErrorResponse};

/// Process-wide diagnoser with the default engine settings
static DIAGNOSER: OnceLock<AnemiaResult<Diagnoser>> = OnceLock::new();

/// Get the shared default diagnoser
///
/// The knowledge base is built on the first call and reused afterwards.
pub fn shared_diagnoser() -> AnemiaResult<&'static Diagnoser> {
    DIAGNOSER
        .get_or_init(Diagnoser::new)
        .as_ref()
        .map_err(Clone::clone)
}

/// Classify one set of blood indices with the shared default diagnoser.
///
/// Never fails: any problem, including no rule firing, yields
/// [`AnemiaCategory::Inconclusive`].
pub fn diagnose(hgb: f64, mcv: f64, mchc: f64) -> AnemiaCategory {
    match shared_diagnoser() {
        Ok(diagnoser) => diagnoser.diagnose(hgb, mcv, mchc),
        Err(e) => {
            tracing::error!(error = %e, "knowledge base failed to build");
            AnemiaCategory::Inconclusive
        }
    }
}
