//! Anemia classification on top of the fuzzy engine
//!
//! - [`knowledge`] - the fixed variables, terms and six rules
//! - [`category`] - the ten categories and the `[i, i + 1)` lookup table
//! - [`diagnosis`] - `diagnose`, full reports and curve export

pub mod category;
pub mod diagnosis;
pub mod knowledge;

pub use category::{categorize, AnemiaCategory, CategoryInterval, CategoryMap};
pub use diagnosis::{Diagnoser, DiagnosisInput, DiagnosisReport, TermCurves, VariableCurves};
pub use knowledge::{knowledge_base, rule_base, ANEMIA, HGB, INPUTS, MCHC, MCV};
