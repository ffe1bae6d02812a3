//! Fuzzy Logic Module
//!
//! Generic building blocks for Mamdani fuzzy inference:
//! - Fuzzy truth values and piecewise-linear membership functions
//! - Sampled universes and linguistic variables
//! - Conjunctive fuzzy rules
//! - The inference engine with its defuzzification methods

pub mod engine;
pub mod membership;
pub mod rule;
pub mod variable;

pub use engine::{
    defuzzify, DefuzzificationMethod, FuzzySystem, FuzzySystemBuilder, Implication, Inference,
    InferenceContext, RuleFiring,
};
pub use membership::{FuzzyValue, MembershipFunction};
pub use rule::{FuzzyAntecedent, FuzzyConsequent, FuzzyRule, RuleBuilder};
pub use variable::{FuzzySet, LinguisticVariable, Universe, VariableBuilder};
