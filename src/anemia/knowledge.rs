//! Fixed clinical knowledge base
//!
//! Universes, term breakpoints and rules below determine every diagnosis.
//! Changing any number here changes results.

use tracing::info;

use crate::error::AnemiaResult;
use crate::fuzzy::{
    DefuzzificationMethod, FuzzyRule, FuzzySystem, Implication, LinguisticVariable, Universe,
};
use super::category::AnemiaCategory;

/// Hemoglobin concentration (g/dL)
pub const HGB: &str = "hgb";
/// Mean corpuscular volume (fL)
pub const MCV: &str = "mcv";
/// Mean corpuscular hemoglobin concentration (g/dL)
pub const MCHC: &str = "mchc";
/// Output index variable
pub const ANEMIA: &str = "anemia";

/// Input variable names in input order
pub const INPUTS: [&str; 3] = [HGB, MCV, MCHC];

pub const LOW: &str = "low";
pub const NORMAL: &str = "normal";
pub const HIGH: &str = "high";

const STEP: f64 = 0.1;

/// Universe sampled at [`STEP`], tagged with its variable on failure
fn universe(variable: &str, min: f64, max: f64) -> AnemiaResult<Universe> {
    Universe::new(min, max, STEP).map_err(|e| e.with_context("variable", variable))
}

pub fn hgb_variable() -> AnemiaResult<LinguisticVariable> {
    LinguisticVariable::builder(HGB, universe(HGB, 5.0, 19.0)?)
        .trapezoid(LOW, 5.0, 5.0, 10.0, 12.0)
        .triangle(NORMAL, 11.0, 14.0, 16.0)
        .trapezoid(HIGH, 15.0, 17.0, 19.0, 19.0)
        .build()
}

pub fn mcv_variable() -> AnemiaResult<LinguisticVariable> {
    LinguisticVariable::builder(MCV, universe(MCV, 60.0, 120.9)?)
        .trapezoid(LOW, 60.0, 60.0, 70.0, 80.0)
        .triangle(NORMAL, 78.0, 95.0, 110.0)
        .trapezoid(HIGH, 100.0, 115.0, 120.9, 120.9)
        .build()
}

pub fn mchc_variable() -> AnemiaResult<LinguisticVariable> {
    LinguisticVariable::builder(MCHC, universe(MCHC, 28.0, 41.0)?)
        .trapezoid(LOW, 28.0, 28.0, 30.0, 32.0)
        .triangle(NORMAL, 31.0, 34.0, 37.0)
        .trapezoid(HIGH, 35.0, 38.0, 41.0, 41.0)
        .build()
}

/// One triangle per category, peaking at the category index and reaching
/// zero at both neighbours.
pub fn anemia_variable() -> AnemiaResult<LinguisticVariable> {
    AnemiaCategory::ALL
        .iter()
        .enumerate()
        .fold(
            LinguisticVariable::builder(ANEMIA, universe(ANEMIA, 0.0, 9.0)?),
            |builder, (i, category)| {
                let center = i as f64;
                builder.triangle(category.name(), center - 1.0, center, center + 1.0)
            },
        )
        .build()
}

fn rule(hgb: &str, mcv: &str, mchc: &str, category: AnemiaCategory) -> FuzzyRule {
    FuzzyRule::when(HGB, hgb)
        .and(MCV, mcv)
        .and(MCHC, mchc)
        .then(ANEMIA, category.name())
}

/// The six rules, in rule-base order
pub fn rule_base() -> Vec<FuzzyRule> {
    vec![
        rule(NORMAL, NORMAL, NORMAL, AnemiaCategory::Normal).with_name("rule1"),
        rule(NORMAL, LOW, LOW, AnemiaCategory::NormocyticHypochromic).with_name("rule2"),
        rule(NORMAL, HIGH, HIGH, AnemiaCategory::NormocyticHyperchromic).with_name("rule3"),
        rule(LOW, LOW, LOW, AnemiaCategory::MicrocyticHypochromic).with_name("rule4"),
        rule(LOW, NORMAL, NORMAL, AnemiaCategory::MicrocyticNormochromic).with_name("rule5"),
        rule(LOW, HIGH, HIGH, AnemiaCategory::MacrocyticHyperchromic).with_name("rule6"),
    ]
}

/// Assemble the complete anemia system
pub fn knowledge_base(
    implication: Implication,
    defuzzification: DefuzzificationMethod,
) -> AnemiaResult<FuzzySystem> {
    let system = FuzzySystem::builder()
        .input(hgb_variable()?)
        .input(mcv_variable()?)
        .input(mchc_variable()?)
        .output(anemia_variable()?)
        .rules(rule_base())
        .implication(implication)
        .defuzzification(defuzzification)
        .build()?;

    info!(
        inputs = system.inputs().len(),
        rules = system.rules().len(),
        implication = implication.as_str(),
        defuzzification = defuzzification.as_str(),
        "anemia knowledge base ready"
    );
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree(var: &LinguisticVariable, term: &str, x: f64) -> f64 {
        var.fuzzify(x)[term].value()
    }

    #[test]
    fn test_plateau_centers_are_full_members() {
        let hgb = hgb_variable().unwrap();
        let mcv = mcv_variable().unwrap();
        let mchc = mchc_variable().unwrap();

        assert_eq!(degree(&hgb, NORMAL, 14.0), 1.0);
        assert_eq!(degree(&hgb, LOW, 7.5), 1.0);
        assert_eq!(degree(&hgb, HIGH, 18.0), 1.0);
        assert_eq!(degree(&mcv, NORMAL, 95.0), 1.0);
        assert_eq!(degree(&mcv, LOW, 65.0), 1.0);
        assert_eq!(degree(&mcv, HIGH, 118.0), 1.0);
        assert_eq!(degree(&mchc, NORMAL, 34.0), 1.0);
        assert_eq!(degree(&mchc, LOW, 29.0), 1.0);
        assert_eq!(degree(&mchc, HIGH, 39.5), 1.0);
    }

    #[test]
    fn test_outside_support_is_zero() {
        let hgb = hgb_variable().unwrap();
        let mcv = mcv_variable().unwrap();
        let mchc = mchc_variable().unwrap();

        assert_eq!(degree(&hgb, NORMAL, 10.0), 0.0);
        assert_eq!(degree(&hgb, LOW, 13.0), 0.0);
        assert_eq!(degree(&hgb, HIGH, 14.0), 0.0);
        assert_eq!(degree(&mcv, NORMAL, 115.0), 0.0);
        assert_eq!(degree(&mcv, HIGH, 90.0), 0.0);
        assert_eq!(degree(&mchc, LOW, 33.0), 0.0);
        assert_eq!(degree(&mchc, NORMAL, 38.0), 0.0);
    }

    #[test]
    fn test_universe_extremes_saturate() {
        let hgb = hgb_variable().unwrap();
        assert_eq!(degree(&hgb, LOW, 2.0), 1.0);
        assert_eq!(degree(&hgb, HIGH, 25.0), 1.0);

        let mcv = mcv_variable().unwrap();
        assert_eq!(degree(&mcv, HIGH, 130.0), 1.0);
    }

    #[test]
    fn test_output_terms_follow_category_order() {
        let anemia = anemia_variable().unwrap();
        let names: Vec<&str> = anemia.term_names().collect();
        assert_eq!(names.len(), 10);
        for (name, category) in names.iter().zip(AnemiaCategory::ALL.iter()) {
            assert_eq!(*name, category.name());
        }
        assert_eq!(anemia.universe().len(), 91);
        assert_eq!(degree(&anemia, "Normocytic Hypochromic", 4.0), 1.0);
        assert_eq!(degree(&anemia, "Normal", 0.0), 1.0);
    }

    #[test]
    fn test_rule_base_shape() {
        let rules = rule_base();
        assert_eq!(rules.len(), 6);
        assert!(rules.iter().all(|r| r.antecedents.len() == 3));
        assert_eq!(rules[3].consequent.term, "Microcytic Hypochromic");
        assert_eq!(rules[5].consequent.term, "Macrocytic Hyperchromic");
        assert!(rules
            .iter()
            .all(|r| r.antecedents.iter().all(|a| a.term != HIGH || a.variable != HGB)));
    }

    #[test]
    fn test_universe_errors_name_the_variable() {
        let err = universe(MCV, 120.9, 60.0).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidUniverse);
        assert_eq!(err.context_field("variable"), Some(MCV));
    }

    #[test]
    fn test_knowledge_base_builds() {
        let system = knowledge_base(Implication::Minimum, DefuzzificationMethod::Centroid).unwrap();
        assert_eq!(system.inputs().len(), 3);
        assert_eq!(system.output().name(), ANEMIA);
        assert_eq!(system.rules().len(), 6);
    }
}
