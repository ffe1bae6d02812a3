//! Mamdani fuzzy inference
//!
//! A [`FuzzySystem`] owns its input variables, one output variable and a
//! rule base. It is assembled once through [`FuzzySystemBuilder`], which
//! resolves every rule reference up front, and is read-only afterwards so it
//! can be shared freely between threads.
//!
//! Each call gets its own [`InferenceContext`]:
//!
//! 1. Fuzzification - crisp inputs are clamped onto their universes and
//!    evaluated against every term
//! 2. Rule strength - minimum over the antecedent degrees, scaled by weight
//! 3. Aggregation - every output term is clipped (or scaled) by the strongest
//!    rule targeting it, then combined with a pointwise maximum
//! 4. Defuzzification - centroid by default

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AnemiaError, AnemiaResult};
use super::membership::FuzzyValue;
use super::rule::FuzzyRule;
use super::variable::LinguisticVariable;

/// Tolerance when comparing aggregate maxima
const MAXIMUM_TOLERANCE: f64 = 1e-12;

/// Implication operator applied to the output terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Implication {
    /// Mamdani: clip the term at the rule strength
    #[default]
    Minimum,
    /// Larsen: scale the term by the rule strength
    Product,
}

impl Implication {
    pub fn as_str(&self) -> &'static str {
        match self {
            Implication::Minimum => "minimum",
            Implication::Product => "product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimum" | "min" | "mamdani" => Some(Implication::Minimum),
            "product" | "prod" | "larsen" => Some(Implication::Product),
            _ => None,
        }
    }

    fn apply(&self, strength: FuzzyValue, degree: f64) -> f64 {
        match self {
            Implication::Minimum => strength.value().min(degree),
            Implication::Product => strength.value() * degree,
        }
    }
}

/// Defuzzification method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DefuzzificationMethod {
    /// Center of Gravity (Centroid)
    #[default]
    Centroid,
    /// Bisector of Area
    Bisector,
    /// Mean of Maximum
    MeanOfMaximum,
    /// Smallest of Maximum
    SmallestOfMaximum,
    /// Largest of Maximum
    LargestOfMaximum,
}

impl DefuzzificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefuzzificationMethod::Centroid => "centroid",
            DefuzzificationMethod::Bisector => "bisector",
            DefuzzificationMethod::MeanOfMaximum => "mean_of_maximum",
            DefuzzificationMethod::SmallestOfMaximum => "smallest_of_maximum",
            DefuzzificationMethod::LargestOfMaximum => "largest_of_maximum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "centroid" | "cog" => Some(DefuzzificationMethod::Centroid),
            "bisector" | "bisector_of_area" => Some(DefuzzificationMethod::Bisector),
            "mean_of_maximum" | "mom" => Some(DefuzzificationMethod::MeanOfMaximum),
            "smallest_of_maximum" | "som" => Some(DefuzzificationMethod::SmallestOfMaximum),
            "largest_of_maximum" | "lom" => Some(DefuzzificationMethod::LargestOfMaximum),
            _ => None,
        }
    }
}

/// Defuzzify an aggregated curve sampled at `xs`.
///
/// Returns `None` when the curve is identically zero.
pub fn defuzzify(method: DefuzzificationMethod, xs: &[f64], mu: &[f64]) -> Option<f64> {
    debug_assert_eq!(xs.len(), mu.len());
    let points = xs.iter().copied().zip(mu.iter().copied());

    match method {
        DefuzzificationMethod::Centroid => {
            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for (x, m) in points {
                numerator += x * m;
                denominator += m;
            }
            if denominator > 0.0 {
                Some(numerator / denominator)
            } else {
                None
            }
        }
        DefuzzificationMethod::Bisector => {
            let total_area: f64 = mu.iter().sum();
            if total_area <= 0.0 {
                return None;
            }
            let half_area = total_area / 2.0;
            let mut cumulative = 0.0;
            for (x, m) in points {
                cumulative += m;
                if cumulative >= half_area {
                    return Some(x);
                }
            }
            xs.last().copied()
        }
        DefuzzificationMethod::MeanOfMaximum
        | DefuzzificationMethod::SmallestOfMaximum
        | DefuzzificationMethod::LargestOfMaximum => {
            let max_value = mu.iter().copied().fold(0.0, f64::max);
            if max_value <= 0.0 {
                return None;
            }
            let maxima: Vec<f64> = points
                .filter(|(_, m)| (m - max_value).abs() < MAXIMUM_TOLERANCE)
                .map(|(x, _)| x)
                .collect();
            match method {
                DefuzzificationMethod::SmallestOfMaximum => maxima.first().copied(),
                DefuzzificationMethod::LargestOfMaximum => maxima.last().copied(),
                _ => Some(maxima.iter().sum::<f64>() / maxima.len() as f64),
            }
        }
    }
}

/// Rule with its variable and term names resolved to indices
#[derive(Debug, Clone)]
struct ResolvedRule {
    antecedents: Vec<(usize, usize)>,
    consequent: usize,
    weight: f64,
}

/// Fuzzy Inference System
#[derive(Debug, Clone)]
pub struct FuzzySystem {
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<FuzzyRule>,
    resolved: Vec<ResolvedRule>,
    implication: Implication,
    defuzzification: DefuzzificationMethod,
}

impl FuzzySystem {
    pub fn builder() -> FuzzySystemBuilder {
        FuzzySystemBuilder::default()
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &[FuzzyRule] {
        &self.rules
    }

    pub fn implication(&self) -> Implication {
        self.implication
    }

    pub fn defuzzification(&self) -> DefuzzificationMethod {
        self.defuzzification
    }

    /// Look up an input or the output variable by name
    pub fn variable(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs
            .iter()
            .chain(std::iter::once(&self.output))
            .find(|v| v.name() == name)
    }

    /// Start a fresh per-call inference context
    pub fn context(&self) -> InferenceContext<'_> {
        InferenceContext {
            system: self,
            values: vec![None; self.inputs.len()],
        }
    }

    /// Run one inference over named crisp inputs
    pub fn infer<'k, I>(&self, inputs: I) -> AnemiaResult<Inference>
    where
        I: IntoIterator<Item = (&'k str, f64)>,
    {
        let mut ctx = self.context();
        for (name, value) in inputs {
            ctx.set_input(name, value)?;
        }
        ctx.compute()
    }
}

/// Builder for [`FuzzySystem`]
#[derive(Debug, Clone, Default)]
pub struct FuzzySystemBuilder {
    inputs: Vec<LinguisticVariable>,
    output: Option<LinguisticVariable>,
    rules: Vec<FuzzyRule>,
    implication: Implication,
    defuzzification: DefuzzificationMethod,
}

impl FuzzySystemBuilder {
    pub fn input(mut self, var: LinguisticVariable) -> Self {
        self.inputs.push(var);
        self
    }

    pub fn output(mut self, var: LinguisticVariable) -> Self {
        self.output = Some(var);
        self
    }

    pub fn rule(mut self, rule: FuzzyRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = FuzzyRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn implication(mut self, implication: Implication) -> Self {
        self.implication = implication;
        self
    }

    pub fn defuzzification(mut self, method: DefuzzificationMethod) -> Self {
        self.defuzzification = method;
        self
    }

    /// Validate every definition and resolve rule references
    pub fn build(self) -> AnemiaResult<FuzzySystem> {
        let output = self
            .output
            .ok_or_else(|| AnemiaError::configuration("Fuzzy system has no output variable"))?;
        if self.inputs.is_empty() {
            return Err(AnemiaError::configuration("Fuzzy system has no input variables"));
        }
        for (i, var) in self.inputs.iter().enumerate() {
            let clash = self.inputs[..i].iter().any(|v| v.name() == var.name())
                || var.name() == output.name();
            if clash {
                return Err(AnemiaError::configuration(format!(
                    "Variable '{}' is defined more than once",
                    var.name()
                )));
            }
        }
        if self.rules.is_empty() {
            return Err(AnemiaError::configuration("Fuzzy system has no rules"));
        }

        let mut resolved = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            resolved.push(resolve_rule(rule, &self.inputs, &output)?);
        }

        Ok(FuzzySystem {
            inputs: self.inputs,
            output,
            rules: self.rules,
            resolved,
            implication: self.implication,
            defuzzification: self.defuzzification,
        })
    }
}

fn resolve_rule(
    rule: &FuzzyRule,
    inputs: &[LinguisticVariable],
    output: &LinguisticVariable,
) -> AnemiaResult<ResolvedRule> {
    let in_rule = |e: AnemiaError| e.with_cause(format!("in rule {}", rule.label()));

    if rule.antecedents.is_empty() {
        return Err(in_rule(AnemiaError::configuration("Rule has no antecedents")));
    }
    if !(rule.weight.is_finite() && (0.0..=1.0).contains(&rule.weight)) {
        return Err(in_rule(AnemiaError::configuration(format!(
            "Rule weight {} is outside [0, 1]",
            rule.weight
        ))));
    }

    let mut antecedents = Vec::with_capacity(rule.antecedents.len());
    for antecedent in &rule.antecedents {
        let var_index = inputs
            .iter()
            .position(|v| v.name() == antecedent.variable)
            .ok_or_else(|| in_rule(AnemiaError::unknown_reference(&antecedent.variable, None)))?;
        let term_index = inputs[var_index]
            .term_index(&antecedent.term)
            .ok_or_else(|| {
                in_rule(AnemiaError::unknown_reference(
                    &antecedent.variable,
                    Some(&antecedent.term),
                ))
            })?;
        antecedents.push((var_index, term_index));
    }

    if rule.consequent.variable != output.name() {
        return Err(in_rule(AnemiaError::unknown_reference(&rule.consequent.variable, None)));
    }
    let consequent = output.term_index(&rule.consequent.term).ok_or_else(|| {
        in_rule(AnemiaError::unknown_reference(
            &rule.consequent.variable,
            Some(&rule.consequent.term),
        ))
    })?;

    Ok(ResolvedRule {
        antecedents,
        consequent,
        weight: rule.weight,
    })
}

/// Per-call state: created, filled with inputs, computed once
#[derive(Debug)]
pub struct InferenceContext<'a> {
    system: &'a FuzzySystem,
    values: Vec<Option<f64>>,
}

impl<'a> InferenceContext<'a> {
    pub fn set_input(&mut self, name: &str, value: f64) -> AnemiaResult<&mut Self> {
        let index = self
            .system
            .inputs
            .iter()
            .position(|v| v.name() == name)
            .ok_or_else(|| {
                AnemiaError::invalid_input(format!("Unknown input variable '{}'", name))
                    .with_context("field", name)
            })?;
        if !value.is_finite() {
            return Err(AnemiaError::non_numeric(name, value));
        }
        self.values[index] = Some(value);
        Ok(self)
    }

    pub fn compute(self) -> AnemiaResult<Inference> {
        let system = self.system;

        let mut crisp_inputs = Vec::with_capacity(system.inputs.len());
        for (var, value) in system.inputs.iter().zip(&self.values) {
            let value = value.ok_or_else(|| AnemiaError::missing_input(var.name()))?;
            crisp_inputs.push(value);
        }

        // Fuzzification
        let degrees: Vec<Vec<FuzzyValue>> = system
            .inputs
            .iter()
            .zip(&crisp_inputs)
            .map(|(var, &x)| {
                let x = var.universe().clamp(x);
                var.terms().map(|set| set.membership_of(x)).collect()
            })
            .collect();

        // Rule strengths
        let mut term_strengths = vec![FuzzyValue::ZERO; system.output.term_count()];
        let mut firings = Vec::with_capacity(system.resolved.len());
        for (rule, resolved) in system.rules.iter().zip(&system.resolved) {
            let strength = resolved
                .antecedents
                .iter()
                .fold(FuzzyValue::ONE, |acc, &(v, t)| acc.and(&degrees[v][t]));
            let strength = FuzzyValue::new(strength.value() * resolved.weight);
            trace!(rule = %rule.label(), strength = strength.value(), "rule evaluated");

            let slot = &mut term_strengths[resolved.consequent];
            *slot = slot.or(&strength);
            firings.push(RuleFiring {
                rule: rule.label(),
                consequent: rule.consequent.term.clone(),
                strength: strength.value(),
            });
        }

        // Aggregation
        let xs = system.output.universe().samples();
        let mut aggregate = vec![0.0; xs.len()];
        for (set, &strength) in system.output.terms().zip(&term_strengths) {
            if strength.is_zero() {
                continue;
            }
            for (acc, &degree) in aggregate.iter_mut().zip(set.sampled()) {
                let implied = system.implication.apply(strength, degree);
                if implied > *acc {
                    *acc = implied;
                }
            }
        }

        let crisp = defuzzify(system.defuzzification, xs, &aggregate);
        debug!(
            inputs = ?crisp_inputs,
            output = system.output.name(),
            crisp = ?crisp,
            "inference computed"
        );

        Ok(Inference {
            output: system.output.name().to_string(),
            inputs: system
                .inputs
                .iter()
                .zip(&crisp_inputs)
                .map(|(var, &x)| (var.name().to_string(), x))
                .collect(),
            fuzzified: system
                .inputs
                .iter()
                .zip(&degrees)
                .map(|(var, row)| {
                    let terms = var
                        .term_names()
                        .zip(row)
                        .map(|(t, d)| (t.to_string(), d.value()))
                        .collect();
                    (var.name().to_string(), terms)
                })
                .collect(),
            rules: firings,
            term_strengths: system
                .output
                .term_names()
                .zip(&term_strengths)
                .map(|(t, s)| (t.to_string(), s.value()))
                .collect(),
            aggregate: xs.iter().copied().zip(aggregate).collect(),
            crisp,
        })
    }
}

/// Strength with which one rule fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFiring {
    pub rule: String,
    pub consequent: String,
    pub strength: f64,
}

/// Result of one inference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inference {
    /// Output variable name
    pub output: String,
    /// Crisp inputs as supplied (before clamping)
    pub inputs: IndexMap<String, f64>,
    /// Membership degree of every input term
    pub fuzzified: IndexMap<String, IndexMap<String, f64>>,
    /// Strength of every rule, in rule-base order
    pub rules: Vec<RuleFiring>,
    /// Aggregated strength per output term
    pub term_strengths: IndexMap<String, f64>,
    /// Aggregated output curve as `(x, degree)`
    pub aggregate: Vec<(f64, f64)>,
    /// Defuzzified value, `None` when no rule fired
    pub crisp: Option<f64>,
}

impl Inference {
    /// The defuzzified output, or `NoRuleFired`
    pub fn crisp_output(&self) -> AnemiaResult<f64> {
        self.crisp
            .ok_or_else(|| AnemiaError::no_rule_fired(&self.output))
    }

    pub fn any_rule_fired(&self) -> bool {
        self.crisp.is_some()
    }

    /// Output term with the highest aggregated strength
    pub fn strongest_term(&self) -> Option<(&str, f64)> {
        self.term_strengths
            .iter()
            .filter(|(_, s)| **s > 0.0)
            .fold(None, |best: Option<(&str, f64)>, (name, &s)| match best {
                Some(b) if b.1 >= s => Some(b),
                _ => Some((name.as_str(), s)),
            })
    }
}
