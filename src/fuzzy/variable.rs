//! Universes of discourse and linguistic variables

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{AnemiaError, AnemiaResult, ErrorCode};
use super::membership::{FuzzyValue, MembershipFunction};

/// Slack allowed when deciding whether the last step still lands on `max`
const STEP_TOLERANCE: f64 = 1e-9;
/// Samples are rounded onto this grid so `5.0 + 90 * 0.1` is exactly `14.0`
const SAMPLE_GRID: f64 = 1e9;
/// Upper bound on samples per universe
pub const MAX_SAMPLES: usize = 1_000_000;

/// An ordered, strictly increasing set of sample points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    min: f64,
    max: f64,
    step: f64,
    samples: Vec<f64>,
}

impl Universe {
    /// Sample `min, min + step, ...` up to and including `max` when it is
    /// reached within tolerance. The final sample never exceeds `max`, and
    /// every sample is rounded to nine decimals to shed accumulated drift.
    pub fn new(min: f64, max: f64, step: f64) -> AnemiaResult<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(AnemiaError::invalid_universe(format!(
                "Universe bounds must be finite (min={}, max={}, step={})",
                min, max, step
            )));
        }
        if step <= 0.0 {
            return Err(AnemiaError::invalid_universe(format!(
                "Universe step must be positive, got {}",
                step
            )));
        }
        if min >= max {
            return Err(AnemiaError::invalid_universe(format!(
                "Universe min {} must be below max {}",
                min, max
            )));
        }

        let steps = ((max - min) / step + STEP_TOLERANCE).floor();
        if steps >= MAX_SAMPLES as f64 {
            return Err(AnemiaError::invalid_universe(format!(
                "Universe [{}, {}] with step {} exceeds {} samples",
                min, max, step, MAX_SAMPLES
            )));
        }
        let count = steps as usize;
        let samples = (0..=count)
            .map(|i| ((min + i as f64 * step) * SAMPLE_GRID).round() / SAMPLE_GRID)
            .map(|x| x.min(max))
            .collect();

        Ok(Self {
            min,
            max,
            step,
            samples,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Saturate a crisp value onto the universe bounds
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }
}

/// A named fuzzy set with its membership precomputed over the universe
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzySet {
    /// Name of the fuzzy set (e.g., "low", "normal")
    pub name: String,
    /// The membership function
    pub membership: MembershipFunction,
    curve: Vec<f64>,
}

impl FuzzySet {
    fn new(name: String, membership: MembershipFunction, universe: &Universe) -> Self {
        let curve = universe
            .samples()
            .iter()
            .map(|&x| membership.evaluate(x).value())
            .collect();
        Self {
            name,
            membership,
            curve,
        }
    }

    /// Get membership degree for a value
    pub fn membership_of(&self, x: f64) -> FuzzyValue {
        self.membership.evaluate(x)
    }

    /// Membership degree at every universe sample, in universe order
    pub fn sampled(&self) -> &[f64] {
        &self.curve
    }
}

/// A linguistic variable with associated fuzzy sets
///
/// Built once through [`VariableBuilder`] and immutable afterwards. Terms keep
/// their insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct LinguisticVariable {
    name: String,
    universe: Universe,
    terms: IndexMap<String, FuzzySet>,
}

impl LinguisticVariable {
    pub fn builder(name: impl Into<String>, universe: Universe) -> VariableBuilder {
        VariableBuilder {
            name: name.into(),
            universe,
            terms: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn term(&self, name: &str) -> Option<&FuzzySet> {
        self.terms.get(name)
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.get_index_of(name)
    }

    pub fn terms(&self) -> impl Iterator<Item = &FuzzySet> {
        self.terms.values()
    }

    pub fn term_names(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Fuzzify a crisp value against every term, after clamping it onto the
    /// universe.
    pub fn fuzzify(&self, value: f64) -> IndexMap<String, FuzzyValue> {
        let x = self.universe.clamp(value);
        self.terms
            .iter()
            .map(|(name, set)| (name.clone(), set.membership_of(x)))
            .collect()
    }

    /// Get the term with highest membership for a value
    pub fn dominant_term(&self, value: f64) -> Option<(&str, FuzzyValue)> {
        let x = self.universe.clamp(value);
        self.terms
            .iter()
            .map(|(name, set)| (name.as_str(), set.membership_of(x)))
            .fold(None, |best: Option<(&str, FuzzyValue)>, candidate| match best {
                Some(b) if b.1.value() >= candidate.1.value() => Some(b),
                _ => Some(candidate),
            })
    }

    /// Membership curves of every term as `(x, degree)` pairs.
    ///
    /// `downsample` picks that many evenly spaced universe samples, always
    /// keeping both ends. `None`, or a target of at least the universe size,
    /// returns the full resolution.
    pub fn curves(&self, downsample: Option<usize>) -> IndexMap<String, Vec<(f64, f64)>> {
        let indices = sample_indices(self.universe.len(), downsample);
        let xs = self.universe.samples();
        self.terms
            .iter()
            .map(|(name, set)| {
                let curve = indices.iter().map(|&i| (xs[i], set.curve[i])).collect();
                (name.clone(), curve)
            })
            .collect()
    }
}

/// Indices of an even subsample of `len` points
pub(crate) fn sample_indices(len: usize, target: Option<usize>) -> Vec<usize> {
    match target {
        Some(n) if n < len && len > 1 => {
            let n = n.max(2);
            let last = (len - 1) as f64;
            let mut indices: Vec<usize> = (0..n)
                .map(|k| ((k as f64) * last / ((n - 1) as f64)).round() as usize)
                .collect();
            indices.dedup();
            indices
        }
        _ => (0..len).collect(),
    }
}

/// Collects term definitions for a [`LinguisticVariable`]
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    name: String,
    universe: Universe,
    terms: Vec<(String, MembershipFunction)>,
}

impl VariableBuilder {
    /// Add a term with an explicit membership function
    pub fn term(mut self, name: impl Into<String>, membership: MembershipFunction) -> Self {
        self.terms.push((name.into(), membership));
        self
    }

    /// Add a trapezoidal term `(a, b, c, d)`
    pub fn trapezoid(self, name: impl Into<String>, a: f64, b: f64, c: f64, d: f64) -> Self {
        self.term(name, MembershipFunction::Trapezoidal(a, b, c, d))
    }

    /// Add a triangular term `(a, b, c)`
    pub fn triangle(self, name: impl Into<String>, a: f64, b: f64, c: f64) -> Self {
        self.term(name, MembershipFunction::Triangular(a, b, c))
    }

    pub fn build(self) -> AnemiaResult<LinguisticVariable> {
        if self.name.trim().is_empty() {
            return Err(AnemiaError::configuration("Variable name cannot be empty"));
        }
        if self.terms.is_empty() {
            return Err(AnemiaError::configuration(format!(
                "Variable '{}' has no terms",
                self.name
            )));
        }

        let mut terms = IndexMap::with_capacity(self.terms.len());
        for (term, membership) in self.terms {
            membership
                .validate(&term)
                .map_err(|e| e.with_context("variable", self.name.as_str()))?;
            if terms.contains_key(&term) {
                return Err(AnemiaError::new(
                    ErrorCode::DuplicateTerm,
                    format!("Term '{}' defined twice on variable '{}'", term, self.name),
                ));
            }
            let set = FuzzySet::new(term.clone(), membership, &self.universe);
            terms.insert(term, set);
        }

        Ok(LinguisticVariable {
            name: self.name,
            universe: self.universe,
            terms,
        })
    }
}
