//! Conjunctive fuzzy rules

use serde::{Deserialize, Serialize};

/// A fuzzy rule antecedent (condition)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyAntecedent {
    /// Variable name
    pub variable: String,
    /// Term name (fuzzy set)
    pub term: String,
}

impl FuzzyAntecedent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

/// A fuzzy rule consequent (conclusion)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyConsequent {
    /// Output variable name
    pub variable: String,
    /// Output term name
    pub term: String,
}

impl FuzzyConsequent {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

/// A fuzzy rule: antecedents ANDed together imply one consequent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyRule {
    /// Rule name/label
    pub name: Option<String>,
    /// Antecedents (ANDed together)
    pub antecedents: Vec<FuzzyAntecedent>,
    /// Consequent
    pub consequent: FuzzyConsequent,
    /// Rule weight in [0, 1]
    pub weight: f64,
}

impl FuzzyRule {
    pub fn new(antecedents: Vec<FuzzyAntecedent>, consequent: FuzzyConsequent) -> Self {
        Self {
            name: None,
            antecedents,
            consequent,
            weight: 1.0,
        }
    }

    /// Start a rule from its first condition
    ///
    /// ```rust,ignore
    /// let rule = FuzzyRule::when("hgb", "low")
    ///     .and("mcv", "low")
    ///     .then("anemia", "Microcytic Hypochromic");
    /// ```
    pub fn when(variable: impl Into<String>, term: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            antecedents: vec![FuzzyAntecedent::new(variable, term)],
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label for logs and reports: the name, or the rule written out
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.to_string(),
        }
    }
}

impl std::fmt::Display for FuzzyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IF ")?;
        for (i, a) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{} is {}", a.variable, a.term)?;
        }
        write!(f, " THEN {} is {}", self.consequent.variable, self.consequent.term)
    }
}

/// Accumulates antecedents until a consequent closes the rule
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    antecedents: Vec<FuzzyAntecedent>,
}

impl RuleBuilder {
    pub fn and(mut self, variable: impl Into<String>, term: impl Into<String>) -> Self {
        self.antecedents.push(FuzzyAntecedent::new(variable, term));
        self
    }

    pub fn then(self, variable: impl Into<String>, term: impl Into<String>) -> FuzzyRule {
        FuzzyRule::new(self.antecedents, FuzzyConsequent::new(variable, term))
    }
}
